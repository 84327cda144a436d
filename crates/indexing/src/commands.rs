use crate::command::{CommandType, IndexingCommand};
use std::collections::HashSet;

/// Commands pending for one document within one unit of work, holding at
/// most one command per type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingCommands {
    doc_id: String,
    commands: Vec<IndexingCommand>,
    types: HashSet<CommandType>,
}

impl IndexingCommands {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            commands: Vec::new(),
            types: HashSet::new(),
        }
    }

    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Fold `command` into the pending set.
    ///
    /// Precedence, first match wins:
    /// 1. same type pending: merge flags into it;
    /// 2. a delete pending: nothing else matters for a removed document;
    /// 3. an index pending: a delete cancels everything, a sync command makes
    ///    the index sync, anything else is already covered by the index;
    /// 4. an incoming delete replaces whatever was pending;
    /// 5. otherwise append.
    ///
    /// Commands for another document are discarded.
    pub fn add(&mut self, command: IndexingCommand) {
        if command.doc_id() != self.doc_id {
            log::trace!("Discarding {command}: not a command for {}", self.doc_id);
            return;
        }
        let ty = command.command_type();

        if let Some(existing) = self.find_mut(ty) {
            existing.update(&command);
            log::trace!("Merged {command} into {existing}");
            return;
        }

        if self.contains(CommandType::Delete) {
            log::trace!("Discarding {command}: {} is already deleted", self.doc_id);
            return;
        }

        if self.contains(CommandType::Index) {
            if ty == CommandType::Delete {
                log::trace!(
                    "{} created and deleted in the same unit of work, dropping all commands",
                    self.doc_id
                );
                self.clear();
            } else if command.is_sync() {
                if let Some(index) = self.find_mut(CommandType::Index) {
                    index.make_sync();
                    log::trace!("Promoted {index} on behalf of {command}");
                }
            } else {
                log::trace!("Discarding {command}: covered by pending index");
            }
            return;
        }

        if ty == CommandType::Delete {
            self.clear();
        }
        log::trace!("Stacked {command}");
        self.types.insert(ty);
        self.commands.push(command);
    }

    /// Surviving commands in insertion order.
    #[must_use]
    pub fn merged_commands(&self) -> &[IndexingCommand] {
        &self.commands
    }

    #[must_use]
    pub fn contains(&self, ty: CommandType) -> bool {
        self.types.contains(&ty)
    }

    #[must_use]
    pub fn find(&self, ty: CommandType) -> Option<&IndexingCommand> {
        if !self.contains(ty) {
            return None;
        }
        self.commands.iter().find(|cmd| cmd.command_type() == ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn find_mut(&mut self, ty: CommandType) -> Option<&mut IndexingCommand> {
        if !self.contains(ty) {
            return None;
        }
        self.commands.iter_mut().find(|cmd| cmd.command_type() == ty)
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.types.clear();
    }
}
