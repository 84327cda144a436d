use crate::command::{CommandType, IndexingCommand};
use crate::commands::IndexingCommands;
use crate::config::StackerConfig;
use crate::document::{Document, DocumentSession};
use crate::hand_off::IndexingHandOff;
use crate::{IndexingError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Repository lifecycle events that carry indexing meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentEvent {
    DocumentCreated,
    BeforeDocumentUpdate,
    DocumentCreatedByCopy,
    DocumentMoved,
    DocumentSecurityUpdated,
    DocumentRemoved,
}

impl DocumentEvent {
    pub const ALL: [DocumentEvent; 6] = [
        DocumentEvent::DocumentCreated,
        DocumentEvent::BeforeDocumentUpdate,
        DocumentEvent::DocumentCreatedByCopy,
        DocumentEvent::DocumentMoved,
        DocumentEvent::DocumentSecurityUpdated,
        DocumentEvent::DocumentRemoved,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DocumentEvent::DocumentCreated => "document-created",
            DocumentEvent::BeforeDocumentUpdate => "before-document-update",
            DocumentEvent::DocumentCreatedByCopy => "document-created-by-copy",
            DocumentEvent::DocumentMoved => "document-moved",
            DocumentEvent::DocumentSecurityUpdated => "document-security-updated",
            DocumentEvent::DocumentRemoved => "document-removed",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.name() == name)
    }

    #[must_use]
    pub const fn command_type(self) -> CommandType {
        match self {
            DocumentEvent::DocumentCreated | DocumentEvent::DocumentCreatedByCopy => {
                CommandType::Index
            }
            DocumentEvent::BeforeDocumentUpdate | DocumentEvent::DocumentMoved => {
                CommandType::Update
            }
            DocumentEvent::DocumentSecurityUpdated => CommandType::UpdateSecurity,
            DocumentEvent::DocumentRemoved => CommandType::Delete,
        }
    }

    /// Events whose effect is inherited by descendants recurse on folders;
    /// events touching only the document's own properties never do.
    pub fn recurse_for(self, doc: &(impl Document + ?Sized)) -> bool {
        match self {
            DocumentEvent::DocumentCreated | DocumentEvent::BeforeDocumentUpdate => false,
            DocumentEvent::DocumentCreatedByCopy
            | DocumentEvent::DocumentMoved
            | DocumentEvent::DocumentSecurityUpdated
            | DocumentEvent::DocumentRemoved => doc.is_folder(),
        }
    }
}

/// Per unit of work mapping from document id to its pending commands.
pub trait CommandAccumulator {
    fn get_or_create(&mut self, doc_id: &str) -> &mut IndexingCommands;

    /// Every tracked document, empty ones included.
    fn entries(&self) -> Vec<&IndexingCommands>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulator that remembers the order documents were first stacked in.
pub type DocumentCommandMap = IndexMap<String, IndexingCommands>;

impl CommandAccumulator for IndexMap<String, IndexingCommands> {
    fn get_or_create(&mut self, doc_id: &str) -> &mut IndexingCommands {
        self.entry(doc_id.to_string())
            .or_insert_with(|| IndexingCommands::new(doc_id))
    }

    fn entries(&self) -> Vec<&IndexingCommands> {
        self.values().collect()
    }

    fn clear(&mut self) {
        IndexMap::clear(self);
    }

    fn len(&self) -> usize {
        IndexMap::len(self)
    }
}

impl CommandAccumulator for HashMap<String, IndexingCommands> {
    fn get_or_create(&mut self, doc_id: &str) -> &mut IndexingCommands {
        self.entry(doc_id.to_string())
            .or_insert_with(|| IndexingCommands::new(doc_id))
    }

    fn entries(&self) -> Vec<&IndexingCommands> {
        self.values().collect()
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

impl<A: CommandAccumulator + ?Sized> CommandAccumulator for &mut A {
    fn get_or_create(&mut self, doc_id: &str) -> &mut IndexingCommands {
        (**self).get_or_create(doc_id)
    }

    fn entries(&self) -> Vec<&IndexingCommands> {
        (**self).entries()
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushStats {
    pub documents: usize,
    pub sync_commands: usize,
    pub async_commands: usize,
}

/// Turns lifecycle events into coalesced indexing commands and flushes them
/// at the end of the unit of work.
pub struct IndexingCommandsStacker<A> {
    accumulator: A,
    config: StackerConfig,
}

impl<A: CommandAccumulator> IndexingCommandsStacker<A> {
    pub fn new(accumulator: A) -> Self {
        Self::with_config(accumulator, StackerConfig::default())
    }

    pub fn with_config(accumulator: A, config: StackerConfig) -> Self {
        Self {
            accumulator,
            config,
        }
    }

    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }

    pub fn into_inner(self) -> A {
        self.accumulator
    }

    pub fn get_or_create_commands(
        &mut self,
        doc: &(impl Document + ?Sized),
    ) -> Result<&mut IndexingCommands> {
        let doc_id = doc
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(IndexingError::MissingDocumentId)?;
        Ok(self.accumulator.get_or_create(doc_id))
    }

    pub fn stack(
        &mut self,
        doc: &(impl Document + ?Sized),
        event: DocumentEvent,
        sync: bool,
    ) -> Result<()> {
        let command =
            IndexingCommand::new(doc, event.command_type(), sync, event.recurse_for(doc))?;
        log::debug!("Stacking {command} for {}", event.name());
        self.get_or_create_commands(doc)?.add(command);
        Ok(())
    }

    /// Stack the command for a raw event name. Names outside the event table
    /// are ignored and yield `Ok(false)`.
    pub fn stack_command(
        &mut self,
        doc: &(impl Document + ?Sized),
        event_name: &str,
        sync: bool,
    ) -> Result<bool> {
        let Some(event) = DocumentEvent::from_name(event_name) else {
            log::debug!("Ignoring event {event_name:?}: no indexing impact");
            return Ok(false);
        };
        self.stack(doc, event, sync)?;
        Ok(true)
    }

    /// Hand every pending command off, document by document: one sync call
    /// and then one async call per document, each only when its partition is
    /// non-empty.
    ///
    /// All partitions are built (and refreshed) before the first hand-off. The
    /// accumulator is cleared only once every hand-off succeeded; on error the
    /// pending commands are left untouched for a retry.
    pub fn flush_commands(
        &mut self,
        session: &(impl DocumentSession + ?Sized),
        hand_off: &mut (impl IndexingHandOff + ?Sized),
    ) -> Result<FlushStats> {
        let mut stats = FlushStats::default();
        let mut partitions = Vec::new();

        for commands in self.accumulator.entries() {
            if commands.is_empty() {
                continue;
            }
            let mut sync_batch = Vec::new();
            let mut async_batch = Vec::new();
            for command in commands.merged_commands() {
                let mut command = command.clone();
                if self.config.refresh_on_flush && command.command_type() != CommandType::Delete
                {
                    command.refresh(session)?;
                }
                if command.is_sync() {
                    sync_batch.push(command);
                } else {
                    async_batch.push(command);
                }
            }
            stats.documents += 1;
            stats.sync_commands += sync_batch.len();
            stats.async_commands += async_batch.len();
            partitions.push((sync_batch, async_batch));
        }

        for (sync_batch, async_batch) in partitions {
            if !sync_batch.is_empty() {
                hand_off.hand_off_sync(sync_batch)?;
            }
            if !async_batch.is_empty() {
                hand_off.hand_off_async(async_batch)?;
            }
        }

        self.accumulator.clear();
        log::info!(
            "Flushed indexing commands for {} documents ({} sync, {} async)",
            stats.documents,
            stats.sync_commands,
            stats.async_commands
        );
        Ok(stats)
    }
}
