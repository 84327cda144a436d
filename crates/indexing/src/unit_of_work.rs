use crate::config::StackerConfig;
use crate::document::DocumentSession;
use crate::hand_off::IndexingHandOff;
use crate::stacker::{DocumentCommandMap, FlushStats, IndexingCommandsStacker};
use crate::Result;

/// Carries the pending commands of exactly one unit of work.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    commands: DocumentCommandMap,
    config: StackerConfig,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StackerConfig) -> Self {
        Self {
            commands: DocumentCommandMap::new(),
            config,
        }
    }

    pub fn stacker(&mut self) -> IndexingCommandsStacker<&mut DocumentCommandMap> {
        IndexingCommandsStacker::with_config(&mut self.commands, self.config.clone())
    }

    #[must_use]
    pub fn commands(&self) -> &DocumentCommandMap {
        &self.commands
    }

    /// Documents that still have surviving commands.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.commands.values().filter(|cmds| !cmds.is_empty()).count()
    }

    /// Flush at the transaction boundary. A failed commit keeps every pending
    /// command, so it can be retried as is.
    pub fn commit(
        &mut self,
        session: &(impl DocumentSession + ?Sized),
        hand_off: &mut (impl IndexingHandOff + ?Sized),
    ) -> Result<FlushStats> {
        self.stacker().flush_commands(session, hand_off)
    }

    /// Drop everything pending; returns the number of documents discarded.
    pub fn rollback(&mut self) -> usize {
        let discarded = self.pending();
        self.commands.clear();
        if discarded > 0 {
            log::info!("Rolled back indexing commands for {discarded} documents");
        }
        discarded
    }
}
