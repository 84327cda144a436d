use crate::command::IndexingCommand;
use crate::config::StackerConfig;
use crate::{IndexingError, Result};
use tokio::sync::mpsc;

/// Downstream end of a flush.
pub trait IndexingHandOff {
    /// Blocks until the index writer has acknowledged `commands`.
    fn hand_off_sync(&mut self, commands: Vec<IndexingCommand>) -> Result<()>;

    /// Enqueues `commands` for out-of-band processing and returns at once.
    fn hand_off_async(&mut self, commands: Vec<IndexingCommand>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOffCall {
    Sync(Vec<IndexingCommand>),
    Async(Vec<IndexingCommand>),
}

/// Keeps every hand-off in memory.
#[derive(Debug, Default)]
pub struct RecordingHandOff {
    calls: Vec<HandOffCall>,
    fail_sync: bool,
    fail_async: bool,
}

impl RecordingHandOff {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> &[HandOffCall] {
        &self.calls
    }

    /// Batches handed off synchronously, in call order.
    #[must_use]
    pub fn sync_calls(&self) -> Vec<&[IndexingCommand]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HandOffCall::Sync(cmds) => Some(cmds.as_slice()),
                HandOffCall::Async(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn async_calls(&self) -> Vec<&[IndexingCommand]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HandOffCall::Async(cmds) => Some(cmds.as_slice()),
                HandOffCall::Sync(_) => None,
            })
            .collect()
    }

    pub fn take_calls(&mut self) -> Vec<HandOffCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn fail_next_sync(&mut self) {
        self.fail_sync = true;
    }

    pub fn fail_next_async(&mut self) {
        self.fail_async = true;
    }
}

impl IndexingHandOff for RecordingHandOff {
    fn hand_off_sync(&mut self, commands: Vec<IndexingCommand>) -> Result<()> {
        if std::mem::take(&mut self.fail_sync) {
            return Err(IndexingError::HandOff("sync indexer unavailable".to_string()));
        }
        self.calls.push(HandOffCall::Sync(commands));
        Ok(())
    }

    fn hand_off_async(&mut self, commands: Vec<IndexingCommand>) -> Result<()> {
        if std::mem::take(&mut self.fail_async) {
            return Err(IndexingError::HandOff("async queue unavailable".to_string()));
        }
        self.calls.push(HandOffCall::Async(commands));
        Ok(())
    }
}

/// The search-index writer used for synchronous batches.
pub trait SyncIndexer {
    fn index(&mut self, commands: &[IndexingCommand]) -> Result<()>;
}

impl<F> SyncIndexer for F
where
    F: FnMut(&[IndexingCommand]) -> Result<()>,
{
    fn index(&mut self, commands: &[IndexingCommand]) -> Result<()> {
        self(commands)
    }
}

/// Sync batches go straight to a [`SyncIndexer`]; async batches are encoded
/// to the wire format and queued for a worker holding the [`IndexingQueue`].
pub struct QueuedHandOff<S> {
    indexer: S,
    queue: mpsc::Sender<Vec<u8>>,
}

/// Consuming end of a [`QueuedHandOff`].
pub struct IndexingQueue {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl<S: SyncIndexer> QueuedHandOff<S> {
    pub fn channel(indexer: S, config: &StackerConfig) -> Result<(Self, IndexingQueue)> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        Ok((Self { indexer, queue: tx }, IndexingQueue { rx }))
    }

    pub fn indexer(&self) -> &S {
        &self.indexer
    }

    pub fn indexer_mut(&mut self) -> &mut S {
        &mut self.indexer
    }
}

impl<S: SyncIndexer> IndexingHandOff for QueuedHandOff<S> {
    fn hand_off_sync(&mut self, commands: Vec<IndexingCommand>) -> Result<()> {
        self.indexer.index(&commands)
    }

    fn hand_off_async(&mut self, commands: Vec<IndexingCommand>) -> Result<()> {
        let payloads = commands
            .iter()
            .map(IndexingCommand::to_wire)
            .collect::<Result<Vec<_>>>()?;

        // all or nothing: the flush keeps its commands if this batch is refused
        let free = self.queue.capacity();
        if free < payloads.len() {
            return Err(IndexingError::HandOff(format!(
                "async queue has room for {free} commands, batch needs {}",
                payloads.len()
            )));
        }
        for payload in payloads {
            self.queue.try_send(payload).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    IndexingError::HandOff("async queue is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    IndexingError::HandOff("async queue is closed".to_string())
                }
            })?;
        }
        log::debug!("Queued {} commands for async indexing", commands.len());
        Ok(())
    }
}

impl IndexingQueue {
    /// Next queued command; `None` once every sender is gone and the queue
    /// is drained.
    pub async fn recv(&mut self) -> Option<Result<IndexingCommand>> {
        let payload = self.rx.recv().await?;
        Some(IndexingCommand::from_wire(&payload))
    }

    /// Non-blocking variant of [`IndexingQueue::recv`].
    pub fn try_recv(&mut self) -> Option<Result<IndexingCommand>> {
        let payload = self.rx.try_recv().ok()?;
        Some(IndexingCommand::from_wire(&payload))
    }
}
