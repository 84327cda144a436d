//! # Indexing Stack
//!
//! Coalesces the document lifecycle events of one unit of work into the
//! smallest set of indexing commands for an external search-index writer.
//!
//! ## Pipeline
//!
//! ```text
//! Repository events
//!     │
//!     ├──> IndexingCommandsStacker::stack_command
//!     │      └─> IndexingCommand (event table: type + recurse)
//!     │
//!     ├──> IndexingCommands::add (per document)
//!     │      └─> merge / cancel / promote / discard / append
//!     │
//!     └──> IndexingCommandsStacker::flush_commands
//!            ├─ sync batch  ──> IndexingHandOff::hand_off_sync
//!            └─ async batch ──> IndexingHandOff::hand_off_async
//! ```
//!
//! ## Example
//!
//! ```
//! use indexing_stack::{DocumentRef, MemorySession, RecordingHandOff, UnitOfWork};
//!
//! # fn main() -> indexing_stack::Result<()> {
//! let doc = DocumentRef::new("default", "doc1").with_path("/ws/doc1");
//! let mut session = MemorySession::new("default");
//! session.insert(doc.clone());
//!
//! let mut uow = UnitOfWork::new();
//! uow.stacker().stack_command(&doc, "document-created", false)?;
//! uow.stacker().stack_command(&doc, "before-document-update", false)?;
//!
//! let mut hand_off = RecordingHandOff::new();
//! let stats = uow.commit(&session, &mut hand_off)?;
//! assert_eq!(stats.async_commands, 1);
//! # Ok(())
//! # }
//! ```

mod command;
mod commands;
mod config;
mod document;
mod error;
mod hand_off;
mod stacker;
mod unit_of_work;
mod wire;

pub use command::{CommandType, IndexingCommand};
pub use commands::IndexingCommands;
pub use config::StackerConfig;
pub use document::{Document, DocumentRef, DocumentSession, MemorySession};
pub use error::{IndexingError, Result};
pub use hand_off::{
    HandOffCall, IndexingHandOff, IndexingQueue, QueuedHandOff, RecordingHandOff, SyncIndexer,
};
pub use stacker::{
    CommandAccumulator, DocumentCommandMap, DocumentEvent, FlushStats, IndexingCommandsStacker,
};
pub use unit_of_work::UnitOfWork;
pub use wire::{wire_schema, WireCommand};
