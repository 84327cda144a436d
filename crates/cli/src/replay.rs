use anyhow::{Context, Result};
use indexing_stack::{
    DocumentEvent, DocumentRef, FlushStats, IndexingCommand, MemorySession, QueuedHandOff,
    StackerConfig, SyncIndexer, UnitOfWork,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct EventLog {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub events: Vec<LoggedEvent>,
    #[serde(default)]
    pub rollback: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedEvent {
    pub doc_id: String,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub folder: bool,
    #[serde(default)]
    pub schemas: Vec<String>,
    pub event: String,
    #[serde(default)]
    pub sync: bool,
}

impl LoggedEvent {
    fn document(&self, default_repo: &str) -> DocumentRef {
        DocumentRef {
            repository: self.repo.clone().unwrap_or_else(|| default_repo.to_string()),
            id: self.doc_id.clone(),
            path: self.path.clone(),
            folder: self.folder,
            schemas: self.schemas.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Committed,
    RolledBack,
}

#[derive(Debug)]
pub struct TransactionReport {
    pub index: usize,
    pub outcome: Outcome,
    pub ignored: usize,
    pub discarded: usize,
    pub stats: FlushStats,
    pub sync: Vec<IndexingCommand>,
    pub queued: Vec<IndexingCommand>,
}

impl TransactionReport {
    pub fn to_json(&self) -> Result<Value> {
        let wire = |cmds: &[IndexingCommand]| -> Result<Vec<Value>> {
            cmds.iter()
                .map(|cmd| cmd.to_wire_value().map_err(anyhow::Error::from))
                .collect()
        };
        Ok(json!({
            "transaction": self.index,
            "outcome": self.outcome,
            "ignored": self.ignored,
            "discarded": self.discarded,
            "stats": self.stats,
            "sync": wire(&self.sync)?,
            "async": wire(&self.queued)?,
        }))
    }

    pub fn render(&self) -> String {
        let mut out = match self.outcome {
            Outcome::Committed => format!(
                "transaction {}: committed, {} documents ({} sync, {} async), {} ignored",
                self.index,
                self.stats.documents,
                self.stats.sync_commands,
                self.stats.async_commands,
                self.ignored
            ),
            Outcome::RolledBack => format!(
                "transaction {}: rolled back, {} documents discarded",
                self.index, self.discarded
            ),
        };
        for cmd in &self.sync {
            out.push_str(&format!("\n  sync  {cmd}"));
        }
        for cmd in &self.queued {
            out.push_str(&format!("\n  async {cmd}"));
        }
        out
    }
}

#[derive(Debug, Default)]
struct CollectingIndexer {
    batches: Vec<Vec<IndexingCommand>>,
}

impl SyncIndexer for CollectingIndexer {
    fn index(&mut self, commands: &[IndexingCommand]) -> indexing_stack::Result<()> {
        self.batches.push(commands.to_vec());
        Ok(())
    }
}

/// Run every transaction of `log` through its own unit of work.
pub fn replay(
    log: &EventLog,
    config: &StackerConfig,
    default_repo: &str,
) -> Result<Vec<TransactionReport>> {
    let mut session = MemorySession::new(default_repo);
    let (mut hand_off, mut queue) = QueuedHandOff::channel(CollectingIndexer::default(), config)?;
    let mut reports = Vec::with_capacity(log.transactions.len());

    for (index, tx) in log.transactions.iter().enumerate() {
        let checkpoint = session.clone();
        let mut uow = UnitOfWork::with_config(config.clone());
        let mut ignored = 0;

        for (pos, event) in tx.events.iter().enumerate() {
            let doc = event.document(default_repo);
            // the session only tracks the default repository
            if doc.repository == default_repo {
                if event.event == DocumentEvent::DocumentRemoved.name() {
                    session.remove(&doc.id);
                } else {
                    session.insert(doc.clone());
                }
            }
            let stacked = uow
                .stacker()
                .stack_command(&doc, &event.event, event.sync)
                .with_context(|| {
                    format!(
                        "transaction {index}, event {pos}: {} on {}",
                        event.event, event.doc_id
                    )
                })?;
            if !stacked {
                ignored += 1;
            }
        }

        if tx.rollback {
            session = checkpoint;
            reports.push(TransactionReport {
                index,
                outcome: Outcome::RolledBack,
                ignored,
                discarded: uow.rollback(),
                stats: FlushStats::default(),
                sync: Vec::new(),
                queued: Vec::new(),
            });
            continue;
        }

        let stats = uow
            .commit(&session, &mut hand_off)
            .with_context(|| format!("commit of transaction {index}"))?;
        let sync = hand_off.indexer_mut().batches.drain(..).flatten().collect();
        let mut queued = Vec::new();
        while let Some(cmd) = queue.try_recv() {
            queued.push(cmd.context("queued command failed to decode")?);
        }
        log::debug!("Transaction {index} committed: {stats:?}");

        reports.push(TransactionReport {
            index,
            outcome: Outcome::Committed,
            ignored,
            discarded: 0,
            stats,
            sync,
            queued,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexing_stack::CommandType;

    fn parse(raw: Value) -> EventLog {
        serde_json::from_value(raw).expect("event log")
    }

    #[test]
    fn replays_transactions_independently() {
        let log = parse(json!({
            "transactions": [
                { "events": [
                    { "docId": "a", "event": "document-created", "sync": true },
                    { "docId": "a", "event": "before-document-update" },
                    { "docId": "b", "event": "document-security-updated", "folder": true },
                    { "docId": "b", "event": "document-checked-in" }
                ] },
                { "events": [
                    { "docId": "c", "event": "document-created" }
                ], "rollback": true },
                { "events": [
                    { "docId": "a", "event": "document-removed" }
                ] }
            ]
        }));

        let reports = replay(&log, &StackerConfig::default(), "default").expect("replay");
        assert_eq!(reports.len(), 3);

        let first = &reports[0];
        assert_eq!(first.outcome, Outcome::Committed);
        assert_eq!(first.ignored, 1);
        assert_eq!(first.sync.len(), 1);
        assert_eq!(first.sync[0].command_type(), CommandType::Index);
        assert_eq!(first.queued.len(), 1);
        assert!(first.queued[0].is_recurse());

        assert_eq!(reports[1].outcome, Outcome::RolledBack);
        assert_eq!(reports[1].discarded, 1);

        assert_eq!(reports[2].queued[0].command_type(), CommandType::Delete);
        assert_eq!(reports[2].queued[0].doc_id(), "a");
    }

    #[test]
    fn foreign_repository_events_keep_their_own_target() {
        let log = parse(json!({
            "transactions": [
                { "events": [
                    { "docId": "d1", "path": "/default/d1", "event": "document-created" }
                ] },
                { "events": [
                    { "docId": "d1", "repo": "other", "path": "/other/d1",
                      "event": "before-document-update" }
                ] }
            ]
        }));
        let reports = replay(&log, &StackerConfig::default(), "default").expect("replay");
        let queued = &reports[1].queued;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].repository_name(), "other");
        assert_eq!(queued[0].path(), Some("/other/d1"));
    }

    #[test]
    fn sync_recursive_event_reports_position() {
        let log = parse(json!({
            "transactions": [
                { "events": [
                    { "docId": "dir", "event": "document-moved", "folder": true, "sync": true }
                ] }
            ]
        }));
        let err = replay(&log, &StackerConfig::default(), "default").expect_err("invalid");
        assert!(format!("{err:#}").contains("transaction 0, event 0"));
    }
}
