//! Unit of work committing through the queued hand-off.

use indexing_stack::{
    CommandType, DocumentEvent, DocumentRef, DocumentSession, IndexingCommand, MemorySession,
    QueuedHandOff, Result, StackerConfig, UnitOfWork,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn async_commands_reach_the_worker_and_refresh_from_session() {
    let mut session = MemorySession::new("default");
    let dir = DocumentRef::new("default", "dir")
        .with_path("/ws/dir")
        .with_folder(true)
        .with_schemas(["dublincore"]);
    let page = DocumentRef::new("default", "page").with_path("/ws/page");
    session.insert(dir.clone());
    session.insert(page.clone());

    let indexed = Arc::new(Mutex::new(Vec::new()));
    let sink = indexed.clone();
    let indexer = move |cmds: &[IndexingCommand]| -> Result<()> {
        let mut guard = sink.lock().expect("lock");
        guard.extend(cmds.iter().map(|c| c.doc_id().to_string()));
        Ok(())
    };
    let (mut hand_off, mut queue) =
        QueuedHandOff::channel(indexer, &StackerConfig::default()).expect("channel");

    let mut uow = UnitOfWork::new();
    uow.stacker()
        .stack(&dir, DocumentEvent::DocumentSecurityUpdated, false)
        .expect("acl");
    uow.stacker()
        .stack(&page, DocumentEvent::DocumentCreated, true)
        .expect("create");

    let stats = uow.commit(&session, &mut hand_off).expect("commit");
    assert_eq!(stats.documents, 2);
    assert_eq!(*indexed.lock().expect("lock"), vec!["page".to_string()]);

    drop(hand_off);
    let mut worker_side = Vec::new();
    while let Some(cmd) = queue.recv().await {
        worker_side.push(cmd.expect("decode"));
    }
    assert_eq!(worker_side.len(), 1);
    let mut acl = worker_side.remove(0);
    assert_eq!(acl.command_type(), CommandType::UpdateSecurity);
    assert!(acl.is_recurse());
    assert!(acl.schemas().is_empty());

    assert!(acl.refresh(&session).expect("refresh"));
    assert!(acl.target().folder);
    assert_eq!(acl.schemas(), vec!["dublincore".to_string()]);
    assert_eq!(session.repository_name(), acl.repository_name());
}

#[test]
fn saved_handle_rebinds_pending_command() {
    let mut uow = UnitOfWork::new();
    let draft = DocumentRef::new("default", "doc").with_path("/ws/draft");
    uow.stacker()
        .stack(&draft, DocumentEvent::DocumentCreated, false)
        .expect("create");

    let saved = draft.clone().with_path("/ws/doc");
    let pending = uow.commands()["doc"].merged_commands()[0].clone();
    let rebound = pending.with_target(&saved).expect("same document");
    assert_eq!(rebound.id(), pending.id());
    assert_eq!(rebound.path(), Some("/ws/doc"));
}
