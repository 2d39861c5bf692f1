use memopad_core::{
    merge, project, ErrorKind, ManualClock, MemoryKvStore, Note, NoteSession, RepoError,
    SessionError, TransferError, DEFAULT_NOTES_KEY,
};
use serde_json::json;
use std::collections::HashSet;

fn session_at(tick: i64) -> (NoteSession<MemoryKvStore>, ManualClock) {
    let clock = ManualClock::new(tick);
    let session = NoteSession::open(MemoryKvStore::new(), clock.clone()).unwrap();
    (session, clock)
}

#[test]
fn merge_example_drops_collision_and_prepends_new() {
    let existing = vec![Note {
        id: 1,
        content: "mine".to_string(),
        last_modified: 1,
        is_important: false,
    }];
    let incoming = json!([
        {"id": 1, "content": "dup", "date": 99, "isImportant": true},
        {"id": 2, "content": "new", "date": 1_700_000_000_000_i64, "isImportant": false}
    ]);

    let outcome = merge(&existing, &incoming).unwrap();
    assert_eq!(outcome.added_count, 1);
    assert_eq!(outcome.merged.len(), 2);
    assert_eq!(outcome.merged[0].id, 2);
    assert_eq!(outcome.merged[0].content, "new");
    assert_eq!(outcome.merged[1], existing[0]);
}

#[test]
fn invalid_record_rejects_batch_and_keeps_repository() {
    let (mut session, _clock) = session_at(10);
    session.save("local").unwrap();
    let before = session.repository().notes().to_vec();
    let revision = session.repository().revision();

    let incoming = json!([
        {"id": 2, "content": "ok", "date": 5, "isImportant": false},
        {"id": 3, "date": 5, "isImportant": false}
    ]);
    let err = session.prepare_import(&incoming).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(matches!(
        err,
        SessionError::Transfer(TransferError::Format { index: Some(1), .. })
    ));
    assert_eq!(session.repository().notes(), before.as_slice());
    assert_eq!(session.repository().revision(), revision);
}

#[test]
fn declined_import_leaves_state_unchanged() {
    let (mut session, _clock) = session_at(10);
    session.save("local").unwrap();
    let before = session.repository().notes().to_vec();

    let pending = session
        .prepare_import(&json!([{"id": 5, "content": "x", "date": 5, "isImportant": true}]))
        .unwrap();
    assert_eq!(pending.added_count(), 1);
    drop(pending);

    assert_eq!(session.repository().notes(), before.as_slice());
}

#[test]
fn confirmed_import_is_persisted_and_counted() {
    let (mut session, _clock) = session_at(10);
    session.save("local").unwrap();

    let pending = session
        .prepare_import(&json!([
            {"id": 5, "content": "five", "date": 5, "isImportant": true},
            {"id": 6, "content": "six", "date": 6, "isImportant": false}
        ]))
        .unwrap();
    assert_eq!(session.commit_import(pending).unwrap(), 2);

    let ids: Vec<_> = session.repository().notes().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![5, 6, 10]);
}

#[test]
fn import_prepared_before_a_mutation_is_stale() {
    let (mut session, clock) = session_at(10);
    let pending = session
        .prepare_import(&json!([{"id": 5, "content": "x", "date": 5, "isImportant": false}]))
        .unwrap();

    clock.advance(1);
    session.save("interleaved").unwrap();

    let err = session.commit_import(pending).unwrap_err();
    assert!(matches!(err, SessionError::StaleImport { .. }));
    assert_eq!(session.repository().len(), 1);
}

#[test]
fn export_then_import_into_empty_repository_roundtrips() {
    let (mut source, clock) = session_at(1_000);
    source.save("alpha").unwrap();
    clock.advance(5);
    source.toggle_important_mode();
    source.save("beta").unwrap();
    clock.advance(5);
    source.save("gamma").unwrap();
    source.search("zzz");
    source.toggle_filter();

    let document = source.export().unwrap();
    let payload: serde_json::Value = serde_json::from_str(&document).unwrap();

    let (mut target, _clock) = session_at(1);
    let pending = target.prepare_import(&payload).unwrap();
    assert_eq!(pending.added_count(), 3);
    target.commit_import(pending).unwrap();

    let original: HashSet<Note> = source.repository().notes().iter().cloned().collect();
    let restored: HashSet<Note> = target.repository().notes().iter().cloned().collect();
    assert_eq!(original, restored);
}

#[test]
fn export_to_dir_writes_timestamped_file_readable_by_import() {
    let dir = tempfile::tempdir().unwrap();
    let (mut session, clock) = session_at(2_000);
    session.save("persist me").unwrap();
    clock.set(1_700_000_000_000);

    let path = session.export_to_dir(dir.path()).unwrap();
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("memos-backup-1700000000000.json")
    );

    let (other, _clock) = session_at(1);
    let pending = other.prepare_import_file(&path).unwrap();
    assert_eq!(pending.merged()[0].content, "persist me");
}

#[test]
fn non_json_file_is_rejected_before_read() {
    let (session, _clock) = session_at(1);
    let err = session
        .prepare_import_file("/definitely/missing/backup.txt")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = session
        .prepare_import_file("/definitely/missing/backup.json")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn projection_is_idempotent_and_identity_without_predicates() {
    let (mut session, clock) = session_at(1);
    for (content, important) in [("Milk", true), ("bread", false), ("milk tea", false)] {
        session.set_important_mode(important);
        session.save(content).unwrap();
        clock.advance(1);
    }
    let notes = session.repository().notes();

    let all: Vec<&Note> = notes.iter().collect();
    assert_eq!(project(notes, "", false), all);

    let once = project(notes, "MILK", false);
    let again = project(notes, "MILK", false);
    assert_eq!(once, again);
    assert_eq!(once.len(), 2);
}

#[test]
fn import_with_max_timestamp_is_rejected_and_ids_stay_unique() {
    let (mut session, _clock) = session_at(10);
    let err = session
        .prepare_import(&json!([
            {"id": 5, "content": "far", "date": i64::MAX, "isImportant": false}
        ]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let first = session.save("one").unwrap().note().id;
    let second = session.save("two").unwrap().note().id;
    assert_ne!(first, second);
}

#[test]
fn stored_max_timestamp_blocks_creation_instead_of_repeating_ids() {
    let stored = json!([{"id": 5, "content": "far", "date": i64::MAX, "isImportant": false}]);
    let store = MemoryKvStore::new().with_entry(DEFAULT_NOTES_KEY, stored.to_string());
    let mut session = NoteSession::open(store, ManualClock::new(10)).unwrap();

    for content in ["one", "two"] {
        let err = session.save(content).unwrap_err();
        assert!(matches!(err, SessionError::Repo(RepoError::IdsExhausted)));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
    let ids: Vec<_> = session.repository().notes().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![5]);
}
