use tripod::construct::Triple;
use tripod::error::TripodError;
use tripod::persist::{FactStore, PersistenceMode, SqliteStore};

fn setup() -> SqliteStore {
    SqliteStore::new(PersistenceMode::InMemory).expect("store")
}

fn triple(id: &str, predicate: &str, object: &str) -> Triple {
    Triple::new(id, predicate, object).unwrap()
}

#[test]
fn insert_contains_remove_roundtrip() {
    let store = setup();
    let married = triple("alice", "married", "bob");
    assert!(store.insert(&married).unwrap(), "first insert adds");
    assert!(!store.insert(&married).unwrap(), "second insert is a no-op");
    assert!(store.contains(&married).unwrap());
    assert!(store.remove(&married).unwrap(), "present fact is removed");
    assert!(!store.remove(&married).unwrap(), "absent fact is not");
    assert!(!store.contains(&married).unwrap());
}

#[test]
fn patterns_are_rejected_by_persistence() {
    let store = setup();
    let pattern = triple("?who", "married", "bob");
    assert!(matches!(
        store.insert(&pattern),
        Err(TripodError::Execution(_))
    ));
    assert!(matches!(
        store.remove(&pattern),
        Err(TripodError::Execution(_))
    ));
}

#[test]
fn single_pattern_enumeration_binds_each_variable_slot() {
    let store = setup();
    store.insert(&triple("alice", "likes", "cake")).unwrap();
    store.insert(&triple("bob", "likes", "beer")).unwrap();
    let rows = store.enumerate(&[triple("?who", "likes", "?what")]).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(
        rows.iter()
            .any(|row| row.lookup("who") == Some("alice") && row.lookup("what") == Some("cake"))
    );
    assert!(
        rows.iter()
            .any(|row| row.lookup("who") == Some("bob") && row.lookup("what") == Some("beer"))
    );
}

#[test]
fn conjunction_join_runs_in_the_store() {
    let store = setup();
    store.insert(&triple("alice", "likes", "bob")).unwrap();
    store.insert(&triple("bob", "likes", "cake")).unwrap();
    store.insert(&triple("carol", "likes", "beer")).unwrap();
    let rows = store
        .enumerate(&[triple("?a", "likes", "?b"), triple("?b", "likes", "cake")])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].lookup("a"), Some("alice"));
    assert_eq!(rows[0].lookup("b"), Some("bob"));
}

#[test]
fn repeated_variable_joins_inside_one_pattern() {
    let store = setup();
    store
        .insert(&triple("narcissus", "likes", "narcissus"))
        .unwrap();
    store.insert(&triple("alice", "likes", "cake")).unwrap();
    let rows = store.enumerate(&[triple("?a", "likes", "?a")]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].lookup("a"), Some("narcissus"));
}

#[test]
fn concrete_patterns_enumerate_existence() {
    let store = setup();
    store.insert(&triple("alice", "likes", "cake")).unwrap();
    let rows = store.enumerate(&[triple("alice", "likes", "cake")]).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_empty(), "no variables means no bindings");
    let rows = store.enumerate(&[triple("alice", "likes", "beer")]).unwrap();
    assert!(rows.is_empty(), "no match is an empty result, not an error");
}

#[test]
fn empty_pattern_list_is_a_missing_argument() {
    let store = setup();
    assert!(matches!(
        store.enumerate(&[]),
        Err(TripodError::MissingArgument(_))
    ));
}

#[test]
fn clear_removes_everything() {
    let store = setup();
    store.insert(&triple("alice", "likes", "cake")).unwrap();
    store.insert(&triple("bob", "likes", "beer")).unwrap();
    store.clear().unwrap();
    assert!(!store.contains(&triple("alice", "likes", "cake")).unwrap());
    let rows = store.enumerate(&[triple("?who", "likes", "?what")]).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn file_mode_persists_across_reopen() {
    // Use a temp path; ensure a clean start either way
    let path = "test_tripod_temp.db".to_string();
    let _ = std::fs::remove_file(&path);
    {
        let store = SqliteStore::new(PersistenceMode::File(path.clone())).expect("store");
        store.insert(&triple("alice", "likes", "cake")).unwrap();
    }
    let store = SqliteStore::new(PersistenceMode::File(path.clone())).expect("store");
    assert!(
        store.contains(&triple("alice", "likes", "cake")).unwrap(),
        "expected the fact to survive a reopen in file-backed mode"
    );
    let _ = std::fs::remove_file(&path);
}
