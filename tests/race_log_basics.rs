mod common;

use racelog::{
    author::Author,
    core::{RaceLog, RaceLogError},
    types::{DEFAULT_PASS_ID, EventId},
};

use common::{event, event_at, ids};

#[test]
fn queries_fail_without_read_lock() {
    let log = RaceLog::new("test-identifier");
    assert_eq!(log.get_raw_fixes().unwrap_err(), RaceLogError::NotLocked);
    assert_eq!(log.get_raw_fixes_descending().unwrap_err(), RaceLogError::NotLocked);
    assert_eq!(log.get_fixes_descending().unwrap_err(), RaceLogError::NotLocked);
    assert_eq!(log.get_first_fix_after(0).unwrap_err(), RaceLogError::NotLocked);
    assert_eq!(log.is_empty().unwrap_err(), RaceLogError::NotLocked);

    log.lock_for_read();
    assert!(log.is_empty().unwrap());
    log.unlock_after_read().unwrap();

    assert_eq!(log.get_raw_fixes().unwrap_err(), RaceLogError::NotLocked);
}

#[test]
fn scoped_guard_releases_on_drop() {
    let log = RaceLog::new("guard");
    {
        let guard = log.read();
        assert!(guard.holds_read_lock());
        assert_eq!(guard.get_raw_fixes().unwrap().len(), 0);
    }
    assert!(!log.holds_read_lock());
    assert_eq!(log.is_empty(), Err(RaceLogError::NotLocked));
}

#[test]
fn identifier_is_kept() {
    assert_eq!(RaceLog::new("test-identifier").id(), "test-identifier");
}

#[test]
fn add_event() {
    let log = RaceLog::new("add");
    let author = Author::new("committee", 1);
    let e = event("a", &author, 0, 0);

    assert!(log.add(e.clone()));

    let guard = log.read();
    let raw = guard.get_raw_fixes().unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].id(), e.id());
    assert!(!guard.is_empty().unwrap());
}

#[test]
fn different_pass_same_time_point_are_both_kept() {
    let log = RaceLog::new("passes");
    assert!(log.add(event("a", &Author::new("one", 1), 0, 0)));
    assert!(log.add(event("b", &Author::new("two", 1), 0, 1)));

    let guard = log.read();
    assert_eq!(ids(&guard.get_raw_fixes().unwrap()), ["a", "b"]);
}

#[test]
fn same_pass_author_and_time_but_different_id_are_both_kept() {
    let log = RaceLog::new("ids");
    let author = Author::new("committee", 1);
    assert!(log.add(event("a", &author, 0, 0)));
    assert!(log.add(event("b", &author, 0, 0)));

    let guard = log.read();
    assert_eq!(guard.len().unwrap(), 2);
}

#[test]
fn identical_statement_is_rejected() {
    let log = RaceLog::new("dedup");
    let author = Author::new("committee", 1);
    assert!(log.add(event("a", &author, 0, 0)));
    assert!(!log.add(event("a", &author, 0, 0)));
    assert!(!log.load(event("a", &author, 0, 0)));

    let guard = log.read();
    let raw = guard.get_raw_fixes().unwrap();
    assert_eq!(ids(&raw), ["a"]);
}

#[test]
fn equal_valued_but_distinct_authors_are_not_duplicates() {
    let log = RaceLog::new("authors");
    assert!(log.add(event("a", &Author::new("tablet", 1), 0, 0)));
    assert!(log.add(event("a", &Author::new("tablet", 1), 0, 0)));

    let guard = log.read();
    assert_eq!(guard.len().unwrap(), 2);
}

#[test]
fn raw_fixes_descending_rank_priority_over_recency() {
    let log = RaceLog::new("descending");
    let minor = Author::new("minor", 1);
    let major = Author::new("major", 2);

    log.add(event("e1", &major, 1, 0));
    log.add(event("e2", &minor, 2, 0));
    log.add(event("e3", &minor, 3, 0));

    let guard = log.read();
    assert_eq!(ids(&guard.get_raw_fixes_descending().unwrap()), ["e1", "e3", "e2"]);
    assert_eq!(ids(&guard.get_raw_fixes().unwrap()), ["e1", "e2", "e3"]);
}

#[test]
fn fixes_descending_only_cover_current_pass() {
    let log = RaceLog::new("fixes");
    let minor = Author::new("minor", 1);
    let major = Author::new("major", 2);

    log.add(event("e1", &major, 1, 1));
    log.add(event("e2", &minor, 2, 1));
    log.add(event("e3", &minor, 3, 1));
    log.add(event("e4", &major, 4, 0));

    assert_eq!(log.current_pass_id(), 1);

    let guard = log.read();
    assert_eq!(ids(&guard.get_fixes_descending().unwrap()), ["e1", "e3", "e2"]);
    assert_eq!(ids(&guard.get_raw_fixes_descending().unwrap()), ["e4", "e1", "e3", "e2"]);
}

#[test]
fn current_pass_starts_at_default_and_never_decreases() {
    let log = RaceLog::new("pass");
    assert_eq!(log.current_pass_id(), DEFAULT_PASS_ID);

    let author = Author::new("committee", 1);
    log.add(event("a", &author, 1, 3));
    log.load(event("b", &author, 2, 1));
    assert_eq!(log.current_pass_id(), 3);
}

#[test]
fn first_fix_after_uses_logical_time_point() {
    let log = RaceLog::new("first-after");
    let author = Author::new("committee", 1);
    log.add(event_at("one", &author, 100, 1, 0));

    let guard = log.read();
    assert!(guard.get_first_fix_after(1).unwrap().is_none());
    assert_eq!(guard.get_first_fix_after(0).unwrap().unwrap().id().as_str(), "one");
}

#[test]
fn first_fix_after_picks_earliest_and_breaks_ties_canonically() {
    let log = RaceLog::new("first-after-ties");
    let minor = Author::new("minor", 1);
    let major = Author::new("major", 5);
    log.add(event_at("late", &major, 1, 50, 0));
    log.add(event_at("tie-minor", &minor, 2, 20, 0));
    log.add(event_at("tie-major", &major, 3, 20, 0));
    log.add(event_at("early", &minor, 4, 5, 0));

    let guard = log.read();
    assert_eq!(guard.get_first_fix_after(10).unwrap().unwrap().id().as_str(), "tie-major");
    assert_eq!(guard.get_first_fix_after(20).unwrap().unwrap().id().as_str(), "late");
    assert!(guard.get_first_fix_after(50).unwrap().is_none());
}

#[test]
fn lookup_by_id() {
    let log = RaceLog::new("by-id");
    let author = Author::new("committee", 1);
    log.add(event("a", &author, 1, 0));

    let guard = log.read();
    assert!(guard.get_event_by_id(&EventId::new("a")).unwrap().is_some());
    assert!(guard.get_event_by_id(&EventId::new("zz")).unwrap().is_none());
}

#[test]
fn returned_sequences_are_snapshots() {
    let log = RaceLog::new("snapshots");
    let author = Author::new("committee", 1);
    log.add(event("a", &author, 1, 0));

    let before = {
        let guard = log.read();
        guard.get_raw_fixes().unwrap()
    };
    log.add(event("b", &author, 2, 0));

    assert_eq!(ids(&before), ["a"]);
    let guard = log.read();
    assert_eq!(guard.get_raw_fixes().unwrap().len(), 2);
}

#[test]
fn merge_adds_only_missing_events() {
    let author = Author::new("committee", 1);
    let shared = event("shared", &author, 1, 0);

    let a = RaceLog::new("a");
    let b = RaceLog::new("b");
    a.add(shared.clone());
    b.add(shared);
    b.add(event("only-b", &author, 2, 0));

    assert_eq!(a.merge(&b), 1);
    assert_eq!(a.merge(&b), 0);
    assert_eq!(a.merge(&a), 0);

    let guard = a.read();
    assert_eq!(ids(&guard.get_raw_fixes().unwrap()), ["shared", "only-b"]);
}

#[test]
fn nested_read_locks_release_in_pairs() {
    let log = RaceLog::new("nested");
    log.lock_for_read();
    log.lock_for_read();
    log.unlock_after_read().unwrap();
    assert!(log.is_empty().unwrap());
    log.unlock_after_read().unwrap();
    assert_eq!(log.is_empty(), Err(RaceLogError::NotLocked));
    assert_eq!(log.unlock_after_read(), Err(RaceLogError::NotLocked));
}

#[test]
fn read_lock_is_per_thread() {
    let log = std::sync::Arc::new(RaceLog::new("threads"));
    let _guard = log.read();
    let other = std::sync::Arc::clone(&log);
    let res = std::thread::spawn(move || other.get_raw_fixes().map(|f| f.len()))
        .join()
        .unwrap();
    assert_eq!(res, Err(RaceLogError::NotLocked));
}
