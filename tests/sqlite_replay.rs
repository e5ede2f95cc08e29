use tempfile::TempDir;

use racelog::{
    author::{Author, AuthorRegistry, same_author},
    core::RaceLog,
    event::{CourseDesign, EventType, WindFix},
    factory::EventFactory,
    persist::{EventSink, PersistError, sqlite::SqliteEventStore},
    record::EventRecord,
    types::{CompetitorId, Flag},
};

fn ids(log: &RaceLog) -> Vec<String> {
    let guard = log.read();
    guard
        .get_raw_fixes()
        .expect("locked")
        .iter()
        .map(|e| e.id().to_string())
        .collect()
}

fn populate(log: &RaceLog) {
    let factory = EventFactory::new();
    let committee = Author::new("committee", 2);
    let tablet = Author::new("tablet", 1);

    log.add(factory.flag(10, &committee, 0, Flag::Class, Flag::None, true));
    log.add(factory.course_design_changed(
        11,
        &tablet,
        0,
        CourseDesign {
            name: "windward-leeward".to_string(),
            waypoints: vec!["1".to_string(), "4s".to_string(), "Finish".to_string()],
        },
    ));
    log.add(factory.wind_fix(
        12,
        &tablet,
        0,
        WindFix {
            speed_knots: 11.5,
            from_bearing_deg: 270.0,
            lat_deg: 54.43,
            lng_deg: 10.19,
        },
    ));
    log.add(factory.register_competitor(13, &committee, 1, CompetitorId::from("GER 42")));
}

#[test]
fn sqlite_replay_round_trips_events_and_order() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("race.db");

    let log = RaceLog::new("regatta/race-1");
    populate(&log);

    let mut store = SqliteEventStore::open(&db_path, log.id()).expect("open sqlite");
    let records: Vec<EventRecord> = {
        let guard = log.read();
        guard
            .get_raw_fixes()
            .expect("locked")
            .iter()
            .map(|e| EventRecord::from_event(e))
            .collect()
    };
    assert_eq!(store.append_records(&records).expect("append"), 4);
    store.flush().expect("flush");
    drop(store);

    let reopened = SqliteEventStore::open(&db_path, "regatta/race-1").expect("reopen");
    let registry = AuthorRegistry::new();
    let replayed = RaceLog::new("regatta/race-1");
    assert_eq!(reopened.load_into(&replayed, &registry).expect("replay"), 4);

    assert_eq!(ids(&replayed), ids(&log));
    assert_eq!(replayed.current_pass_id(), 1);
    assert_eq!(registry.len(), 2);

    let guard = replayed.read();
    let fixes = guard.get_raw_fixes().expect("locked");
    assert_eq!(fixes[1].event_type(), EventType::CourseDesignChanged);
    assert!(same_author(fixes[1].author(), fixes[2].author()));
    assert!(!same_author(fixes[0].author(), fixes[1].author()));
}

#[test]
fn replaying_twice_loads_nothing_new() {
    let log = RaceLog::new("race-2");
    populate(&log);

    let mut store = SqliteEventStore::open_in_memory("race-2").expect("open");
    let records: Vec<EventRecord> = {
        let guard = log.read();
        guard.get_raw_fixes().expect("locked").iter().map(|e| EventRecord::from_event(e)).collect()
    };
    store.append_records(&records).expect("append");

    let registry = AuthorRegistry::new();
    let replayed = RaceLog::new("race-2");
    assert_eq!(store.load_into(&replayed, &registry).expect("first"), 4);
    assert_eq!(store.load_into(&replayed, &registry).expect("second"), 0);
}

#[test]
fn journals_of_different_logs_do_not_mix() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("shared.db");

    let factory = EventFactory::new();
    let author = Author::new("committee", 1);
    let mut a = SqliteEventStore::open(&db_path, "race-a").expect("open a");
    a.append_records(&[EventRecord::from_event(&factory.start_tracking(1, &author, 0))])
        .expect("append a");
    drop(a);

    let b = SqliteEventStore::open(&db_path, "race-b").expect("open b");
    assert_eq!(b.event_count().expect("count"), 0);
    assert!(b.load_records().expect("load").is_empty());
}

#[test]
fn unknown_record_version_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("future.db");
    drop(SqliteEventStore::open(&db_path, "race").expect("create"));

    let conn = rusqlite::Connection::open(&db_path).expect("raw open");
    conn.execute(
        "INSERT INTO race_log_events(race_log_id, event_id, event_type, pass_id, created_at, payload) \
         VALUES ('race', 'x', 'PassChangeEvent', 0, 0, ?1)",
        [br#"{"format_version":99,"record":null}"#.to_vec()],
    )
    .expect("insert");
    drop(conn);

    let store = SqliteEventStore::open(&db_path, "race").expect("reopen");
    assert!(matches!(store.load_records(), Err(PersistError::UnsupportedFormat(99))));
}

#[test]
fn out_of_range_timestamp_fails_the_whole_batch() {
    let author = Author::new("committee", 1);
    let factory = EventFactory::new();
    let fine = factory.start_tracking(1, &author, 0);
    let far_future = factory.restore(
        racelog::types::EventId::new("far-future"),
        u64::MAX,
        0,
        0,
        author,
        vec![],
        racelog::event::EventKind::PassChange,
    );

    let mut store = SqliteEventStore::open_in_memory("race").expect("open");
    let err = store
        .append_records(&[EventRecord::from_event(&fine), EventRecord::from_event(&far_future)])
        .expect_err("out of range");
    assert!(matches!(err, PersistError::Message(_)));
    assert_eq!(store.event_count().expect("count"), 0);
}
