use racelog::{
    author::{Author, AuthorRegistry, same_author},
    factory::EventFactory,
    record::{EventRecord, EventRecordEnvelope, RECORD_FORMAT_VERSION},
    types::Flag,
};

#[test]
fn records_from_one_author_restore_to_one_handle() {
    let factory = EventFactory::new();
    let author = Author::new("committee", 2);
    let a = factory.flag(1, &author, 0, Flag::Alpha, Flag::None, true);
    let b = factory.flag(2, &author, 0, Flag::Ap, Flag::None, false);

    let registry = AuthorRegistry::new();
    let a2 = EventRecord::from_event(&a).into_event(&registry);
    let b2 = EventRecord::from_event(&b).into_event(&registry);

    assert!(same_author(a2.author(), b2.author()));
    assert_eq!(a2.kind(), a.kind());
    assert_eq!(a2.id(), a.id());
    assert_eq!(a2.created_at(), a.created_at());
}

#[test]
fn envelope_json_carries_version() {
    let factory = EventFactory::new();
    let author = Author::new("committee", 2);
    let event = factory.start_tracking(5, &author, 1);
    let json = serde_json::to_value(EventRecordEnvelope::new(EventRecord::from_event(&event))).expect("json");
    assert_eq!(json["format_version"], u64::from(RECORD_FORMAT_VERSION));
    assert_eq!(json["record"]["kind"], "StartTracking");
}
