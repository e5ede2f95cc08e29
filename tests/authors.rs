use racelog::author::{Author, AuthorRegistry, same_author};

#[test]
fn interning_reuses_the_same_handle() {
    let registry = AuthorRegistry::new();
    assert!(registry.is_empty());

    let a = registry.intern("committee", 1);
    let b = registry.intern("committee", 1);
    let c = registry.intern("committee", 2);
    assert!(same_author(&a, &b));
    assert!(!same_author(&a, &c));
    assert_eq!(registry.len(), 2);
}

#[test]
fn equal_values_are_still_distinct_handles() {
    let a = Author::new("tablet", 3);
    let b = Author::new("tablet", 3);
    assert_eq!(*a, *b);
    assert!(!same_author(&a, &b));
}

#[test]
fn higher_priority_outranks() {
    let officer = Author::new("race officer", 5);
    let tablet = Author::new("tablet", 1);
    assert!(officer.outranks_or_equals(&tablet));
    assert!(officer.outranks_or_equals(&officer));
    assert!(!tablet.outranks_or_equals(&officer));
}
