//! End-to-end behavior through the public `Engine` surface.

use trine_engine::{Capacity, Engine, EngineConfig, EngineError, Position, TermId, Triple, TriplePattern};
use trine_index::IndexError;

const W: TermId = TermId::WILDCARD;

#[test]
fn alice_knows_charlie() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let alice = engine.intern("alice").unwrap();
    let knows = engine.intern("knows").unwrap();
    let charlie = engine.intern("charlie").unwrap();
    let bob = engine.intern("bob").unwrap();

    assert!(engine.add_triple(alice, knows, charlie).unwrap());

    assert!(engine.ask(alice, knows, charlie));
    assert!(engine.ask(alice, knows, W));
    assert!(!engine.ask(alice, knows, bob));
}

#[test]
fn multiple_objects_per_subject_are_all_kept() {
    let mut engine = Engine::with_capacity(Capacity::uniform(1024)).unwrap();
    let s = engine.intern("s").unwrap();
    let p = engine.intern("p").unwrap();
    let objects: Vec<TermId> = (0..100)
        .map(|i| engine.intern(&format!("o{i}")).unwrap())
        .collect();
    for &o in &objects {
        engine.add_triple(s, p, o).unwrap();
    }
    for &o in &objects {
        assert!(engine.ask(s, p, o), "lost object {o}");
    }
    assert_eq!(engine.object_vector(p, s).popcount(), 100);
    assert_eq!(engine.len(), 100);
}

#[test]
fn duplicate_insert_is_idempotent() {
    let mut engine = Engine::with_capacity(Capacity::uniform(64)).unwrap();
    assert!(engine.insert("x", "p", "y").unwrap());
    for _ in 0..10 {
        assert!(!engine.insert("x", "p", "y").unwrap());
    }
    let x = engine.lookup("x").unwrap();
    let p = engine.lookup("p").unwrap();
    assert_eq!(engine.matches(&TriplePattern::new(x, p, W)).len(), 1);
    assert_eq!(engine.len(), 1);
}

#[test]
fn read_and_write_bounds_differ() {
    let mut engine = Engine::with_capacity(Capacity::uniform(8)).unwrap();
    let id = |n| TermId::new(n);

    // Largest in-range id is capacity - 1 on both paths.
    assert!(engine.add_triple(id(7), id(7), id(7)).unwrap());
    assert!(engine.ask(id(7), id(7), id(7)));

    // At or beyond capacity: the write fails, the read is just false.
    assert!(engine.add_triple(id(8), id(1), id(1)).is_err());
    assert!(!engine.ask(id(8), id(7), id(7)));
    assert!(!engine.ask(id(7), id(8), id(7)));
    assert!(!engine.ask(id(7), id(7), id(8)));
    assert!(!engine.ask(id(u32::MAX), W, W));
}

#[test]
fn rejected_insert_leaves_terms_unchanged() {
    let mut engine = Engine::with_capacity(Capacity::uniform(4)).unwrap();
    assert!(engine.insert("a", "p", "b").unwrap());
    assert_eq!(engine.term_count(), 3);

    // "c" would get id 4, one past the subject bound.
    let err = engine.insert("c", "q", "d").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Index(IndexError::OutOfRange {
            position: Position::Subject,
            ..
        })
    ));
    assert_eq!(engine.term_count(), 3);
    assert_eq!(engine.lookup("c"), None);
    assert_eq!(engine.lookup("q"), None);
    assert_eq!(engine.lookup("d"), None);
    assert_eq!(engine.len(), 1);

    // Known texts keep their ids; a retry that fits still works.
    assert_eq!(engine.lookup("a"), Some(TermId::new(1)));
    assert!(engine.insert("a", "p", "a").unwrap());
    assert_eq!(engine.term_count(), 3);
}

#[test]
fn new_predicate_after_many_terms_with_defaults() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    for i in 0..5000 {
        engine.insert(&format!("s{i}"), "type", "Thing").unwrap();
    }
    assert!(engine.term_count() > 5000);

    assert!(engine.insert("s0", "name", "x").unwrap());
    let name = engine.lookup("name").unwrap();
    assert!(name.get() > 4096);
    let s0 = engine.lookup("s0").unwrap();
    assert!(engine.ask(s0, name, W));
    assert_eq!(engine.index().predicate_count(), 2);
}

#[test]
fn batch_agrees_with_single_asks() {
    let mut engine = Engine::with_capacity(Capacity::uniform(64)).unwrap();
    for (s, p, o) in [("a", "p", "b"), ("b", "p", "c"), ("a", "q", "c")] {
        engine.insert(s, p, o).unwrap();
    }
    let terms: Vec<TermId> = (0..8).map(TermId::new).collect();
    let mut patterns = Vec::new();
    for &s in &terms {
        for &p in &terms {
            for &o in &terms {
                patterns.push(TriplePattern::new(s, p, o));
            }
        }
    }
    let single: Vec<bool> = patterns.iter().map(|q| engine.ask_pattern(q)).collect();
    assert_eq!(engine.ask_batch(&patterns), single);
    assert_eq!(engine.ask_batch_parallel(&patterns, 4), single);

    let mut buf = vec![false; 10];
    assert_eq!(engine.ask_batch_into(&patterns, &mut buf), 10);
    assert_eq!(&buf[..], &single[..10]);
}

#[test]
fn transitive_chain_and_cycle() {
    let mut engine = Engine::with_capacity(Capacity::uniform(64)).unwrap();
    for (s, o) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")] {
        engine.insert(s, "next", o).unwrap();
    }
    let [a, next, c, d] = ["a", "next", "c", "d"].map(|t| engine.lookup(t).unwrap());
    assert!(engine.is_transitively_related(a, next, d, 3));
    assert!(!engine.is_transitively_related(a, next, d, 2));
    assert!(engine.is_transitively_related(a, next, a, 4));
    assert!(!engine.is_transitively_related(a, next, a, 3));
    assert!(engine.is_transitively_related(c, next, c, 10));
}

#[test]
fn triples_enumerate_everything() {
    let mut engine = Engine::with_capacity(Capacity::uniform(64)).unwrap();
    engine.insert("a", "p", "b").unwrap();
    engine.insert("a", "p", "c").unwrap();
    engine.insert("d", "q", "b").unwrap();
    let all: Vec<Triple> = engine.triples().collect();
    assert_eq!(all.len(), 3);
    for t in &all {
        assert!(engine.ask(t.subject, t.predicate, t.object));
    }
}
