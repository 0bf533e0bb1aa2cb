use mindtree_core::model::id::generate_id;
use mindtree_core::{
    IdAllocator, RandomIdAllocator, SequentialIdAllocator, Sheet, StructureClass, TopicKey,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_allocation_never_collides() {
    let allocator = Arc::new(RandomIdAllocator);
    let handles = (0..4)
        .map(|_| {
            let allocator = Arc::clone(&allocator);
            thread::spawn(move || (0..500).map(|_| allocator.next_id()).collect::<Vec<_>>())
        })
        .collect::<Vec<_>>();
    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), 2_000);
    assert!(seen.iter().all(|id| id.is_ordinary()));
}

#[test]
fn injected_allocator_numbers_every_topic() {
    let build = || {
        let mut sheet = Sheet::with_allocator(
            "s",
            "c",
            StructureClass::default(),
            Arc::new(SequentialIdAllocator::new(1)),
        );
        sheet.central_mut().add("a").add("b");
        let mut ids = Vec::new();
        sheet
            .range(|_, topic| {
                ids.push(topic.id().clone());
                Ok::<(), ()>(())
            })
            .unwrap();
        ids
    };
    assert_eq!(build(), build());
}

#[test]
fn reserved_keys_are_not_identifiers() {
    assert_eq!(TopicKey::Central.ordinary(), None);
    assert_eq!(TopicKey::Root.ordinary(), None);
    assert_eq!(TopicKey::Cursor.ordinary(), None);
    let id = generate_id();
    assert_eq!(TopicKey::from(&id).ordinary(), Some(&id));
}
