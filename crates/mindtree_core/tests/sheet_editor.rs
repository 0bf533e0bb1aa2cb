use mindtree_core::{
    AddMode, EditError, NodeIndex, SequentialIdAllocator, Sheet, StructureClass, TopicId, TopicKey,
};
use std::sync::Arc;

fn setup() -> Sheet {
    Sheet::with_allocator(
        "s1",
        "main",
        StructureClass::default(),
        Arc::new(SequentialIdAllocator::new(7)),
    )
}

fn child_titles(sheet: &Sheet, parent: NodeIndex) -> Vec<String> {
    sheet
        .topic(parent)
        .unwrap()
        .children()
        .iter()
        .map(|child| sheet.topic(*child).unwrap().title().to_string())
        .collect()
}

fn id_of(sheet: &mut Sheet, title: &str) -> TopicId {
    let key = sheet.central_mut().cid(title);
    key.ordinary().cloned().unwrap()
}

/// Every live topic is indexed under its own id and linked both ways.
fn assert_consistent(sheet: &Sheet) {
    let mut visited = 0;
    sheet
        .range(|_, topic| {
            visited += 1;
            let index = sheet.index_of(topic.id()).unwrap();
            assert_eq!(sheet.topic(index).unwrap().id(), topic.id());
            for child in topic.children() {
                assert_eq!(sheet.parent_of(*child), Some(index));
            }
            Ok::<(), ()>(())
        })
        .unwrap();
    assert_eq!(visited, sheet.topic_count());
    assert_eq!(sheet.ids().count(), sheet.topic_count());
}

#[test]
fn new_sheet_adds_children_in_order() {
    let mut sheet = setup();
    assert_eq!(sheet.title(), "s1");
    assert!(!sheet.topic(sheet.central()).unwrap().has_children());

    sheet.central_mut().add("a").add("b");

    assert_eq!(child_titles(&sheet, sheet.central()), vec!["a", "b"]);
    assert_eq!(sheet.topic_count(), 3);
    assert_consistent(&sheet);
}

#[test]
fn empty_titles_get_numbered_defaults() {
    let mut sheet = setup();
    sheet.central_mut().add("").add("").add("named").add("");
    assert_eq!(
        child_titles(&sheet, sheet.central()),
        vec!["Topic 1", "Topic 2", "named", "Topic 3"]
    );
}

#[test]
fn parent_insert_wraps_current_topic() {
    let mut sheet = setup();
    sheet.central_mut().add("x");
    let x_id = id_of(&mut sheet, "x");

    let mut handle = sheet.edit(&x_id);
    let inserted = handle.try_add("y", AddMode::ParentInsert).unwrap();
    assert_eq!(handle.title(), Some("x"));
    assert_eq!(handle.id(), Some(&x_id));
    drop(handle);

    let central = sheet.central();
    assert_eq!(child_titles(&sheet, central), vec!["y"]);
    assert_eq!(child_titles(&sheet, inserted.created), vec!["x"]);
    assert_eq!(sheet.parent_of(inserted.current), Some(inserted.created));
    assert_eq!(sheet.cursor(), inserted.current);
    assert_consistent(&sheet);
}

#[test]
fn sibling_inserts_land_next_to_current() {
    let mut sheet = setup();
    sheet
        .central_mut()
        .add("m")
        .on_title("m")
        .add_with("before", AddMode::Before)
        .add_with("after", AddMode::After);

    assert_eq!(
        child_titles(&sheet, sheet.central()),
        vec!["before", "m", "after"]
    );
}

#[test]
fn inserts_at_central_fall_back_to_child() {
    let mut sheet = setup();
    sheet
        .central_mut()
        .add_with("a", AddMode::Before)
        .add_with("b", AddMode::ParentInsert);
    assert_eq!(child_titles(&sheet, sheet.central()), vec!["a", "b"]);
}

#[test]
fn insert_at_sheet_root_is_refused() {
    let mut sheet = setup();
    let mut handle = sheet.edit(TopicKey::Root);
    assert!(handle.is_root());
    assert_eq!(handle.try_add("a", AddMode::Sub), Err(EditError::RootPosition));
    handle.add("b");
    assert_eq!(sheet.topic_count(), 1);
}

#[test]
fn move_after_sibling_reorders() {
    let mut sheet = setup();
    sheet.central_mut().add("x").add("y").add("z");
    let z_id = id_of(&mut sheet, "z");

    sheet.central_mut().on_title("x").move_with(&z_id, AddMode::After);
    assert_eq!(child_titles(&sheet, sheet.central()), vec!["x", "z", "y"]);

    sheet.central_mut().on_title("x").move_with(&z_id, AddMode::Before);
    assert_eq!(child_titles(&sheet, sheet.central()), vec!["z", "x", "y"]);

    sheet.central_mut().on_title("y").move_with(&z_id, AddMode::After);
    assert_eq!(child_titles(&sheet, sheet.central()), vec!["x", "y", "z"]);
    assert_consistent(&sheet);
}

#[test]
fn move_before_accounts_for_earlier_source() {
    let mut sheet = setup();
    sheet.central_mut().add("x").add("y").add("z");
    let x_id = id_of(&mut sheet, "x");

    sheet.central_mut().on_title("z").move_with(&x_id, AddMode::Before);

    assert_eq!(child_titles(&sheet, sheet.central()), vec!["y", "x", "z"]);
}

#[test]
fn move_carries_subtree_and_keeps_ids() {
    let mut sheet = setup();
    sheet
        .central_mut()
        .add("a")
        .add("b")
        .on_title("a")
        .add("a1");
    let a_id = id_of(&mut sheet, "a");
    let a1_id = id_of(&mut sheet, "a1");

    sheet.central_mut().on_title("b").move_topic(&a_id);

    let b_id = id_of(&mut sheet, "b");
    let b = sheet.index_of(&b_id).unwrap();
    assert_eq!(child_titles(&sheet, b), vec!["a"]);
    let a = sheet.index_of(&a_id).unwrap();
    assert_eq!(child_titles(&sheet, a), vec!["a1"]);
    assert!(sheet.contains(&a1_id));
    assert_eq!(sheet.topic_count(), 4);
    assert_consistent(&sheet);
}

#[test]
fn move_into_own_subtree_is_a_no_op() {
    let mut sheet = setup();
    sheet.central_mut().add("p").on_title("p").add("c");
    let p_id = id_of(&mut sheet, "p");

    let mut handle = sheet.edit(TopicKey::Cursor).on_title("c");
    let err = handle.try_move(&p_id, AddMode::Sub).unwrap_err();
    assert!(matches!(err, EditError::CycleDetected { .. }));

    let handle = handle.move_topic(&p_id);
    assert_eq!(handle.title(), Some("c"));
    drop(handle);

    let p = sheet.index_of(&p_id).unwrap();
    assert_eq!(child_titles(&sheet, sheet.central()), vec!["p"]);
    assert_eq!(child_titles(&sheet, p), vec!["c"]);
}

#[test]
fn move_onto_itself_is_refused() {
    let mut sheet = setup();
    sheet.central_mut().add("p");
    let p_id = id_of(&mut sheet, "p");

    let mut handle = sheet.edit(&p_id);
    assert!(matches!(
        handle.try_move(&p_id, AddMode::Sub),
        Err(EditError::CycleDetected { .. })
    ));
}

#[test]
fn move_rejects_reserved_and_unknown_targets() {
    let mut sheet = setup();
    sheet.central_mut().add("p");
    let mut handle = sheet.central_mut().on_title("p");

    assert_eq!(
        handle.try_move(TopicKey::Central, AddMode::Sub),
        Err(EditError::SentinelTarget(TopicKey::Central))
    );
    let missing = TopicId::new("missing");
    assert_eq!(
        handle.try_move(&missing, AddMode::Sub),
        Err(EditError::TopicNotFound(missing.clone()))
    );
}

#[test]
fn remove_purges_subtree_and_resets_cursor() {
    let mut sheet = setup();
    sheet
        .central_mut()
        .add("p")
        .on_title("p")
        .add("c1")
        .on_title("c1")
        .add("g1");
    assert_eq!(sheet.topic_count(), 4);

    let handle = sheet.central_mut().on_title("g1").remove("p");
    assert!(handle.is_central());
    drop(handle);

    assert_eq!(sheet.topic_count(), 1);
    assert_eq!(sheet.cursor(), sheet.central());
    assert!(!sheet.topic(sheet.central()).unwrap().has_children());
    assert_eq!(sheet.resolve(&TopicKey::Cursor), sheet.resolve(&TopicKey::Central));
}

#[test]
fn remove_reports_purged_count_and_refuses_central() {
    let mut sheet = setup();
    sheet.central_mut().add("p").on_title("p").add("c").add("d");
    let p_id = id_of(&mut sheet, "p");
    let central_id = sheet.topic(sheet.central()).unwrap().id().clone();

    let mut handle = sheet.central_mut();
    assert_eq!(handle.try_remove_by_id(&central_id), Err(EditError::CentralTopic));
    assert_eq!(handle.try_remove_by_id(&p_id), Ok(3));
    assert_eq!(
        handle.try_remove_by_id(&p_id),
        Err(EditError::TopicNotFound(p_id.clone()))
    );
}

#[test]
fn stale_handles_do_not_resolve() {
    let mut sheet = setup();
    sheet.central_mut().add("p");
    let p_id = id_of(&mut sheet, "p");
    let stale = sheet.index_of(&p_id).unwrap();

    sheet.central_mut().remove_by_id(&p_id);
    sheet.central_mut().add("q");

    assert!(sheet.topic(stale).is_none());
    let handle = sheet.edit_index(stale);
    assert!(handle.is_central());
}

#[test]
fn navigation_falls_back_to_cursor() {
    let mut sheet = setup();
    sheet.central_mut().add("a");
    let handle = sheet.central_mut().on_title("a").on(TopicId::new("nope"));
    assert_eq!(handle.title(), Some("a"));

    let handle = handle.on(TopicKey::Root);
    assert!(handle.is_root());
    let handle = handle.on(TopicKey::Cursor);
    assert_eq!(handle.title(), Some("a"));
}

#[test]
fn parent_walks_up_to_central() {
    let mut sheet = setup();
    sheet.central_mut().add("a").on_title("a").add("b");
    let handle = sheet.central_mut().on_title("b");
    let handle = handle.parent().unwrap();
    assert_eq!(handle.title(), Some("a"));
    let handle = handle.parent().unwrap();
    assert!(handle.is_central());
    assert!(handle.parent().is_none());
}

#[test]
fn content_modifiers_update_current_topic() {
    let mut sheet = setup();
    sheet
        .central_mut()
        .add("a")
        .on_title("a")
        .add("a1")
        .set_title("renamed")
        .add_labels(["one", "two"])
        .add_labels(Vec::<String>::new())
        .add_notes("text")
        .add_href("https://example.org")
        .folded(true)
        .update_sheet("plan", "hub", Some(StructureClass::MAP));

    let a_id = id_of(&mut sheet, "renamed");
    let a = sheet.topic_by_id(&a_id).unwrap();
    assert_eq!(a.labels(), ["one", "two"]);
    assert_eq!(a.notes(), Some("text"));
    assert_eq!(a.href(), Some("https://example.org"));
    assert!(a.is_folded());
    let a1 = sheet.topic(a.children()[0]).unwrap();
    assert!(a1.is_folded());

    assert_eq!(sheet.title(), "plan");
    assert_eq!(sheet.topic(sheet.central()).unwrap().title(), "hub");
    assert_eq!(sheet.structure_class(), Some(&StructureClass::MAP));
}
