use mindtree_core::{Position, Sheet, TopicKey};

fn setup() -> Sheet {
    let mut sheet = Sheet::new("s", "root");
    sheet
        .central_mut()
        .add("a")
        .add("b")
        .on_title("a")
        .add("dup")
        .add("a2")
        .on_title("b")
        .add("dup");
    sheet
}

fn title_of(sheet: &Sheet, key: &TopicKey) -> String {
    match sheet.resolve(key).unwrap() {
        Position::Topic(index) => sheet.topic(index).unwrap().title().to_string(),
        Position::Root => String::new(),
    }
}

fn parent_title(sheet: &Sheet, key: &TopicKey) -> String {
    let Position::Topic(index) = sheet.resolve(key).unwrap() else {
        panic!("expected a topic");
    };
    let parent = sheet.parent_of(index).unwrap();
    sheet.topic(parent).unwrap().title().to_string()
}

#[test]
fn range_walks_preorder_from_central() {
    let sheet = setup();
    let mut seen = Vec::new();
    sheet
        .range(|depth, topic| {
            seen.push((depth, topic.title().to_string()));
            Ok::<(), ()>(())
        })
        .unwrap();
    assert_eq!(
        seen,
        vec![
            (1, "root".to_string()),
            (2, "a".to_string()),
            (3, "dup".to_string()),
            (3, "a2".to_string()),
            (2, "b".to_string()),
            (3, "dup".to_string()),
        ]
    );
}

#[test]
fn range_stops_at_first_error() {
    let sheet = setup();
    let mut visited = 0;
    let result = sheet.range(|_, topic| {
        visited += 1;
        if topic.title() == "a2" {
            Err(topic.id().clone())
        } else {
            Ok(())
        }
    });
    assert_eq!(visited, 4);
    let stopped_at = result.unwrap_err();
    assert_eq!(sheet.topic_by_id(&stopped_at).unwrap().title(), "a2");
}

#[test]
fn handle_range_covers_only_its_subtree() {
    let mut sheet = setup();
    let handle = sheet.central_mut().on_title("b");
    let mut titles = Vec::new();
    handle
        .range(|_, topic| {
            titles.push(topic.title().to_string());
            Ok::<(), ()>(())
        })
        .unwrap();
    assert_eq!(titles, vec!["b", "dup"]);
}

#[test]
fn cid_prefers_current_subtree() {
    let mut sheet = setup();

    let key = sheet.central_mut().on_title("b").cid("dup");
    assert_eq!(parent_title(&sheet, &key), "b");

    let key = sheet.central_mut().cid("dup");
    assert_eq!(parent_title(&sheet, &key), "a");
}

#[test]
fn cid_falls_back_to_whole_tree() {
    let mut sheet = setup();
    let key = sheet.central_mut().on_title("b").cid("a2");
    assert_eq!(title_of(&sheet, &key), "a2");
    assert_eq!(parent_title(&sheet, &key), "a");
}

#[test]
fn cid_sentinels() {
    let mut sheet = setup();
    let handle = sheet.central_mut();
    assert_eq!(handle.cid(""), TopicKey::Central);
    assert_eq!(handle.cid("missing"), TopicKey::Cursor);
    assert_eq!(handle.cids(""), vec![TopicKey::Central]);
    assert_eq!(handle.cids("missing"), vec![TopicKey::Cursor]);
}

#[test]
fn cids_collects_every_match_in_first_scope() {
    let mut sheet = setup();

    let all = sheet.central_mut().cids("dup");
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|key| key.ordinary().is_some()));

    let scoped = sheet.central_mut().on_title("b").cids("dup");
    assert_eq!(scoped.len(), 1);
    assert_eq!(parent_title(&sheet, &scoped[0]), "b");
}

#[test]
fn lookup_from_sheet_root_searches_whole_tree() {
    let sheet = setup();
    let key = sheet.cid_from(Position::Root, "a2");
    assert_eq!(title_of(&sheet, &key), "a2");
    assert_eq!(sheet.cids_from(Position::Root, "dup").len(), 2);
}
