use paper_outline_core::model::ids::IdRename;
use paper_outline_core::{
    sync, BuiltinTemplates, ContentStore, IdStrategy, NodeLocation, OutlineError, OutlineNode,
    OutlineTree, TemplateProvider, ValidationIssue, TEMPLATE_SECTION_KEY,
};
use serde_json::json;

fn hierarchical(title: &str) -> OutlineTree {
    OutlineTree::new(title).with_id_strategy(IdStrategy::Hierarchical)
}

fn titles(tree: &OutlineTree) -> Vec<(String, usize)> {
    tree.preorder()
        .into_iter()
        .map(|(node, depth)| (node.title.clone(), depth))
        .collect()
}

fn ids(tree: &OutlineTree) -> Vec<String> {
    tree.preorder()
        .into_iter()
        .map(|(node, _)| node.id.clone())
        .collect()
}

fn rename(from: &str, to: &str) -> IdRename {
    IdRename {
        from: from.to_string(),
        to: to.to_string(),
    }
}

fn store_with_sentinel() -> ContentStore {
    serde_json::from_value(json!({
        "meta": { "title": "Paper", "theme": "robots" },
        "defaults": { "textPromptTemplate": "Write {{sectionTitle}} about {{theme}}" },
        "contents": {
            "__TEMPLATE_PER_SECTION__": { "length": { "unit": "word", "target": 300 } }
        }
    }))
    .unwrap()
}

#[test]
fn validate_reports_duplicate_ids_and_blank_titles() {
    let tree: OutlineTree = serde_json::from_value(json!({
        "title": "Paper",
        "nodes": [
            { "id": "1", "title": "Intro", "children": [
                { "id": "1.1", "title": "   " }
            ]},
            { "id": "1", "title": "Again" }
        ]
    }))
    .unwrap();

    let report = tree.validate();
    assert!(!report.is_valid());
    assert_eq!(
        report.errors,
        vec![
            ValidationIssue::EmptyTitle {
                id: "1.1".to_string()
            },
            ValidationIssue::DuplicateId {
                id: "1".to_string()
            },
        ]
    );
}

#[test]
fn validate_accepts_unique_ids_and_titles() {
    let mut tree = OutlineTree::new("Paper");
    let intro = tree.insert_root("Intro");
    tree.insert_child(&intro.id, "Background").unwrap();
    assert!(tree.validate().is_valid());
}

#[test]
fn scenario_insert_root_then_child_then_sync_hierarchical() {
    let mut tree = hierarchical("Paper");

    let intro = tree.insert_root("Intro");
    assert_eq!(intro.id, "1");
    let background = tree.insert_child("1", "Background").unwrap();
    assert_eq!(background.id, "1.1");

    let mut store = store_with_sentinel();
    let report = sync(&tree, &mut store);
    assert_eq!(report.created, vec!["1".to_string(), "1.1".to_string()]);

    let entry = store.entry("1.1").unwrap();
    assert_eq!(entry.section_title, "Background");
    assert_eq!(entry.length.unit, "word");
    assert_eq!(entry.length.target, 300);
    assert_eq!(entry.text_prompt, "Write Background about robots");
    assert!(entry.plan.want_text);
    assert!(store.entry(TEMPLATE_SECTION_KEY).is_some());
}

#[test]
fn scenario_insert_root_then_child_opaque_numbers_by_position() {
    let mut tree = OutlineTree::new("Paper");
    let intro = tree.insert_root("Intro");
    let background = tree.insert_child(&intro.id, "Background").unwrap();
    assert_ne!(intro.id, background.id);

    let numbers = tree
        .outline_numbers()
        .into_iter()
        .map(|section| (section.id, section.number))
        .collect::<Vec<_>>();
    assert_eq!(
        numbers,
        vec![
            (intro.id.clone(), "1".to_string()),
            (background.id.clone(), "1.1".to_string()),
        ]
    );
}

#[test]
fn scenario_insert_sibling_does_not_collide_hierarchical() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("A");
    tree.insert_root("B");
    tree.insert_root("C");

    let inserted = tree.insert_sibling("1", "New").unwrap();
    assert_eq!(inserted.id, "2");
    assert_eq!(
        tree.find_parent_and_index("2"),
        Some(NodeLocation {
            parent_id: None,
            index: 1
        })
    );
    assert!(tree.validate().is_valid());
    assert_eq!(ids(&tree), vec!["1", "2", "3", "4"]);
    assert_eq!(tree.find_node("3").unwrap().title, "B");
    assert_eq!(tree.find_node("4").unwrap().title, "C");
    assert_eq!(
        tree.take_renames(),
        vec![vec![rename("2", "3"), rename("3", "4")]]
    );
}

#[test]
fn scenario_insert_sibling_does_not_collide_opaque() {
    let mut tree = OutlineTree::new("Paper");
    let a = tree.insert_root("A");
    let b = tree.insert_root("B");
    let c = tree.insert_root("C");

    let inserted = tree.insert_sibling(&a.id, "New").unwrap();
    assert!(tree.validate().is_valid());
    assert_eq!(
        ids(&tree),
        vec![a.id.clone(), inserted.id.clone(), b.id.clone(), c.id.clone()]
    );
    assert!(tree.take_renames().is_empty());
}

#[test]
fn renumbering_keeps_nested_children_consistent() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("A");
    tree.insert_root("B");
    tree.insert_child("2", "B1").unwrap();
    tree.insert_child("2.1", "B1a").unwrap();

    tree.insert_sibling("1", "New").unwrap();

    assert_eq!(ids(&tree), vec!["1", "2", "3", "3.1", "3.1.1"]);
    assert_eq!(
        tree.take_renames(),
        vec![vec![
            rename("2", "3"),
            rename("2.1", "3.1"),
            rename("2.1.1", "3.1.1"),
        ]]
    );
}

#[test]
fn scenario_delete_subtree_then_sync_prunes_descendants() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("Intro");
    tree.insert_child("1", "Background").unwrap();

    let mut store = store_with_sentinel();
    sync(&tree, &mut store);
    assert_eq!(store.section_ids(), vec!["1", "1.1"]);

    assert!(tree.delete_subtree("1"));
    assert_eq!(tree.node_count(), 0);

    let report = sync(&tree, &mut store);
    assert_eq!(report.pruned, vec!["1".to_string(), "1.1".to_string()]);
    assert!(store.section_ids().is_empty());
    assert!(store.entry(TEMPLATE_SECTION_KEY).is_some());
}

#[test]
fn delete_subtree_of_missing_id_returns_false() {
    let mut tree = OutlineTree::new("Paper");
    tree.insert_root("Intro");
    let before = tree.clone();

    assert!(!tree.delete_subtree("nope"));
    assert_eq!(tree, before);
}

#[test]
fn delete_renumbers_following_siblings_hierarchical() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("A");
    tree.insert_root("B");
    tree.insert_child("2", "B1").unwrap();

    assert!(tree.delete_subtree("1"));
    assert_eq!(ids(&tree), vec!["1", "1.1"]);
    assert_eq!(
        tree.take_renames(),
        vec![vec![rename("2", "1"), rename("2.1", "1.1")]]
    );
}

#[test]
fn insert_child_into_missing_parent_fails_without_mutation() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("Intro");
    let before = tree.clone();

    let err = tree.insert_child("9", "Orphan").unwrap_err();
    assert_eq!(err, OutlineError::NodeNotFound("9".to_string()));
    assert!(matches!(
        tree.insert_sibling("9", "Orphan"),
        Err(OutlineError::NodeNotFound(_))
    ));
    assert_eq!(tree, before);
}

#[test]
fn insert_child_expands_collapsed_parent() {
    let mut tree = OutlineTree::new("Paper");
    let intro = tree.insert_root("Intro");
    tree.set_collapsed(&intro.id, true).unwrap();
    assert!(tree.find_node(&intro.id).unwrap().collapsed);

    tree.insert_child(&intro.id, "Background").unwrap();
    assert!(!tree.find_node(&intro.id).unwrap().collapsed);
}

#[test]
fn move_node_rejects_self_and_cyclic_moves() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("A");
    tree.insert_child("1", "A1").unwrap();
    tree.insert_child("1.1", "A1a").unwrap();
    let before = tree.clone();

    assert_eq!(
        tree.move_node("1", "1"),
        Err(OutlineError::SelfMove("1".to_string()))
    );
    assert_eq!(
        tree.move_node("1", "1.1.1"),
        Err(OutlineError::CyclicMove {
            source_id: "1".to_string(),
            target_id: "1.1.1".to_string(),
        })
    );
    assert_eq!(
        tree.move_node("missing", "1"),
        Err(OutlineError::NodeNotFound("missing".to_string()))
    );
    assert_eq!(
        tree.move_node("1.1", "missing"),
        Err(OutlineError::NodeNotFound("missing".to_string()))
    );
    assert_eq!(tree, before);
    assert!(tree.take_renames().is_empty());
}

#[test]
fn move_node_relocates_full_subtree_and_expands_target() {
    let mut tree = OutlineTree::new("Paper");
    let a = tree.insert_root("A");
    let a1 = tree.insert_child(&a.id, "A1").unwrap();
    let b = tree.insert_root("B");
    tree.set_collapsed(&b.id, true).unwrap();

    tree.move_node(&a.id, &b.id).unwrap();

    assert_eq!(
        titles(&tree),
        vec![
            ("B".to_string(), 0),
            ("A".to_string(), 1),
            ("A1".to_string(), 2),
        ]
    );
    assert!(!tree.find_node(&b.id).unwrap().collapsed);
    assert_eq!(
        tree.find_parent_and_index(&a1.id),
        Some(NodeLocation {
            parent_id: Some(a.id.clone()),
            index: 0
        })
    );
    assert!(tree.validate().is_valid());
}

#[test]
fn move_node_renumbers_moved_subtree_hierarchical() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("A");
    tree.insert_child("1", "A1").unwrap();
    tree.insert_root("B");

    tree.move_node("1", "2").unwrap();

    assert_eq!(ids(&tree), vec!["1", "1.1", "1.1.1"]);
    assert_eq!(tree.find_node("1").unwrap().title, "B");
    assert_eq!(tree.find_node("1.1.1").unwrap().title, "A1");
    assert_eq!(
        tree.take_renames(),
        vec![vec![
            rename("2", "1"),
            rename("1", "1.1"),
            rename("1.1", "1.1.1"),
        ]]
    );
}

#[test]
fn set_all_collapsed_only_touches_nodes_with_children() {
    let mut tree = OutlineTree::new("Paper");
    let a = tree.insert_root("A");
    let a1 = tree.insert_child(&a.id, "A1").unwrap();
    let b = tree.insert_root("B");

    tree.set_all_collapsed(true);
    assert!(tree.find_node(&a.id).unwrap().collapsed);
    assert!(!tree.find_node(&a1.id).unwrap().collapsed);
    assert!(!tree.find_node(&b.id).unwrap().collapsed);

    tree.set_all_collapsed(false);
    assert!(!tree.find_node(&a.id).unwrap().collapsed);
    assert!(matches!(
        tree.set_collapsed("missing", true),
        Err(OutlineError::NodeNotFound(_))
    ));
}

#[test]
fn rename_node_and_tree_update_titles() {
    let mut tree = OutlineTree::new("Draft");
    let a = tree.insert_root("A");

    tree.rename_node(&a.id, "Introduction").unwrap();
    tree.rename_tree("Final");

    assert_eq!(tree.find_node(&a.id).unwrap().title, "Introduction");
    assert_eq!(tree.title, "Final");
    assert!(matches!(
        tree.rename_node("missing", "x"),
        Err(OutlineError::NodeNotFound(_))
    ));
}

#[test]
fn switching_to_hierarchical_canonicalizes_loaded_ids() {
    let mut tree: OutlineTree = serde_json::from_value(json!({
        "title": "Paper",
        "nodes": [
            { "id": "1", "title": "A", "children": [ { "id": "1.4", "title": "A4" } ] },
            { "id": "5", "title": "E" }
        ]
    }))
    .unwrap();
    tree.set_id_strategy(IdStrategy::Hierarchical);

    assert_eq!(ids(&tree), vec!["1", "1.1", "2"]);
    assert_eq!(
        tree.take_renames(),
        vec![vec![rename("1.4", "1.1"), rename("5", "2")]]
    );
    assert_eq!(tree.insert_root("F").id, "3");
    assert_eq!(tree.insert_child("1", "A5").unwrap().id, "1.2");
    assert!(tree.take_renames().is_empty());
}

#[test]
fn insert_child_after_opaque_move_of_template_ids_stays_unique() {
    let mut tree = BuiltinTemplates.outline_template().unwrap();
    let moved_title = tree.find_node("1.2").unwrap().title.clone();
    tree.move_node("1.2", "2").unwrap();
    tree.set_id_strategy(IdStrategy::Hierarchical);

    let added = tree.insert_child("1", "New").unwrap();

    assert_eq!(added.id, "1.2");
    let report = tree.validate();
    assert!(report.is_valid(), "{report}");
    assert_eq!(tree.find_node("2.3").unwrap().title, moved_title);
}

#[test]
fn inserts_renumber_nodes_pushed_with_stray_ids() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("A");
    tree.nodes.push(OutlineNode::new("3", "C"));
    tree.nodes[0].children.push(OutlineNode::new("1.7", "A7"));

    let root = tree.insert_root("D");
    let child = tree.insert_child("1", "A8").unwrap();

    assert_eq!(root.id, "3");
    assert_eq!(child.id, "1.2");
    assert_eq!(ids(&tree), vec!["1", "1.1", "1.2", "2", "3"]);
    assert_eq!(
        tree.take_renames(),
        vec![vec![rename("1.7", "1.1"), rename("3", "2")]]
    );
    assert!(tree.validate().is_valid());
}

#[test]
fn inserted_ids_stay_unique_across_mixed_edits() {
    for strategy in [IdStrategy::Opaque, IdStrategy::Hierarchical] {
        let mut tree = OutlineTree::new("Paper").with_id_strategy(strategy);
        let a = tree.insert_root("A");
        let b = tree.insert_root("B");
        let a1 = tree.insert_child(&a.id, "A1").unwrap();
        tree.insert_sibling(&a1.id, "A2").unwrap();
        let first = tree.nodes[0].id.clone();
        tree.insert_sibling(&first, "Between").unwrap();
        let last = tree.nodes[tree.nodes.len() - 1].id.clone();
        tree.insert_child(&last, "B1").unwrap();
        tree.insert_root("C");

        let report = tree.validate();
        assert!(report.is_valid(), "{strategy:?}: {report}");
        assert_eq!(tree.node_count(), 7);
        if strategy == IdStrategy::Opaque {
            assert!(tree.contains(&b.id));
        }
    }
}

#[test]
fn outline_serializes_to_wire_shape() {
    let mut tree = hierarchical("Paper");
    tree.insert_root("Intro");
    tree.insert_child("1", "Background").unwrap();
    tree.set_collapsed("1", true).unwrap();

    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(
        value,
        json!({
            "title": "Paper",
            "nodes": [
                {
                    "id": "1",
                    "title": "Intro",
                    "children": [
                        { "id": "1.1", "title": "Background", "children": [] }
                    ],
                    "collapsed": true
                }
            ]
        })
    );
}
