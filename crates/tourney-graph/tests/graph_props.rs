use proptest::prelude::*;
use std::collections::HashSet;
use tourney_graph::{IdFactory, VersionGraph, VersionNode};

proptest! {
    #[test]
    fn prop_ids_pairwise_distinct(
        prefixes in proptest::collection::vec("[a-z]{0,4}", 1..200)
    ) {
        let ids = IdFactory::new();
        let issued: Vec<String> = prefixes.iter().map(|p| ids.new_id(p)).collect();
        let distinct: HashSet<&String> = issued.iter().collect();

        prop_assert_eq!(distinct.len(), issued.len());
        prop_assert_eq!(ids.issued(), issued.len() as u64);
    }

    #[test]
    fn prop_get_node_returns_added_node(
        titles in proptest::collection::vec("[A-Za-z ]{1,12}", 1..40)
    ) {
        let ids = IdFactory::new();
        let mut graph = VersionGraph::new();
        let mut added = Vec::new();

        for title in &titles {
            let node = VersionNode::new(ids.next_id(), title.clone());
            added.push(node.clone());
            graph.add_node(node).unwrap();
        }

        for node in &added {
            prop_assert_eq!(graph.get_node(node.id()), Some(node));
        }
        prop_assert!(graph.get_node("never-added").is_none());
    }

    #[test]
    fn prop_parent_to_new_child_stays_acyclic(
        parents in proptest::collection::vec(any::<prop::sample::Index>(), 1..60)
    ) {
        // Each new node is attached to some node that already exists.
        let ids = IdFactory::new();
        let mut graph = VersionGraph::new();
        let root = ids.new_id("root");
        graph.add_node(VersionNode::new(root.clone(), "root")).unwrap();
        let mut existing = vec![root];

        for pick in parents {
            let parent = existing[pick.index(existing.len())].clone();
            let child = ids.new_id("n");
            graph
                .add_node(VersionNode::new(child.clone(), "child").with_parent(Some(parent.as_str())))
                .unwrap();
            graph.connect(&ids, &parent, &child).unwrap();
            existing.push(child);
        }

        prop_assert!(graph.is_acyclic());
        prop_assert_eq!(graph.roots().len(), 1);
        prop_assert_eq!(graph.edge_count(), graph.len() - 1);
    }
}
