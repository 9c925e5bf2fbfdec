use crate::graph::*;
use crate::types::EntityId;
use std::collections::BTreeSet;

fn id(n: u64) -> EntityId {
    EntityId::new(n)
}

fn docs(list: &[u64]) -> BTreeSet<u64> {
    list.iter().copied().collect()
}

/// Build a small test graph:
/// 1 - 2 - 3
///  \     /
///   4 - 5      6 (isolated)
fn build_test_graph() -> CooccurrenceGraph {
    let mut graph = CooccurrenceGraph::new();
    graph.record_document([id(1), id(2)], 100);
    graph.record_document([id(2), id(3)], 101);
    graph.record_document([id(1), id(4)], 102);
    graph.record_document([id(4), id(5)], 103);
    graph.record_document([id(5), id(3)], 104);
    graph.record_document([id(6)], 105);
    graph
}

#[test]
fn test_record_document_creates_all_pairs() {
    let mut graph = CooccurrenceGraph::new();
    let outcome = graph.record_document([id(3), id(1), id(2)], 7);

    assert_eq!(outcome.nodes_added, 3);
    assert_eq!(outcome.edges_created.len(), 3);
    assert_eq!(outcome.edges_updated, 0);
    assert_eq!(graph.edge_count(), 3);

    let edge = graph.edge(id(3), id(1)).unwrap();
    assert_eq!(edge.entity_a, id(1));
    assert_eq!(edge.entity_b, id(3));
    assert_eq!(edge.weight, 1);
    assert_eq!(edge.supporting_documents, docs(&[7]));
    graph.verify().unwrap();
}

#[test]
fn test_record_document_is_idempotent_per_document() {
    let mut graph = CooccurrenceGraph::new();
    graph.record_document([id(1), id(2)], 10);
    let version = graph.version();

    let again = graph.record_document([id(2), id(1)], 10);
    assert!(again.edges_created.is_empty());
    assert_eq!(again.edges_updated, 0);
    assert_eq!(graph.version(), version);
    assert_eq!(graph.edge(id(1), id(2)).unwrap().weight, 1);

    let next = graph.record_document([id(1), id(2)], 11);
    assert_eq!(next.edges_updated, 1);
    assert_eq!(graph.edge(id(1), id(2)).unwrap().weight, 2);
}

#[test]
fn test_self_pairs_and_duplicates_ignored() {
    let mut graph = CooccurrenceGraph::new();
    let outcome = graph.record_document([id(1), id(1), id(1)], 1);
    assert_eq!(outcome.nodes_added, 1);
    assert!(outcome.edges_created.is_empty());
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.contains_node(id(1)));
}

#[test]
fn test_merge_rewrites_and_unions_edges() {
    let mut graph = CooccurrenceGraph::new();
    // 1-3 {10}, 2-3 {11, 12}, 1-2 {13}, 2-4 {14}
    graph.record_document([id(1), id(3)], 10);
    graph.record_document([id(2), id(3)], 11);
    graph.record_document([id(2), id(3)], 12);
    graph.record_document([id(1), id(2)], 13);
    graph.record_document([id(2), id(4)], 14);

    let outcome = graph.apply_merge(id(2), id(1));
    assert_eq!(outcome.combined, 1);
    assert_eq!(outcome.rewritten, 1);
    assert_eq!(outcome.dropped_self_pairs, 1);

    assert!(!graph.contains_node(id(2)));
    assert!(graph.edges().all(|e| e.entity_a != id(2) && e.entity_b != id(2)));

    let merged = graph.edge(id(1), id(3)).unwrap();
    assert_eq!(merged.supporting_documents, docs(&[10, 11, 12]));
    assert_eq!(merged.weight, 3);
    assert_eq!(graph.edge(id(1), id(4)).unwrap().supporting_documents, docs(&[14]));
    assert_eq!(graph.neighbors(id(1)), vec![id(3), id(4)]);
    graph.verify().unwrap();
}

#[test]
fn test_merge_of_unknown_node_is_noop() {
    let mut graph = build_test_graph();
    let version = graph.version();
    let outcome = graph.apply_merge(id(42), id(1));
    assert_eq!(outcome, MergeEdges::default());
    assert_eq!(graph.version(), version);
}

#[test]
fn test_split_moves_attributed_documents() {
    let mut graph = CooccurrenceGraph::new();
    // Entity 1 co-occurs with 2 in docs 10 (extracted alias) and 11 (retained alias),
    // with 3 only in doc 12 (extracted alias).
    graph.record_document([id(1), id(2)], 10);
    graph.record_document([id(1), id(2)], 11);
    graph.record_document([id(1), id(3)], 12);

    let extracted = docs(&[10, 12]);
    let retained = docs(&[11]);
    let outcome = graph.apply_split(id(1), id(9), &extracted, &retained);

    assert!(!outcome.is_ambiguous());
    assert_eq!(outcome.moved, 1);
    assert_eq!(outcome.shared, 1);
    assert!(!outcome.linked);

    assert_eq!(graph.edge(id(1), id(2)).unwrap().supporting_documents, docs(&[11]));
    assert_eq!(graph.edge(id(9), id(2)).unwrap().supporting_documents, docs(&[10]));
    assert!(graph.edge(id(1), id(3)).is_none());
    assert_eq!(graph.edge(id(9), id(3)).unwrap().supporting_documents, docs(&[12]));
    graph.verify().unwrap();
}

#[test]
fn test_split_links_documents_mentioning_both_alias_sets() {
    let mut graph = CooccurrenceGraph::new();
    graph.record_document([id(1), id(2)], 10);

    let both = docs(&[10]);
    let outcome = graph.apply_split(id(1), id(5), &both, &both);
    assert!(outcome.linked);
    assert_eq!(graph.edge(id(1), id(5)).unwrap().weight, 1);
    assert_eq!(graph.edge(id(1), id(2)).unwrap().weight, 1);
    assert_eq!(graph.edge(id(5), id(2)).unwrap().weight, 1);
    graph.verify().unwrap();
}

#[test]
fn test_split_with_unattributed_documents_keeps_everything() {
    let mut graph = CooccurrenceGraph::new();
    graph.record_document([id(1), id(2)], 10);
    graph.record_document([id(1), id(3)], 77);

    let outcome = graph.apply_split(id(1), id(4), &docs(&[10]), &docs(&[]));
    assert!(outcome.is_ambiguous());
    assert_eq!(outcome.unattributed_documents, 1);
    assert_eq!(outcome.moved, 0);
    assert_eq!(graph.edge(id(1), id(2)).unwrap().weight, 1);
    assert_eq!(graph.edge(id(1), id(3)).unwrap().weight, 1);
    assert_eq!(graph.edge(id(4), id(2)).unwrap().weight, 1);
    assert_eq!(graph.edge(id(4), id(3)).unwrap().supporting_documents, docs(&[77]));
    graph.verify().unwrap();
}

#[test]
fn test_snapshot_is_isolated_from_later_writes() {
    let mut graph = build_test_graph();
    let snapshot = graph.snapshot();
    let before = snapshot.edge_count();

    graph.record_document([id(1), id(6)], 200);
    graph.record_document([id(1), id(2)], 201);
    graph.apply_merge(id(5), id(4));

    assert_eq!(snapshot.edge_count(), before);
    assert!(snapshot.contains(id(5)));
    assert_eq!(snapshot.edge(id(1), id(2)).unwrap().weight, 1);
    assert!(snapshot.edge(id(1), id(6)).is_none());
    assert_ne!(graph.snapshot().version(), snapshot.version());
}

#[test]
fn test_stats_and_components() {
    let graph = build_test_graph();
    let snapshot = graph.snapshot();
    let stats = snapshot.stats();

    assert_eq!(stats.node_count, 6);
    assert_eq!(stats.edge_count, 5);
    assert_eq!(stats.components, 2);
    assert!((stats.density - 10.0 / 30.0).abs() < 1e-9);
    assert!((stats.avg_degree - 10.0 / 6.0).abs() < 1e-9);

    let components = snapshot.components();
    assert_eq!(components, vec![vec![id(1), id(2), id(3), id(4), id(5)], vec![id(6)]]);
}

#[test]
fn test_stats_empty_graph() {
    let stats = CooccurrenceGraph::new().snapshot().stats();
    assert_eq!(stats, GraphStats::default());
}

#[test]
fn test_shortest_path_prefers_strong_ties() {
    let mut graph = build_test_graph();
    // Strengthen 1-4-5-3 so the longer route is cheaper than 1-2-3.
    for doc in 300..305 {
        graph.record_document([id(1), id(4)], doc);
        graph.record_document([id(4), id(5)], doc + 10);
        graph.record_document([id(5), id(3)], doc + 20);
    }
    let snapshot = graph.snapshot();

    let path = snapshot.shortest_path(id(1), id(3)).unwrap();
    assert_eq!(path.nodes, vec![id(1), id(4), id(5), id(3)]);
    assert_eq!(path.hops, 3);
    assert_eq!(path.weights, vec![6, 6, 6]);
    assert_eq!(path.total_weight, 18);
    assert!((path.distance - 0.5).abs() < 1e-9);
}

#[test]
fn test_shortest_path_edge_cases() {
    let snapshot = build_test_graph().snapshot();
    assert!(snapshot.shortest_path(id(1), id(6)).is_none());
    assert!(snapshot.shortest_path(id(1), id(99)).is_none());

    let same = snapshot.shortest_path(id(2), id(2)).unwrap();
    assert_eq!(same.nodes, vec![id(2)]);
    assert_eq!(same.hops, 0);

    let direct = snapshot.shortest_path(id(1), id(2)).unwrap();
    assert_eq!(direct.nodes, vec![id(1), id(2)]);
}

#[test]
fn test_neighbors_by_hop_and_weight() {
    let mut graph = build_test_graph();
    graph.record_document([id(1), id(2)], 400);
    let snapshot = graph.snapshot();

    let one = snapshot.neighbors(id(1), 1, 1);
    assert_eq!(one.len(), 2);
    assert_eq!(one[0].entity_id, id(2));
    assert_eq!(one[0].weight, 2);
    assert_eq!(one[1].entity_id, id(4));

    let two = snapshot.neighbors(id(1), 2, 1);
    let ids: BTreeSet<EntityId> = two.iter().map(|n| n.entity_id).collect();
    assert_eq!(ids, [id(2), id(3), id(4), id(5)].into_iter().collect());
    assert!(two.iter().filter(|n| n.hop == 2).all(|n| n.entity_id == id(3) || n.entity_id == id(5)));

    let strong = snapshot.neighbors(id(1), 3, 2);
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[0].entity_id, id(2));

    assert!(snapshot.neighbors(id(6), 2, 1).is_empty());
    assert!(snapshot.neighbors(id(99), 2, 1).is_empty());
}

#[test]
fn test_filtered_and_subgraph() {
    let mut graph = build_test_graph();
    graph.record_document([id(1), id(2)], 500);
    let snapshot = graph.snapshot();

    let heavy = snapshot.filtered(|_| true, 2);
    assert_eq!(heavy.node_count(), 6);
    assert_eq!(heavy.edge_count(), 1);

    let sub = snapshot.subgraph(&[id(1), id(2), id(3), id(99)]);
    assert_eq!(sub.node_count(), 3);
    assert_eq!(sub.edge_count(), 2);
    assert!(sub.edge(id(1), id(4)).is_none());
    assert_eq!(sub.version(), snapshot.version());
}

#[test]
fn test_verify_detects_nothing_on_fresh_graph() {
    let graph = build_test_graph();
    graph.verify().unwrap();
    assert_eq!(graph.degree(id(1)), 2);
    assert_eq!(graph.degree(id(6)), 0);
}
