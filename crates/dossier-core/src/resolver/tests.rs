use crate::error::DossierError;
use crate::graph::CooccurrenceGraph;
use crate::kinds::defaults;
use crate::normalize::NormalizerConfig;
use crate::resolver::*;
use crate::types::{EntityId, EntityType};

fn person() -> EntityType {
    defaults::person()
}

fn org() -> EntityType {
    defaults::organization()
}

fn id(n: u64) -> EntityId {
    EntityId::new(n)
}

fn resolver_with(config: ResolverConfig) -> IdentityResolver {
    IdentityResolver::new(&NormalizerConfig::default(), config).unwrap()
}

/// Resolver that auto-merges initial matches like "J. Doe" ~ "Jane Doe".
fn lenient() -> IdentityResolver {
    resolver_with(ResolverConfig::new().with_auto_merge_threshold(0.8))
}

#[test]
fn test_exact_resolution_is_idempotent() {
    let mut resolver = IdentityResolver::default();
    let first = resolver.resolve_mention("Jane Doe", &person(), 1);
    assert_eq!(first.outcome, ResolutionOutcome::Created);
    assert!(first.new_mention);

    let again = resolver.resolve_mention("Jane Doe", &person(), 1);
    assert_eq!(again.entity_id, first.entity_id);
    assert_eq!(again.outcome, ResolutionOutcome::Exact);
    assert!(!again.new_mention);
    assert_eq!(resolver.entity(first.entity_id).unwrap().mention_count, 1);

    resolver.resolve("Jane Doe", &person(), 2);
    let entity = resolver.entity(first.entity_id).unwrap();
    assert_eq!(entity.mention_count, 2);
    assert_eq!(entity.first_seen_doc, 1);
    assert_eq!(entity.last_seen_doc, 2);
}

#[test]
fn test_variants_fold_to_one_entity() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let a = resolver.resolve("Jane Doe", &person(), 1);
    let b = resolver.resolve("jane doe", &person(), 2);
    let c = resolver.resolve("JANE DOE.", &person(), 3);
    let d = resolver.resolve("Dr. Jane Doe Jr.", &person(), 4);
    let e = resolver.resolve("Doe, Jane", &person(), 5);
    assert!([b, c, d, e].iter().all(|&x| x == a));
    assert_eq!(resolver.len(), 1);
    assert_eq!(resolver.aliases(a).unwrap().len(), 5);
    resolver.verify().unwrap();
}

#[test]
fn test_types_never_collide() {
    let mut resolver = IdentityResolver::default();
    let person_id = resolver.resolve("Jordan", &person(), 1);
    let place_id = resolver.resolve("Jordan", &defaults::location(), 1);
    assert_ne!(person_id, place_id);
    assert_eq!(resolver.entities_of_type(&defaults::location()).len(), 1);
}

#[test]
fn test_initial_match_merges_at_tuned_threshold() {
    let mut resolver = lenient();
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let resolution = resolver.resolve_mention("J. Doe", &person(), 2);

    assert_eq!(resolution.entity_id, jane);
    assert!(resolution.is_fuzzy());
    assert_eq!(resolver.lookup("J Doe", &person()), Some(jane));

    let entity = resolver.entity(jane).unwrap();
    assert!(entity.aliases.contains("J. Doe"));
    assert_eq!(entity.display_name, "Jane Doe");
    resolver.verify().unwrap();
}

#[test]
fn test_co_occurrence_boost_lifts_same_document_match() {
    let mut resolver = IdentityResolver::default();
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let resolution = resolver.resolve_mention("J. Doe", &person(), 1);
    assert_eq!(resolution.entity_id, jane);
    match resolution.outcome {
        ResolutionOutcome::Fuzzy { similarity } => {
            assert!((similarity.score - 0.9).abs() < 1e-9);
            assert_eq!(similarity.strategy, MatchStrategy::Initial);
        }
        other => panic!("expected fuzzy match, got {:?}", other),
    }
}

#[test]
fn test_fuzzy_disabled_creates_new_entity() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let other = resolver.resolve("J. Doe", &person(), 1);
    assert_ne!(jane, other);
    assert!(resolver.review_queue().is_empty());
}

#[test]
fn test_candidate_ties_prefer_more_mentions() {
    let mut resolver = lenient();
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let john = resolver.resolve("John Doe", &person(), 2);
    assert_ne!(jane, john);
    resolver.resolve("John Doe", &person(), 3);

    assert_eq!(resolver.resolve("J. Doe", &person(), 4), john);
}

#[test]
fn test_candidate_ties_prefer_earlier_first_document() {
    let mut resolver = lenient();
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    resolver.resolve("John Doe", &person(), 2);
    assert_eq!(resolver.resolve("J. Doe", &person(), 4), jane);
}

#[test]
fn test_low_confidence_match_is_suggested_for_review() {
    let mut resolver = IdentityResolver::default();
    let mut graph = CooccurrenceGraph::new();
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let resolution = resolver.resolve_mention("J. Doe", &person(), 2);

    assert!(resolution.created_entity());
    assert_ne!(resolution.entity_id, jane);
    let ResolutionOutcome::Suggested {
        candidate,
        review_item,
        ..
    } = resolution.outcome
    else {
        panic!("expected a suggestion, got {:?}", resolution.outcome);
    };
    assert_eq!(candidate, jane);

    let queue = resolver.review_queue();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, review_item);
    assert_eq!(queue[0].source, resolution.entity_id);

    let merged = resolver.approve(review_item, &mut graph).unwrap();
    assert_eq!(merged.survivor, jane);
    assert_eq!(merged.absorbed, Some(resolution.entity_id));
    assert_eq!(resolver.lookup("J. Doe", &person()), Some(jane));
    assert!(resolver.review_queue().is_empty());

    assert!(matches!(
        resolver.approve(review_item, &mut graph),
        Err(DossierError::ReviewItemNotFound(_))
    ));

    let actions: Vec<LogAction> = resolver
        .resolution_log()
        .entries()
        .iter()
        .map(|e| e.action)
        .collect();
    assert!(actions.contains(&LogAction::Suggested));
    assert!(actions.contains(&LogAction::Merged));
    assert!(actions.contains(&LogAction::Approved));
    resolver.verify().unwrap();
}

#[test]
fn test_rejected_suggestion_keeps_entities_apart() {
    let mut resolver = IdentityResolver::default();
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let short = resolver.resolve("J. Doe", &person(), 2);
    let item = resolver.review_queue()[0].id;

    let rejected = resolver.reject(item).unwrap();
    assert_eq!((rejected.source, rejected.target), (short, jane));
    assert!(resolver.review_queue().is_empty());
    assert_eq!(resolver.lookup("J. Doe", &person()), Some(short));
    assert!(resolver.reject(item).is_err());
}

#[test]
fn test_merge_rewrites_graph_and_keeps_pointer() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let mut graph = CooccurrenceGraph::new();

    let alice = resolver.resolve("Alice", &person(), 1);
    let bob = resolver.resolve("Bob", &person(), 1);
    graph.record_document([alice, bob], 1);
    let alicia = resolver.resolve("Alicia", &person(), 2);
    resolver.resolve("Bob", &person(), 2);
    graph.record_document([alicia, bob], 2);
    resolver.resolve("Alicia", &person(), 3);
    let carol = resolver.resolve("Carol", &person(), 3);
    graph.record_document([alicia, carol], 3);
    resolver.resolve("Alice", &person(), 4);
    resolver.resolve("Alicia", &person(), 4);
    graph.record_document([alice, alicia], 4);

    let outcome = resolver.merge(alice, alicia, &mut graph).unwrap();
    assert_eq!(outcome.survivor, alicia);
    assert_eq!(outcome.absorbed, Some(alice));
    assert_eq!(outcome.edges.combined, 1);
    assert_eq!(outcome.edges.dropped_self_pairs, 1);

    assert_eq!(resolver.resolve("Alice", &person(), 5), alicia);
    assert_eq!(resolver.canonical_id(alice).unwrap(), alicia);
    assert_eq!(resolver.entity(alice).unwrap().entity_id, alicia);
    assert!(!resolver.is_live(alice));
    assert_eq!(resolver.len(), 3);

    let survivor = resolver.entity(alicia).unwrap();
    assert_eq!(survivor.absorbed_ids, vec![alice]);
    assert!(survivor.aliases.contains("Alice"));
    assert_eq!(survivor.mention_count, 6);

    assert!(graph.edges().all(|e| e.entity_a != alice && e.entity_b != alice));
    assert_eq!(graph.edge(alicia, bob).unwrap().weight, 2);
    graph.verify().unwrap();
    resolver.verify().unwrap();
}

#[test]
fn test_merge_tie_keeps_lower_id() {
    let mut resolver = IdentityResolver::default();
    let mut graph = CooccurrenceGraph::new();
    let a = resolver.resolve("Acme", &org(), 1);
    let b = resolver.resolve("Globex", &org(), 2);
    assert_eq!(resolver.merge(b, a, &mut graph).unwrap().survivor, a);
}

#[test]
fn test_merge_same_and_unknown() {
    let mut resolver = IdentityResolver::default();
    let mut graph = CooccurrenceGraph::new();
    let a = resolver.resolve("Acme", &org(), 1);

    let same = resolver.merge(a, a, &mut graph).unwrap();
    assert_eq!(same.absorbed, None);

    assert!(matches!(
        resolver.merge(a, id(99), &mut graph),
        Err(DossierError::NotFound(missing)) if missing == id(99)
    ));
}

#[test]
fn test_merge_chain_pointers_stay_one_hop() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let mut graph = CooccurrenceGraph::new();
    let a = resolver.resolve("Alpha", &org(), 1);
    let b = resolver.resolve("Beta", &org(), 1);
    let c = resolver.resolve("Gamma", &org(), 1);
    resolver.resolve("Gamma", &org(), 2);
    resolver.resolve("Gamma", &org(), 3);

    assert_eq!(resolver.merge(a, b, &mut graph).unwrap().survivor, a);
    assert_eq!(resolver.merge(b, c, &mut graph).unwrap().survivor, c);

    assert_eq!(resolver.canonical_id(b).unwrap(), c);
    assert_eq!(resolver.lookup("Beta", &org()), Some(c));
    assert_eq!(resolver.entity(c).unwrap().absorbed_ids, vec![a, b]);
    resolver.verify().unwrap();
}

/// "Jane Doe" with Acme in document 1, "J. Doe" with Globex in document 2,
/// fuzzy-merged into one person.
fn over_merged() -> (IdentityResolver, CooccurrenceGraph, [EntityId; 3]) {
    let mut resolver = lenient();
    let mut graph = CooccurrenceGraph::new();

    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let acme = resolver.resolve("Acme Corp", &org(), 1);
    graph.record_document([jane, acme], 1);

    let short = resolver.resolve("J. Doe", &person(), 2);
    assert_eq!(short, jane);
    let globex = resolver.resolve("Globex", &org(), 2);
    graph.record_document([jane, globex], 2);

    (resolver, graph, [jane, acme, globex])
}

#[test]
fn test_split_moves_extracted_provenance() {
    let (mut resolver, mut graph, [jane, acme, globex]) = over_merged();

    let outcome = resolver.split(jane, &["J. Doe"], &mut graph).unwrap();
    assert!(outcome.is_exact());
    assert_eq!(outcome.extracted_aliases, vec!["J. Doe".to_string()]);
    let split_off = outcome.new_entity;

    assert_eq!(resolver.lookup("J. Doe", &person()), Some(split_off));
    assert_eq!(resolver.lookup("Jane Doe", &person()), Some(jane));
    assert_eq!(resolver.entity(jane).unwrap().mention_count, 1);
    assert_eq!(resolver.entity(split_off).unwrap().mention_count, 1);

    assert_eq!(graph.edge(jane, acme).unwrap().weight, 1);
    assert!(graph.edge(jane, globex).is_none());
    assert_eq!(graph.edge(split_off, globex).unwrap().weight, 1);
    assert_eq!(outcome.into_exact().unwrap(), split_off);

    graph.verify().unwrap();
    resolver.verify().unwrap();
}

#[test]
fn test_split_without_provenance_flags_both() {
    let (mut resolver, mut graph, [jane, acme, globex]) = over_merged();
    // Recorded directly, no mention provenance on the resolver side.
    graph.record_document([jane, acme], 99);

    let outcome = resolver.split(jane, &["j doe"], &mut graph).unwrap();
    assert_eq!(
        outcome.provenance,
        SplitProvenance::Insufficient {
            unattributed_documents: 1
        }
    );
    let split_off = outcome.new_entity;
    assert!(resolver.entity(jane).unwrap().split_ambiguous);
    assert!(resolver.entity(split_off).unwrap().split_ambiguous);

    assert_eq!(graph.edge(jane, acme).unwrap().weight, 2);
    assert_eq!(graph.edge(split_off, acme).unwrap().weight, 2);
    assert_eq!(graph.edge(split_off, globex).unwrap().weight, 1);

    match outcome.into_exact() {
        Err(DossierError::InsufficientProvenance {
            entity, new_entity, ..
        }) => {
            assert_eq!(entity, jane);
            assert_eq!(new_entity, split_off);
        }
        other => panic!("expected InsufficientProvenance, got {:?}", other),
    }
    resolver.verify().unwrap();
}

#[test]
fn test_split_validation() {
    let (mut resolver, mut graph, [jane, ..]) = over_merged();
    assert!(matches!(
        resolver.split(jane, &["Someone Else"], &mut graph),
        Err(DossierError::Validation(_))
    ));
    assert!(matches!(
        resolver.split(jane, &["Jane Doe", "J. Doe"], &mut graph),
        Err(DossierError::Validation(_))
    ));
    assert!(matches!(
        resolver.split(id(42), &["Jane Doe"], &mut graph),
        Err(DossierError::NotFound(_))
    ));
}

#[test]
fn test_merge_across_types_keeps_both_keys() {
    let mut resolver = IdentityResolver::default();
    let mut graph = CooccurrenceGraph::new();
    let place = defaults::location();

    let jordan = resolver.resolve("Jordan", &person(), 1);
    let amman = resolver.resolve("Amman", &place, 1);
    graph.record_document([jordan, amman], 1);
    let country = resolver.resolve("Jordan", &place, 2);
    let acme = resolver.resolve("Acme", &org(), 2);
    graph.record_document([country, acme], 2);

    let outcome = resolver.merge(jordan, country, &mut graph).unwrap();
    assert_eq!(outcome.survivor, jordan);
    resolver.verify().unwrap();
    graph.verify().unwrap();
    assert_eq!(resolver.lookup("Jordan", &place), Some(jordan));
    assert_eq!(resolver.aliases(jordan).unwrap(), vec!["Jordan".to_string()]);

    // The place spelling keeps its own provenance after the merge.
    assert_eq!(resolver.resolve("Jordan", &place, 3), jordan);
    assert_eq!(resolver.entity(jordan).unwrap().mention_count, 3);
    resolver.verify().unwrap();

    // A bare spelling selects the key of every type it carries.
    assert!(matches!(
        resolver.split(jordan, &["Jordan"], &mut graph),
        Err(DossierError::Validation(_))
    ));

    let restored = resolver
        .split(jordan, &["location:jordan"], &mut graph)
        .unwrap()
        .into_exact()
        .unwrap();
    assert_eq!(resolver.entity_type(restored).unwrap(), place);
    assert_eq!(resolver.lookup("Jordan", &place), Some(restored));
    assert_eq!(resolver.lookup("Jordan", &person()), Some(jordan));
    assert_eq!(resolver.entity(restored).unwrap().mention_count, 2);
    assert!(graph.edge(restored, acme).is_some());
    assert!(graph.edge(jordan, acme).is_none());
    assert!(graph.edge(jordan, amman).is_some());
    resolver.verify().unwrap();
    graph.verify().unwrap();
}

#[test]
fn test_log_can_be_drained() {
    let mut resolver = IdentityResolver::default();
    resolver.resolve("Acme", &org(), 1);
    let entries = resolver.take_log_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, LogAction::Created);
    assert!(resolver.resolution_log().is_empty());
}

#[test]
fn test_rescan_files_review_items_for_existing_pairs() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let initials = resolver.resolve("J. Doe", &person(), 2);
    resolver.resolve("Acme", &org(), 3);
    resolver.resolve("Zenith", &org(), 4);
    assert!(resolver.review_queue().is_empty());

    let outcome = resolver.rescan(Some(&person()));
    assert_eq!(outcome.entities_scanned, 2);
    assert_eq!(outcome.review_items.len(), 1);

    let queue = resolver.review_queue();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].source, initials);
    assert_eq!(queue[0].target, jane);
    assert!((queue[0].confidence - 0.8).abs() < 1e-9);
    assert_eq!(queue[0].strategy, MatchStrategy::Initial);

    let last = resolver.resolution_log().entries().last().unwrap().clone();
    assert_eq!(last.action, LogAction::Suggested);
    assert_eq!(last.entity, initials);
    assert_eq!(last.related, Some(jane));

    // Pending pairs are not filed twice; unrelated orgs never qualify.
    let again = resolver.rescan(None);
    assert_eq!(again.entities_scanned, 4);
    assert!(again.review_items.is_empty());
    assert_eq!(resolver.len(), 4);
}

#[test]
fn test_rescan_never_merges_and_applies_boost() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let initials = resolver.resolve("J. Doe", &person(), 1);

    let outcome = resolver.rescan(None);
    assert_eq!(outcome.review_items.len(), 1);
    // 0.8 + 0.1 for the shared document clears auto-merge, but a rescan
    // only suggests.
    assert!((resolver.review_queue()[0].confidence - 0.9).abs() < 1e-9);
    assert_ne!(resolver.canonical_id(initials).unwrap(), jane);

    let mut graph = CooccurrenceGraph::new();
    graph.add_node(jane);
    graph.add_node(initials);
    let merged = resolver.approve(outcome.review_items[0], &mut graph).unwrap();
    assert_eq!(merged.survivor, jane);
    assert_eq!(resolver.canonical_id(initials).unwrap(), jane);
    resolver.verify().unwrap();
}

#[test]
fn test_rescan_single_entity() {
    let mut resolver = resolver_with(ResolverConfig::exact_only());
    let jane = resolver.resolve("Jane Doe", &person(), 1);
    let initials = resolver.resolve("J. Doe", &person(), 2);
    let other = resolver.resolve("Bob Stone", &person(), 3);

    let outcome = resolver.rescan_entity(jane).unwrap();
    assert_eq!(outcome.entities_scanned, 3);
    assert_eq!(outcome.review_items.len(), 1);
    let item = resolver.review_queue()[0].clone();
    assert_eq!((item.source, item.target), (initials, jane));

    assert!(resolver.rescan_entity(other).unwrap().review_items.is_empty());
    assert!(matches!(resolver.rescan_entity(id(99)), Err(DossierError::NotFound(_))));
}
