//! Greedy modularity communities (Clauset-Newman-Moore).
//!
//! Starts from singletons and repeatedly merges the adjacent pair of
//! communities with the largest modularity gain `2 (e_ij - a_i a_j)`,
//! stopping once no merge has a positive gain. The result is a local
//! optimum: deterministic for a given snapshot, not globally optimal.

use crate::analytics::budget::Deadline;
use crate::analytics::indexed::IndexedGraph;
use crate::error::Result;
use crate::graph::GraphSnapshot;
use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Gains at or below this are not improvements.
const GAIN_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityAssignment {
    pub entity_id: EntityId,
    /// Numbered by smallest member; only meaningful within one run.
    pub community_id: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub community_id: usize,
    /// Ascending id order.
    pub members: Vec<EntityId>,
    pub size: usize,
    /// Internal edges over possible internal edges; 0 for singletons.
    pub density: f64,
    /// Summed weight of internal edges.
    pub internal_weight: usize,
}

/// A flat partition of every node in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityPartition {
    /// One entry per node, ascending id order.
    pub assignments: Vec<CommunityAssignment>,
    pub modularity: f64,
    pub communities: Vec<Community>,
}

impl CommunityPartition {
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Communities with at least `min_size` members, largest first.
    pub fn communities(&self, min_size: usize) -> Vec<&Community> {
        let mut selected: Vec<&Community> = self
            .communities
            .iter()
            .filter(|c| c.size >= min_size)
            .collect();
        selected.sort_by(|a, b| b.size.cmp(&a.size).then(a.community_id.cmp(&b.community_id)));
        selected
    }

    pub fn community_of(&self, entity_id: EntityId) -> Option<usize> {
        self.assignments
            .binary_search_by_key(&entity_id, |a| a.entity_id)
            .ok()
            .map(|i| self.assignments[i].community_id)
    }
}

/// Modularity of an arbitrary assignment over a snapshot. Nodes without
/// an assignment count as singletons.
pub fn modularity(snapshot: &GraphSnapshot, assignments: &[CommunityAssignment], weighted: bool) -> f64 {
    let community: HashMap<EntityId, usize> = assignments
        .iter()
        .map(|a| (a.entity_id, a.community_id))
        .collect();
    let weight_of = |w: usize| if weighted { w as f64 } else { 1.0 };
    let total: f64 = snapshot.edges().map(|e| weight_of(e.weight)).sum();
    if total == 0.0 {
        return 0.0;
    }

    // Unassigned nodes get a private community key.
    let key = |id: EntityId| match community.get(&id) {
        Some(&c) => (0u8, c as u64),
        None => (1u8, id.ordinal()),
    };

    let mut internal = 0.0;
    let mut strength: HashMap<(u8, u64), f64> = HashMap::new();
    for edge in snapshot.edges() {
        let w = weight_of(edge.weight);
        let (ka, kb) = (key(edge.entity_a), key(edge.entity_b));
        if ka == kb {
            internal += w;
        }
        *strength.entry(ka).or_default() += w;
        *strength.entry(kb).or_default() += w;
    }

    let expected: f64 = strength
        .values()
        .map(|s| (s / (2.0 * total)).powi(2))
        .sum();
    internal / total - expected
}

struct Group {
    members: Vec<usize>,
    ordinal_sum: u128,
    /// a_i: fraction of edge endpoints in the group.
    degree_share: f64,
    /// e_ij to each adjacent group.
    links: BTreeMap<usize, f64>,
}

pub(crate) fn greedy_modularity(
    graph: &IndexedGraph,
    snapshot: &GraphSnapshot,
    weighted: bool,
    deadline: &Deadline,
) -> Result<CommunityPartition> {
    let n = graph.len();
    let weight_of = |w: usize| if weighted { w as f64 } else { 1.0 };
    let total: f64 = graph
        .neighbors
        .iter()
        .flatten()
        .map(|&(_, w)| weight_of(w))
        .sum::<f64>()
        / 2.0;

    let mut groups: Vec<Option<Group>> = (0..n)
        .map(|i| {
            let mut links = BTreeMap::new();
            let mut strength = 0.0;
            for &(j, w) in &graph.neighbors[i] {
                let w = weight_of(w);
                strength += w;
                if total > 0.0 {
                    *links.entry(j).or_insert(0.0) += w / (2.0 * total);
                }
            }
            Some(Group {
                members: vec![i],
                ordinal_sum: u128::from(graph.ids[i].ordinal()),
                degree_share: if total > 0.0 { strength / (2.0 * total) } else { 0.0 },
                links,
            })
        })
        .collect();

    let mut merges = 0;
    loop {
        deadline.check(merges, n.saturating_sub(1))?;

        let mut best: Option<(f64, u128, usize, usize)> = None;
        for (i, group) in groups.iter().enumerate() {
            let Some(group) = group else {
                continue;
            };
            for (&j, &e_ij) in group.links.range(i + 1..) {
                let Some(other) = groups[j].as_ref() else {
                    continue;
                };
                let gain = 2.0 * (e_ij - group.degree_share * other.degree_share);
                if gain <= GAIN_EPSILON {
                    continue;
                }
                let ordinal_sum = group.ordinal_sum + other.ordinal_sum;
                let better = match best {
                    None => true,
                    Some((best_gain, best_sum, _, _)) => {
                        gain > best_gain + GAIN_EPSILON
                            || ((gain - best_gain).abs() <= GAIN_EPSILON && ordinal_sum < best_sum)
                    }
                };
                if better {
                    best = Some((gain, ordinal_sum, i, j));
                }
            }
        }

        let Some((_, _, keep, absorb)) = best else {
            break;
        };
        merge_groups(&mut groups, keep, absorb);
        merges += 1;
    }

    let mut clusters: Vec<Vec<EntityId>> = groups
        .into_iter()
        .flatten()
        .map(|group| {
            let mut members: Vec<EntityId> = group.members.iter().map(|&i| graph.ids[i]).collect();
            members.sort_unstable();
            members
        })
        .collect();
    clusters.sort_by_key(|members| members.first().copied());

    let mut assignments: Vec<CommunityAssignment> = clusters
        .iter()
        .enumerate()
        .flat_map(|(community_id, members)| {
            members.iter().map(move |&entity_id| CommunityAssignment {
                entity_id,
                community_id,
            })
        })
        .collect();
    assignments.sort_by_key(|a| a.entity_id);

    let communities = summarize(snapshot, &clusters);
    let score = modularity(snapshot, &assignments, weighted);
    Ok(CommunityPartition {
        assignments,
        modularity: score,
        communities,
    })
}

fn merge_groups(groups: &mut [Option<Group>], keep: usize, absorb: usize) {
    let Some(absorbed) = groups[absorb].take() else {
        return;
    };
    for (&k, &e) in &absorbed.links {
        if k == keep {
            continue;
        }
        if let Some(neighbor) = groups[k].as_mut() {
            neighbor.links.remove(&absorb);
            *neighbor.links.entry(keep).or_insert(0.0) += e;
        }
    }
    if let Some(kept) = groups[keep].as_mut() {
        kept.links.remove(&absorb);
        for (k, e) in absorbed.links {
            if k != keep {
                *kept.links.entry(k).or_insert(0.0) += e;
            }
        }
        kept.members.extend(absorbed.members);
        kept.ordinal_sum += absorbed.ordinal_sum;
        kept.degree_share += absorbed.degree_share;
    }
}

fn summarize(snapshot: &GraphSnapshot, clusters: &[Vec<EntityId>]) -> Vec<Community> {
    let mut owner: HashMap<EntityId, usize> = HashMap::new();
    for (community_id, members) in clusters.iter().enumerate() {
        for &id in members {
            owner.insert(id, community_id);
        }
    }
    let mut internal_edges = vec![0usize; clusters.len()];
    let mut internal_weight = vec![0usize; clusters.len()];
    for edge in snapshot.edges() {
        if let (Some(&a), Some(&b)) = (owner.get(&edge.entity_a), owner.get(&edge.entity_b)) {
            if a == b {
                internal_edges[a] += 1;
                internal_weight[a] += edge.weight;
            }
        }
    }

    clusters
        .iter()
        .enumerate()
        .map(|(community_id, members)| {
            let size = members.len();
            let density = if size > 1 {
                (2 * internal_edges[community_id]) as f64 / (size * (size - 1)) as f64
            } else {
                0.0
            };
            Community {
                community_id,
                members: members.clone(),
                size,
                density,
                internal_weight: internal_weight[community_id],
            }
        })
        .collect()
}
