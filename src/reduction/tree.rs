// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Series/parallel tree folding, for remnants with no path back to the
//! main source bus.

use std::collections::HashSet;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::graph::{undirected_neighbors, EquivalentGraph};
use crate::{Error, Impedance, PhaseMap};

/// A node of the equivalence tree, stored in an arena indexed by `usize`.
struct TreeNode {
    bus: NodeIndex,
    /// The branch connecting this node to its parent; `None` only for the
    /// boundary bus at the arena root.
    parent_branch: Option<EdgeIndex>,
    children: Vec<usize>,
}

/// Folds a pure remnant into its equivalent impedance, seen from the
/// boundary bus.
///
/// At every bus, the impedance looking outward is the bus's own shunt
/// impedance in parallel with, for every child, the series combination of
/// the connecting branch impedance and the child's folded equivalent. The
/// boundary bus contributes no shunt of its own. Phases absent on either
/// side of a combination pass the other side through unchanged.
///
/// Returns an error if the remnant still contains the main source bus;
/// folding cannot account for the path back to the supply.
pub fn fold_remnant(equivalent: &EquivalentGraph) -> Result<PhaseMap<Impedance>, Error> {
    if equivalent.contains_source() {
        return Err(Error::invalid_graph(
            "Can't fold a remnant that contains the main source bus.",
        ));
    }

    let arena = build_tree(equivalent)?;

    // Children always sit after their parent in the arena, so one reverse
    // sweep folds the whole tree from the leaves inward.
    let mut folded: Vec<Option<PhaseMap<Impedance>>> = (0..arena.len()).map(|_| None).collect();
    for i in (0..arena.len()).rev() {
        let own = if i == 0 {
            PhaseMap::new()
        } else {
            equivalent.graph[arena[i].bus].shunt.clone()
        };

        let mut combined = Vec::new();
        for &child in &arena[i].children {
            let Some(edge) = arena[child].parent_branch else {
                return Err(Error::internal("Tree child without a parent branch."));
            };
            let Some(child_equivalent) = folded[child].take() else {
                return Err(Error::internal("Tree child folded out of order."));
            };
            combined.push(equivalent.graph[edge].series.series(&child_equivalent));
        }

        folded[i] = Some(if combined.is_empty() {
            own
        } else {
            combined.push(own);
            let mut accumulated = combined[0].clone();
            for item in &combined[1..] {
                accumulated = accumulated.parallel(item);
            }
            accumulated
        });
    }

    folded[0]
        .take()
        .ok_or_else(|| Error::internal("Equivalence tree without a root."))
}

/// Builds the arena-indexed equivalence tree by breadth-first descent from
/// the boundary bus, visiting neighbors in lexicographic code order.
fn build_tree(equivalent: &EquivalentGraph) -> Result<Vec<TreeNode>, Error> {
    let root = equivalent
        .node_indices
        .get(&equivalent.boundary_bus)
        .copied()
        .ok_or_else(|| Error::internal("Equivalent graph without its boundary bus."))?;

    let mut arena = vec![TreeNode {
        bus: root,
        parent_branch: None,
        children: Vec::new(),
    }];
    let mut visited: HashSet<NodeIndex> = HashSet::from([root]);
    let mut cursor = 0;
    while cursor < arena.len() {
        let bus = arena[cursor].bus;
        let mut neighbors: Vec<(NodeIndex, EdgeIndex)> =
            undirected_neighbors(&equivalent.graph, bus)
                .filter(|(v, _)| !visited.contains(v))
                .collect();
        neighbors.sort_by(|(a, _), (b, _)| {
            equivalent.graph[*a].code.cmp(&equivalent.graph[*b].code)
        });

        for (v, edge) in neighbors {
            if !visited.insert(v) {
                continue;
            }
            arena.push(TreeNode {
                bus: v,
                parent_branch: Some(edge),
                children: Vec::new(),
            });
            let child = arena.len() - 1;
            arena[cursor].children.push(child);
        }
        cursor += 1;
    }

    Ok(arena)
}
