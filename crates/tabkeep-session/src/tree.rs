// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tab forest construction from relationship edges.
//!
//! Roots are tabs without a parent inside the considered set. Children are
//! ordered by tab index. Traversal is iterative and tolerates cycles: tabs
//! unreachable from any root are promoted to roots.

use std::collections::{HashMap, HashSet};

use tabkeep_core::TabId;
use tabkeep_core::types::{RelationshipEdge, Tab, TabSnapshot, WindowSnapshot};

/// Anything placeable in a tab forest.
pub trait ForestNode {
    fn node_id(&self) -> TabId;
    fn position(&self) -> u32;
}

impl ForestNode for Tab {
    fn node_id(&self) -> TabId {
        self.id
    }

    fn position(&self) -> u32 {
        self.index
    }
}

impl ForestNode for TabSnapshot {
    fn node_id(&self) -> TabId {
        self.original_id
    }

    fn position(&self) -> u32 {
        self.index
    }
}

/// One visited node in depth-first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestEntry {
    pub id: TabId,
    pub parent: Option<TabId>,
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    pub roots: Vec<TabId>,
    pub children: HashMap<TabId, Vec<TabId>>,
    /// Pre-order walk of every node, each exactly once.
    pub order: Vec<ForestEntry>,
}

impl Forest {
    pub fn children_of(&self, id: TabId) -> &[TabId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn depth_of(&self, id: TabId) -> Option<usize> {
        self.order.iter().find(|e| e.id == id).map(|e| e.depth)
    }
}

/// Builds the forest of `nodes` under `edges`.
///
/// Edges whose parent is outside `nodes` make their child a root.
pub fn build_forest<N: ForestNode>(nodes: &[N], edges: &[RelationshipEdge]) -> Forest {
    let position: HashMap<TabId, u32> = nodes.iter().map(|n| (n.node_id(), n.position())).collect();
    let parent_of: HashMap<TabId, TabId> = edges
        .iter()
        .filter(|e| e.child != e.parent)
        .filter(|e| position.contains_key(&e.child) && position.contains_key(&e.parent))
        .map(|e| (e.child, e.parent))
        .collect();

    let mut sorted: Vec<TabId> = position.keys().copied().collect();
    sorted.sort_by_key(|id| (position[id], *id));

    let mut children: HashMap<TabId, Vec<TabId>> = HashMap::new();
    let mut roots = Vec::new();
    for &id in &sorted {
        match parent_of.get(&id) {
            Some(parent) => children.entry(*parent).or_default().push(id),
            None => roots.push(id),
        }
    }

    let mut visited = HashSet::with_capacity(sorted.len());
    let mut order = Vec::with_capacity(sorted.len());
    walk(&roots, &children, &parent_of, &mut visited, &mut order);

    // Members of a parent cycle are unreachable from any root.
    for &id in &sorted {
        if !visited.contains(&id) {
            roots.push(id);
            walk(&[id], &children, &HashMap::new(), &mut visited, &mut order);
        }
    }

    Forest {
        roots,
        children,
        order,
    }
}

fn walk(
    starts: &[TabId],
    children: &HashMap<TabId, Vec<TabId>>,
    parent_of: &HashMap<TabId, TabId>,
    visited: &mut HashSet<TabId>,
    order: &mut Vec<ForestEntry>,
) {
    let mut stack: Vec<(TabId, Option<TabId>, usize)> = starts
        .iter()
        .rev()
        .map(|&id| (id, parent_of.get(&id).copied(), 0))
        .collect();
    while let Some((id, parent, depth)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        order.push(ForestEntry { id, parent, depth });
        if let Some(kids) = children.get(&id) {
            for &kid in kids.iter().rev() {
                if !visited.contains(&kid) {
                    stack.push((kid, Some(id), depth + 1));
                }
            }
        }
    }
}

/// Relationship edges recorded inside a snapshot.
pub fn snapshot_edges(snapshot: &WindowSnapshot) -> Vec<RelationshipEdge> {
    snapshot
        .tabs
        .iter()
        .filter_map(|t| {
            t.parent_tab_id.map(|parent| RelationshipEdge {
                child: t.original_id,
                parent,
                created_at: snapshot.deactivated_at,
            })
        })
        .collect()
}
