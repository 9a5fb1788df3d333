//! Category tree assembly and ancestor/descendant queries.
//!
//! # Responsibility
//! - Convert the flat category list into an ordered forest of nodes.
//! - Answer containment queries (`is_descendant`, `descendant_ids`).
//!
//! # Invariants
//! - Child order is deterministic: `sort_order ASC, id ASC`.
//! - The forest is derived and ephemeral; it is rebuilt from the flat list
//!   on every structural change, never patched incrementally.
//! - Rows stranded by a dangling or cyclic parent link are reported through
//!   `orphaned_ids` instead of being silently dropped or looped over.

use crate::model::category::{Category, CategoryId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One category plus its ordered children, ready for tree rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryTreeNode>,
}

/// Derived view over the flat category list.
///
/// Holds the assembled root nodes together with the parent/child indexes
/// the containment queries run against.
#[derive(Debug, Clone)]
pub struct CategoryForest {
    roots: Vec<CategoryTreeNode>,
    parents: BTreeMap<CategoryId, Option<CategoryId>>,
    children_index: BTreeMap<CategoryId, Vec<CategoryId>>,
    orphaned: Vec<CategoryId>,
}

impl CategoryForest {
    /// Builds the forest in a single pass over the flat list plus one
    /// depth-first assembly from the roots.
    pub fn build(categories: &[Category]) -> Self {
        let mut by_id: BTreeMap<CategoryId, &Category> = BTreeMap::new();
        for category in categories {
            by_id.insert(category.id, category);
        }

        let mut parents = BTreeMap::new();
        let mut children_index: BTreeMap<CategoryId, Vec<CategoryId>> = BTreeMap::new();
        let mut root_ids = Vec::new();
        for category in by_id.values() {
            parents.insert(category.id, category.parent_id);
            match category.parent_id {
                None => root_ids.push(category.id),
                Some(parent_id) if parent_id != category.id && by_id.contains_key(&parent_id) => {
                    children_index.entry(parent_id).or_default().push(category.id);
                }
                // Dangling or self-referential parent link; the row surfaces
                // through `orphaned_ids` after assembly.
                Some(_) => {}
            }
        }

        let order_key = |id: &CategoryId| (by_id[id].sort_order, *id);
        root_ids.sort_by_key(order_key);
        for child_ids in children_index.values_mut() {
            child_ids.sort_by_key(order_key);
        }

        let mut reached = HashSet::new();
        let roots = root_ids
            .iter()
            .map(|id| assemble(*id, &by_id, &children_index, &mut reached))
            .collect();

        // Cycle members are never reachable from a root: every node on the
        // cycle has its single parent link inside the cycle.
        let orphaned = by_id
            .keys()
            .copied()
            .filter(|id| !reached.contains(id))
            .collect();

        Self {
            roots,
            parents,
            children_index,
            orphaned,
        }
    }

    /// Ordered root nodes.
    pub fn roots(&self) -> &[CategoryTreeNode] {
        &self.roots
    }

    /// Consumes the forest, returning the ordered root nodes.
    pub fn into_roots(self) -> Vec<CategoryTreeNode> {
        self.roots
    }

    /// Every category id known to the forest, ascending.
    pub fn category_ids(&self) -> impl Iterator<Item = CategoryId> + '_ {
        self.parents.keys().copied()
    }

    /// Returns whether the forest knows the given id.
    pub fn contains(&self, id: CategoryId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Ids whose parent link points nowhere valid (dangling reference or a
    /// corrupt parent cycle). Empty on well-formed data.
    pub fn orphaned_ids(&self) -> &[CategoryId] {
        &self.orphaned
    }

    /// True iff `candidate` is reachable from `ancestor` by following child
    /// links, including `candidate == ancestor`.
    ///
    /// Implemented as a parent-chain walk from `candidate`; a visited set
    /// guards against corrupt cycles in persisted data.
    pub fn is_descendant(&self, candidate: CategoryId, ancestor: CategoryId) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(candidate);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current) {
                return false;
            }
            cursor = self.parents.get(&current).copied().flatten();
        }
        false
    }

    /// The id plus every transitive child id.
    pub fn descendant_ids(&self, id: CategoryId) -> BTreeSet<CategoryId> {
        let mut result = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !result.insert(current) {
                continue;
            }
            if let Some(child_ids) = self.children_index.get(&current) {
                stack.extend(child_ids.iter().copied());
            }
        }
        result
    }

    /// Restartable depth-first traversal over all assembled nodes.
    pub fn walk(&self) -> TreeWalk<'_> {
        TreeWalk {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Reduces the assembled tree back to `(id, parent_id)` pairs.
    pub fn flatten(&self) -> Vec<(CategoryId, Option<CategoryId>)> {
        self.walk()
            .map(|node| (node.category.id, node.category.parent_id))
            .collect()
    }
}

fn assemble(
    id: CategoryId,
    by_id: &BTreeMap<CategoryId, &Category>,
    children_index: &BTreeMap<CategoryId, Vec<CategoryId>>,
    reached: &mut HashSet<CategoryId>,
) -> CategoryTreeNode {
    reached.insert(id);
    let children = children_index
        .get(&id)
        .map(|child_ids| {
            child_ids
                .iter()
                .map(|child_id| assemble(*child_id, by_id, children_index, reached))
                .collect()
        })
        .unwrap_or_default();

    CategoryTreeNode {
        category: by_id[&id].clone(),
        children,
    }
}

/// Depth-first, pre-order iterator over forest nodes.
pub struct TreeWalk<'forest> {
    stack: Vec<&'forest CategoryTreeNode>,
}

impl<'forest> Iterator for TreeWalk<'forest> {
    type Item = &'forest CategoryTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
