//! Mind-map tree layout.
//!
//! Rebuilds the parent/child forest from a flat idea list and assigns every
//! node a rectangle. Siblings get disjoint horizontal slices sized by their
//! subtree widths; pinned positions are honored when they do not break that
//! guarantee.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::config::LayoutConfig;
use crate::model::idea::{Idea, Placement};

/// Screen rectangle computed for one idea
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodePosition {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the horizontal extents of two rectangles intersect
    pub fn overlaps_x(&self, other: &NodePosition) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

/// An idea together with its resolved children
#[derive(Debug)]
pub struct TreeNode<'a> {
    pub idea: &'a Idea,
    pub children: Vec<TreeNode<'a>>,
}

impl TreeNode<'_> {
    /// Number of nodes in this subtree, including itself
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_len).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Tree construction
// ---------------------------------------------------------------------------

/// Build the forest of ideas.
///
/// Children keep their input order. An idea whose parent is not in `ideas`
/// becomes a root. Ideas caught in a parent cycle (never reachable from a
/// root) are promoted to roots in input order so that every idea appears
/// exactly once.
pub fn build_tree(ideas: &[Idea]) -> Vec<TreeNode<'_>> {
    let index: HashMap<&str, usize> = ideas
        .iter()
        .enumerate()
        .map(|(i, idea)| (idea.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); ideas.len()];
    let mut roots = Vec::new();
    for (i, idea) in ideas.iter().enumerate() {
        match idea.parent_id.as_deref().and_then(|p| index.get(p)) {
            Some(&parent) => children[parent].push(i),
            None => {
                if let Some(parent) = &idea.parent_id {
                    tracing::debug!(id = %idea.id, parent = %parent, "parent not found, treating idea as root");
                }
                roots.push(i);
            }
        }
    }

    let mut visited = vec![false; ideas.len()];
    let mut forest: Vec<TreeNode<'_>> = roots
        .into_iter()
        .map(|i| attach(i, ideas, &children, &mut visited))
        .collect();

    for i in 0..ideas.len() {
        if !visited[i] {
            tracing::warn!(id = %ideas[i].id, "idea is part of a parent cycle, laying it out as a root");
            forest.push(attach(i, ideas, &children, &mut visited));
        }
    }
    forest
}

fn attach<'a>(
    i: usize,
    ideas: &'a [Idea],
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> TreeNode<'a> {
    visited[i] = true;
    let mut kids = Vec::with_capacity(children[i].len());
    for &child in &children[i] {
        if !visited[child] {
            kids.push(attach(child, ideas, children, visited));
        }
    }
    TreeNode {
        idea: &ideas[i],
        children: kids,
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Minimum horizontal span for `node` and all of its descendants
pub fn subtree_width(node: &TreeNode<'_>, settings: &LayoutConfig) -> f64 {
    measure(node, settings, &mut HashMap::new())
}

/// Post-order pass recording the subtree width of every node in `widths`
fn measure<'a>(node: &TreeNode<'a>, settings: &LayoutConfig, widths: &mut HashMap<&'a str, f64>) -> f64 {
    let width = if node.children.is_empty() {
        settings.node_width
    } else {
        let total: f64 = node.children.iter().map(|c| measure(c, settings, widths)).sum();
        let gaps = settings.horizontal_gap * node.children.len().saturating_sub(1) as f64;
        (total + gaps).max(settings.node_width)
    };
    widths.insert(node.idea.id.as_str(), width);
    width
}

/// Precomputed subtree widths, keyed by idea id
struct Widths<'a>(HashMap<&'a str, f64>);

impl<'a> Widths<'a> {
    fn of_forest(forest: &[TreeNode<'a>], settings: &LayoutConfig) -> Self {
        let mut widths = HashMap::new();
        for root in forest {
            measure(root, settings, &mut widths);
        }
        Widths(widths)
    }

    fn get(&self, node: &TreeNode<'_>, settings: &LayoutConfig) -> f64 {
        self.0
            .get(node.idea.id.as_str())
            .copied()
            .unwrap_or(settings.node_width)
    }

    fn group(&self, nodes: &[TreeNode<'_>], gap: f64, settings: &LayoutConfig) -> f64 {
        let total: f64 = nodes.iter().map(|n| self.get(n, settings)).sum();
        total + gap * nodes.len().saturating_sub(1) as f64
    }
}

/// Compute a rectangle for every idea, keyed by id in input order.
///
/// Pinned roots sit at their pins. The remaining roots are laid out side by
/// side from the top-left margin.
pub fn calculate_layout(ideas: &[Idea], settings: &LayoutConfig) -> IndexMap<String, NodePosition> {
    let forest = build_tree(ideas);
    let widths = Widths::of_forest(&forest, settings);
    let mut placed: HashMap<&str, NodePosition> = HashMap::with_capacity(ideas.len());

    let mut slice_left = settings.margin_x;
    for root in &forest {
        match root.idea.placement {
            Placement::Pinned { x, y } => place_node(root, x, y, settings, &widths, &mut placed),
            Placement::Auto => {
                let slice_width = widths.get(root, settings);
                let x = slice_left + (slice_width - settings.node_width) / 2.0;
                place_node(root, x, settings.margin_y, settings, &widths, &mut placed);
                slice_left += slice_width + settings.root_gap;
            }
        }
    }

    tracing::debug!(ideas = ideas.len(), roots = forest.len(), "computed mind-map layout");

    ideas
        .iter()
        .filter_map(|idea| {
            placed
                .get(idea.id.as_str())
                .map(|pos| (idea.id.clone(), *pos))
        })
        .collect()
}

/// Lay out the children of one node, whose slices start at `left`.
///
/// When every child is pinned the pins are used as-is. Otherwise a pin is
/// honored only if the child fits inside its own slice.
fn place_children<'a>(
    nodes: &[TreeNode<'a>],
    left: f64,
    y: f64,
    settings: &LayoutConfig,
    widths: &Widths<'_>,
    placed: &mut HashMap<&'a str, NodePosition>,
) {
    let all_pinned = !nodes.is_empty() && nodes.iter().all(|n| n.idea.placement.is_pinned());
    let mut slice_left = left;

    for node in nodes {
        let slice_width = widths.get(node, settings);
        let auto_x = slice_left + (slice_width - settings.node_width) / 2.0;

        let (x, node_y) = match node.idea.placement {
            Placement::Pinned { x, y: pinned_y }
                if all_pinned || fits_slice(x, slice_left, slice_width, settings) =>
            {
                (x, pinned_y)
            }
            _ => (auto_x, y),
        };

        place_node(node, x, node_y, settings, widths, placed);
        slice_left += slice_width + settings.horizontal_gap;
    }
}

fn fits_slice(x: f64, slice_left: f64, slice_width: f64, settings: &LayoutConfig) -> bool {
    x >= slice_left && x + settings.node_width <= slice_left + slice_width
}

fn place_node<'a>(
    node: &TreeNode<'a>,
    x: f64,
    y: f64,
    settings: &LayoutConfig,
    widths: &Widths<'_>,
    placed: &mut HashMap<&'a str, NodePosition>,
) {
    placed.insert(
        node.idea.id.as_str(),
        NodePosition {
            x,
            y,
            width: settings.node_width,
            height: settings.node_height,
        },
    );

    if node.children.is_empty() {
        return;
    }

    let width = widths.group(&node.children, settings.horizontal_gap, settings);
    let left = x + settings.node_width / 2.0 - width / 2.0;
    let child_y = y + settings.node_height + settings.vertical_gap;
    place_children(&node.children, left, child_y, settings, widths, placed);
}

/// Spot for a new root idea: one slot to the right of the right-most pinned
/// node, at the top margin.
pub fn next_free_position(ideas: &[Idea], settings: &LayoutConfig) -> (f64, f64) {
    if ideas.is_empty() {
        return (settings.margin_x, settings.margin_y);
    }
    let max_x = ideas
        .iter()
        .filter_map(|idea| idea.placement.pinned())
        .map(|(x, _)| x + settings.node_width)
        .fold(settings.margin_x, f64::max);
    (
        max_x + settings.node_width + settings.horizontal_gap,
        settings.margin_y,
    )
}
