use crate::config::TreeConfig;
use crate::error::LayoutError;
use skein_data::{Tree, VertexId};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Deterministic two-pass tree layout (Reingold-Tilford with the
/// Buchheim/Walker linear-time refinement).
///
/// Synchronous and single-threaded: no scheduler, no guard. All per-pass
/// bookkeeping lives in a slot arena indexed by `usize`, so the contour
/// `thread` and `ancestor` links of the classic algorithm are plain
/// indices instead of aliased node pointers.
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    pub config: TreeConfig,
}

impl TreeLayout {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    /// Assign coordinates to every reachable, non-pinned vertex of `tree`.
    ///
    /// Only the first discovered root is laid out; additional roots are a
    /// documented upstream limitation and are reported with a warning.
    /// Child links without a matching vertex are walked as sentinel
    /// leaves, so a defective snapshot still lays out.
    pub fn layout(&self, tree: &mut Tree) -> Result<(), LayoutError> {
        let roots = tree.roots();
        let Some(&root) = roots.first() else {
            if tree.vertex_count() == 0 {
                debug!("Empty tree, nothing to lay out");
                return Ok(());
            }
            return Err(LayoutError::NoRoot);
        };
        if roots.len() > 1 {
            warn!(
                ignored = ?&roots[1..],
                "Tree has multiple roots; only the first is laid out"
            );
        }

        let mut arena = Arena::build(tree, root, &self.config)?;
        arena.first_walk(0);
        arena.second_walk(0, 0.0, 0);

        // Canvas-origin normalization: no vertex may end up left of the
        // origin.
        let min_x = arena
            .slots
            .iter()
            .map(|slot| slot.x)
            .fold(f64::INFINITY, f64::min);
        let offset = if min_x < 0.0 {
            -min_x + self.config.margin
        } else {
            0.0
        };

        for slot in &arena.slots {
            let Some(id) = slot.vertex else {
                continue; // sentinel leaf
            };
            let Some(vertex) = tree.vertex_mut(id) else {
                continue;
            };
            if vertex.pinned {
                continue;
            }
            vertex.x = slot.x + offset;
            vertex.y = slot.y;
            vertex.stable = true;
        }

        debug!(
            vertices = arena.slots.len(),
            root = root.0,
            "Tree layout done"
        );
        Ok(())
    }
}

/// Per-pass bookkeeping for one tree vertex. Discarded with the arena when
/// the pass ends.
#[derive(Debug)]
struct Slot {
    /// `None` marks a sentinel leaf substituted for a dangling child id.
    vertex: Option<VertexId>,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Position among the siblings, leftmost first.
    number: usize,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
    thread: Option<usize>,
    ancestor: usize,
    x: f64,
    y: f64,
}

struct Arena<'a> {
    slots: Vec<Slot>,
    config: &'a TreeConfig,
}

impl<'a> Arena<'a> {
    fn build(tree: &Tree, root: VertexId, config: &'a TreeConfig) -> Result<Self, LayoutError> {
        let mut arena = Self {
            slots: Vec::with_capacity(tree.vertex_count()),
            config,
        };
        let mut visited = HashSet::new();
        arena.add(tree, root, None, 0, &mut visited)?;
        Ok(arena)
    }

    fn add(
        &mut self,
        tree: &Tree,
        id: VertexId,
        parent: Option<usize>,
        number: usize,
        visited: &mut HashSet<VertexId>,
    ) -> Result<usize, LayoutError> {
        let exists = tree.vertex(id).is_some();
        if exists && !visited.insert(id) {
            return Err(LayoutError::CyclicLink(id));
        }
        if !exists {
            warn!("Child {id:?} has no vertex, substituting a sentinel leaf");
        }

        let slot = self.slots.len();
        self.slots.push(Slot {
            vertex: exists.then_some(id),
            parent,
            children: Vec::new(),
            number,
            prelim: 0.0,
            modifier: 0.0,
            change: 0.0,
            shift: 0.0,
            thread: None,
            ancestor: slot,
            x: 0.0,
            y: 0.0,
        });

        if exists {
            for (number, child) in tree.children(id).into_iter().enumerate() {
                let child_slot = self.add(tree, child, Some(slot), number, visited)?;
                self.slots[slot].children.push(child_slot);
            }
        }
        Ok(slot)
    }

    /// Post-order walk computing preliminary positions and modifiers.
    fn first_walk(&mut self, v: usize) {
        if self.slots[v].children.is_empty() {
            self.slots[v].prelim = match self.left_sibling(v) {
                Some(w) => self.slots[w].prelim + self.config.sibling_distance,
                None => 0.0,
            };
            return;
        }

        let children = self.slots[v].children.clone();
        let mut default_ancestor = children[0];
        for &w in &children {
            self.first_walk(w);
            default_ancestor = self.apportion(w, default_ancestor);
        }
        self.execute_shifts(v);

        let first = *children.first().expect("internal node has children");
        let last = *children.last().expect("internal node has children");
        let midpoint = (self.slots[first].prelim + self.slots[last].prelim) / 2.0;

        if let Some(w) = self.left_sibling(v) {
            self.slots[v].prelim = self.slots[w].prelim + self.config.sibling_distance;
            self.slots[v].modifier = self.slots[v].prelim - midpoint;
        } else {
            self.slots[v].prelim = midpoint;
        }
    }

    /// Resolve collisions between the subtree rooted at `v` and its left
    /// siblings by walking the inside and outside contours in lockstep.
    fn apportion(&mut self, v: usize, mut default_ancestor: usize) -> usize {
        let Some(w) = self.left_sibling(v) else {
            return default_ancestor;
        };

        // Inside/outside contour cursors: `ip`/`op` walk the right
        // subtree, `im`/`om` the left one.
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.leftmost_sibling(v);

        let mut sip = self.slots[vip].modifier;
        let mut sop = self.slots[vop].modifier;
        let mut sim = self.slots[vim].modifier;
        let mut som = self.slots[vom].modifier;

        loop {
            let (Some(next_im), Some(next_ip)) = (self.next_right(vim), self.next_left(vip))
            else {
                break;
            };
            vim = next_im;
            vip = next_ip;
            vom = self
                .next_left(vom)
                .expect("left outside contour ended before the inside walk");
            vop = self
                .next_right(vop)
                .expect("right outside contour ended before the inside walk");

            self.slots[vop].ancestor = v;
            let shift = (self.slots[vim].prelim + sim) - (self.slots[vip].prelim + sip)
                + self.config.sibling_distance;
            if shift > 0.0 {
                let ancestor = self.ancestor_or_default(vim, v, default_ancestor);
                self.move_subtree(ancestor, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.slots[vim].modifier;
            sip += self.slots[vip].modifier;
            som += self.slots[vom].modifier;
            sop += self.slots[vop].modifier;
        }

        if self.next_right(vim).is_some() && self.next_right(vop).is_none() {
            self.slots[vop].thread = self.next_right(vim);
            self.slots[vop].modifier += sim - sop;
        }
        if self.next_left(vip).is_some() && self.next_left(vom).is_none() {
            self.slots[vom].thread = self.next_left(vip);
            self.slots[vom].modifier += sip - som;
            default_ancestor = v;
        }
        default_ancestor
    }

    /// Shift the subtree rooted at `wp` right by `shift`, spreading the
    /// move evenly across the subtrees between `wm` and `wp` through the
    /// change/shift accumulators.
    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = (self.slots[wp].number - self.slots[wm].number) as f64;
        self.slots[wp].change -= shift / subtrees;
        self.slots[wp].shift += shift;
        self.slots[wm].change += shift / subtrees;
        self.slots[wp].prelim += shift;
        self.slots[wp].modifier += shift;
    }

    /// Apply the accumulated shifts to the children of `v`, right to left.
    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for &w in self.slots[v].children.clone().iter().rev() {
            self.slots[w].prelim += shift;
            self.slots[w].modifier += shift;
            change += self.slots[w].change;
            shift += self.slots[w].shift + change;
        }
    }

    /// The recorded ancestor of `vim` if it is a sibling of `v`, else the
    /// default ancestor.
    fn ancestor_or_default(&self, vim: usize, v: usize, default_ancestor: usize) -> usize {
        let ancestor = self.slots[vim].ancestor;
        if self.slots[ancestor].parent == self.slots[v].parent {
            ancestor
        } else {
            default_ancestor
        }
    }

    /// Pre-order walk resolving final coordinates from the preliminary
    /// position and the accumulated modifiers along the path to the root.
    fn second_walk(&mut self, v: usize, modsum: f64, depth: usize) {
        self.slots[v].x = self.slots[v].prelim + modsum;
        self.slots[v].y =
            (depth + 1) as f64 * self.config.level_distance + self.config.margin;

        let modsum = modsum + self.slots[v].modifier;
        for w in self.slots[v].children.clone() {
            self.second_walk(w, modsum, depth + 1);
        }
    }

    /// Next vertex on the left contour: first child, or the thread.
    fn next_left(&self, v: usize) -> Option<usize> {
        self.slots[v].children.first().copied().or(self.slots[v].thread)
    }

    /// Next vertex on the right contour: last child, or the thread.
    fn next_right(&self, v: usize) -> Option<usize> {
        self.slots[v].children.last().copied().or(self.slots[v].thread)
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let parent = self.slots[v].parent?;
        let number = self.slots[v].number;
        (number > 0).then(|| self.slots[parent].children[number - 1])
    }

    fn leftmost_sibling(&self, v: usize) -> usize {
        match self.slots[v].parent {
            Some(parent) => self.slots[parent].children[0],
            None => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use skein_data::Vertex;
    use test_log::test;

    fn tree_with(ids: &[u64], links: &[(u64, u64)]) -> Tree {
        let mut tree = Tree::new(1);
        for &id in ids {
            tree.insert_vertex(Vertex::new(VertexId(id), format!("v{id}")))
                .unwrap();
        }
        for &(parent, child) in links {
            tree.attach(VertexId(parent), VertexId(child));
        }
        tree
    }

    fn x(tree: &Tree, id: u64) -> f64 {
        tree.vertex(VertexId(id)).unwrap().x
    }

    fn y(tree: &Tree, id: u64) -> f64 {
        tree.vertex(VertexId(id)).unwrap().y
    }

    #[test]
    fn root_with_two_leaves() {
        let mut tree = tree_with(&[1, 2, 3], &[(1, 2), (1, 3)]);
        let layout = TreeLayout::default();
        layout.layout(&mut tree).unwrap();

        let cfg = &layout.config;
        // Children sit one sibling distance apart, the root centered above.
        assert_eq!(x(&tree, 3) - x(&tree, 2), cfg.sibling_distance);
        assert_eq!(x(&tree, 1), (x(&tree, 2) + x(&tree, 3)) / 2.0);
        assert_eq!(y(&tree, 1), cfg.level_distance + cfg.margin);
        assert_eq!(y(&tree, 2), 2.0 * cfg.level_distance + cfg.margin);
        assert_eq!(y(&tree, 3), 2.0 * cfg.level_distance + cfg.margin);
        assert!(tree.vertices().all(|v| v.stable));
    }

    /// Complete binary tree on ids 1..=15, children of `i` are `2i` and
    /// `2i + 1`.
    fn complete_binary() -> Tree {
        let ids: Vec<u64> = (1..=15).collect();
        let links: Vec<(u64, u64)> = (1..=7u64).flat_map(|i| [(i, 2 * i), (i, 2 * i + 1)]).collect();
        tree_with(&ids, &links)
    }

    #[test]
    fn siblings_never_overlap() {
        let mut tree = complete_binary();
        let layout = TreeLayout::default();
        layout.layout(&mut tree).unwrap();

        for parent in 1..=7u64 {
            let (left, right) = (2 * parent, 2 * parent + 1);
            assert!(
                x(&tree, right) >= x(&tree, left) + layout.config.sibling_distance - 1e-9,
                "children of {parent} overlap: {} vs {}",
                x(&tree, left),
                x(&tree, right)
            );
        }
    }

    #[test]
    fn parents_are_centered_over_their_children() {
        let mut tree = complete_binary();
        let layout = TreeLayout::default();
        layout.layout(&mut tree).unwrap();

        for parent in 1..=7u64 {
            let midpoint = (x(&tree, 2 * parent) + x(&tree, 2 * parent + 1)) / 2.0;
            assert!(
                approx_eq!(f64, x(&tree, parent), midpoint, epsilon = 1e-9),
                "{parent} not centered"
            );
        }
    }

    #[test]
    fn layout_is_bit_exact_deterministic() {
        let run = || {
            let mut tree = complete_binary();
            TreeLayout::default().layout(&mut tree).unwrap();
            tree.vertices().map(|v| (v.id, v.x, v.y)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn coordinates_stay_on_canvas() {
        // Left-heavy and ragged on purpose.
        let mut tree = tree_with(
            &[1, 2, 3, 4, 5, 6, 7, 8, 9],
            &[
                (1, 2),
                (1, 3),
                (2, 4),
                (2, 5),
                (4, 6),
                (4, 7),
                (5, 8),
                (3, 9),
            ],
        );
        TreeLayout::default().layout(&mut tree).unwrap();
        assert!(tree.vertices().all(|v| v.x >= 0.0 && v.y >= 0.0));
    }

    #[test]
    fn dangling_child_becomes_a_sentinel_leaf() {
        // Child 99 is declared but has no vertex.
        let mut tree = tree_with(&[1, 2], &[(1, 99), (1, 2)]);
        let layout = TreeLayout::default();
        layout.layout(&mut tree).unwrap();

        // The sentinel still occupies a slot, so the real child sits one
        // sibling distance to the right of it and the root is centered.
        assert_eq!(x(&tree, 2), layout.config.sibling_distance);
        assert_eq!(x(&tree, 1), layout.config.sibling_distance / 2.0);
    }

    #[test]
    fn only_the_first_root_is_laid_out() {
        let mut tree = tree_with(&[1, 2, 7], &[(1, 2)]);
        TreeLayout::default().layout(&mut tree).unwrap();

        assert!(tree.vertex(VertexId(1)).unwrap().stable);
        let stray = tree.vertex(VertexId(7)).unwrap();
        assert!(!stray.stable);
        assert_eq!((stray.x, stray.y), (0.0, 0.0));
    }

    #[test]
    fn pinned_vertices_keep_their_coordinates() {
        let mut tree = tree_with(&[1, 3], &[(1, 2), (1, 3)]);
        tree.insert_vertex(Vertex::pinned_at(VertexId(2), "pinned", 5.5, 6.5))
            .unwrap();
        TreeLayout::default().layout(&mut tree).unwrap();

        let pinned = tree.vertex(VertexId(2)).unwrap();
        assert_eq!((pinned.x, pinned.y), (5.5, 6.5));
        assert!(tree.vertex(VertexId(3)).unwrap().stable);
    }

    #[test]
    fn chains_stack_level_by_level() {
        let mut tree = tree_with(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4)]);
        let layout = TreeLayout::default();
        layout.layout(&mut tree).unwrap();

        for (depth, id) in [1u64, 2, 3, 4].iter().enumerate() {
            assert_eq!(x(&tree, *id), 0.0);
            assert_eq!(
                y(&tree, *id),
                (depth + 1) as f64 * layout.config.level_distance + layout.config.margin
            );
        }
    }

    #[test]
    fn cyclic_links_are_rejected() {
        let mut tree = tree_with(&[1, 2, 3], &[(1, 2), (2, 3), (3, 2)]);
        let err = TreeLayout::default().layout(&mut tree).unwrap_err();
        assert_eq!(err, LayoutError::CyclicLink(VertexId(2)));
    }

    #[test]
    fn a_tree_without_roots_is_an_error() {
        // Two vertices pointing at each other: no vertex is parentless.
        let mut tree = tree_with(&[1, 2], &[(1, 2), (2, 1)]);
        assert_eq!(
            TreeLayout::default().layout(&mut tree).unwrap_err(),
            LayoutError::NoRoot
        );

        let mut empty = Tree::new(9);
        assert!(TreeLayout::default().layout(&mut empty).is_ok());
    }
}
