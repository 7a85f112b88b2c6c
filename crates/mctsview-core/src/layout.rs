//! Layered tree layout for the visible part of a cache.
//!
//! Positions come from the Buchheim/Jünger/Leipert refinement of Walker's
//! algorithm, the same tidy-tree drawing used by most tree widgets: parents
//! are centred over their children, subtrees are packed as tightly as the
//! separation function allows, and the result depends only on the shape of
//! the visible tree.

use kurbo::{CubicBez, Point, Rect};

use crate::{
    config::{LayoutConfig, Orientation},
    tree::{cache::TreeCache, ids::NodeId},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedNode {
    pub id: NodeId,
    pub depth: usize,
    /// Center in world coordinates.
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub parent: NodeId,
    pub child: NodeId,
    pub path: CubicBez,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    /// Visible nodes in pre-order; the root comes first at the origin.
    pub nodes: Vec<PlacedNode>,
    pub links: Vec<Link>,
    /// Bounding box of all node centers.
    pub bounds: Rect,
}

impl TreeLayout {
    pub fn position_of(&self, id: NodeId) -> Option<Point> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.position)
    }

    /// Topmost node whose disc of `radius_of(id)` contains `point`.
    pub fn hit_test<F>(&self, point: Point, radius_of: F) -> Option<NodeId>
    where
        F: Fn(NodeId) -> f64,
    {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.position.distance(point) <= radius_of(n.id))
            .map(|n| n.id)
    }
}

/// Per-node working state of the tidy-tree passes.
#[derive(Debug, Clone)]
struct Slot {
    id: NodeId,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Index among siblings.
    index: usize,
    depth: usize,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
    thread: Option<usize>,
    ancestor: usize,
    /// Default ancestor used while apportioning this node's children.
    default_ancestor: Option<usize>,
    x: f64,
}

struct Walker<'a> {
    slots: Vec<Slot>,
    config: &'a LayoutConfig,
}

/// Lay out the visible tree of `cache`.
pub fn layout(cache: &TreeCache, config: &LayoutConfig) -> TreeLayout {
    let mut walker = Walker {
        slots: collect_visible(cache),
        config,
    };
    if walker.slots.is_empty() {
        return TreeLayout::default();
    }
    walker.first_walk_all();
    walker.second_walk_all();
    walker.finish()
}

fn collect_visible(cache: &TreeCache) -> Vec<Slot> {
    let mut slots: Vec<Slot> = Vec::new();
    let mut stack = vec![(cache.root_id(), None::<usize>, 0usize)];
    while let Some((id, parent, depth)) = stack.pop() {
        let Ok(node) = cache.node(id) else {
            continue;
        };
        let slot = slots.len();
        let index = match parent {
            Some(parent) => {
                slots[parent].children.push(slot);
                slots[parent].children.len() - 1
            }
            None => 0,
        };
        slots.push(Slot {
            id,
            parent,
            children: Vec::new(),
            index,
            depth,
            prelim: 0.0,
            modifier: 0.0,
            change: 0.0,
            shift: 0.0,
            thread: None,
            ancestor: slot,
            default_ancestor: None,
            x: 0.0,
        });
        for child in node.children().iter().rev() {
            stack.push((*child, Some(slot), depth + 1));
        }
    }
    slots
}

impl Walker<'_> {
    fn separation(&self, a: usize, b: usize) -> f64 {
        if self.slots[a].parent == self.slots[b].parent {
            self.config.sibling_separation
        } else {
            self.config.cousin_separation
        }
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let slot = &self.slots[v];
        let parent = slot.parent?;
        if slot.index == 0 {
            None
        } else {
            Some(self.slots[parent].children[slot.index - 1])
        }
    }

    fn leftmost_sibling(&self, v: usize) -> usize {
        match self.slots[v].parent {
            Some(parent) => self.slots[parent].children[0],
            None => v,
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.slots[v].children.first().copied().or(self.slots[v].thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.slots[v].children.last().copied().or(self.slots[v].thread)
    }

    /// Post-order with siblings left to right, so a node's left sibling and
    /// all of its own subtree are placed before it.
    fn first_walk_all(&mut self) {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut stack = vec![(0usize, false)];
        while let Some((v, children_done)) = stack.pop() {
            if children_done {
                order.push(v);
                continue;
            }
            stack.push((v, true));
            for &child in self.slots[v].children.iter().rev() {
                stack.push((child, false));
            }
        }
        for v in order {
            self.first_walk(v);
        }
    }

    fn first_walk(&mut self, v: usize) {
        let w = self.left_sibling(v);
        if self.slots[v].children.is_empty() {
            if let Some(w) = w {
                self.slots[v].prelim = self.slots[w].prelim + self.separation(v, w);
            }
        } else {
            self.execute_shifts(v);
            let first = self.slots[v].children[0];
            let last = self.slots[v].children[self.slots[v].children.len() - 1];
            let midpoint = (self.slots[first].prelim + self.slots[last].prelim) / 2.0;
            match w {
                Some(w) => {
                    self.slots[v].prelim = self.slots[w].prelim + self.separation(v, w);
                    self.slots[v].modifier = self.slots[v].prelim - midpoint;
                }
                None => self.slots[v].prelim = midpoint,
            }
        }
        if let Some(parent) = self.slots[v].parent {
            let ancestor = self.slots[parent]
                .default_ancestor
                .unwrap_or_else(|| self.leftmost_sibling(v));
            let ancestor = self.apportion(v, w, ancestor);
            self.slots[parent].default_ancestor = Some(ancestor);
        }
    }

    fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = w else {
            return ancestor;
        };
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.leftmost_sibling(v);
        let mut sip = self.slots[vip].modifier;
        let mut sop = self.slots[vop].modifier;
        let mut sim = self.slots[vim].modifier;
        let mut som = self.slots[vom].modifier;

        loop {
            let (Some(next_vim), Some(next_vip)) = (self.next_right(vim), self.next_left(vip))
            else {
                break;
            };
            vim = next_vim;
            vip = next_vip;
            vom = match self.next_left(vom) {
                Some(next) => next,
                None => break,
            };
            vop = match self.next_right(vop) {
                Some(next) => next,
                None => break,
            };
            self.slots[vop].ancestor = v;
            let shift = self.slots[vim].prelim + sim - self.slots[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.slots[vim].modifier;
            sip += self.slots[vip].modifier;
            som += self.slots[vom].modifier;
            sop += self.slots[vop].modifier;
        }

        if self.next_right(vim).is_some() && self.next_right(vop).is_none() {
            let target = self.next_right(vim);
            self.slots[vop].thread = target;
            self.slots[vop].modifier += sim - sop;
        }
        if self.next_left(vip).is_some() && self.next_left(vom).is_none() {
            let target = self.next_left(vip);
            self.slots[vom].thread = target;
            self.slots[vom].modifier += sip - som;
            ancestor = v;
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.slots[vim].ancestor;
        if self.slots[candidate].parent == self.slots[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = (self.slots[wp].index as f64 - self.slots[wm].index as f64).max(1.0);
        let change = shift / subtrees;
        self.slots[wp].change -= change;
        self.slots[wp].shift += shift;
        self.slots[wm].change += change;
        self.slots[wp].prelim += shift;
        self.slots[wp].modifier += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        let children = self.slots[v].children.clone();
        for &w in children.iter().rev() {
            let slot = &mut self.slots[w];
            slot.prelim += shift;
            slot.modifier += shift;
            change += slot.change;
            shift += slot.shift + change;
        }
    }

    /// Pre-order: parents are final before their children read them.
    fn second_walk_all(&mut self) {
        for v in 0..self.slots.len() {
            let parent_modifier = match self.slots[v].parent {
                Some(parent) => self.slots[parent].modifier,
                None => -self.slots[v].prelim,
            };
            let slot = &mut self.slots[v];
            slot.x = slot.prelim + parent_modifier;
            slot.modifier += parent_modifier;
        }
    }

    fn finish(self) -> TreeLayout {
        let config = self.config;
        let place = |slot: &Slot| {
            let breadth = slot.x * config.node_spacing;
            let depth = slot.depth as f64 * config.level_spacing;
            match config.orientation {
                Orientation::Vertical => Point::new(breadth, depth),
                Orientation::Horizontal => Point::new(depth, breadth),
            }
        };

        let nodes: Vec<PlacedNode> = self
            .slots
            .iter()
            .map(|slot| PlacedNode {
                id: slot.id,
                depth: slot.depth,
                position: place(slot),
            })
            .collect();

        let links = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let parent = slot.parent?;
                Some(Link {
                    parent: nodes[parent].id,
                    child: nodes[i].id,
                    path: diagonal(nodes[parent].position, nodes[i].position, config.orientation),
                })
            })
            .collect();

        let bounds = nodes
            .iter()
            .skip(1)
            .fold(Rect::from_points(nodes[0].position, nodes[0].position), |acc, n| {
                acc.union_pt(n.position)
            });

        TreeLayout {
            nodes,
            links,
            bounds,
        }
    }
}

/// Smooth parent-to-child curve whose control points sit halfway along the
/// depth axis.
fn diagonal(from: Point, to: Point, orientation: Orientation) -> CubicBez {
    match orientation {
        Orientation::Vertical => {
            let mid = (from.y + to.y) / 2.0;
            CubicBez::new(from, Point::new(from.x, mid), Point::new(to.x, mid), to)
        }
        Orientation::Horizontal => {
            let mid = (from.x + to.x) / 2.0;
            CubicBez::new(from, Point::new(mid, from.y), Point::new(mid, to.y), to)
        }
    }
}
