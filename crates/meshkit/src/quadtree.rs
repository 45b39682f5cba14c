//! Bounding-box-partitioned spatial index over point-like objects.
//!
//! A single [`Quadtree`] instance is monomorphic in its key type `K`
//! (node/edge/triangle ids): every entry carries a representative point
//! (node coordinates, edge centroid, triangle centroid) supplied by the
//! caller at insert time. Without this index the advancing-front
//! driver's "objects within radius r of p" queries would be O(N) each
//! and dominate the whole run.

use std::collections::HashMap;
use std::hash::Hash;

use crate::geometry::{bbox_overlap, in_bbox, Point};

/// Maximum recursion depth; a leaf that is still overfull here is
/// allowed to exceed `max_obj` (graceful degradation, logged once).
pub const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone)]
struct QuadNode<K> {
    min: Point,
    max: Point,
    depth: usize,
    parent: Option<usize>,
    /// `(key, point)` pairs; only meaningful while this node is a leaf
    /// (`children.is_none()`), but entries may also accumulate here
    /// past `max_depth` once splitting is disallowed.
    objs: Vec<(K, Point)>,
    children: Option<[usize; 4]>,
    total: usize,
}

impl<K> QuadNode<K> {
    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) * 0.5, (self.min.y + self.max.y) * 0.5)
    }
}

/// Axis-aligned spatial index over heterogeneous point-like objects of
/// key type `K`, keyed by a caller-supplied representative point.
#[derive(Debug, Clone)]
pub struct Quadtree<K> {
    nodes: Vec<QuadNode<K>>,
    root: usize,
    max_obj: usize,
    max_depth: usize,
    /// key -> index of the leaf node currently holding it.
    locations: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash + std::fmt::Debug> Quadtree<K> {
    pub fn new(min: Point, max: Point, max_obj: usize) -> Self {
        let root = QuadNode {
            min,
            max,
            depth: 0,
            parent: None,
            objs: Vec::new(),
            children: None,
            total: 0,
        };
        Self {
            nodes: vec![root],
            root: 0,
            max_obj: max_obj.max(1),
            max_depth: MAX_DEPTH,
            locations: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> (Point, Point) {
        (self.nodes[self.root].min, self.nodes[self.root].max)
    }

    /// Inserts `key` at `point`. Returns `false` (no-op) when `point`
    /// lies outside the tree's bounding box.
    pub fn insert(&mut self, key: K, point: Point) -> bool {
        let (min, max) = self.bounds();
        if !in_bbox(point, min, max) {
            return false;
        }
        self.insert_into(self.root, key, point);
        true
    }

    fn insert_into(&mut self, idx: usize, key: K, point: Point) {
        // Walk down to the leaf that should hold `key`.
        let mut cur = idx;
        loop {
            if self.nodes[cur].is_leaf() {
                break;
            }
            cur = self.child_for(cur, point);
        }

        self.nodes[cur].objs.push((key, point));
        self.locations.insert(key, cur);
        self.bump_total(cur, 1);

        let depth = self.nodes[cur].depth;
        if self.nodes[cur].objs.len() > self.max_obj && depth < self.max_depth {
            self.split(cur);
        } else if self.nodes[cur].objs.len() > self.max_obj {
            tracing::warn!(
                depth,
                max_depth = self.max_depth,
                "quadtree leaf exceeds max_obj at max_depth; degrading gracefully"
            );
        }
    }

    /// Index of the child quadrant of `idx` that contains `point`.
    /// Order is `[NE, NW, SW, SE]`; the center belongs to NE by the
    /// `>=` tiebreak on both axes.
    fn child_for(&self, idx: usize, point: Point) -> usize {
        let children = self.nodes[idx].children.expect("child_for on a leaf");
        let center = self.nodes[idx].center();
        if point.x >= center.x {
            if point.y >= center.y {
                children[0] // NE
            } else {
                children[3] // SE
            }
        } else if point.y >= center.y {
            children[1] // NW
        } else {
            children[2] // SW
        }
    }

    fn split(&mut self, idx: usize) {
        let node = self.nodes[idx].clone();
        let center = node.center();
        let depth = node.depth + 1;

        let quads = [
            (center, node.max),                                    // NE
            (Point::new(node.min.x, center.y), Point::new(center.x, node.max.y)), // NW
            (node.min, center),                                    // SW
            (Point::new(center.x, node.min.y), Point::new(node.max.x, center.y)), // SE
        ];

        let mut child_ids = [0usize; 4];
        for (i, (min, max)) in quads.into_iter().enumerate() {
            let child = QuadNode {
                min,
                max,
                depth,
                parent: Some(idx),
                objs: Vec::new(),
                children: None,
                total: 0,
            };
            self.nodes.push(child);
            child_ids[i] = self.nodes.len() - 1;
        }
        self.nodes[idx].children = Some(child_ids);

        let objs = std::mem::take(&mut self.nodes[idx].objs);
        for (key, point) in objs {
            let child = self.child_for(idx, point);
            self.insert_into(child, key, point);
        }
    }

    fn bump_total(&mut self, leaf: usize, delta: i64) {
        let mut cur = Some(leaf);
        while let Some(i) = cur {
            let t = self.nodes[i].total as i64 + delta;
            self.nodes[i].total = t.max(0) as usize;
            cur = self.nodes[i].parent;
        }
    }

    /// Removes `key`. Returns `false` when it was not present.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(leaf) = self.locations.remove(&key) else {
            return false;
        };
        let objs = &mut self.nodes[leaf].objs;
        let Some(pos) = objs.iter().position(|(k, _)| *k == key) else {
            return false;
        };
        objs.remove(pos);
        self.bump_total(leaf, -1);
        self.maybe_merge_ancestors(leaf);
        true
    }

    /// Walks from `leaf` up to the root, merging the first ancestor
    /// whose total descendant count has fallen to `<= max_obj`. Merge
    /// fires only on removals, never as split's own bookkeeping.
    fn maybe_merge_ancestors(&mut self, leaf: usize) {
        let mut cur = self.nodes[leaf].parent;
        while let Some(i) = cur {
            if self.nodes[i].children.is_some() && self.nodes[i].total <= self.max_obj {
                self.merge(i);
            }
            cur = self.nodes[i].parent;
        }
    }

    fn merge(&mut self, idx: usize) {
        let Some(children) = self.nodes[idx].children.take() else {
            return;
        };
        let mut gathered = Vec::new();
        for c in children {
            gathered.extend(self.collect_subtree(c));
        }
        for (key, point) in &gathered {
            self.locations.insert(*key, idx);
        }
        self.nodes[idx].objs = gathered;
        // Dropping the child indices leaves them as unreachable dead
        // nodes in the arena; they are never visited again.
    }

    fn collect_subtree(&self, idx: usize) -> Vec<(K, Point)> {
        let mut out = self.nodes[idx].objs.clone();
        if let Some(children) = self.nodes[idx].children {
            for c in children {
                out.extend(self.collect_subtree(c));
            }
        }
        out
    }

    /// All keys whose representative point lies within the inclusive
    /// bbox `[min, max]`.
    pub fn query_bbox(&self, min: Point, max: Point) -> Vec<K> {
        let mut out = Vec::new();
        self.query_bbox_into(self.root, min, max, &mut out);
        out
    }

    fn query_bbox_into(&self, idx: usize, min: Point, max: Point, out: &mut Vec<K>) {
        let node = &self.nodes[idx];
        if !bbox_overlap(node.min, node.max, min, max) {
            return;
        }
        if let Some(children) = node.children {
            for c in children {
                self.query_bbox_into(c, min, max, out);
            }
        }
        for (k, p) in &node.objs {
            if in_bbox(*p, min, max) {
                out.push(*k);
            }
        }
    }

    /// All keys within `radius` of `center`, paired with their squared
    /// distance to `center` as a sorting hint so callers can order
    /// neighbors without recomputing.
    pub fn query_disk(&self, center: Point, radius: f64) -> Vec<(K, f64)> {
        let mut out = Vec::new();
        let r2 = radius * radius;
        self.query_disk_into(self.root, center, radius, r2, &mut out);
        out
    }

    fn query_disk_into(&self, idx: usize, center: Point, radius: f64, r2: f64, out: &mut Vec<(K, f64)>) {
        let node = &self.nodes[idx];
        if !bbox_overlap(
            node.min,
            node.max,
            Point::new(center.x - radius, center.y - radius),
            Point::new(center.x + radius, center.y + radius),
        ) {
            return;
        }
        if let Some(children) = node.children {
            for c in children {
                self.query_disk_into(c, center, radius, r2, out);
            }
        }
        for (k, p) in &node.objs {
            let d2 = (p - center).norm_squared();
            if d2 <= r2 {
                out.push((*k, d2));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_outside_bounds_fails() {
        let mut qt: Quadtree<usize> = Quadtree::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0), 4);
        assert!(!qt.insert(0, Point::new(20.0, 20.0)));
    }

    #[test]
    fn split_then_query_finds_all() {
        let mut qt: Quadtree<usize> = Quadtree::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0), 2);
        for i in 0..50 {
            let x = (i as f64 * 1.9) % 100.0;
            let y = (i as f64 * 3.7) % 100.0;
            assert!(qt.insert(i, Point::new(x, y)));
        }
        let all = qt.query_bbox(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn remove_then_merge_shrinks_back() {
        let mut qt: Quadtree<usize> = Quadtree::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0), 2);
        for i in 0..10 {
            qt.insert(i, Point::new((i as f64) * 9.0, (i as f64) * 9.0));
        }
        for i in 0..9 {
            assert!(qt.remove(i));
        }
        assert_eq!(qt.len(), 1);
        let all = qt.query_bbox(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert_eq!(all, vec![9]);
    }

    #[test]
    fn query_disk_matches_brute_force() {
        let mut qt: Quadtree<usize> = Quadtree::new(Point::new(0.0, 0.0), Point::new(50.0, 50.0), 3);
        let mut pts = Vec::new();
        for i in 0..40 {
            let p = Point::new((i as f64 * 7.0) % 50.0, (i as f64 * 13.0) % 50.0);
            qt.insert(i, p);
            pts.push(p);
        }
        let center = Point::new(25.0, 25.0);
        let radius = 10.0;
        let mut got: Vec<usize> = qt.query_disk(center, radius).into_iter().map(|(k, _)| k).collect();
        got.sort();
        let mut expected: Vec<usize> = pts
            .iter()
            .enumerate()
            .filter(|(_, p)| (**p - center).norm_squared() <= radius * radius)
            .map(|(i, _)| i)
            .collect();
        expected.sort();
        assert_eq!(got, expected);
    }

    proptest! {
        #[test]
        fn insert_remove_round_trip(n in 1usize..200) {
            let mut qt: Quadtree<usize> = Quadtree::new(Point::new(0.0, 0.0), Point::new(1000.0, 1000.0), 8);
            for i in 0..n {
                let x = ((i * 37) % 1000) as f64;
                let y = ((i * 91) % 1000) as f64;
                qt.insert(i, Point::new(x, y));
            }
            prop_assert_eq!(qt.len(), n);
            for i in 0..n {
                prop_assert!(qt.remove(i));
            }
            prop_assert_eq!(qt.len(), 0);
        }
    }
}
