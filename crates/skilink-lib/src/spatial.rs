//! KD-tree point index for proximity queries.
//!
//! Matching and simplification repeatedly ask which topology points (link
//! endpoints, intersections, bus stops) lie around a feature. The
//! [`PointIndex`] answers radius and envelope queries in O(log n) using a 2D
//! `kiddo` tree. Each indexed point carries a payload so callers can recover
//! the feature or link it came from.

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::feature::Coordinate;
use crate::geometry::Envelope;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// A point stored in the index together with its payload.
#[derive(Debug, Clone)]
pub struct IndexedPoint<T> {
    pub coord: Coordinate,
    pub payload: T,
}

/// Static 2D point index with per-point payloads.
pub struct PointIndex<T> {
    /// Items are positions into `points`.
    tree: KdTree<f64, usize, 2, BUCKET_SIZE, u32>,
    points: Vec<IndexedPoint<T>>,
}

impl<T> PointIndex<T> {
    /// Build an index. Points without finite planar coordinates are skipped.
    pub fn build(items: impl IntoIterator<Item = (Coordinate, T)>) -> Self {
        let points: Vec<IndexedPoint<T>> = items
            .into_iter()
            .filter(|(coord, _)| coord.is_finite_2d())
            .map(|(coord, payload)| IndexedPoint { coord, payload })
            .collect();

        let mut tree: KdTree<f64, usize, 2, BUCKET_SIZE, u32> = KdTree::new();
        for (index, point) in points.iter().enumerate() {
            tree.add(&[point.coord.x, point.coord.y], index);
        }

        debug!(node_count = points.len(), "built point index");
        Self { tree, points }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All indexed points in insertion order.
    pub fn points(&self) -> &[IndexedPoint<T>] {
        &self.points
    }

    /// Points within `radius` of `point`, closest first. Equal distances keep
    /// insertion order.
    pub fn within_radius(&self, point: &Coordinate, radius: f64) -> Vec<(&IndexedPoint<T>, f64)> {
        self.radius_hits(point, radius)
            .into_iter()
            .map(|(index, distance)| (&self.points[index], distance))
            .collect()
    }

    /// Points inside an envelope, in insertion order.
    pub fn within_envelope(&self, envelope: &Envelope) -> Vec<&IndexedPoint<T>> {
        if envelope.is_empty() {
            return Vec::new();
        }
        let mut hits: Vec<usize> = self
            .radius_hits(&envelope.centre(), envelope.radius())
            .into_iter()
            .map(|(index, _)| index)
            .filter(|index| envelope.contains(&self.points[*index].coord))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|index| &self.points[index]).collect()
    }

    fn radius_hits(&self, point: &Coordinate, radius: f64) -> Vec<(usize, f64)> {
        if radius < 0.0 || self.points.is_empty() || !point.is_finite_2d() {
            return Vec::new();
        }

        // Pad the squared radius so points exactly on the circle survive
        // rounding; the exact filter below restores the bound.
        let squared = radius * radius * (1.0 + 1e-9) + 1e-12;
        let mut hits: Vec<(usize, f64)> = self
            .tree
            .within::<SquaredEuclidean>(&[point.x, point.y], squared)
            .into_iter()
            .map(|neighbour| {
                let distance = self.points[neighbour.item].coord.distance(point);
                (neighbour.item, distance)
            })
            .filter(|(_, distance)| *distance <= radius)
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits
    }

    /// Closest indexed point.
    pub fn nearest(&self, point: &Coordinate) -> Option<(&IndexedPoint<T>, f64)> {
        if self.points.is_empty() || !point.is_finite_2d() {
            return None;
        }
        self.tree
            .nearest_n::<SquaredEuclidean>(&[point.x, point.y], 1)
            .into_iter()
            .next()
            .map(|neighbour| {
                let indexed = &self.points[neighbour.item];
                (indexed, indexed.coord.distance(point))
            })
    }
}
