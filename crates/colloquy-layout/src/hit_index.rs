//! Grid-bucketed hit testing for circles
//!
//! The canvas is divided into square cells; every circle is registered in
//! each cell its bounding box overlaps. A query only inspects the circles in
//! one cell. When circles overlap, the one registered last is on top.

use std::collections::HashMap;

use crate::geometry::Point;

/// Tunables for [`PointIndex`]
#[derive(Debug, Clone, PartialEq)]
pub struct HitIndexConfig {
    /// Side length of a grid cell in canvas units
    pub cell_size: f64,
    /// Bucket size above which a warning is logged
    pub bucket_warn_threshold: usize,
}

impl Default for HitIndexConfig {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            bucket_warn_threshold: 64,
        }
    }
}

#[derive(Debug, Clone)]
struct HitCircle<T> {
    key: T,
    center: Point,
    radius: f64,
}

impl<T> HitCircle<T> {
    fn contains(&self, p: Point) -> bool {
        self.center.distance(p) <= self.radius
    }
}

/// Spatial index over rendered circles
#[derive(Debug, Clone)]
pub struct PointIndex<T> {
    config: HitIndexConfig,
    circles: Vec<HitCircle<T>>,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl<T: Clone> Default for PointIndex<T> {
    fn default() -> Self {
        Self::new(HitIndexConfig::default())
    }
}

impl<T: Clone> PointIndex<T> {
    pub fn new(config: HitIndexConfig) -> Self {
        Self {
            config,
            circles: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        let size = self.config.cell_size.max(f64::EPSILON);
        ((x / size).floor() as i64, (y / size).floor() as i64)
    }

    /// Register a circle; later registrations draw on top of earlier ones
    pub fn insert(&mut self, key: T, center: Point, radius: f64) {
        let radius = radius.max(0.0);
        let idx = self.circles.len();
        let (x0, y0) = self.cell_of(center.x - radius, center.y - radius);
        let (x1, y1) = self.cell_of(center.x + radius, center.y + radius);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                let bucket = self.buckets.entry((cx, cy)).or_default();
                bucket.push(idx);
                if bucket.len() == self.config.bucket_warn_threshold {
                    tracing::warn!(cell = ?(cx, cy), size = bucket.len(), "Hit index bucket is crowded");
                }
            }
        }
        self.circles.push(HitCircle { key, center, radius });
    }

    /// Topmost circle containing the point, if any
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&T> {
        let p = Point::new(x, y);
        self.buckets
            .get(&self.cell_of(x, y))?
            .iter()
            .rev()
            .map(|&i| &self.circles[i])
            .find(|c| c.contains(p))
            .map(|c| &c.key)
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    pub fn clear(&mut self) {
        self.circles.clear();
        self.buckets.clear();
    }
}
