//! Removes redundant waypoints from a path found by the [`PathFinder`](crate::PathFinder).

use glam::Vec3A;

use crate::{
    config::PathfinderConfig,
    geometry::GeometryQuery,
    graph::{NavGraph, NavNodeKey},
};

/// Shortcuts paths by dropping waypoints that an agent can walk past in a straight line.
///
/// For every run of three waypoints A, B and C, B is dropped if
/// - the height difference between A and B is small enough,
/// - the shortcut from A to C is close enough to horizontal, and
/// - nothing in the world blocks the line of sight from A to C.
///
/// After dropping B the new run starting at A is checked again.
pub struct PathSmoother<'a, G: ?Sized> {
    config: &'a PathfinderConfig,
    geometry: &'a G,
}

impl<'a, G: GeometryQuery + ?Sized> PathSmoother<'a, G> {
    /// Creates a smoother using the smoothing settings of `config`.
    pub fn new(config: &'a PathfinderConfig, geometry: &'a G) -> Self {
        Self { config, geometry }
    }

    /// Smooths the path in place. The first and last waypoints are always kept and the
    /// order of the remaining ones is never changed.
    pub fn smooth(&self, graph: &NavGraph, path: &mut Vec<NavNodeKey>) {
        let mut i = 0;
        while i + 2 < path.len() {
            let positions = (
                graph.position(path[i]),
                graph.position(path[i + 1]),
                graph.position(path[i + 2]),
            );
            let (Some(a), Some(b), Some(c)) = positions else {
                i += 1;
                continue;
            };
            if self.can_skip(a, b, c) {
                path.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    fn can_skip(&self, a: Vec3A, b: Vec3A, c: Vec3A) -> bool {
        let dy = a.y - b.y;
        if dy * dy >= self.config.max_smoothed_slope {
            return false;
        }

        // NaN for a zero-length shortcut, which fails both comparisons
        let angle = (c - a).angle_between(Vec3A::Y).to_degrees();
        let threshold = self.config.smooth_angle_threshold;
        if !(90.0 - threshold < angle && angle < 90.0 + threshold) {
            return false;
        }

        self.connection_valid(a, c)
    }

    /// Whether an agent can walk in a straight line from `from` to `to`.
    ///
    /// Both points are lifted by the node clearance before querying the world geometry.
    /// A failed query counts as blocked.
    pub fn connection_valid(&self, from: Vec3A, to: Vec3A) -> bool {
        let clearance = Vec3A::Y * self.config.node_clearance;
        match self.geometry.is_segment_obstructed(
            from + clearance,
            to + clearance,
            self.config.collision_mask,
        ) {
            Ok(obstructed) => !obstructed,
            Err(err) => {
                tracing::warn!("Rejecting path shortcut from {from} to {to}: {err}");
                false
            }
        }
    }
}
