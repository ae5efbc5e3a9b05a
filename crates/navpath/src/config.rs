use thiserror::Error;

use crate::geometry::CollisionLayers;

/// Specifies the tunables of a [`PathFinder`](crate::PathFinder).
///
/// The defaults are tuned for a world measured in meters with the y-axis pointing up
/// and a human-sized agent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct PathfinderConfig {
    /// Nodes whose move modifier is at or above this value are never entered. `[Limit: > 0]`
    pub untraversable_move_modifier: f32,

    /// The largest squared height difference between a waypoint and its successor
    /// that still allows the successor to be smoothed away. `[Limit: >= 0] [Units: wu²]`
    ///
    /// Keeps paths from being shortcut from one hilltop straight to the next.
    pub max_smoothed_slope: f32,

    /// How far the shortcut between two waypoints may tilt away from the horizontal
    /// for the waypoint between them to be smoothed away. `[Limits: 0 <= value <= 90] [Units: Degrees]`
    ///
    /// A shortcut is accepted when its angle to the up axis lies strictly within
    /// `90 ± smooth_angle_threshold`.
    pub smooth_angle_threshold: f32,

    /// How far above the waypoints the line of sight of a shortcut is checked. `[Limit: >= 0] [Units: wu]`
    ///
    /// Lifts the check off the ground so the terrain the waypoints stand on does not block it.
    pub node_clearance: f32,

    /// The geometry layers that block a shortcut.
    pub collision_mask: CollisionLayers,

    /// Stops the search with no result after expanding this many nodes.
    /// `None` searches until the open list is exhausted.
    pub max_expanded_nodes: Option<usize>,

    /// How to handle a cheaper route to a node that is already waiting in the open list.
    pub reopen_policy: ReopenPolicy,
}

impl PathfinderConfig {
    /// The default value of [`PathfinderConfig::untraversable_move_modifier`].
    pub const UNTRAVERSABLE_MOVE_MODIFIER: f32 = 1000.0;
    /// The default value of [`PathfinderConfig::max_smoothed_slope`].
    pub const MAX_SMOOTHED_SLOPE: f32 = 4.0;
    /// The default value of [`PathfinderConfig::smooth_angle_threshold`].
    pub const SMOOTH_ANGLE_THRESHOLD: f32 = 30.0;
    /// The default value of [`PathfinderConfig::node_clearance`].
    pub const NODE_CLEARANCE: f32 = 1.0;

    /// Checks that every value is within its documented limits.
    pub fn validate(&self) -> Result<(), PathfinderConfigError> {
        if self.untraversable_move_modifier.is_nan() || self.untraversable_move_modifier <= 0.0 {
            return Err(PathfinderConfigError::UntraversableMoveModifier(
                self.untraversable_move_modifier,
            ));
        }
        if self.max_smoothed_slope.is_nan() || self.max_smoothed_slope < 0.0 {
            return Err(PathfinderConfigError::MaxSmoothedSlope(
                self.max_smoothed_slope,
            ));
        }
        if !(0.0..=90.0).contains(&self.smooth_angle_threshold) {
            return Err(PathfinderConfigError::SmoothAngleThreshold(
                self.smooth_angle_threshold,
            ));
        }
        if self.node_clearance.is_nan() || self.node_clearance < 0.0 {
            return Err(PathfinderConfigError::NodeClearance(self.node_clearance));
        }
        Ok(())
    }
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            untraversable_move_modifier: Self::UNTRAVERSABLE_MOVE_MODIFIER,
            max_smoothed_slope: Self::MAX_SMOOTHED_SLOPE,
            smooth_angle_threshold: Self::SMOOTH_ANGLE_THRESHOLD,
            node_clearance: Self::NODE_CLEARANCE,
            collision_mask: CollisionLayers::STATIC | CollisionLayers::TERRAIN,
            max_expanded_nodes: None,
            reopen_policy: ReopenPolicy::default(),
        }
    }
}

/// What happens when a cheaper route is found to a node that is already in the open list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ReopenPolicy {
    /// Re-parent the node and lower its cost, but leave its priority in the open list as it was.
    ///
    /// The node may be expanded later than its new cost warrants, so the path is not
    /// guaranteed to be the cheapest one.
    #[default]
    KeepPriority,
    /// Re-parent the node, lower its cost, recompute its fitness and push it again.
    /// The outdated entry is skipped once popped.
    Requeue,
}

/// Errors returned by [`PathfinderConfig::validate`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PathfinderConfigError {
    /// The untraversable sentinel must be positive.
    #[error("untraversable move modifier must be positive, but got {0}")]
    UntraversableMoveModifier(f32),
    /// The maximum smoothed slope must not be negative.
    #[error("max smoothed slope must not be negative, but got {0}")]
    MaxSmoothedSlope(f32),
    /// The smoothing angle threshold must be within 0 to 90 degrees.
    #[error("smooth angle threshold must be within 0 and 90 degrees, but got {0}")]
    SmoothAngleThreshold(f32),
    /// The node clearance must not be negative.
    #[error("node clearance must not be negative, but got {0}")]
    NodeClearance(f32),
}
