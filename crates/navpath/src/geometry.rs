//! World-geometry queries used to validate path shortcuts.

use glam::Vec3A;
use thiserror::Error;

bitflags::bitflags! {
    /// Collision layers of world geometry.
    ///
    /// A line-of-sight query only considers geometry whose layers intersect the query mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct CollisionLayers: u32 {
        /// Static level geometry such as walls and buildings.
        const STATIC = 1 << 0;
        /// Terrain surfaces.
        const TERRAIN = 1 << 1;
        /// Geometry that moves, like doors and platforms.
        const DYNAMIC = 1 << 2;
        /// Water volumes.
        const WATER = 1 << 3;
        /// Triggers and other volumes that never block movement by default.
        const TRIGGER = 1 << 4;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::STATIC
    }
}

/// Answers whether a straight segment through the world is blocked.
pub trait GeometryQuery {
    /// Returns `true` if the segment from `from` to `to` intersects geometry on any of the layers in `mask`.
    ///
    /// Returns an error if the query cannot be answered, e.g. because the world data is not loaded.
    fn is_segment_obstructed(
        &self,
        from: Vec3A,
        to: Vec3A,
        mask: CollisionLayers,
    ) -> Result<bool, GeometryQueryError>;
}

impl<T: GeometryQuery + ?Sized> GeometryQuery for &T {
    fn is_segment_obstructed(
        &self,
        from: Vec3A,
        to: Vec3A,
        mask: CollisionLayers,
    ) -> Result<bool, GeometryQueryError> {
        (**self).is_segment_obstructed(from, to, mask)
    }
}

/// A world without any geometry. Every segment is clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenSky;

impl GeometryQuery for OpenSky {
    #[inline]
    fn is_segment_obstructed(
        &self,
        _from: Vec3A,
        _to: Vec3A,
        _mask: CollisionLayers,
    ) -> Result<bool, GeometryQueryError> {
        Ok(false)
    }
}

/// Errors that can occur when answering a [`GeometryQuery`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryQueryError {
    /// The world data needed to answer the query is not available.
    #[error("world geometry is unavailable: {reason}")]
    Unavailable {
        /// Why the geometry could not be queried
        reason: String,
    },
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references a vertex outside of the {vertex_count} available vertices")]
    DegenerateMesh {
        /// The index of the offending triangle
        triangle: usize,
        /// The number of vertices in the mesh
        vertex_count: usize,
    },
}
