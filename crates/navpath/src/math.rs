use glam::{UVec3, Vec3A};

/// An axis-aligned bounding box in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb3d {
    /// The minimum corner
    pub min: Vec3A,
    /// The maximum corner
    pub max: Vec3A,
}

impl Aabb3d {
    /// Creates an AABB from its center and half extents.
    #[inline]
    pub fn new(center: impl Into<Vec3A>, half_size: impl Into<Vec3A>) -> Self {
        let center = center.into();
        let half_size = half_size.into();
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    /// Computes the smallest AABB containing all `verts`.
    /// Returns `None` if `verts` is empty.
    pub fn from_verts(verts: &[Vec3A]) -> Option<Self> {
        let mut iter = verts.iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((*first, *first), |(prev_min, prev_max), point| {
            (point.min(prev_min), point.max(prev_max))
        });
        Some(Self { min, max })
    }

    /// The AABB spanned by a line segment.
    #[inline]
    pub fn from_segment(from: Vec3A, to: Vec3A) -> Self {
        Self {
            min: from.min(to),
            max: from.max(to),
        }
    }

    /// Whether the two boxes overlap. Touching boxes count as overlapping.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }
}

pub(crate) trait TriangleIndices {
    fn vertices(&self, vertices: &[Vec3A]) -> Option<[Vec3A; 3]>;
}

impl TriangleIndices for UVec3 {
    #[inline]
    fn vertices(&self, vertices: &[Vec3A]) -> Option<[Vec3A; 3]> {
        Some([
            *vertices.get(self.x as usize)?,
            *vertices.get(self.y as usize)?,
            *vertices.get(self.z as usize)?,
        ])
    }
}

pub(crate) trait TriangleVertices {
    fn aabb(&self) -> Aabb3d;
}

impl TriangleVertices for [Vec3A; 3] {
    #[inline]
    fn aabb(&self) -> Aabb3d {
        let min = self[0].min(self[1]).min(self[2]);
        let max = self[0].max(self[1]).max(self[2]);
        Aabb3d { min, max }
    }
}

/// Möller–Trumbore test between the segment `from..=to` and a triangle.
///
/// Returns the parametric distance along the segment in `[0, 1]` of the hit, if any.
/// Triangles are treated as double-sided.
pub(crate) fn segment_triangle_intersection(
    from: Vec3A,
    to: Vec3A,
    triangle: [Vec3A; 3],
) -> Option<f32> {
    const EPSILON: f32 = 1.0e-7;

    let dir = to - from;
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        // Parallel to the triangle plane
        return None;
    }
    let s = from - triangle[0];
    let u = s.dot(p) / det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = dir.dot(q) / det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) / det;
    (0.0..=1.0).contains(&t).then_some(t)
}
