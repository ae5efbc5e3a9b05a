//! Contains [`TriMesh`], a triangle soup that can answer line-of-sight queries.

use glam::{UVec3, Vec3A};

use crate::{
    geometry::{CollisionLayers, GeometryQuery, GeometryQueryError},
    math::{Aabb3d, TriangleIndices as _, TriangleVertices as _, segment_triangle_intersection},
};

/// World geometry used for line-of-sight checks while smoothing paths.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TriMesh {
    /// The vertices composing the mesh.
    /// Follows the convention of a triangle list.
    pub vertices: Vec<Vec3A>,

    /// The indices composing the mesh.
    /// Follows the convention of a triangle list.
    pub indices: Vec<UVec3>,

    /// The collision layers of the trimesh. Each index corresponds 1:1 to the [`TriMesh::indices`].
    pub layers: Vec<CollisionLayers>,
}

impl TriMesh {
    /// Extends the trimesh with the vertices and indices of another trimesh.
    /// The indices of `other` will be offset by the number of vertices in `self`.
    ///
    /// # Panics
    ///
    /// Panics if the combined trimesh would have more vertices than a `u32` index can address.
    pub fn extend(&mut self, other: TriMesh) {
        let Some(next_vertex_index) = first_new_index(self.vertices.len(), other.vertices.len())
        else {
            panic!(
                "Cannot extend a trimesh of {} vertices by {} vertices: indices are limited to u32",
                self.vertices.len(),
                other.vertices.len()
            );
        };
        self.fill_layers();
        self.vertices.extend(other.vertices);
        self.indices
            .extend(other.indices.iter().map(|i| i + next_vertex_index));
        self.layers.extend(other.layers);
    }

    /// Appends a single triangle on the given layers.
    ///
    /// # Panics
    ///
    /// Panics if the new vertices cannot be addressed by a `u32` index.
    pub fn push_triangle(&mut self, triangle: [Vec3A; 3], layers: CollisionLayers) {
        let Some(first) = first_new_index(self.vertices.len(), triangle.len()) else {
            panic!(
                "Cannot push a triangle onto a trimesh of {} vertices: indices are limited to u32",
                self.vertices.len()
            );
        };
        self.vertices.extend(triangle);
        self.indices.push(UVec3::new(first, first + 1, first + 2));
        self.layers.push(layers);
    }

    /// Appends an axis-aligned quad of two triangles spanned by `corner`, `corner + u` and `corner + v`.
    pub fn push_quad(&mut self, corner: Vec3A, u: Vec3A, v: Vec3A, layers: CollisionLayers) {
        self.push_triangle([corner, corner + u, corner + u + v], layers);
        self.push_triangle([corner, corner + u + v, corner + v], layers);
    }

    /// Computes the AABB of the trimesh.
    /// Returns `None` if the trimesh is empty.
    pub fn compute_aabb(&self) -> Option<Aabb3d> {
        Aabb3d::from_verts(&self.vertices)
    }

    /// Moves the triangles whose slope is gentle enough onto [`CollisionLayers::TERRAIN`].
    ///
    /// A triangle counts as terrain if the angle between its normal and the up axis is below the threshold.
    /// Triangles without an entry in [`TriMesh::layers`] are given the default layers first.
    ///
    /// # Arguments
    ///
    /// * `threshold_rad` - The threshold angle in radians.
    ///
    pub fn mark_terrain_triangles(&mut self, threshold_rad: f32) {
        let threshold_cos = threshold_rad.cos();
        self.fill_layers();
        for (i, indices) in self.indices.iter().enumerate() {
            let Some([a, b, c]) = indices.vertices(&self.vertices) else {
                continue;
            };
            let normal = (b - a).cross(c - a).normalize_or_zero();
            if normal.y.abs() > threshold_cos {
                let layers = &mut self.layers[i];
                layers.remove(CollisionLayers::STATIC);
                layers.insert(CollisionLayers::TERRAIN);
            }
        }
    }

    /// Gives every triangle without an entry in [`TriMesh::layers`] the default layers.
    fn fill_layers(&mut self) {
        if self.layers.len() < self.indices.len() {
            self.layers
                .resize(self.indices.len(), CollisionLayers::default());
        }
    }

    /// Returns the parametric distance of the closest hit along the segment, if any.
    pub fn cast_segment(
        &self,
        from: Vec3A,
        to: Vec3A,
        mask: CollisionLayers,
    ) -> Result<Option<f32>, GeometryQueryError> {
        let segment_aabb = Aabb3d::from_segment(from, to);
        let mut closest: Option<f32> = None;
        for (i, indices) in self.indices.iter().enumerate() {
            let layers = self.layers.get(i).copied().unwrap_or_default();
            if !layers.intersects(mask) {
                continue;
            }
            let triangle =
                indices
                    .vertices(&self.vertices)
                    .ok_or(GeometryQueryError::DegenerateMesh {
                        triangle: i,
                        vertex_count: self.vertices.len(),
                    })?;
            if !triangle.aabb().intersects(&segment_aabb) {
                continue;
            }
            if let Some(t) = segment_triangle_intersection(from, to, triangle) {
                closest = Some(closest.map_or(t, |c| c.min(t)));
            }
        }
        Ok(closest)
    }
}

/// The index of the first of `added` vertices appended after `len` existing ones,
/// if every new vertex stays addressable by a `u32`.
fn first_new_index(len: usize, added: usize) -> Option<u32> {
    let end = len.checked_add(added)?;
    u32::try_from(end.saturating_sub(1)).ok()?;
    u32::try_from(len).ok()
}

impl GeometryQuery for TriMesh {
    fn is_segment_obstructed(
        &self,
        from: Vec3A,
        to: Vec3A,
        mask: CollisionLayers,
    ) -> Result<bool, GeometryQueryError> {
        Ok(self.cast_segment(from, to, mask)?.is_some())
    }
}
