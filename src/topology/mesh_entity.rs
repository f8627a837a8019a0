use crate::error::Result;
use crate::math::{Point3, Vector3};
use crate::mesh::Mesh;

use super::entity_id::NO_ID;

/// Mesh of a Corner, Line, Surface or Region, with the model vertex bound to
/// each of its vertices.
///
/// The vertex map is kept the same length as the mesh vertex list; an
/// unbound vertex maps to [`NO_ID`].
#[derive(Debug, Clone, Default)]
pub struct MeshComponent {
    mesh: Mesh,
    model_vertex_ids: Vec<usize>,
}

impl MeshComponent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    #[must_use]
    pub fn nb_vertices(&self) -> usize {
        self.mesh.nb_vertices()
    }

    /// Coordinates of local vertex `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is out of range.
    pub fn vertex(&self, v: usize) -> Result<&Point3> {
        Ok(self.mesh.point(v)?)
    }

    /// Model vertex bound to local vertex `v`, [`NO_ID`] if none.
    #[must_use]
    pub fn model_vertex_id(&self, v: usize) -> usize {
        self.model_vertex_ids.get(v).copied().unwrap_or(NO_ID)
    }

    /// Model vertices of every local vertex, in local order.
    #[must_use]
    pub fn model_vertex_ids(&self) -> &[usize] {
        &self.model_vertex_ids
    }

    /// Appends a local vertex bound to `model_vertex` and returns its index.
    pub(crate) fn create_vertex(&mut self, point: Point3, model_vertex: usize) -> usize {
        self.model_vertex_ids.push(model_vertex);
        self.mesh.create_vertex(point)
    }

    pub(crate) fn set_model_vertex_id(&mut self, v: usize, model_vertex: usize) {
        if let Some(slot) = self.model_vertex_ids.get_mut(v) {
            *slot = model_vertex;
        }
    }

    /// Rewrites every bound model vertex through `map` (old id → new id).
    pub(crate) fn remap_model_vertices(&mut self, map: &[usize]) {
        for g in &mut self.model_vertex_ids {
            if *g != NO_ID {
                *g = map.get(*g).copied().unwrap_or(NO_ID);
            }
        }
    }

    /// Empties the mesh. The vertex map is cleared with it.
    pub(crate) fn clear(&mut self) {
        self.mesh.clear();
        self.model_vertex_ids.clear();
    }

    // --- Line queries ---

    /// Length of segment `s`, between local vertices `s` and `s + 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not exist.
    pub fn segment_length(&self, s: usize) -> Result<f64> {
        Ok((self.vertex(s + 1)? - self.vertex(s)?).norm())
    }

    /// Midpoint of segment `s`.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not exist.
    pub fn segment_barycenter(&self, s: usize) -> Result<Point3> {
        let p0 = self.vertex(s)?;
        let p1 = self.vertex(s + 1)?;
        Ok(Point3::from((p0.coords + p1.coords) * 0.5))
    }

    /// Sum of the segment lengths of a line mesh.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.mesh
            .points()
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }

    /// Whether the vertices are exactly `points`, in either direction.
    #[must_use]
    pub fn equal(&self, points: &[Point3]) -> bool {
        let own = self.mesh.points();
        own.len() == points.len()
            && (own.iter().eq(points.iter()) || own.iter().rev().eq(points.iter()))
    }

    /// Mean of the facet normals around each local vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if a facet refers to a missing vertex.
    pub fn vertex_normals(&self) -> Result<Vec<Vector3>> {
        let mut normals = vec![Vector3::zeros(); self.nb_vertices()];
        for f in 0..self.mesh.nb_facets() {
            let normal = self.facet_normal(f)?;
            for &v in self.mesh.facet_vertices(f)? {
                normals[v] += normal;
            }
        }
        for n in &mut normals {
            if let Some(unit) = n.try_normalize(0.0) {
                *n = unit;
            }
        }
        Ok(normals)
    }
}
