//! Binding of entity vertices to model vertices, and geometry setters.

use tracing::debug;

use crate::error::{MeshError, OperationError, Result, TopologyError};
use crate::math::Point3;

use super::{EntityId, EntityType, GeoModel, GeoModelVertices, MeshComponent, NO_ID};

impl GeoModel {
    /// Model vertex bound to local vertex `local` of `id`, [`NO_ID`] if none.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not an existing mesh entity.
    pub fn model_vertex_id(&self, id: EntityId, local: usize) -> Result<usize> {
        Ok(self.entity_mesh(id)?.model_vertex_id(local))
    }

    /// Model vertex bound to local vertex `local` of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not an existing mesh entity or the vertex
    /// is not bound.
    pub fn unique_vertex_id(&self, id: EntityId, local: usize) -> Result<usize> {
        match self.model_vertex_id(id, local)? {
            NO_ID => Err(OperationError::InvalidInput(format!(
                "vertex {local} of {id} is not bound to a model vertex"
            ))
            .into()),
            g => Ok(g),
        }
    }

    /// First local vertex of `id` bound to model vertex `g`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` does not exist.
    pub fn local_id(&self, id: EntityId, g: usize) -> Result<Option<usize>> {
        self.element(id)?;
        Ok(self.vertices().local_id(g, id))
    }

    /// Binds local vertex `local` of `id` to model vertex `g` and copies its
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a mesh entity, `local` is out of range
    /// or `g` does not exist.
    pub fn set_vertex_from_model(&mut self, id: EntityId, local: usize, g: usize) -> Result<()> {
        let (mesh, vertices) = self.mesh_and_vertices_mut(id)?;
        let point = *vertices.point(g).ok_or_else(|| {
            OperationError::InvalidInput(format!("model vertex {g} does not exist"))
        })?;
        mesh.mesh_mut().set_point(local, point)?;

        let old = mesh.model_vertex_id(local);
        if old != NO_ID {
            vertices.remove_occurrence(old, id, local);
        }
        mesh.set_model_vertex_id(local, g);
        vertices.add_occurrence(g, id, local);
        Ok(())
    }

    /// Moves local vertex `local` of `id`.
    ///
    /// With `propagate`, the bound model vertex and every other occurrence
    /// of it move too; otherwise the colocated copies keep their old
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a mesh entity or `local` is out of
    /// range.
    pub fn set_vertex_point(
        &mut self,
        id: EntityId,
        local: usize,
        point: Point3,
        propagate: bool,
    ) -> Result<()> {
        let (mesh, _) = self.mesh_and_vertices_mut(id)?;
        mesh.mesh_mut().set_point(local, point)?;
        let g = mesh.model_vertex_id(local);
        if propagate && g != NO_ID {
            self.update_point(g, point)?;
        }
        Ok(())
    }

    /// Moves model vertex `g` and every entity vertex bound to it.
    ///
    /// # Errors
    ///
    /// Returns an error if `g` does not exist or an occurrence is stale.
    pub fn update_point(&mut self, g: usize, point: Point3) -> Result<()> {
        if self.vertices().point(g).is_none() {
            return Err(
                OperationError::InvalidInput(format!("model vertex {g} does not exist")).into(),
            );
        }
        self.vertices_mut().set_point(g, point);
        let occurrences = self.vertices().occurrences(g).to_vec();
        for o in occurrences {
            let (mesh, _) = self.mesh_and_vertices_mut(o.entity)?;
            mesh.mesh_mut().set_point(o.local, point)?;
        }
        Ok(())
    }

    /// Appends unbound vertices at `points` to `id` and returns the index of
    /// the first one. With `clear`, the previous mesh is dropped first. A
    /// line gets the edge chain over the new vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a mesh entity.
    pub fn set_vertices_from_points(
        &mut self,
        id: EntityId,
        points: &[Point3],
        clear: bool,
    ) -> Result<usize> {
        let (mesh, vertices) = self.mesh_and_vertices_mut(id)?;
        if clear {
            unregister(mesh, vertices, id);
            mesh.clear();
        }
        let first = mesh.nb_vertices();
        for &point in points {
            mesh.create_vertex(point, NO_ID);
        }
        if id.ty == EntityType::Line {
            chain_edges(mesh, first)?;
        }
        Ok(first)
    }

    /// Appends vertices bound to the model vertices `gs` and returns the
    /// index of the first one. See [`GeoModel::set_vertices_from_points`].
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a mesh entity or a model vertex does
    /// not exist.
    pub fn set_vertices_from_model(
        &mut self,
        id: EntityId,
        gs: &[usize],
        clear: bool,
    ) -> Result<usize> {
        let (mesh, vertices) = self.mesh_and_vertices_mut(id)?;
        let mut points = Vec::with_capacity(gs.len());
        for &g in gs {
            let point = vertices.point(g).ok_or_else(|| {
                OperationError::InvalidInput(format!("model vertex {g} does not exist"))
            })?;
            points.push(*point);
        }
        if clear {
            unregister(mesh, vertices, id);
            mesh.clear();
        }
        let first = mesh.nb_vertices();
        for (&g, point) in gs.iter().zip(points) {
            let local = mesh.create_vertex(point, g);
            vertices.add_occurrence(g, id, local);
        }
        if id.ty == EntityType::Line {
            chain_edges(mesh, first)?;
        }
        Ok(first)
    }

    /// Replaces the mesh of surface `id` by unbound vertices at `points` and
    /// the polygons `facets[facet_ptr[i]..facet_ptr[i + 1]]`, then computes
    /// facet adjacencies.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a surface or a polygon is malformed.
    pub fn set_surface_geometry_from_points(
        &mut self,
        id: EntityId,
        points: &[Point3],
        facets: &[usize],
        facet_ptr: &[usize],
    ) -> Result<()> {
        ensure_surface(id)?;
        self.set_vertices_from_points(id, points, true)?;
        self.create_polygons(id, facets, facet_ptr)
    }

    /// Same as [`GeoModel::set_surface_geometry_from_points`] with every
    /// local vertex bound to the model vertex at the same position of
    /// `model_vertices`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a surface, a model vertex does not
    /// exist or a polygon is malformed.
    pub fn set_surface_geometry_from_model(
        &mut self,
        id: EntityId,
        model_vertices: &[usize],
        facets: &[usize],
        facet_ptr: &[usize],
    ) -> Result<()> {
        ensure_surface(id)?;
        self.set_vertices_from_model(id, model_vertices, true)?;
        self.create_polygons(id, facets, facet_ptr)
    }

    fn create_polygons(&mut self, id: EntityId, facets: &[usize], facet_ptr: &[usize]) -> Result<()> {
        let (mesh, _) = self.mesh_and_vertices_mut(id)?;
        for w in facet_ptr.windows(2) {
            let polygon = facets.get(w[0]..w[1]).ok_or_else(|| {
                MeshError::InvalidFacet(format!(
                    "facet range {}..{} is outside the {} corners",
                    w[0],
                    w[1],
                    facets.len()
                ))
            })?;
            mesh.mesh_mut().create_polygon(polygon)?;
        }
        mesh.mesh_mut().connect_facets();
        debug!(
            "{id}: {} facets over {} vertices",
            mesh.mesh().nb_facets(),
            mesh.nb_vertices()
        );
        Ok(())
    }

    pub(crate) fn mesh_and_vertices_mut(
        &mut self,
        id: EntityId,
    ) -> std::result::Result<(&mut MeshComponent, &mut GeoModelVertices), TopologyError> {
        let (entity, vertices) = self.element_and_vertices_mut(id)?;
        let mesh = entity
            .mesh_mut()
            .ok_or_else(|| TopologyError::InvalidEntityType(format!("{id} has no mesh")))?;
        Ok((mesh, vertices))
    }
}

fn ensure_surface(id: EntityId) -> std::result::Result<(), TopologyError> {
    if id.ty == EntityType::Surface {
        Ok(())
    } else {
        Err(TopologyError::InvalidEntityType(format!(
            "{id} is not a surface"
        )))
    }
}

/// Drops the registry occurrences of every vertex of `mesh`.
fn unregister(mesh: &MeshComponent, vertices: &mut GeoModelVertices, id: EntityId) {
    for (local, &g) in mesh.model_vertex_ids().iter().enumerate() {
        if g != NO_ID {
            vertices.remove_occurrence(g, id, local);
        }
    }
}

/// Links vertices `first - 1`, `first`, ... with consecutive edges; the
/// chain continues from the last existing vertex when there is one.
fn chain_edges(mesh: &mut MeshComponent, first: usize) -> std::result::Result<(), MeshError> {
    let start = first.max(1);
    for v in start..mesh.nb_vertices() {
        mesh.mesh_mut().create_edge(v - 1, v)?;
    }
    Ok(())
}
