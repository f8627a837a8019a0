use std::collections::HashMap;

use tracing::debug;

use crate::error::{OperationError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{EntityId, EntityType, GeoModel};

/// Rebuilds the shared-vertex registry from the geometry of the mesh
/// entities.
///
/// Every vertex of every corner, line, surface and region is bound to a
/// model vertex; vertices within the tolerance share one. Existing
/// bindings are discarded.
pub struct BuildUniqueVertices {
    tolerance: f64,
}

impl Default for BuildUniqueVertices {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildUniqueVertices {
    /// Creates a new `BuildUniqueVertices` operation with the default
    /// tolerance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tolerance: TOLERANCE,
        }
    }

    /// Sets the distance under which two vertices are merged.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Executes the operation, returning the number of model vertices.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the tolerance is not a
    /// positive finite number, and an error if a mesh cannot be read.
    pub fn execute(&self, model: &mut GeoModel) -> Result<usize> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(OperationError::InvalidInput(format!(
                "merge tolerance must be positive and finite, got {}",
                self.tolerance
            ))
            .into());
        }
        let mut merger = VertexMerger::new(self.tolerance);
        let mut bindings: Vec<(EntityId, Vec<usize>)> = Vec::new();
        for ty in EntityType::MESH {
            for entity in model.elements(ty) {
                let Some(mesh) = entity.mesh() else {
                    continue;
                };
                let gids = mesh
                    .mesh()
                    .points()
                    .iter()
                    .map(|p| merger.get_or_create(p))
                    .collect();
                bindings.push((entity.id(), gids));
            }
        }

        model.vertices_mut().clear();
        for point in &merger.points {
            model.vertices_mut().add_vertex(*point);
        }
        for (id, gids) in bindings {
            let (mesh, _) = model.mesh_and_vertices_mut(id)?;
            for (local, g) in gids.into_iter().enumerate() {
                mesh.set_model_vertex_id(local, g);
            }
        }
        model.rebuild_vertex_occurrences()?;

        debug!(
            "{} model vertices built with tolerance {}",
            merger.points.len(),
            self.tolerance
        );
        Ok(merger.points.len())
    }
}

/// Groups points by grid cell and merges points within `cell_size` of each
/// other. Cell keys saturate far from the origin.
struct VertexMerger {
    cell_size: f64,
    map: HashMap<(i64, i64, i64), Vec<usize>>,
    points: Vec<Point3>,
}

impl VertexMerger {
    fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            map: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_key(&self, p: &Point3) -> (i64, i64, i64) {
        let inv = 1.0 / self.cell_size;
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    }

    fn get_or_create(&mut self, point: &Point3) -> usize {
        let key = self.cell_key(point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let (Some(x), Some(y), Some(z)) = (
                        key.0.checked_add(dx),
                        key.1.checked_add(dy),
                        key.2.checked_add(dz),
                    ) else {
                        continue;
                    };
                    if let Some(entries) = self.map.get(&(x, y, z)) {
                        for &g in entries {
                            if (point - self.points[g]).norm() <= self.cell_size {
                                return g;
                            }
                        }
                    }
                }
            }
        }

        let g = self.points.len();
        self.points.push(*point);
        self.map.entry(key).or_default().push(g);
        g
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_fixtures::cube;
    use crate::topology::NO_ID;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn colocated_vertices_share_a_model_vertex() {
        let mut model = GeoModel::new("test");
        let corner = model.create_element(EntityType::Corner).unwrap();
        let line = model.create_element(EntityType::Line).unwrap();
        model
            .set_vertices_from_points(corner, &[p(1.0, 0.0, 0.0)], true)
            .unwrap();
        model
            .set_vertices_from_points(line, &[p(0.0, 0.0, 0.0), p(1.0 + 1e-12, 0.0, 0.0)], true)
            .unwrap();

        let nb = BuildUniqueVertices::new().execute(&mut model).unwrap();
        assert_eq!(nb, 2);
        assert_eq!(model.model_vertex_id(corner, 0).unwrap(), 0);
        assert_eq!(model.model_vertex_id(line, 1).unwrap(), 0);
        assert_eq!(model.vertices().occurrences(0).len(), 2);
        assert!(model.vertices().is_consistent(&model));
    }

    #[test]
    fn coarse_tolerance_merges_more() {
        let mut model = GeoModel::new("test");
        let line = model.create_element(EntityType::Line).unwrap();
        model
            .set_vertices_from_points(line, &[p(0.0, 0.0, 0.0), p(0.01, 0.0, 0.0)], true)
            .unwrap();

        assert_eq!(BuildUniqueVertices::new().execute(&mut model).unwrap(), 2);
        let nb = BuildUniqueVertices::new()
            .with_tolerance(0.1)
            .execute(&mut model)
            .unwrap();
        assert_eq!(nb, 1);
        assert_eq!(model.duplicated_vertices(line).unwrap(), vec![0, 1]);
    }

    #[test]
    fn tolerance_must_be_positive_and_finite() {
        let mut model = GeoModel::new("test");
        let line = model.create_element(EntityType::Line).unwrap();
        model
            .set_vertices_from_points(line, &[p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.0)], true)
            .unwrap();
        for tolerance in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = BuildUniqueVertices::new()
                .with_tolerance(tolerance)
                .execute(&mut model)
                .unwrap_err();
            assert!(matches!(
                err,
                crate::GeoRepError::Operation(OperationError::InvalidInput(_))
            ));
        }
        assert_eq!(model.model_vertex_id(line, 0).unwrap(), NO_ID);
    }

    #[test]
    fn far_points_and_exact_distance() {
        let mut model = GeoModel::new("test");
        let line = model.create_element(EntityType::Line).unwrap();
        let far = p(1e300, -1e300, 0.0);
        model
            .set_vertices_from_points(line, &[far, far, p(0.0, 0.0, 0.0), p(0.5, 0.0, 0.0)], true)
            .unwrap();
        let nb = BuildUniqueVertices::new()
            .with_tolerance(0.5)
            .execute(&mut model)
            .unwrap();
        assert_eq!(nb, 2);
        let gid = |v| model.model_vertex_id(line, v).unwrap();
        assert_eq!(gid(0), gid(1));
        assert_eq!(gid(2), gid(3));
    }

    #[test]
    fn rebuilding_a_wired_model_keeps_its_vertices() {
        let mut model = cube();
        assert_eq!(BuildUniqueVertices::new().execute(&mut model).unwrap(), 8);
        assert!(model.vertices().is_consistent(&model));
        for surface in model.elements(EntityType::Surface) {
            let gids = surface.mesh().unwrap().model_vertex_ids();
            assert!(gids.iter().all(|&g| g != NO_ID));
            assert_eq!(model.vertices().occurrences(gids[0]).len(), 1 + 3 + 3);
        }
    }
}
