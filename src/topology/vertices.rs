use crate::error::TopologyError;
use crate::math::Point3;

use super::entity_id::{EntityId, NO_ID};
use super::{EntityType, GeoModel};

/// One local vertex of one entity standing for a model vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexInEntity {
    pub entity: EntityId,
    pub local: usize,
}

impl VertexInEntity {
    #[must_use]
    pub fn new(entity: EntityId, local: usize) -> Self {
        Self { entity, local }
    }
}

/// Shared-vertex registry: the unique vertices of a model and, for each, the
/// ordered set of entity vertices that are colocated with it.
///
/// The registry never owns meshes. It is kept in step with the local-to-model
/// maps of the mesh entities by the model container.
#[derive(Debug, Clone, Default)]
pub struct GeoModelVertices {
    points: Vec<Point3>,
    occurrences: Vec<Vec<VertexInEntity>>,
}

impl GeoModelVertices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of model vertices.
    #[must_use]
    pub fn nb(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn point(&self, g: usize) -> Option<&Point3> {
        self.points.get(g)
    }

    /// Colocated entity vertices of model vertex `g`, sorted.
    #[must_use]
    pub fn occurrences(&self, g: usize) -> &[VertexInEntity] {
        self.occurrences.get(g).map_or(&[], Vec::as_slice)
    }

    /// Appends a model vertex with no occurrence and returns its id.
    pub fn add_vertex(&mut self, point: Point3) -> usize {
        self.points.push(point);
        self.occurrences.push(Vec::new());
        self.points.len() - 1
    }

    /// First local vertex of `entity` standing for model vertex `g`.
    #[must_use]
    pub fn local_id(&self, g: usize, entity: EntityId) -> Option<usize> {
        self.occurrences(g)
            .iter()
            .find(|o| o.entity == entity)
            .map(|o| o.local)
    }

    /// Number of occurrences of `g` inside `entity`.
    #[must_use]
    pub fn nb_occurrences_in(&self, g: usize, entity: EntityId) -> usize {
        self.occurrences(g)
            .iter()
            .filter(|o| o.entity == entity)
            .count()
    }

    /// Whether the registry and the vertex maps of the mesh entities of
    /// `model` agree: every occurrence reads back to its model vertex, and
    /// every bound entity vertex is listed as an occurrence.
    #[must_use]
    pub fn is_consistent(&self, model: &GeoModel) -> bool {
        for (g, list) in self.occurrences.iter().enumerate() {
            for o in list {
                let bound = model
                    .entity_mesh(o.entity)
                    .map(|mesh| mesh.model_vertex_id(o.local));
                if !matches!(bound, Ok(b) if b == g) {
                    return false;
                }
            }
        }
        EntityType::MESH.iter().all(|&ty| {
            model.elements(ty).iter().all(|entity| {
                entity.mesh().is_none_or(|mesh| {
                    mesh.model_vertex_ids()
                        .iter()
                        .enumerate()
                        .all(|(local, &g)| {
                            g == NO_ID
                                || self
                                    .occurrences(g)
                                    .contains(&VertexInEntity::new(entity.id(), local))
                        })
                })
            })
        })
    }

    pub(crate) fn set_point(&mut self, g: usize, point: Point3) {
        if let Some(slot) = self.points.get_mut(g) {
            *slot = point;
        }
    }

    /// Records that local vertex `local` of `entity` stands for `g`.
    /// Returns `false` if `g` does not exist.
    pub(crate) fn add_occurrence(&mut self, g: usize, entity: EntityId, local: usize) -> bool {
        let Some(list) = self.occurrences.get_mut(g) else {
            return false;
        };
        let occurrence = VertexInEntity::new(entity, local);
        if let Err(pos) = list.binary_search(&occurrence) {
            list.insert(pos, occurrence);
        }
        true
    }

    pub(crate) fn remove_occurrence(&mut self, g: usize, entity: EntityId, local: usize) {
        if let Some(list) = self.occurrences.get_mut(g) {
            list.retain(|o| !(o.entity == entity && o.local == local));
        }
    }

    /// Forgets every occurrence, keeping the vertices.
    pub(crate) fn clear_occurrences(&mut self) {
        for list in &mut self.occurrences {
            list.clear();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.occurrences.clear();
    }

    /// Rewrites the entity of every occurrence through `map` and drops the
    /// occurrences whose entity is gone. Vertices that lose their last
    /// occurrence are deleted and the rest compacted.
    ///
    /// Returns the old-to-new vertex table ([`NO_ID`] for deleted vertices).
    ///
    /// # Errors
    ///
    /// Returns the first error of `map`; the registry is then left as it was.
    pub(crate) fn remap_entities<F>(&mut self, mut map: F) -> Result<Vec<usize>, TopologyError>
    where
        F: FnMut(EntityId) -> Result<Option<EntityId>, TopologyError>,
    {
        let mut table = Vec::with_capacity(self.points.len());
        let mut points = Vec::with_capacity(self.points.len());
        let mut occurrences = Vec::with_capacity(self.points.len());

        for (point, list) in self.points.iter().zip(&self.occurrences) {
            let mut remapped = Vec::with_capacity(list.len());
            for o in list {
                if let Some(entity) = map(o.entity)? {
                    remapped.push(VertexInEntity::new(entity, o.local));
                }
            }
            if !list.is_empty() && remapped.is_empty() {
                table.push(NO_ID);
                continue;
            }
            remapped.sort_unstable();
            table.push(points.len());
            points.push(*point);
            occurrences.push(remapped);
        }

        self.points = points;
        self.occurrences = occurrences;
        Ok(table)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn occurrences_stay_sorted_and_unique() {
        let mut vertices = GeoModelVertices::new();
        let g = vertices.add_vertex(Point3::origin());
        assert!(vertices.add_occurrence(g, EntityId::surface(1), 4));
        assert!(vertices.add_occurrence(g, EntityId::corner(0), 0));
        assert!(vertices.add_occurrence(g, EntityId::surface(1), 4));
        assert!(!vertices.add_occurrence(7, EntityId::corner(0), 0));

        assert_eq!(
            vertices.occurrences(g),
            &[
                VertexInEntity::new(EntityId::corner(0), 0),
                VertexInEntity::new(EntityId::surface(1), 4)
            ]
        );
        assert_eq!(vertices.local_id(g, EntityId::surface(1)), Some(4));
        assert_eq!(vertices.local_id(g, EntityId::line(0)), None);
    }

    #[test]
    fn remap_prunes_orphaned_vertices() {
        let mut vertices = GeoModelVertices::new();
        let a = vertices.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = vertices.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = vertices.add_vertex(Point3::new(2.0, 0.0, 0.0));
        let free = vertices.add_vertex(Point3::new(3.0, 0.0, 0.0));
        vertices.add_occurrence(a, EntityId::line(0), 0);
        vertices.add_occurrence(b, EntityId::line(0), 1);
        vertices.add_occurrence(b, EntityId::line(1), 0);
        vertices.add_occurrence(c, EntityId::line(1), 1);

        // Line 0 is deleted, line 1 becomes line 0.
        let table = vertices
            .remap_entities(|id| match id.index {
                0 => Ok(None),
                i => Ok(Some(EntityId::line(i - 1))),
            })
            .unwrap();

        assert_eq!(table, vec![NO_ID, 0, 1, 2]);
        assert_eq!(vertices.nb(), 3);
        assert_eq!(
            vertices.occurrences(0),
            &[VertexInEntity::new(EntityId::line(0), 0)]
        );
        assert_eq!(vertices.point(2), Some(&Point3::new(3.0, 0.0, 0.0)));
        assert!(vertices.occurrences(free - 1).is_empty());
    }

    #[test]
    fn failed_remap_leaves_the_registry_untouched() {
        let mut vertices = GeoModelVertices::new();
        let a = vertices.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = vertices.add_vertex(Point3::new(1.0, 0.0, 0.0));
        vertices.add_occurrence(a, EntityId::line(0), 0);
        vertices.add_occurrence(b, EntityId::line(7), 0);

        let err = vertices
            .remap_entities(|id| match id.index {
                0 => Ok(None),
                _ => Err(TopologyError::Inconsistent(format!("{id} is unknown"))),
            })
            .unwrap_err();
        assert!(matches!(err, TopologyError::Inconsistent(_)));
        assert_eq!(vertices.nb(), 2);
        assert_eq!(
            vertices.occurrences(a),
            &[VertexInEntity::new(EntityId::line(0), 0)]
        );
    }
}
