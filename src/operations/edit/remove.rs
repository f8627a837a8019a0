use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::Result;
use crate::topology::{EntityId, EntityType, GeoModel, NO_ID};

use super::Renumbering;

/// Removes exactly the given entities and renumbers the survivors.
///
/// No dependency closure is computed: references from survivors to removed
/// entities are dropped, so callers wanting a cascade run
/// [`DependentEntities`](super::DependentEntities) first. The shared-vertex
/// registry loses the vertices no survivor uses and is rebuilt.
pub struct RemoveEntities {
    entities: BTreeSet<EntityId>,
}

impl RemoveEntities {
    /// Creates a new `RemoveEntities` operation.
    #[must_use]
    pub fn new(entities: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            entities: entities.into_iter().collect(),
        }
    }

    /// Executes the removal, returning the renumbering that was applied.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity of the set does not exist, before
    /// anything is changed.
    pub fn execute(&self, model: &mut GeoModel) -> Result<Renumbering> {
        let renumbering = Renumbering::new(model, &self.entities)?;
        if self.entities.is_empty() {
            return Ok(renumbering);
        }

        let vertex_table = model
            .vertices_mut()
            .remap_entities(|id| renumbering.new_id(id))?;

        for ty in EntityType::STORED {
            let table = renumbering.table(ty);
            let store = model.collection_mut(ty)?;
            let mut index = 0;
            store.retain(|_| {
                let keep = table[index] != NO_ID;
                index += 1;
                keep
            });
        }

        for entity in model.all_elements_mut() {
            if let Some(new_id) = renumbering.new_id(entity.id())? {
                entity.set_id(new_id);
            }
            entity.remap_references(|r| renumbering.new_id(r))?;
            if let Some(mesh) = entity.mesh_mut() {
                mesh.remap_model_vertices(&vertex_table);
            }
        }
        model
            .universe_mut()
            .remap_references(|r| renumbering.new_id(r))?;
        model.rebuild_vertex_occurrences()?;

        for ty in EntityType::STORED {
            let nb = renumbering.nb_removed(ty);
            if nb > 0 {
                debug!("removed {nb} {ty} entities");
            }
        }
        info!(
            "removed {} entities, {} model vertices left",
            self.entities.len(),
            model.vertices().nb()
        );
        Ok(renumbering)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_fixtures::{cube, init_tracing, two_cubes};

    fn references(model: &GeoModel) -> Vec<EntityId> {
        let mut refs = Vec::new();
        for ty in EntityType::STORED {
            for e in model.elements(ty) {
                refs.extend_from_slice(e.boundaries());
                refs.extend_from_slice(e.in_boundary());
                refs.extend_from_slice(e.children());
                refs.extend(e.parent());
            }
        }
        refs.extend_from_slice(model.universe().boundaries());
        refs
    }

    #[test]
    fn empty_set_changes_nothing() {
        let mut model = cube();
        let before = format!("{model:?}");
        let renumbering = RemoveEntities::new([]).execute(&mut model).unwrap();
        assert!(renumbering.is_identity());
        assert_eq!(format!("{model:?}"), before);
    }

    #[test]
    fn survivors_are_ranked_by_original_index() {
        init_tracing();
        let mut model = two_cubes();
        let old_names: Vec<_> = (0..model.nb_elements(EntityType::Surface))
            .map(|i| format!("s{i}"))
            .collect();
        for (i, name) in old_names.iter().enumerate() {
            model.set_entity_name(EntityId::surface(i), name.clone()).unwrap();
        }

        let removed = [EntityId::surface(0), EntityId::surface(7), EntityId::line(3)];
        RemoveEntities::new(removed).execute(&mut model).unwrap();

        assert_eq!(model.nb_elements(EntityType::Surface), 9);
        assert_eq!(model.nb_elements(EntityType::Line), 19);
        let names: Vec<&str> = model
            .elements(EntityType::Surface)
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, ["s1", "s2", "s3", "s4", "s5", "s6", "s8", "s9", "s10"]);
        for (i, s) in model.elements(EntityType::Surface).iter().enumerate() {
            assert_eq!(s.id(), EntityId::surface(i));
        }
    }

    #[test]
    fn references_to_removed_entities_are_dropped() {
        let mut model = two_cubes();
        let region0_sides = model.element(EntityId::region(0)).unwrap().nb_boundaries();
        RemoveEntities::new([EntityId::surface(2)])
            .execute(&mut model)
            .unwrap();

        for r in references(&model) {
            if r.ty != EntityType::Universe {
                assert!(model.element(r).is_ok(), "dangling reference {r}");
            }
        }
        let region0 = model.element(EntityId::region(0)).unwrap();
        assert_eq!(region0.nb_boundaries(), region0_sides - 1);
        assert_eq!(region0.sides().len(), region0.nb_boundaries());
        assert_eq!(model.universe().sides().len(), 9);
        // Surface 5 of the old numbering, shared by both cubes, is now 4.
        let regions = model.element(EntityId::surface(4)).unwrap().in_boundary();
        assert_eq!(regions, &[EntityId::region(0), EntityId::region(1)]);
    }

    #[test]
    fn registry_follows_removed_meshes() {
        let mut model = cube();
        let closure = crate::operations::edit::DependentEntities::new([EntityId::region(0)])
            .execute(&model)
            .unwrap();
        RemoveEntities::new(closure).execute(&mut model).unwrap();
        for ty in EntityType::STORED {
            assert_eq!(model.nb_elements(ty), 0);
        }
        assert_eq!(model.vertices().nb(), 0);
        assert!(model.universe().boundaries().is_empty());
    }

    #[test]
    #[cfg_attr(
        debug_assertions,
        should_panic(expected = "outside the renumbering tables")
    )]
    fn stale_registry_entry_is_reported_not_pruned() {
        let mut model = cube();
        assert!(model
            .vertices_mut()
            .add_occurrence(0, EntityId::line(99), 0));
        let err = RemoveEntities::new([EntityId::corner(7)])
            .execute(&mut model)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::GeoRepError::Topology(crate::error::TopologyError::Inconsistent(_))
        ));
        assert_eq!(model.nb_elements(EntityType::Corner), 8);
    }

    #[test]
    fn registry_stays_consistent_after_partial_removal() {
        let mut model = two_cubes();
        // Corner 2 sits at (2, 0, 0); removing it orphans model vertex 2
        // only if no line still uses it.
        RemoveEntities::new([EntityId::corner(2)])
            .execute(&mut model)
            .unwrap();
        assert_eq!(model.vertices().nb(), 12);
        assert!(model.vertices().is_consistent(&model));
        assert!(model
            .elements(EntityType::Line)
            .iter()
            .all(|l| l.mesh().unwrap().model_vertex_ids().iter().all(|&g| g != NO_ID)));
    }
}
