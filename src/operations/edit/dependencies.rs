use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::topology::{Entity, EntityId, EntityType, GeoModel};

/// Computes the entities that must go together with a set of entities.
///
/// The closure adds the children of every entity in the set, every
/// geological entity whose children are all in the set, and every mesh
/// entity whose in-boundary entities are all in the set, until nothing
/// more joins.
pub struct DependentEntities {
    seeds: BTreeSet<EntityId>,
}

impl DependentEntities {
    /// Creates a new `DependentEntities` query.
    #[must_use]
    pub fn new(seeds: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            seeds: seeds.into_iter().collect(),
        }
    }

    /// Executes the query, returning the closed set (seeds included).
    ///
    /// # Errors
    ///
    /// Returns an error if an entity of the set does not exist.
    pub fn execute(&self, model: &GeoModel) -> Result<BTreeSet<EntityId>> {
        let mut set = self.seeds.clone();
        extend_with_dependencies(model, &mut set)?;
        Ok(set)
    }
}

/// Extends `set` in place with its dependent entities.
///
/// Returns whether the set grew.
///
/// # Errors
///
/// Returns an error if an entity of the set does not exist.
pub fn extend_with_dependencies(
    model: &GeoModel,
    set: &mut BTreeSet<EntityId>,
) -> std::result::Result<bool, TopologyError> {
    let initial = set.len();
    loop {
        let before = set.len();

        let mut children = Vec::new();
        for &id in set.iter() {
            children.extend_from_slice(model.element(id)?.children());
        }
        set.extend(children);

        for ty in EntityType::GEOLOGICAL {
            join_if_all_in(model.elements(ty), set, Entity::children);
        }
        for ty in EntityType::MESH {
            join_if_all_in(model.elements(ty), set, Entity::in_boundary);
        }

        if set.len() == before {
            break;
        }
    }

    let grew = set.len() > initial;
    if grew {
        debug!(
            "dependency closure grew from {initial} to {} entities",
            set.len()
        );
    }
    Ok(grew)
}

/// Adds every entity whose non-empty `related` list lies in `set`.
fn join_if_all_in(
    entities: &[Entity],
    set: &mut BTreeSet<EntityId>,
    related: fn(&Entity) -> &[EntityId],
) {
    for entity in entities {
        let links = related(entity);
        if !links.is_empty()
            && !set.contains(&entity.id())
            && links.iter().all(|l| set.contains(l))
        {
            set.insert(entity.id());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_fixtures::{cube, two_cubes};

    #[test]
    fn region_takes_its_whole_cube() {
        let model = cube();
        let set = DependentEntities::new([EntityId::region(0)])
            .execute(&model)
            .unwrap();
        assert_eq!(set.len(), 1 + 6 + 12 + 8);
    }

    #[test]
    fn shared_face_survives() {
        let model = two_cubes();
        let set = DependentEntities::new([EntityId::region(1)])
            .execute(&model)
            .unwrap();
        let count = |ty: EntityType| set.iter().filter(|id| id.ty == ty).count();
        assert_eq!(count(EntityType::Surface), 5);
        assert_eq!(count(EntityType::Line), 8);
        assert_eq!(count(EntityType::Corner), 4);
        assert!(!set.contains(&EntityId::surface(5)));
    }

    #[test]
    fn empty_grouping_joins() {
        let mut model = GeoModel::new("layers");
        model.resize_elements(EntityType::Region, 4).unwrap();
        let layer = model.create_element(EntityType::Layer).unwrap();
        for r in 0..3 {
            model
                .add_parent_child_relation(layer, EntityId::region(r))
                .unwrap();
        }

        let mut set: BTreeSet<EntityId> = (0..3).map(EntityId::region).collect();
        assert!(extend_with_dependencies(&model, &mut set).unwrap());
        assert!(set.contains(&layer));
        assert!(!set.contains(&EntityId::region(3)));
    }

    #[test]
    fn children_follow_their_parent() {
        let mut model = GeoModel::new("layers");
        model.resize_elements(EntityType::Region, 2).unwrap();
        let layer = model.create_element(EntityType::Layer).unwrap();
        model.add_parent_child_relation(layer, EntityId::region(0)).unwrap();
        model.add_parent_child_relation(layer, EntityId::region(1)).unwrap();

        let set = DependentEntities::new([layer]).execute(&model).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn closure_is_idempotent() {
        let model = two_cubes();
        let mut set: BTreeSet<EntityId> = [EntityId::region(0)].into();
        assert!(extend_with_dependencies(&model, &mut set).unwrap());
        let first = set.clone();
        assert!(!extend_with_dependencies(&model, &mut set).unwrap());
        assert_eq!(set, first);
    }

    #[test]
    fn unknown_entity_fails() {
        let model = cube();
        assert!(DependentEntities::new([EntityId::region(3)])
            .execute(&model)
            .is_err());
    }
}
