//! Incremental wiring of the entity graph.
//!
//! The single-direction setters write exactly one list; the `*_relation`
//! helpers write both directions. Every referenced type is checked against
//! the type registry.

use crate::error::TopologyError;

use super::{EntityId, EntityType, GeoModel, GeologicalFeature};

fn check_type(
    expected: Option<EntityType>,
    got: EntityId,
    relation: &str,
    of: EntityId,
) -> Result<(), TopologyError> {
    match expected {
        Some(ty) if ty == got.ty => Ok(()),
        Some(ty) => Err(TopologyError::InvalidEntityType(format!(
            "{relation} of {of} must be a {ty}, got {got}"
        ))),
        None => Err(TopologyError::InvalidEntityType(format!(
            "{of} cannot have a {relation}"
        ))),
    }
}

/// Regions and the universe carry one side flag per boundary.
fn has_sides(ty: EntityType) -> bool {
    matches!(ty, EntityType::Region | EntityType::Universe)
}

impl GeoModel {
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn set_entity_name(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
    ) -> Result<(), TopologyError> {
        self.modifiable_element(id)?.set_name(name.into());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn set_geological_feature(
        &mut self,
        id: EntityId,
        feature: GeologicalFeature,
    ) -> Result<(), TopologyError> {
        self.modifiable_element(id)?.set_geological_feature(feature);
        Ok(())
    }

    /// Appends `boundary` to the boundary list of `id`. `side` is only
    /// recorded for regions and the universe.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity does not exist or `boundary` has
    /// the wrong type.
    pub fn add_boundary(
        &mut self,
        id: EntityId,
        boundary: EntityId,
        side: bool,
    ) -> Result<(), TopologyError> {
        check_type(id.ty.boundary_type(), boundary, "boundary", id)?;
        self.element(boundary)?;
        let side = has_sides(id.ty).then_some(side);
        self.modifiable_element(id)?.push_boundary(boundary, side);
        Ok(())
    }

    /// Replaces boundary `k` of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity does not exist, `boundary` has the
    /// wrong type, or `k` is out of range.
    pub fn set_boundary(
        &mut self,
        id: EntityId,
        k: usize,
        boundary: EntityId,
        side: bool,
    ) -> Result<(), TopologyError> {
        check_type(id.ty.boundary_type(), boundary, "boundary", id)?;
        self.element(boundary)?;
        let entity = self.modifiable_element(id)?;
        if k >= entity.nb_boundaries() {
            return Err(TopologyError::InvalidTopology(format!(
                "{id} has {} boundaries, no boundary {k}",
                entity.nb_boundaries()
            )));
        }
        entity.set_boundary(k, boundary, has_sides(id.ty).then_some(side));
        Ok(())
    }

    /// Appends `in_boundary` to the in-boundary list of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity does not exist or `in_boundary` has
    /// the wrong type.
    pub fn add_in_boundary(
        &mut self,
        id: EntityId,
        in_boundary: EntityId,
    ) -> Result<(), TopologyError> {
        check_type(id.ty.in_boundary_type(), in_boundary, "in-boundary", id)?;
        self.element(in_boundary)?;
        self.modifiable_element(id)?.push_in_boundary(in_boundary);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if either entity does not exist or `parent` has the
    /// wrong type.
    pub fn set_parent(&mut self, id: EntityId, parent: EntityId) -> Result<(), TopologyError> {
        check_type(id.ty.parent_type(), parent, "parent", id)?;
        self.element(parent)?;
        self.modifiable_element(id)?.set_parent(Some(parent));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if either entity does not exist or `child` has the
    /// wrong type.
    pub fn add_child(&mut self, id: EntityId, child: EntityId) -> Result<(), TopologyError> {
        check_type(id.ty.child_type(), child, "child", id)?;
        self.element(child)?;
        self.modifiable_element(id)?.push_child(child);
        Ok(())
    }

    /// Records `boundary` as a boundary of `id` and `id` as in-boundary of
    /// `boundary`. The universe only gets the forward link.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity does not exist or the types do not
    /// match.
    pub fn add_boundary_relation(
        &mut self,
        id: EntityId,
        boundary: EntityId,
        side: bool,
    ) -> Result<(), TopologyError> {
        self.add_boundary(id, boundary, side)?;
        if id.ty != EntityType::Universe {
            self.add_in_boundary(boundary, id)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if either entity does not exist or the types do not
    /// match.
    pub fn add_parent_child_relation(
        &mut self,
        parent: EntityId,
        child: EntityId,
    ) -> Result<(), TopologyError> {
        self.add_child(parent, child)?;
        self.set_parent(child, parent)
    }

    /// Rebuilds every in-boundary list from the boundary lists.
    pub fn fill_in_boundaries(&mut self) {
        let mut links = Vec::new();
        for ty in EntityType::MESH {
            for entity in self.elements(ty) {
                links.extend(entity.boundaries().iter().map(|&b| (b, entity.id())));
            }
        }
        for entity in self.all_elements_mut() {
            entity.clear_in_boundary();
        }
        for (boundary, id) in links {
            if let Ok(entity) = self.modifiable_element(boundary) {
                entity.push_in_boundary(id);
            }
        }
    }

    /// Rebuilds every children list from the parents of the mesh entities.
    pub fn fill_children(&mut self) {
        let mut links = Vec::new();
        for ty in EntityType::MESH {
            for entity in self.elements(ty) {
                if let Some(parent) = entity.parent() {
                    links.push((parent, entity.id()));
                }
            }
        }
        for entity in self.all_elements_mut() {
            entity.clear_children();
        }
        for (parent, id) in links {
            if let Ok(entity) = self.modifiable_element(parent) {
                entity.push_child(id);
            }
        }
    }

    /// Whether both boundary corners of `line` are the same corner.
    ///
    /// # Errors
    ///
    /// Returns an error if `line` is not an existing line.
    pub fn is_line_closed(&self, line: EntityId) -> Result<bool, TopologyError> {
        check_type(Some(EntityType::Line), line, "closure query", line)?;
        let entity = self.element(line)?;
        Ok(entity.nb_boundaries() == 2 && entity.boundary(0) == entity.boundary(1))
    }

    /// Whether `id` appears more than once in the boundaries of `of`, i.e.
    /// both sides of `of` touch it.
    ///
    /// # Errors
    ///
    /// Returns an error if `of` does not exist.
    pub fn is_inside_border(&self, id: EntityId, of: EntityId) -> Result<bool, TopologyError> {
        let count = self
            .element(of)?
            .boundaries()
            .iter()
            .filter(|&&b| b == id)
            .count();
        Ok(count > 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn layered_model() -> GeoModel {
        let mut model = GeoModel::new("test");
        model.resize_elements(EntityType::Corner, 2).unwrap();
        model.resize_elements(EntityType::Line, 1).unwrap();
        model.resize_elements(EntityType::Region, 2).unwrap();
        model.resize_elements(EntityType::Layer, 1).unwrap();
        model
    }

    #[test]
    fn relation_helpers_write_both_directions() {
        let mut model = layered_model();
        let line = EntityId::line(0);
        model.add_boundary_relation(line, EntityId::corner(0), true).unwrap();
        model.add_boundary_relation(line, EntityId::corner(1), true).unwrap();

        let layer = EntityId::new(EntityType::Layer, 0);
        model.add_parent_child_relation(layer, EntityId::region(1)).unwrap();

        assert_eq!(model.element(line).unwrap().boundaries().len(), 2);
        assert!(model.element(line).unwrap().sides().is_empty());
        assert_eq!(model.element(EntityId::corner(1)).unwrap().in_boundary(), &[line]);
        assert_eq!(model.element(layer).unwrap().children(), &[EntityId::region(1)]);
        assert_eq!(model.element(EntityId::region(1)).unwrap().parent(), Some(layer));
        assert!(!model.is_line_closed(line).unwrap());
    }

    #[test]
    fn mismatching_types_are_rejected() {
        let mut model = layered_model();
        assert!(matches!(
            model.add_boundary(EntityId::line(0), EntityId::region(0), true),
            Err(TopologyError::InvalidEntityType(_))
        ));
        assert!(model.add_boundary(EntityId::corner(0), EntityId::corner(1), true).is_err());
        assert!(model
            .set_parent(EntityId::region(0), EntityId::line(0))
            .is_err());
        assert!(matches!(
            model.add_boundary(EntityId::line(0), EntityId::corner(5), true),
            Err(TopologyError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn region_sides_follow_boundaries() {
        let mut model = GeoModel::new("test");
        model.resize_elements(EntityType::Surface, 2).unwrap();
        model.resize_elements(EntityType::Region, 1).unwrap();
        let region = EntityId::region(0);
        model.add_boundary_relation(region, EntityId::surface(0), true).unwrap();
        model.add_boundary_relation(region, EntityId::surface(1), false).unwrap();
        model.set_boundary(region, 0, EntityId::surface(1), false).unwrap();

        let entity = model.element(region).unwrap();
        assert_eq!(entity.sides(), &[false, false]);
        assert!(model.is_inside_border(EntityId::surface(1), region).unwrap());
        assert!(model.set_boundary(region, 2, EntityId::surface(0), true).is_err());
    }

    #[test]
    fn fill_rebuilds_inverse_lists() {
        let mut model = layered_model();
        let line = EntityId::line(0);
        let layer = EntityId::new(EntityType::Layer, 0);
        model.add_boundary(line, EntityId::corner(0), true).unwrap();
        model.add_boundary(line, EntityId::corner(0), true).unwrap();
        model.set_parent(EntityId::region(0), layer).unwrap();
        model.set_parent(EntityId::region(1), layer).unwrap();

        model.fill_in_boundaries();
        model.fill_children();

        assert_eq!(
            model.element(EntityId::corner(0)).unwrap().in_boundary(),
            &[line, line]
        );
        assert!(model.element(EntityId::corner(1)).unwrap().in_boundary().is_empty());
        assert_eq!(model.element(layer).unwrap().nb_children(), 2);
        assert!(model.is_line_closed(line).unwrap());
    }
}
