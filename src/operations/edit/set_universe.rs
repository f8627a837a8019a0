use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::topology::{EntityId, EntityType, GeoModel};

/// Replaces the boundary list of the universe.
///
/// Each entry is a surface index and its side flag. The universe only gets
/// forward links: surfaces never list it among their in-boundary entities.
pub struct SetUniverse {
    boundaries: Vec<(usize, bool)>,
}

impl SetUniverse {
    /// Creates a new `SetUniverse` operation.
    #[must_use]
    pub fn new(boundaries: impl IntoIterator<Item = (usize, bool)>) -> Self {
        Self {
            boundaries: boundaries.into_iter().collect(),
        }
    }

    /// Executes the operation. Nothing changes if a surface is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a surface index is out of range.
    pub fn execute(&self, model: &mut GeoModel) -> Result<()> {
        let nb_surfaces = model.nb_elements(EntityType::Surface);
        if let Some(&(index, _)) = self.boundaries.iter().find(|(i, _)| *i >= nb_surfaces) {
            return Err(TopologyError::EntityNotFound {
                id: EntityId::surface(index),
            }
            .into());
        }

        let universe = model.universe_mut();
        universe.clear_boundaries();
        for &(index, side) in &self.boundaries {
            universe.push_boundary(EntityId::surface(index), Some(side));
        }
        debug!("universe bounded by {} surfaces", self.boundaries.len());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn replaces_previous_boundaries() {
        let mut model = GeoModel::new("test");
        model.resize_elements(EntityType::Surface, 3).unwrap();
        SetUniverse::new([(0, true), (1, true)]).execute(&mut model).unwrap();
        SetUniverse::new([(2, false)]).execute(&mut model).unwrap();

        let universe = model.universe();
        assert_eq!(universe.boundaries(), &[EntityId::surface(2)]);
        assert_eq!(universe.sides(), &[false]);
        assert!(model
            .element(EntityId::surface(2))
            .unwrap()
            .in_boundary()
            .is_empty());
    }

    #[test]
    fn missing_surface_leaves_universe_untouched() {
        let mut model = GeoModel::new("test");
        model.resize_elements(EntityType::Surface, 1).unwrap();
        SetUniverse::new([(0, true)]).execute(&mut model).unwrap();
        assert!(SetUniverse::new([(0, false), (4, true)])
            .execute(&mut model)
            .is_err());
        assert_eq!(model.universe().sides(), &[true]);
    }
}
