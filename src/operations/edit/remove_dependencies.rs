use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::{OperationError, Result, TopologyError};
use crate::operations::query::IsValid;
use crate::topology::{EntityId, EntityType, GeoModel};

use super::{extend_with_dependencies, RemoveEntities, SetUniverse};

/// Removes one region with everything that only exists because of it.
///
/// The surfaces of the region that stay in the model and are not on the
/// volume of interest become boundaries of the universe, oriented `true`,
/// next to the surviving universe surfaces. The model is checked for
/// validity afterwards.
pub struct RemoveEntitiesAndDependencies {
    seeds: Vec<EntityId>,
}

impl RemoveEntitiesAndDependencies {
    /// Creates a new `RemoveEntitiesAndDependencies` operation. Only a
    /// single region is supported as seed.
    #[must_use]
    pub fn new(seeds: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            seeds: seeds.into_iter().collect(),
        }
    }

    /// Executes the removal.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] unless the seeds are exactly
    /// one existing region, and [`TopologyError::InvalidTopology`] if the
    /// resulting model is not valid.
    pub fn execute(&self, model: &mut GeoModel) -> Result<()> {
        let region = match self.seeds[..] {
            [id] if id.ty == EntityType::Region => id,
            _ => {
                return Err(OperationError::InvalidInput(format!(
                    "expected exactly one region, got {:?}",
                    self.seeds
                ))
                .into())
            }
        };

        let mut exposed = Vec::new();
        for &surface in model.element(region)?.boundaries() {
            if !exposed.contains(&surface) && !model.is_on_voi(surface)? {
                exposed.push(surface);
            }
        }

        let mut closure = BTreeSet::from([region]);
        extend_with_dependencies(model, &mut closure)?;
        let renumbering = RemoveEntities::new(closure).execute(model)?;

        // The universe already went through the renumbering and keeps its
        // sides; newly exposed surfaces face outward.
        let universe = model.universe();
        let mut boundaries: Vec<(usize, bool)> = universe
            .boundaries()
            .iter()
            .zip(universe.sides())
            .map(|(s, &side)| (s.index, side))
            .collect();
        for surface in exposed {
            if let Some(new_id) = renumbering.new_id(surface)? {
                if boundaries.iter().all(|&(s, _)| s != new_id.index) {
                    boundaries.push((new_id.index, true));
                }
            }
        }
        info!(
            "removed {region} with its dependencies, universe bounded by {} surfaces",
            boundaries.len()
        );
        SetUniverse::new(boundaries).execute(model)?;

        let issues = IsValid::new().execute(model);
        if let Some(first) = issues.first() {
            warn!("model invalid after removing {region}: {} issues", issues.len());
            return Err(TopologyError::InvalidTopology(first.to_string()).into());
        }
        Ok(())
    }
}
