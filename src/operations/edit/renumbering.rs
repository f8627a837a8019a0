use std::collections::BTreeSet;

use crate::error::TopologyError;
use crate::topology::{EntityId, EntityType, GeoModel, NO_ID};

/// Old-to-new index tables for the removal of a set of entities.
///
/// Built once from the model and the removal set, before anything is
/// erased, then only read. An entity of type `T` at index `i` moves to `i`
/// minus the number of removed `T` entities below `i`; removed entities map
/// to [`NO_ID`].
#[derive(Debug, Clone)]
pub struct Renumbering {
    tables: [Vec<usize>; EntityType::STORED.len()],
}

impl Renumbering {
    /// Builds the tables for removing `removed` from `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity of `removed` does not exist or is not
    /// stored in a model collection.
    pub fn new(model: &GeoModel, removed: &BTreeSet<EntityId>) -> Result<Self, TopologyError> {
        let mut flags: [Vec<bool>; EntityType::STORED.len()] = Default::default();
        for (t, ty) in EntityType::STORED.into_iter().enumerate() {
            flags[t] = vec![false; model.nb_elements(ty)];
        }
        for &id in removed {
            let t = id.ty.storage_index().ok_or_else(|| {
                TopologyError::InvalidEntityType(format!("{id} cannot be removed"))
            })?;
            let flag = flags[t]
                .get_mut(id.index)
                .ok_or(TopologyError::EntityNotFound { id })?;
            *flag = true;
        }

        let tables = flags.map(|deleted| {
            let mut nb_deleted = 0;
            deleted
                .into_iter()
                .enumerate()
                .map(|(i, d)| {
                    if d {
                        nb_deleted += 1;
                        NO_ID
                    } else {
                        i - nb_deleted
                    }
                })
                .collect::<Vec<usize>>()
        });
        Ok(Self { tables })
    }

    /// Table of type `ty`; empty for types without a collection.
    #[must_use]
    pub fn table(&self, ty: EntityType) -> &[usize] {
        match ty.storage_index() {
            Some(t) => &self.tables[t],
            None => &[],
        }
    }

    #[must_use]
    pub fn is_removed(&self, id: EntityId) -> bool {
        self.table(id.ty).get(id.index) == Some(&NO_ID)
    }

    /// Number of removed entities of type `ty`.
    #[must_use]
    pub fn nb_removed(&self, ty: EntityType) -> usize {
        self.table(ty).iter().filter(|&&i| i == NO_ID).count()
    }

    /// Whether nothing is removed.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.tables.iter().flatten().all(|&i| i != NO_ID)
    }

    /// New id of `id`, `None` if it is removed. The universe keeps its id.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Inconsistent`] if `id` lies outside the
    /// tables: a reference the model should never hold.
    pub fn new_id(&self, id: EntityId) -> Result<Option<EntityId>, TopologyError> {
        if id.ty == EntityType::Universe {
            return Ok(Some(id));
        }
        match self.table(id.ty).get(id.index) {
            Some(&NO_ID) => Ok(None),
            Some(&index) => Ok(Some(EntityId::new(id.ty, index))),
            None => {
                debug_assert!(false, "{id} is outside the renumbering tables");
                Err(TopologyError::Inconsistent(format!(
                    "{id} is outside the renumbering tables"
                )))
            }
        }
    }
}
