pub mod connectivity;
pub mod entity;
pub mod entity_id;
pub mod entity_type;
pub mod feature;
pub mod geometry;
pub mod mesh_entity;
pub mod surface;
pub mod vertices;

pub use entity::{Entity, EntityKind};
pub use entity_id::{EntityId, NO_ID};
pub use entity_type::EntityType;
pub use feature::GeologicalFeature;
pub use mesh_entity::MeshComponent;
pub use surface::BorderStep;
pub use vertices::{GeoModelVertices, VertexInEntity};

use crate::error::TopologyError;

const NB_STORED_TYPES: usize = EntityType::STORED.len();

/// Central container owning every entity of a geological model.
///
/// Entities of each type live in a dense vector indexed by
/// [`EntityId::index`]; the universe is kept apart and the shared-vertex
/// registry sits next to them. Entities refer to each other only by id.
#[derive(Debug, Clone)]
pub struct GeoModel {
    name: String,
    entities: [Vec<Entity>; NB_STORED_TYPES],
    universe: Entity,
    vertices: GeoModelVertices,
}

impl Default for GeoModel {
    fn default() -> Self {
        let mut universe = Entity::new(EntityId::universe());
        universe.set_name("Universe".into());
        Self {
            name: String::new(),
            entities: Default::default(),
            universe,
            vertices: GeoModelVertices::new(),
        }
    }
}

impl GeoModel {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entities of type `ty`; always 0 for non-stored types.
    #[must_use]
    pub fn nb_elements(&self, ty: EntityType) -> usize {
        self.elements(ty).len()
    }

    /// All entities of type `ty`, in index order.
    #[must_use]
    pub fn elements(&self, ty: EntityType) -> &[Entity] {
        match ty.storage_index() {
            Some(t) => &self.entities[t],
            None => &[],
        }
    }

    /// Returns the entity with the given id, or an error if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range for its type.
    pub fn element(&self, id: EntityId) -> Result<&Entity, TopologyError> {
        if id.ty == EntityType::Universe {
            return Ok(&self.universe);
        }
        id.ty
            .storage_index()
            .and_then(|t| self.entities[t].get(id.index))
            .ok_or(TopologyError::EntityNotFound { id })
    }

    /// Returns a mutable reference to the entity with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range for its type.
    pub fn modifiable_element(&mut self, id: EntityId) -> Result<&mut Entity, TopologyError> {
        if id.ty == EntityType::Universe {
            return Ok(&mut self.universe);
        }
        id.ty
            .storage_index()
            .and_then(|t| self.entities[t].get_mut(id.index))
            .ok_or(TopologyError::EntityNotFound { id })
    }

    /// Mesh of a mesh entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or carries no mesh.
    pub fn entity_mesh(&self, id: EntityId) -> Result<&MeshComponent, TopologyError> {
        self.element(id)?.mesh().ok_or_else(|| {
            TopologyError::InvalidEntityType(format!("{id} has no mesh"))
        })
    }

    /// Appends a new, empty entity of type `ty` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if `ty` is not stored in a model collection.
    pub fn create_element(&mut self, ty: EntityType) -> Result<EntityId, TopologyError> {
        let store = self.collection_mut(ty)?;
        let id = EntityId::new(ty, store.len());
        store.push(Entity::new(id));
        Ok(id)
    }

    /// Replaces the entities of type `ty` by `nb` new, empty ones.
    ///
    /// # Errors
    ///
    /// Returns an error if `ty` is not stored in a model collection.
    pub fn resize_elements(&mut self, ty: EntityType, nb: usize) -> Result<(), TopologyError> {
        let store = self.collection_mut(ty)?;
        *store = (0..nb).map(|i| Entity::new(EntityId::new(ty, i))).collect();
        Ok(())
    }

    /// The pseudo-region standing for the outside of the model.
    #[must_use]
    pub fn universe(&self) -> &Entity {
        &self.universe
    }

    /// The shared-vertex registry.
    #[must_use]
    pub fn vertices(&self) -> &GeoModelVertices {
        &self.vertices
    }

    /// Whether the entity, or one of the entities it bounds, lies on the
    /// boundary of the volume of interest.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity or one of its in-boundary entities
    /// does not exist.
    pub fn is_on_voi(&self, id: EntityId) -> Result<bool, TopologyError> {
        let entity = self.element(id)?;
        if entity.geological_feature() != GeologicalFeature::None {
            return Ok(entity.geological_feature().is_voi());
        }
        for &ib in entity.in_boundary() {
            if self.element(ib)?.geological_feature().is_voi() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Local vertices of `id` whose model vertex occurs more than once in it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist or has no mesh.
    pub fn duplicated_vertices(&self, id: EntityId) -> Result<Vec<usize>, TopologyError> {
        let mesh = self.entity_mesh(id)?;
        Ok((0..mesh.nb_vertices())
            .filter(|&v| {
                let g = mesh.model_vertex_id(v);
                g != NO_ID && self.vertices.nb_occurrences_in(g, id) > 1
            })
            .collect())
    }

    /// Rebuilds every registry occurrence from the local-to-model maps of
    /// the mesh entities.
    ///
    /// # Errors
    ///
    /// Returns an error if a mesh entity refers to a missing model vertex.
    pub fn rebuild_vertex_occurrences(&mut self) -> Result<(), TopologyError> {
        self.vertices.clear_occurrences();
        for ty in EntityType::MESH {
            for entity in self.elements(ty) {
                let Some(mesh) = entity.mesh() else {
                    continue;
                };
                for (local, &g) in mesh.model_vertex_ids().iter().enumerate() {
                    if g == NO_ID {
                        continue;
                    }
                    if g >= self.vertices.nb() {
                        return Err(TopologyError::Inconsistent(format!(
                            "{} vertex {local} refers to missing model vertex {g}",
                            entity.id()
                        )));
                    }
                }
            }
        }

        let Self {
            entities, vertices, ..
        } = self;
        for ty in EntityType::MESH {
            let Some(t) = ty.storage_index() else {
                continue;
            };
            for entity in &entities[t] {
                if let Some(mesh) = entity.mesh() {
                    for (local, &g) in mesh.model_vertex_ids().iter().enumerate() {
                        if g != NO_ID {
                            vertices.add_occurrence(g, entity.id(), local);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // --- Crate-internal access for the editor ---

    pub(crate) fn collection_mut(
        &mut self,
        ty: EntityType,
    ) -> Result<&mut Vec<Entity>, TopologyError> {
        match ty.storage_index() {
            Some(t) => Ok(&mut self.entities[t]),
            None => Err(TopologyError::InvalidEntityType(format!(
                "{ty} entities are not stored in a model collection"
            ))),
        }
    }

    pub(crate) fn universe_mut(&mut self) -> &mut Entity {
        &mut self.universe
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut GeoModelVertices {
        &mut self.vertices
    }

    /// Splits the borrow between one entity and the vertex registry.
    pub(crate) fn element_and_vertices_mut(
        &mut self,
        id: EntityId,
    ) -> Result<(&mut Entity, &mut GeoModelVertices), TopologyError> {
        let entity = if id.ty == EntityType::Universe {
            &mut self.universe
        } else {
            id.ty
                .storage_index()
                .and_then(|t| self.entities[t].get_mut(id.index))
                .ok_or(TopologyError::EntityNotFound { id })?
        };
        Ok((entity, &mut self.vertices))
    }

    /// Every stored entity of every type, mutably.
    pub(crate) fn all_elements_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut().flatten()
    }
}
