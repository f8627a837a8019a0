use crate::error::TopologyError;

use super::entity_id::EntityId;
use super::feature::GeologicalFeature;
use super::mesh_entity::MeshComponent;

/// What an entity carries besides its connectivity.
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// Corner, Line, Surface or Region: owns a mesh.
    Mesh(MeshComponent),
    /// Contact, Interface or Layer: only groups children.
    Geological,
    /// The exterior of the model: only a list of oriented boundary surfaces.
    Universe,
}

/// A node of the model's entity graph.
///
/// Links to other entities are plain [`EntityId`]s; the model container owns
/// every entity and keeps the inverse relations symmetric.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    name: String,
    feature: GeologicalFeature,
    boundaries: Vec<EntityId>,
    /// One flag per boundary for regions and the universe, empty otherwise.
    sides: Vec<bool>,
    in_boundary: Vec<EntityId>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    kind: EntityKind,
}

impl Entity {
    /// Creates an empty entity whose kind follows the type of `id`.
    pub(crate) fn new(id: EntityId) -> Self {
        let kind = if id.ty.is_mesh() {
            EntityKind::Mesh(MeshComponent::new())
        } else if id.ty.is_geological() {
            EntityKind::Geological
        } else {
            EntityKind::Universe
        };
        Self {
            id,
            name: String::new(),
            feature: GeologicalFeature::None,
            boundaries: Vec::new(),
            sides: Vec::new(),
            in_boundary: Vec::new(),
            parent: None,
            children: Vec::new(),
            kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn geological_feature(&self) -> GeologicalFeature {
        self.feature
    }

    #[must_use]
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// The mesh of a Corner, Line, Surface or Region.
    #[must_use]
    pub fn mesh(&self) -> Option<&MeshComponent> {
        match &self.kind {
            EntityKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub(crate) fn mesh_mut(&mut self) -> Option<&mut MeshComponent> {
        match &mut self.kind {
            EntityKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    // --- Boundaries ---

    #[must_use]
    pub fn boundaries(&self) -> &[EntityId] {
        &self.boundaries
    }

    #[must_use]
    pub fn nb_boundaries(&self) -> usize {
        self.boundaries.len()
    }

    #[must_use]
    pub fn boundary(&self, k: usize) -> Option<EntityId> {
        self.boundaries.get(k).copied()
    }

    /// Orientation flags of the boundaries (regions and universe only).
    #[must_use]
    pub fn sides(&self) -> &[bool] {
        &self.sides
    }

    #[must_use]
    pub fn side(&self, k: usize) -> Option<bool> {
        self.sides.get(k).copied()
    }

    // --- Inverse boundaries ---

    #[must_use]
    pub fn in_boundary(&self) -> &[EntityId] {
        &self.in_boundary
    }

    #[must_use]
    pub fn nb_in_boundary(&self) -> usize {
        self.in_boundary.len()
    }

    // --- Geological grouping ---

    #[must_use]
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    #[must_use]
    pub fn nb_children(&self) -> usize {
        self.children.len()
    }

    // --- Crate-internal mutation, driven by the model and the editor ---

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_geological_feature(&mut self, feature: GeologicalFeature) {
        self.feature = feature;
    }

    pub(crate) fn push_boundary(&mut self, boundary: EntityId, side: Option<bool>) {
        self.boundaries.push(boundary);
        if let Some(side) = side {
            self.sides.push(side);
        }
    }

    /// Replaces boundary `k`; the side flag is only touched when one is given.
    pub(crate) fn set_boundary(&mut self, k: usize, boundary: EntityId, side: Option<bool>) {
        self.boundaries[k] = boundary;
        if let (Some(side), Some(slot)) = (side, self.sides.get_mut(k)) {
            *slot = side;
        }
    }

    pub(crate) fn clear_boundaries(&mut self) {
        self.boundaries.clear();
        self.sides.clear();
    }

    pub(crate) fn push_in_boundary(&mut self, entity: EntityId) {
        self.in_boundary.push(entity);
    }

    pub(crate) fn clear_in_boundary(&mut self) {
        self.in_boundary.clear();
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: EntityId) {
        self.children.push(child);
    }

    pub(crate) fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Rewrites every stored reference through `map`.
    ///
    /// `map` returns `Ok(None)` for a reference to drop; side flags are
    /// dropped in lock-step with their boundary.
    pub(crate) fn remap_references<F>(&mut self, mut map: F) -> Result<(), TopologyError>
    where
        F: FnMut(EntityId) -> Result<Option<EntityId>, TopologyError>,
    {
        let paired_sides = self.sides.len() == self.boundaries.len();
        let mut boundaries = Vec::with_capacity(self.boundaries.len());
        let mut sides = Vec::with_capacity(self.sides.len());
        for (k, &b) in self.boundaries.iter().enumerate() {
            if let Some(new_b) = map(b)? {
                boundaries.push(new_b);
                if paired_sides {
                    sides.push(self.sides[k]);
                }
            }
        }
        self.boundaries = boundaries;
        if paired_sides {
            self.sides = sides;
        }

        self.in_boundary = remap_list(&self.in_boundary, &mut map)?;
        self.children = remap_list(&self.children, &mut map)?;
        self.parent = match self.parent {
            Some(p) => map(p)?,
            None => None,
        };
        Ok(())
    }
}

fn remap_list<F>(ids: &[EntityId], map: &mut F) -> Result<Vec<EntityId>, TopologyError>
where
    F: FnMut(EntityId) -> Result<Option<EntityId>, TopologyError>,
{
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(new_id) = map(id)? {
            out.push(new_id);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::EntityType;

    #[test]
    fn kind_follows_type() {
        assert!(Entity::new(EntityId::surface(0)).mesh().is_some());
        let layer = Entity::new(EntityId::new(EntityType::Layer, 0));
        assert!(matches!(layer.kind(), EntityKind::Geological));
        assert!(layer.mesh().is_none());
    }

    #[test]
    fn remap_drops_sides_with_boundaries() {
        let mut region = Entity::new(EntityId::region(0));
        region.push_boundary(EntityId::surface(0), Some(true));
        region.push_boundary(EntityId::surface(1), Some(false));
        region.push_boundary(EntityId::surface(2), Some(true));

        region
            .remap_references(|id| {
                Ok(match id.index {
                    1 => None,
                    i => Some(EntityId::surface(i.saturating_sub(1))),
                })
            })
            .unwrap();

        assert_eq!(region.boundaries(), &[EntityId::surface(0), EntityId::surface(1)]);
        assert_eq!(region.sides(), &[true, true]);
    }

    #[test]
    fn remap_clears_removed_parent() {
        let mut surface = Entity::new(EntityId::surface(3));
        surface.set_parent(Some(EntityId::new(EntityType::Interface, 0)));
        surface.remap_references(|_| Ok(None)).unwrap();
        assert_eq!(surface.parent(), None);
    }
}
