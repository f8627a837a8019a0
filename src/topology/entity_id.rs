use std::fmt;

use super::entity_type::EntityType;

/// Sentinel index for an entity or vertex that is not assigned.
pub const NO_ID: usize = usize::MAX;

/// Identifies an entity by its type and its dense index within that type.
///
/// Ordering is by type first, then by index; since [`NO_ID`] is the largest
/// index, undefined indices sort after every defined one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId {
    /// Type of the entity.
    pub ty: EntityType,
    /// Index of the entity among the entities of the same type.
    pub index: usize,
}

impl EntityId {
    #[must_use]
    pub fn new(ty: EntityType, index: usize) -> Self {
        Self { ty, index }
    }

    #[must_use]
    pub fn corner(index: usize) -> Self {
        Self::new(EntityType::Corner, index)
    }

    #[must_use]
    pub fn line(index: usize) -> Self {
        Self::new(EntityType::Line, index)
    }

    #[must_use]
    pub fn surface(index: usize) -> Self {
        Self::new(EntityType::Surface, index)
    }

    #[must_use]
    pub fn region(index: usize) -> Self {
        Self::new(EntityType::Region, index)
    }

    #[must_use]
    pub fn universe() -> Self {
        Self::new(EntityType::Universe, 0)
    }

    /// Whether both the type and the index are assigned.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.ty != EntityType::Undefined && self.index != NO_ID
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new(EntityType::Undefined, NO_ID)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == NO_ID {
            write!(f, "{} NO_ID", self.ty)
        } else {
            write!(f, "{} {}", self.ty, self.index)
        }
    }
}
