use std::fmt;

/// Closed set of entity types of a geological model.
///
/// Mesh entities (`Corner`, `Line`, `Surface`, `Region`) are linked by
/// boundary relations; geological entities (`Contact`, `Interface`, `Layer`)
/// group mesh entities as their children. `Universe` tags the exterior
/// pseudo-region and `Undefined` an identifier that has not been assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EntityType {
    Corner,
    Line,
    Surface,
    Region,
    Contact,
    Interface,
    Layer,
    Universe,
    #[default]
    Undefined,
}

impl EntityType {
    /// Types of the entities that own a mesh.
    pub const MESH: [EntityType; 4] = [Self::Corner, Self::Line, Self::Surface, Self::Region];

    /// Types of the geological grouping entities.
    pub const GEOLOGICAL: [EntityType; 3] = [Self::Contact, Self::Interface, Self::Layer];

    /// Every type stored in a model collection, in storage order.
    pub const STORED: [EntityType; 7] = [
        Self::Corner,
        Self::Line,
        Self::Surface,
        Self::Region,
        Self::Contact,
        Self::Interface,
        Self::Layer,
    ];

    /// Position of this type's collection in a model, `None` for `Universe`
    /// and `Undefined`.
    #[must_use]
    pub fn storage_index(self) -> Option<usize> {
        Self::STORED.iter().position(|&t| t == self)
    }

    #[must_use]
    pub fn is_mesh(self) -> bool {
        matches!(
            self,
            Self::Corner | Self::Line | Self::Surface | Self::Region
        )
    }

    #[must_use]
    pub fn is_geological(self) -> bool {
        matches!(self, Self::Contact | Self::Interface | Self::Layer)
    }

    /// Type of the entities bounding an entity of this type.
    #[must_use]
    pub fn boundary_type(self) -> Option<EntityType> {
        match self {
            Self::Line => Some(Self::Corner),
            Self::Surface => Some(Self::Line),
            Self::Region | Self::Universe => Some(Self::Surface),
            _ => None,
        }
    }

    /// Type of the entities this type may bound.
    #[must_use]
    pub fn in_boundary_type(self) -> Option<EntityType> {
        match self {
            Self::Corner => Some(Self::Line),
            Self::Line => Some(Self::Surface),
            Self::Surface => Some(Self::Region),
            _ => None,
        }
    }

    /// Type of the geological entity grouping entities of this type.
    #[must_use]
    pub fn parent_type(self) -> Option<EntityType> {
        match self {
            Self::Line => Some(Self::Contact),
            Self::Surface => Some(Self::Interface),
            Self::Region => Some(Self::Layer),
            _ => None,
        }
    }

    /// Type of the mesh entities grouped by an entity of this type.
    #[must_use]
    pub fn child_type(self) -> Option<EntityType> {
        match self {
            Self::Contact => Some(Self::Line),
            Self::Interface => Some(Self::Surface),
            Self::Layer => Some(Self::Region),
            _ => None,
        }
    }

    /// Dimension 0, 1, 2 or 3 of the entity.
    #[must_use]
    pub fn dimension(self) -> Option<u8> {
        match self {
            Self::Corner => Some(0),
            Self::Line | Self::Contact => Some(1),
            Self::Surface | Self::Interface => Some(2),
            Self::Region | Self::Layer | Self::Universe => Some(3),
            Self::Undefined => None,
        }
    }

    #[must_use]
    pub fn boundary_allowed(self) -> bool {
        self.boundary_type().is_some()
    }

    #[must_use]
    pub fn in_boundary_allowed(self) -> bool {
        self.in_boundary_type().is_some()
    }

    #[must_use]
    pub fn parent_allowed(self) -> bool {
        self.parent_type().is_some()
    }

    #[must_use]
    pub fn child_allowed(self) -> bool {
        self.child_type().is_some()
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Corner => "CORNER",
            Self::Line => "LINE",
            Self::Surface => "SURFACE",
            Self::Region => "REGION",
            Self::Contact => "CONTACT",
            Self::Interface => "INTERFACE",
            Self::Layer => "LAYER",
            Self::Universe => "UNIVERSE",
            Self::Undefined => "NO_TYPE",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
