use std::fmt;

/// Geological nature of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GeologicalFeature {
    #[default]
    None,
    /// Stratigraphic contact (horizon, unconformity).
    Stratigraphic,
    Fault,
    /// Boundary of the volume of interest.
    VolumeOfInterest,
    StratiFault,
    StratiVoi,
    FaultVoi,
}

impl GeologicalFeature {
    /// Parses the feature names found in model files.
    ///
    /// Unknown names map to [`GeologicalFeature::None`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "none" => Self::None,
            "fault" | "reverse_fault" | "normal_fault" => Self::Fault,
            "top" | "unconformity" => Self::Stratigraphic,
            "boundary" => Self::VolumeOfInterest,
            other => {
                tracing::warn!(name = other, "unknown geological feature");
                Self::None
            }
        }
    }

    /// Feature of an entity at the intersection of entities of the given features.
    #[must_use]
    pub fn determine(features: &[GeologicalFeature]) -> Self {
        let mut unique = features.to_vec();
        unique.sort_unstable();
        unique.dedup();

        match unique[..] {
            [single] => single,
            [Self::Stratigraphic, Self::Fault] => Self::StratiFault,
            [Self::Stratigraphic, Self::VolumeOfInterest] => Self::StratiVoi,
            [Self::Fault, Self::VolumeOfInterest] => Self::FaultVoi,
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn is_voi(self) -> bool {
        matches!(
            self,
            Self::VolumeOfInterest | Self::StratiVoi | Self::FaultVoi
        )
    }

    #[must_use]
    pub fn is_fault(self) -> bool {
        matches!(self, Self::Fault | Self::StratiFault | Self::FaultVoi)
    }

    #[must_use]
    pub fn is_stratigraphic(self) -> bool {
        matches!(
            self,
            Self::Stratigraphic | Self::StratiFault | Self::StratiVoi
        )
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Stratigraphic => "top",
            Self::Fault => "fault",
            Self::VolumeOfInterest => "boundary",
            Self::StratiFault => "top_fault",
            Self::StratiVoi => "top_boundary",
            Self::FaultVoi => "fault_boundary",
        }
    }
}

impl fmt::Display for GeologicalFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
