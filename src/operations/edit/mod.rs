mod cut_by_line;
mod dependencies;
mod remove;
mod remove_dependencies;
mod renumbering;
mod set_universe;
mod unique_vertices;

pub use cut_by_line::{CutByLine, CORNER_DUPLICATION_THRESHOLD};
pub use dependencies::{extend_with_dependencies, DependentEntities};
pub use remove::RemoveEntities;
pub use remove_dependencies::RemoveEntitiesAndDependencies;
pub use renumbering::Renumbering;
pub use set_universe::SetUniverse;
pub use unique_vertices::BuildUniqueVertices;
