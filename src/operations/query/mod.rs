mod is_valid;
mod measure;

pub use is_valid::{IsValid, ValidityIssue};
pub use measure::{Barycenter, Distance, Size};
