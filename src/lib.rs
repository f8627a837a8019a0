pub mod error;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{GeoRepError, Result};
