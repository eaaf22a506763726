//! Domain types: lint domains, paths, batches, and the error taxonomy.

pub mod errors;
pub mod model;
pub mod registry;
