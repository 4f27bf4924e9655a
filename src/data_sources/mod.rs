//! Data source implementations.

pub mod project;

pub use project::ProjectDataSource;
