//! Managed resource implementations.

pub mod project;
pub mod project_members;

pub use project::ProjectResource;
pub use project_members::ProjectMembersResource;
