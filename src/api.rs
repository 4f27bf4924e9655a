//! Upstream API surface consumed by resources.
//!
//! The HTTP client for the Vercel REST API lives outside this crate.
//! Resources depend only on the traits here, so tests can substitute
//! in-memory fakes and the client can evolve independently.

use crate::error::ProviderError;
use crate::reconcile::Keyed;
use serde::{Deserialize, Serialize};

/// A Vercel project as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project id, e.g. `prj_abc123`.
    pub id: String,
    /// The project name.
    pub name: String,
    /// The framework preset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// The region serverless functions run in, if pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverless_function_region: Option<String>,
    /// Environment variables configured on the project.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentVariable>,
    /// The linked git repository, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repository: Option<GitRepository>,
}

/// An environment variable exposed to a project's deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    /// The variable name.
    pub key: String,
    /// The variable value.
    pub value: String,
    /// Deployment targets the variable applies to.
    pub target: Vec<String>,
}

/// A git repository linked to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepository {
    /// The hosting service: `github`, `gitlab`, or `bitbucket`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The repository slug, e.g. `vercel/next.js`.
    pub repo: String,
    /// The production branch, if overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_branch: Option<String>,
}

/// Fields accepted when creating or updating a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectRequest {
    /// The project name.
    pub name: String,
    /// The framework preset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// The region to pin serverless functions to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverless_function_region: Option<String>,
    /// Environment variables to configure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentVariable>,
    /// The git repository to link, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repository: Option<GitRepository>,
}

/// Project CRUD against the Vercel API.
#[async_trait::async_trait]
pub trait ProjectApi: Send + Sync {
    /// Create a project.
    async fn create_project(&self, request: ProjectRequest) -> Result<Project, ProviderError>;

    /// Fetch a project by id or name.
    async fn get_project(&self, id_or_name: &str) -> Result<Project, ProviderError>;

    /// Update a project in place.
    async fn update_project(
        &self,
        id: &str,
        request: ProjectRequest,
    ) -> Result<Project, ProviderError>;

    /// Delete a project by id.
    async fn delete_project(&self, id: &str) -> Result<(), ProviderError>;
}

/// A member of a project.
///
/// `user_id` is absent while an email invitation has not yet resolved to a
/// user; such members are always (re-)added during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    /// The member's user id, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// The email the member was invited with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The member's role on the project.
    pub role: String,
}

impl Keyed for ProjectMember {
    fn key(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// Project membership operations against the Vercel API.
///
/// The API only offers add/remove/update primitives, no bulk replace;
/// [`reconcile`](crate::reconcile::reconcile) computes the minimal call set.
#[async_trait::async_trait]
pub trait ProjectMembersApi: Send + Sync {
    /// List all members of a project.
    async fn list_members(&self, project_id: &str) -> Result<Vec<ProjectMember>, ProviderError>;

    /// Add a member to a project.
    async fn add_member(
        &self,
        project_id: &str,
        member: &ProjectMember,
    ) -> Result<(), ProviderError>;

    /// Remove a member from a project.
    async fn remove_member(&self, project_id: &str, user_id: &str) -> Result<(), ProviderError>;

    /// Change an existing member's role.
    async fn update_member(
        &self,
        project_id: &str,
        member: &ProjectMember,
    ) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_key_is_user_id() {
        let member = ProjectMember {
            user_id: Some("usr_1".to_string()),
            email: None,
            role: "MEMBER".to_string(),
        };
        assert_eq!(member.key(), Some("usr_1"));

        let invited = ProjectMember {
            user_id: None,
            email: Some("dev@example.com".to_string()),
            role: "MEMBER".to_string(),
        };
        assert_eq!(invited.key(), None);
    }

    #[test]
    fn test_git_repository_type_field_name() {
        let repo = GitRepository {
            kind: "github".to_string(),
            repo: "vercel/site".to_string(),
            production_branch: None,
        };
        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["type"], "github");
        assert!(json.get("production_branch").is_none());
    }
}
