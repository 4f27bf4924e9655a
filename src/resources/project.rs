//! The `vercel_project` resource.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{EnvironmentVariable, GitRepository, Project, ProjectApi, ProjectRequest};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::retry::{Attempt, Retry};
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, Constraint, Diagnostic, NestedBlock, Schema,
};
use crate::validators;
use crate::value::Attr;

/// Framework presets the API accepts.
const FRAMEWORKS: [&str; 8] = [
    "nextjs",
    "svelte",
    "sveltekit",
    "astro",
    "nuxtjs",
    "remix",
    "vite",
    "gatsby",
];

/// Git hosting services a project can link.
const GIT_TYPES: [&str; 3] = ["github", "gitlab", "bitbucket"];

/// Regions serverless functions can be pinned to.
const REGIONS: [&str; 8] = [
    "iad1", "sfo1", "pdx1", "cle1", "fra1", "cdg1", "hnd1", "syd1",
];

/// Deployment targets an environment variable can apply to.
const ENV_TARGETS: [&str; 3] = ["production", "preview", "development"];

/// Manages a Vercel project.
pub struct ProjectResource {
    api: Arc<dyn ProjectApi>,
}

impl ProjectResource {
    /// Create the resource around an API handle.
    pub fn new(api: Arc<dyn ProjectApi>) -> Self {
        Self { api }
    }
}

/// Typed view of the project configuration, for cross-field validation.
#[derive(Debug, Deserialize, Default)]
struct ProjectConfig {
    #[serde(default)]
    git_repository: Attr<GitRepository>,
    #[serde(default)]
    git_comments: Attr<bool>,
    #[serde(default)]
    public_source: Attr<bool>,
    #[serde(default)]
    password_protection: Attr<bool>,
}

impl ProjectConfig {
    fn validate(&self) -> Vec<Diagnostic> {
        [
            validators::requires(
                "git_comments",
                &self.git_comments,
                "git_repository",
                &self.git_repository,
            ),
            validators::exclusive_toggles(
                "public_source",
                &self.public_source,
                "password_protection",
                &self.password_protection,
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Typed view of the project state payload.
#[derive(Debug, Deserialize, Default)]
struct ProjectState {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    framework: Option<String>,
    #[serde(default)]
    serverless_function_region: Option<String>,
    #[serde(default)]
    environment: Vec<EnvironmentVariable>,
    #[serde(default)]
    git_repository: Option<GitRepository>,
    #[serde(default)]
    git_comments: Option<bool>,
    #[serde(default)]
    public_source: Option<bool>,
    #[serde(default)]
    password_protection: Option<bool>,
}

impl ProjectState {
    fn parse(value: &Value) -> Result<Self, ProviderError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    fn id(&self) -> Result<&str, ProviderError> {
        self.id
            .as_deref()
            .ok_or_else(|| ProviderError::Validation("project state has no id".to_string()))
    }

    fn request(&self) -> Result<ProjectRequest, ProviderError> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| ProviderError::Validation("project state has no name".to_string()))?;
        Ok(ProjectRequest {
            name,
            framework: self.framework.clone(),
            serverless_function_region: self.serverless_function_region.clone(),
            environment: self.environment.clone(),
            git_repository: self.git_repository.clone(),
        })
    }

    /// Merge API-owned fields into the configured state.
    fn refreshed(&self, project: &Project) -> Value {
        let mut state = serde_json::json!({
            "id": project.id,
            "name": project.name,
            "framework": project.framework,
            "serverless_function_region": project.serverless_function_region,
            "environment": project.environment,
            "git_repository": project.git_repository,
            "git_comments": self.git_comments,
            "public_source": self.public_source,
            "password_protection": self.password_protection,
        });
        // An empty collection must not diff against a config that omits it
        if project.environment.is_empty() {
            if let Value::Object(map) = &mut state {
                map.remove("environment");
            }
        }
        state
    }
}

#[async_trait::async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &'static str {
        "vercel_project"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("The project name")
                    .with_constraint(Constraint::LengthBetween { min: 1, max: 100 }),
            )
            .with_attribute(
                "framework",
                Attribute::optional_string()
                    .with_description("The framework preset")
                    .with_constraint(Constraint::one_of(FRAMEWORKS)),
            )
            .with_attribute(
                "serverless_function_region",
                Attribute::optional_string()
                    .with_description("The region serverless functions are deployed to")
                    .with_constraint(Constraint::one_of(REGIONS)),
            )
            .with_attribute(
                "git_comments",
                Attribute::optional_bool()
                    .with_description("Enable deployment comments on pull requests"),
            )
            .with_attribute("public_source", Attribute::optional_bool())
            .with_attribute("password_protection", Attribute::optional_bool())
            .with_block(
                "git_repository",
                NestedBlock::single(
                    Block::new()
                        .with_attribute(
                            "type",
                            Attribute::required_string()
                                .with_force_new()
                                .with_constraint(Constraint::one_of(GIT_TYPES)),
                        )
                        .with_attribute("repo", Attribute::required_string().with_force_new())
                        .with_attribute("production_branch", Attribute::optional_string()),
                ),
            )
            .with_block(
                "environment",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("key", Attribute::required_string())
                        .with_attribute("value", Attribute::required_string().sensitive())
                        .with_attribute(
                            "target",
                            Attribute::new(
                                AttributeType::set(AttributeType::String),
                                AttributeFlags::required(),
                            )
                            .with_description("Deployments the variable is exposed to")
                            .with_constraint(Constraint::subset_of(ENV_TARGETS))
                            .with_constraint(Constraint::SizeAtLeast(1)),
                        ),
                ),
            )
    }

    async fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = crate::validation::validate(&self.schema(), config);
        // Cross-field rules only run once the shape is sound
        if diagnostics.is_empty() {
            if let Ok(typed) = serde_json::from_value::<ProjectConfig>(config.clone()) {
                diagnostics.extend(typed.validate());
            }
        }
        diagnostics
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let state = ProjectState::parse(&planned_state)?;
        let created = self.api.create_project(state.request()?).await?;
        debug!(project_id = %created.id, "project created");

        // Reads directly after a create can 404 while the project propagates
        let id = created.id.as_str();
        let project = Retry::new(Duration::from_millis(200), 5)
            .run(|_| async move {
                match self.api.get_project(id).await {
                    Ok(project) => Ok(project),
                    Err(e) if e.is_not_found() => Err(Attempt::Retry(e)),
                    Err(e) => Err(Attempt::Halt(e)),
                }
            })
            .await?;

        Ok(state.refreshed(&project))
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let state = ProjectState::parse(&current_state)?;
        match self.api.get_project(state.id()?).await {
            Ok(project) => Ok(state.refreshed(&project)),
            // Gone upstream: signal removal from state
            Err(e) if e.is_not_found() => Ok(Value::Null),
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        _prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let state = ProjectState::parse(&planned_state)?;
        let project = self
            .api
            .update_project(state.id()?, state.request()?)
            .await?;
        Ok(state.refreshed(&project))
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let state = ProjectState::parse(&current_state)?;
        match self.api.delete_project(state.id()?).await {
            Ok(()) => Ok(()),
            // Already gone is success for delete
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let project = self.api.get_project(id).await?;
        Ok(ProjectState::default().refreshed(&project))
    }
}
