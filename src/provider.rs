//! Resource registry and provider dispatch.
//!
//! A provider is a registry: every resource and data source registers a
//! capability object keyed by its type name, and the framework dispatches
//! lifecycle calls (`validate`, `plan`, `create`, `read`, `update`, `delete`,
//! `import`) by looking the type up. Operations addressed to an unregistered
//! type fail with [`ProviderError::UnknownResource`] or
//! [`ProviderError::UnknownDataSource`].
//!
//! Resources own their API access: they are constructed around the client
//! traits they need before registration, so the registry itself stays free of
//! HTTP concerns.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::ProviderError;
use crate::plan::{self, PlanResult};
use crate::schema::{Attribute, Diagnostic, ProviderSchema, Schema};
use crate::validation;

/// Capability object for a single managed resource type.
///
/// `validate`, `plan`, and `import` have default implementations: schema
/// validation, schema-driven state diffing, and "not supported". Resources
/// override them when they need bespoke behavior.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// The resource type name, e.g. `vercel_project`.
    fn type_name(&self) -> &'static str;

    /// The resource's schema.
    fn schema(&self) -> Schema;

    /// Validate a resource configuration before planning.
    async fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Plan changes for this resource.
    async fn plan(
        &self,
        prior_state: Option<&Value>,
        proposed_state: &Value,
    ) -> Result<PlanResult, ProviderError> {
        Ok(plan::plan(&self.schema(), prior_state, proposed_state))
    }

    /// Create the resource from its planned state, returning actual state.
    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh the resource's state from the API.
    async fn read(&self, current_state: Value) -> Result<Value, ProviderError>;

    /// Update the resource in place, returning actual state.
    async fn update(&self, prior_state: Value, planned_state: Value)
        -> Result<Value, ProviderError>;

    /// Delete the resource.
    async fn delete(&self, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure by id.
    async fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let _ = id;
        Err(ProviderError::Unsupported(format!(
            "import is not supported for {}",
            self.type_name()
        )))
    }
}

/// Capability object for a single data source type.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// The data source type name, e.g. `vercel_project`.
    fn type_name(&self) -> &'static str;

    /// The data source's schema.
    fn schema(&self) -> Schema;

    /// Validate a data source configuration.
    async fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Read data from the API.
    async fn read(&self, config: Value) -> Result<Value, ProviderError>;
}

/// Typed provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// API token used to authenticate against the Vercel API.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Team scope applied to all operations.
    #[serde(default)]
    pub team_id: Option<String>,
}

impl ProviderConfig {
    /// Environment variable consulted when `api_token` is not configured.
    pub const TOKEN_ENV: &'static str = "VERCEL_API_TOKEN";
    /// Environment variable consulted when `team_id` is not configured.
    pub const TEAM_ENV: &'static str = "VERCEL_TEAM_ID";

    /// The schema for the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "api_token",
                Attribute::optional_string().sensitive().with_description(
                    "The Vercel API token. Read from VERCEL_API_TOKEN when unset.",
                ),
            )
            .with_attribute(
                "team_id",
                Attribute::optional_string()
                    .with_description("The team to operate on. Read from VERCEL_TEAM_ID when unset."),
            )
    }

    /// Parse a configure payload, falling back to the environment for unset
    /// credentials.
    pub fn from_value(config: &Value) -> Result<Self, ProviderError> {
        let mut parsed: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            serde_json::from_value(config.clone())?
        };
        if parsed.api_token.is_none() {
            parsed.api_token = env_nonempty(Self::TOKEN_ENV);
        }
        if parsed.team_id.is_none() {
            parsed.team_id = env_nonempty(Self::TEAM_ENV);
        }
        Ok(parsed)
    }

    /// Validate the resolved configuration.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.api_token.as_deref().map_or(true, str::is_empty) {
            diagnostics.push(
                Diagnostic::error("Missing API token")
                    .with_detail(format!(
                        "Set the api_token attribute or the {} environment variable",
                        Self::TOKEN_ENV
                    ))
                    .with_attribute("api_token"),
            );
        }
        diagnostics
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Provider metadata: the registered type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}

/// The provider: a registry of resources and data sources plus dispatch.
#[derive(Default)]
pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl Provider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its type name. A later registration with
    /// the same name wins.
    pub fn with_resource(mut self, resource: impl Resource + 'static) -> Self {
        self.resources.insert(resource.type_name(), Arc::new(resource));
        self
    }

    /// Register a data source under its type name.
    pub fn with_data_source(mut self, data_source: impl DataSource + 'static) -> Self {
        self.data_sources
            .insert(data_source.type_name(), Arc::new(data_source));
        self
    }

    /// Provider metadata: the registered type names.
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().map(|k| k.to_string()).collect(),
            data_sources: self.data_sources.keys().map(|k| k.to_string()).collect(),
        }
    }

    /// The full provider schema: configuration plus every registered type.
    pub fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    /// Parse and validate the provider configuration.
    ///
    /// Returns the resolved typed config, or the diagnostics explaining why
    /// it is unusable.
    #[instrument(skip_all, name = "provider.configure")]
    pub fn configure(&self, config: &Value) -> Result<ProviderConfig, Vec<Diagnostic>> {
        let parsed = ProviderConfig::from_value(config)
            .map_err(|e| vec![e.to_diagnostic().with_attribute("provider")])?;
        let diagnostics = parsed.validate();
        if diagnostics.is_empty() {
            info!(team = parsed.team_id.as_deref().unwrap_or("personal"), "provider configured");
            Ok(parsed)
        } else {
            Err(diagnostics)
        }
    }

    fn resource(&self, type_name: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    fn data_source(&self, type_name: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    /// Validate a resource's configuration.
    #[instrument(skip(self, config), name = "provider.validate_resource")]
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: &Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!(resource_type, "validating resource config");
        Ok(self.resource(resource_type)?.validate(config).await)
    }

    /// Plan changes for a resource.
    #[instrument(skip(self, prior_state, proposed_state), name = "provider.plan")]
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<&Value>,
        proposed_state: &Value,
    ) -> Result<PlanResult, ProviderError> {
        let result = self
            .resource(resource_type)?
            .plan(prior_state, proposed_state)
            .await?;
        info!(
            resource_type,
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "plan completed"
        );
        Ok(result)
    }

    /// Create a resource.
    #[instrument(skip(self, planned_state), name = "provider.create")]
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        info!(resource_type, "creating resource");
        self.resource(resource_type)?.create(planned_state).await
    }

    /// Refresh a resource's state.
    #[instrument(skip(self, current_state), name = "provider.read")]
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        debug!(resource_type, "reading resource");
        self.resource(resource_type)?.read(current_state).await
    }

    /// Update a resource in place.
    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        info!(resource_type, "updating resource");
        self.resource(resource_type)?
            .update(prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    #[instrument(skip(self, current_state), name = "provider.delete")]
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        info!(resource_type, "deleting resource");
        self.resource(resource_type)?.delete(current_state).await
    }

    /// Import existing infrastructure into management.
    #[instrument(skip(self), name = "provider.import")]
    pub async fn import(&self, resource_type: &str, id: &str) -> Result<Value, ProviderError> {
        info!(resource_type, id, "importing resource");
        self.resource(resource_type)?.import(id).await
    }

    /// Validate a data source's configuration.
    #[instrument(skip(self, config), name = "provider.validate_data_source")]
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: &Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        debug!(data_source_type, "validating data source config");
        Ok(self.data_source(data_source_type)?.validate(config).await)
    }

    /// Read from a data source.
    #[instrument(skip(self, config), name = "provider.read_data_source")]
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        debug!(data_source_type, "reading data source");
        self.data_source(data_source_type)?.read(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullResource;

    #[async_trait::async_trait]
    impl Resource for NullResource {
        fn type_name(&self) -> &'static str {
            "vercel_null"
        }

        fn schema(&self) -> Schema {
            Schema::v0()
                .with_attribute("name", Attribute::required_string())
                .with_attribute("id", Attribute::computed_string())
        }

        async fn create(&self, mut planned_state: Value) -> Result<Value, ProviderError> {
            planned_state["id"] = json!("null_1");
            Ok(planned_state)
        }

        async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
            Ok(current_state)
        }

        async fn update(
            &self,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn delete(&self, _current_state: Value) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    struct NullDataSource;

    #[async_trait::async_trait]
    impl DataSource for NullDataSource {
        fn type_name(&self) -> &'static str {
            "vercel_null"
        }

        fn schema(&self) -> Schema {
            Schema::v0().with_attribute("name", Attribute::required_string())
        }

        async fn read(&self, config: Value) -> Result<Value, ProviderError> {
            Ok(config)
        }
    }

    fn provider() -> Provider {
        Provider::new()
            .with_resource(NullResource)
            .with_data_source(NullDataSource)
    }

    #[test]
    fn test_metadata_lists_registered_types() {
        let metadata = provider().metadata();
        assert_eq!(metadata.resources, vec!["vercel_null"]);
        assert_eq!(metadata.data_sources, vec!["vercel_null"]);
    }

    #[test]
    fn test_schema_aggregates_registered_types() {
        let schema = provider().schema();
        assert!(schema.provider.block.attributes.contains_key("api_token"));
        assert!(schema.resources.contains_key("vercel_null"));
        assert!(schema.data_sources.contains_key("vercel_null"));
    }

    #[test]
    fn test_configure_with_explicit_token() {
        let config = provider()
            .configure(&json!({"api_token": "tok_abc", "team_id": "team_1"}))
            .unwrap();
        assert_eq!(config.api_token.as_deref(), Some("tok_abc"));
        assert_eq!(config.team_id.as_deref(), Some("team_1"));
    }

    #[test]
    fn test_configure_missing_token_is_diagnosed() {
        // Explicit empty string defeats any ambient environment fallback.
        let diagnostics = provider()
            .configure(&json!({"api_token": ""}))
            .unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("api_token".to_string()));
    }

    #[tokio::test]
    async fn test_dispatch_to_registered_resource() {
        let provider = provider();

        let state = provider
            .create("vercel_null", json!({"name": "test"}))
            .await
            .unwrap();
        assert_eq!(state["id"], "null_1");

        let read_back = provider.read("vercel_null", state.clone()).await.unwrap();
        assert_eq!(read_back, state);

        provider.delete("vercel_null", state).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let err = provider()
            .create("vercel_missing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider()
            .read_data_source("vercel_missing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownDataSource(_)));
    }

    #[tokio::test]
    async fn test_default_validate_uses_schema() {
        let diagnostics = provider()
            .validate_resource_config("vercel_null", &json!({}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));
    }

    #[tokio::test]
    async fn test_default_plan_uses_schema_diff() {
        let provider = provider();
        let prior = json!({"id": "null_1", "name": "test"});
        let proposed = json!({"name": "renamed"});

        let result = provider
            .plan("vercel_null", Some(&prior), &proposed)
            .await
            .unwrap();

        assert_eq!(result.planned_state["id"], "null_1");
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "name");
    }

    #[tokio::test]
    async fn test_default_import_is_unsupported() {
        let err = provider().import("vercel_null", "null_1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_data_source_read() {
        let result = provider()
            .read_data_source("vercel_null", json!({"name": "test"}))
            .await
            .unwrap();
        assert_eq!(result["name"], "test");
    }
}
