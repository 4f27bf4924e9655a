//! The `vercel_project` data source.

use std::sync::Arc;

use serde_json::Value;

use crate::api::ProjectApi;
use crate::error::ProviderError;
use crate::provider::DataSource;
use crate::schema::{Attribute, Schema};

/// Looks up an existing project by name.
pub struct ProjectDataSource {
    api: Arc<dyn ProjectApi>,
}

impl ProjectDataSource {
    /// Create the data source around an API handle.
    pub fn new(api: Arc<dyn ProjectApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl DataSource for ProjectDataSource {
    fn type_name(&self) -> &'static str {
        "vercel_project"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The project name to look up"),
            )
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("framework", Attribute::computed_string())
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let name = config
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Validation("data source has no name".to_string()))?;

        let project = self.api.get_project(name).await?;
        Ok(serde_json::json!({
            "id": project.id,
            "name": project.name,
            "framework": project.framework,
        }))
    }
}
