//! The `vercel_project_members` resource.
//!
//! Membership is synchronized against an API that only offers add, remove,
//! and update primitives. Updates reconcile the prior member list with the
//! planned one and issue the minimal set of calls; the authoritative list is
//! then re-read to refresh state. Creates retry the first list read, because
//! freshly invited members can take a moment to become visible.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{ProjectMember, ProjectMembersApi};
use crate::error::ProviderError;
use crate::provider::Resource;
use crate::reconcile::reconcile;
use crate::retry::{Attempt, Retry};
use crate::schema::{Attribute, Block, Constraint, NestedBlock, Schema};

/// Roles a project member can hold.
const ROLES: [&str; 3] = ["ADMIN", "MEMBER", "VIEWER"];

/// Manages the full membership list of a Vercel project.
pub struct ProjectMembersResource {
    api: Arc<dyn ProjectMembersApi>,
}

impl ProjectMembersResource {
    /// Create the resource around an API handle.
    pub fn new(api: Arc<dyn ProjectMembersApi>) -> Self {
        Self { api }
    }

    /// List members, retrying while recent writes propagate.
    ///
    /// `expected` is the number of members the caller just wrote; a shorter
    /// listing is treated as transient until the budget runs out.
    async fn list_settled(
        &self,
        project_id: &str,
        expected: usize,
    ) -> Result<Vec<ProjectMember>, ProviderError> {
        Retry::new(Duration::from_millis(200), 7)
            .run(|attempt| async move {
                match self.api.list_members(project_id).await {
                    Ok(members) if members.len() >= expected => Ok(members),
                    Ok(members) => {
                        debug!(
                            attempt,
                            visible = members.len(),
                            expected,
                            "membership not yet settled"
                        );
                        Err(Attempt::Retry(ProviderError::NotFound(format!(
                            "only {} of {} members visible on {}",
                            members.len(),
                            expected,
                            project_id
                        ))))
                    },
                    Err(e) if e.is_not_found() => Err(Attempt::Retry(e)),
                    Err(e) => Err(Attempt::Halt(e)),
                }
            })
            .await
    }

    async fn apply_delta(
        &self,
        project_id: &str,
        current: Vec<ProjectMember>,
        desired: Vec<ProjectMember>,
    ) -> Result<usize, ProviderError> {
        let desired_len = desired.len();
        let delta = reconcile(current, desired);
        debug!(
            added = delta.to_add.len(),
            removed = delta.to_remove.len(),
            updated = delta.to_update.len(),
            "reconciling project members"
        );

        for member in &delta.to_remove {
            if let Some(user_id) = member.user_id.as_deref() {
                self.api.remove_member(project_id, user_id).await?;
            }
        }
        for member in &delta.to_add {
            self.api.add_member(project_id, member).await?;
        }
        for member in &delta.to_update {
            self.api.update_member(project_id, member).await?;
        }
        Ok(desired_len)
    }
}

/// Typed view of the members state payload.
#[derive(Debug, Deserialize, Default)]
struct MembersState {
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    member: Vec<ProjectMember>,
}

impl MembersState {
    fn parse(value: &Value) -> Result<Self, ProviderError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    fn project_id(&self) -> Result<&str, ProviderError> {
        self.project_id
            .as_deref()
            .ok_or_else(|| ProviderError::Validation("members state has no project_id".to_string()))
    }
}

fn state_value(project_id: &str, members: &[ProjectMember]) -> Result<Value, ProviderError> {
    Ok(serde_json::json!({
        "project_id": project_id,
        "member": serde_json::to_value(members)?,
    }))
}

#[async_trait::async_trait]
impl Resource for ProjectMembersResource {
    fn type_name(&self) -> &'static str {
        "vercel_project_members"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute(
                "project_id",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The project whose membership is managed"),
            )
            .with_block(
                "member",
                NestedBlock::set(
                    Block::new()
                        .with_attribute("user_id", Attribute::optional_string())
                        .with_attribute("email", Attribute::optional_string())
                        .with_attribute(
                            "role",
                            Attribute::required_string().with_constraint(Constraint::one_of(ROLES)),
                        ),
                )
                .with_min_items(1),
            )
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let state = MembersState::parse(&planned_state)?;
        let project_id = state.project_id()?;

        for member in &state.member {
            self.api.add_member(project_id, member).await?;
        }

        // The list endpoint lags invitations; wait for it to settle
        let members = self.list_settled(project_id, state.member.len()).await?;
        state_value(project_id, &members)
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let state = MembersState::parse(&current_state)?;
        let project_id = state.project_id()?;
        match self.api.list_members(project_id).await {
            Ok(members) => state_value(project_id, &members),
            Err(e) if e.is_not_found() => Ok(Value::Null),
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior = MembersState::parse(&prior_state)?;
        let planned = MembersState::parse(&planned_state)?;
        let project_id = planned.project_id()?.to_string();

        let expected = self
            .apply_delta(&project_id, prior.member, planned.member)
            .await?;

        // The API is the source of truth for refreshed state
        let members = self.list_settled(&project_id, expected).await?;
        state_value(&project_id, &members)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let state = MembersState::parse(&current_state)?;
        let project_id = state.project_id()?;
        for member in &state.member {
            if let Some(user_id) = member.user_id.as_deref() {
                match self.api.remove_member(project_id, user_id).await {
                    Ok(()) => {},
                    Err(e) if e.is_not_found() => {},
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let members = self.api.list_members(id).await?;
        state_value(id, &members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn member(user_id: &str, role: &str) -> ProjectMember {
        ProjectMember {
            user_id: Some(user_id.to_string()),
            email: None,
            role: role.to_string(),
        }
    }

    /// In-memory membership API that records every mutating call and can
    /// hide recent additions from the list endpoint for a few reads.
    #[derive(Default)]
    struct FakeMembersApi {
        members: Mutex<Vec<ProjectMember>>,
        calls: Mutex<Vec<String>>,
        list_lag: Mutex<u32>,
    }

    impl FakeMembersApi {
        fn with_members(members: Vec<ProjectMember>) -> Self {
            Self {
                members: Mutex::new(members),
                ..Default::default()
            }
        }

        fn with_list_lag(self, lag: u32) -> Self {
            *self.list_lag.lock().unwrap() = lag;
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ProjectMembersApi for FakeMembersApi {
        async fn list_members(
            &self,
            _project_id: &str,
        ) -> Result<Vec<ProjectMember>, ProviderError> {
            let mut lag = self.list_lag.lock().unwrap();
            if *lag > 0 {
                *lag -= 1;
                return Ok(Vec::new());
            }
            Ok(self.members.lock().unwrap().clone())
        }

        async fn add_member(
            &self,
            _project_id: &str,
            member: &ProjectMember,
        ) -> Result<(), ProviderError> {
            self.calls.lock().unwrap().push(format!(
                "add:{}",
                member.user_id.as_deref().unwrap_or("pending")
            ));
            self.members.lock().unwrap().push(member.clone());
            Ok(())
        }

        async fn remove_member(
            &self,
            _project_id: &str,
            user_id: &str,
        ) -> Result<(), ProviderError> {
            self.calls.lock().unwrap().push(format!("remove:{}", user_id));
            self.members
                .lock()
                .unwrap()
                .retain(|m| m.user_id.as_deref() != Some(user_id));
            Ok(())
        }

        async fn update_member(
            &self,
            _project_id: &str,
            member: &ProjectMember,
        ) -> Result<(), ProviderError> {
            self.calls.lock().unwrap().push(format!(
                "update:{}",
                member.user_id.as_deref().unwrap_or("pending")
            ));
            let mut members = self.members.lock().unwrap();
            if let Some(existing) = members
                .iter_mut()
                .find(|m| m.user_id == member.user_id)
            {
                *existing = member.clone();
            }
            Ok(())
        }
    }

    fn resource(api: FakeMembersApi) -> (Arc<FakeMembersApi>, ProjectMembersResource) {
        let api = Arc::new(api);
        (api.clone(), ProjectMembersResource::new(api))
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_adds_members_and_waits_for_visibility() {
        // The list endpoint returns nothing for the first two reads.
        let (_api, resource) = resource(FakeMembersApi::default().with_list_lag(2));

        let state = resource
            .create(json!({
                "project_id": "prj_1",
                "member": [
                    {"user_id": "usr_a", "role": "ADMIN"},
                    {"user_id": "usr_b", "role": "MEMBER"}
                ]
            }))
            .await
            .unwrap();

        assert_eq!(state["project_id"], "prj_1");
        assert_eq!(state["member"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_issues_minimal_calls() {
        let (api, resource) = resource(FakeMembersApi::with_members(vec![
            member("usr_a", "MEMBER"),
            member("usr_b", "VIEWER"),
        ]));

        let prior = json!({
            "project_id": "prj_1",
            "member": [
                {"user_id": "usr_a", "role": "MEMBER"},
                {"user_id": "usr_b", "role": "VIEWER"}
            ]
        });
        let planned = json!({
            "project_id": "prj_1",
            "member": [
                {"user_id": "usr_a", "role": "ADMIN"},
                {"user_id": "usr_c", "role": "MEMBER"}
            ]
        });

        let state = resource.update(prior, planned).await.unwrap();

        // Exactly one remove, one add, one update
        assert_eq!(api.calls(), vec!["remove:usr_b", "add:usr_c", "update:usr_a"]);

        let members = state["member"].as_array().unwrap();
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn test_update_with_no_changes_makes_no_mutating_calls() {
        let (api, resource) = resource(FakeMembersApi::with_members(vec![member("usr_a", "MEMBER")]));

        let state = json!({
            "project_id": "prj_1",
            "member": [{"user_id": "usr_a", "role": "MEMBER"}]
        });

        resource.update(state.clone(), state).await.unwrap();
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_returns_authoritative_list() {
        let (_api, resource) = resource(FakeMembersApi::with_members(vec![member("usr_a", "ADMIN")]));

        let state = resource
            .read(json!({"project_id": "prj_1", "member": []}))
            .await
            .unwrap();

        let members = state["member"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["user_id"], "usr_a");
    }

    #[tokio::test]
    async fn test_delete_removes_each_member() {
        let (api, resource) = resource(FakeMembersApi::with_members(vec![
            member("usr_a", "MEMBER"),
            member("usr_b", "VIEWER"),
        ]));

        resource
            .delete(json!({
                "project_id": "prj_1",
                "member": [
                    {"user_id": "usr_a", "role": "MEMBER"},
                    {"user_id": "usr_b", "role": "VIEWER"}
                ]
            }))
            .await
            .unwrap();

        assert_eq!(api.calls(), vec!["remove:usr_a", "remove:usr_b"]);
    }

    #[tokio::test]
    async fn test_import_lists_membership() {
        let (_api, resource) = resource(FakeMembersApi::with_members(vec![member("usr_a", "ADMIN")]));

        let state = resource.import("prj_1").await.unwrap();
        assert_eq!(state["project_id"], "prj_1");
        assert_eq!(state["member"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_role_constraint() {
        let (_api, resource) = resource(FakeMembersApi::default());
        let diagnostics = resource
            .validate(&json!({
                "project_id": "prj_1",
                "member": [{"user_id": "usr_a", "role": "OWNER"}]
            }))
            .await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("member.0.role".to_string()));
    }
}
