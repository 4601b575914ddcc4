use std::sync::Arc;

use async_trait::async_trait;

use enclave_client::types::{EnrolmentKey, EnrolmentKeyCreate, EnrolmentKeyId, EnrolmentKeyPatch};
use enclave_plugin::{
    AttrType, Attribute, Diagnostics, Resource, Schema, Value, ValueInt, ValueString,
};

use crate::provider::EnclaveProvider;
use crate::translate::{parse_approval_mode, parse_key_type, TranslateError};

/// State for `enclave_enrolment_key`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrolmentKeyState {
    pub id: ValueInt,
    /// Secret key material, assigned by the server at create time.
    pub key: ValueString,
    pub key_type: ValueString,
    pub approval_mode: ValueString,
    pub description: ValueString,
    pub tags: Vec<String>,
    pub disconnected_retention_minutes: ValueInt,
}

pub fn schema() -> Schema {
    Schema::new("An enrolment key lets systems join the organisation's network.")
        .attribute(Attribute::new("id", AttrType::Int).computed())
        .attribute(Attribute::new("key", AttrType::String).computed().sensitive())
        .attribute(
            Attribute::new("type", AttrType::String)
                .optional()
                .description("'general' or 'ephemeral'. Defaults to 'general'."),
        )
        .attribute(
            Attribute::new("approval_mode", AttrType::String)
                .optional()
                .description("'automatic' or 'manual'. Defaults to 'manual'."),
        )
        .attribute(Attribute::new("description", AttrType::String).required())
        .attribute(
            Attribute::new("tags", AttrType::List(Box::new(AttrType::String)))
                .optional()
                .description("Tags applied to systems enrolled with this key."),
        )
        .attribute(
            Attribute::new("disconnected_retention_minutes", AttrType::Int)
                .optional()
                .description(
                    "How long a disconnected ephemeral system is retained before removal.",
                ),
        )
}

pub struct EnrolmentKeyResource {
    provider: Arc<EnclaveProvider>,
}

impl EnrolmentKeyResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }

    fn to_create(plan: &EnrolmentKeyState) -> Result<EnrolmentKeyCreate, TranslateError> {
        Ok(EnrolmentKeyCreate {
            key_type: parse_key_type(plan.key_type.as_deref())?,
            approval_mode: parse_approval_mode(plan.approval_mode.as_deref())?,
            description: plan.description.as_deref().unwrap_or_default().to_string(),
            tags: plan.tags.clone(),
            disconnected_retention_minutes: plan.disconnected_retention_minutes.into_option(),
        })
    }

    fn to_patch(plan: &EnrolmentKeyState) -> Result<EnrolmentKeyPatch, TranslateError> {
        Ok(EnrolmentKeyPatch {
            key_type: Some(parse_key_type(plan.key_type.as_deref())?),
            approval_mode: Some(parse_approval_mode(plan.approval_mode.as_deref())?),
            description: plan.description.as_deref().map(str::to_string),
            tags: Some(plan.tags.clone()),
            disconnected_retention_minutes: plan.disconnected_retention_minutes.into_option(),
        })
    }

    fn key_id(state: &EnrolmentKeyState, diags: &mut Diagnostics) -> Option<EnrolmentKeyId> {
        match state.id.as_option() {
            Some(id) => Some(EnrolmentKeyId(*id)),
            None => {
                diags.error(
                    "Missing enrolment key id",
                    "State does not carry an id for this enrolment key.",
                );
                None
            }
        }
    }

    /// Server-assigned fields. The key material only appears in responses
    /// that carry it; an empty key never overwrites a stored one.
    fn write_computed(state: &mut EnrolmentKeyState, remote: &EnrolmentKey) {
        state.id = Value::Value(remote.id.0);
        if !remote.key.is_empty() {
            state.key = Value::Value(remote.key.clone());
        }
    }
}

#[async_trait]
impl Resource for EnrolmentKeyResource {
    type State = EnrolmentKeyState;

    fn type_name(&self) -> &'static str {
        "enclave_enrolment_key"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let body = match Self::to_create(&plan) {
            Ok(body) => body,
            Err(err) => {
                diags.error("Invalid enrolment key configuration", err.to_string());
                return None;
            }
        };
        match client.create_enrolment_key(&body).await {
            Ok(created) => {
                let mut state = plan;
                // Responses carry the tags as rich objects; flatten them back
                // to the plain names the state stores.
                state.tags = created.tags.iter().map(|t| t.tag.clone()).collect();
                Self::write_computed(&mut state, &created);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error creating enrolment key",
                    format!("Could not create enrolment key: {err}"),
                );
                None
            }
        }
    }

    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let id = Self::key_id(&state, diags)?;
        match client.get_enrolment_key(id).await {
            Ok(remote) => {
                let mut state = state;
                Self::write_computed(&mut state, &remote);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error reading enrolment key",
                    format!("Could not read enrolment key {id}: {err}"),
                );
                None
            }
        }
    }

    async fn update(
        &self,
        state: Self::State,
        plan: Self::State,
        diags: &mut Diagnostics,
    ) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let id = Self::key_id(&state, diags)?;
        let body = match Self::to_patch(&plan) {
            Ok(body) => body,
            Err(err) => {
                diags.error("Invalid enrolment key configuration", err.to_string());
                return None;
            }
        };
        match client.update_enrolment_key(id, &body).await {
            Ok(remote) => {
                let mut next = plan;
                next.key = state.key.clone();
                Self::write_computed(&mut next, &remote);
                Some(next)
            }
            Err(err) => {
                diags.error(
                    "Error updating enrolment key",
                    format!("Could not update enrolment key {id}: {err}"),
                );
                None
            }
        }
    }

    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()> {
        let client = self.provider.client(diags).await?;
        let id = Self::key_id(&state, diags)?;
        // Keys are never hard-deleted; disabling revokes the key and the
        // host then drops it from tracked state.
        match client.disable_enrolment_key(id).await {
            Ok(_) => Some(()),
            Err(err) => {
                diags.error(
                    "Error disabling enrolment key",
                    format!("Could not disable enrolment key {id}: {err}"),
                );
                None
            }
        }
    }

    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<Self::State> {
        let parsed: i64 = match id.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                diags.error(
                    "Invalid import id",
                    format!("'{id}' is not a numeric enrolment key id."),
                );
                return None;
            }
        };
        Some(EnrolmentKeyState {
            id: Value::Value(parsed),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclave_client::types::{ApprovalMode, EnrolmentKeyType};

    #[test]
    fn create_payload_applies_defaults() {
        let plan = EnrolmentKeyState {
            description: Value::Value("CI runners".into()),
            ..Default::default()
        };
        let body = EnrolmentKeyResource::to_create(&plan).unwrap();
        assert_eq!(body.key_type, EnrolmentKeyType::GeneralPurpose);
        assert_eq!(body.approval_mode, ApprovalMode::Manual);
        assert_eq!(body.description, "CI runners");
        assert!(body.tags.is_empty());
        assert_eq!(body.disconnected_retention_minutes, None);
    }

    #[test]
    fn unknown_key_type_is_rejected() {
        let plan = EnrolmentKeyState {
            key_type: Value::Value("permanent".into()),
            description: Value::Value("CI runners".into()),
            ..Default::default()
        };
        let err = EnrolmentKeyResource::to_create(&plan).unwrap_err();
        assert_eq!(err, TranslateError::KeyType("permanent".into()));
    }

    #[test]
    fn import_requires_numeric_id() {
        let resource = EnrolmentKeyResource::new(EnclaveProvider::new());

        let mut diags = Diagnostics::new();
        let state = resource.import("42", &mut diags).unwrap();
        assert_eq!(state.id, Value::Value(42));
        assert!(diags.is_empty());

        let mut diags = Diagnostics::new();
        assert!(resource.import("not-a-number", &mut diags).is_none());
        assert!(diags.has_errors());
    }
}
