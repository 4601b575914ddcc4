use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use enclave_client::types::{Policy, PolicyAcl, PolicyCreate, PolicyId, PolicyPatch};
use enclave_plugin::{
    AttrType, Attribute, Diagnostics, Resource, Schema, Value, ValueBool, ValueInt, ValueString,
};

use crate::provider::EnclaveProvider;
use crate::translate::{parse_protocol, to_trust_requirement_ids, TranslateError};

/// One ACL entry as configured, either inline or via `enclave_policy_acl`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyAclEntry {
    pub protocol: ValueString,
    pub ports: ValueString,
    pub description: ValueString,
}

/// State for `enclave_policy`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyState {
    pub id: ValueInt,
    pub description: ValueString,
    pub notes: ValueString,
    pub is_enabled: ValueBool,
    pub sender_tags: Vec<String>,
    pub receiver_tags: Vec<String>,
    pub acls: Vec<PolicyAclEntry>,
    pub trust_requirements: Vec<i64>,
}

fn acl_object() -> AttrType {
    AttrType::Object(vec![
        Attribute::new("protocol", AttrType::String)
            .required()
            .description("'any', 'tcp', 'udp' or 'icmp'."),
        Attribute::new("ports", AttrType::String)
            .optional()
            .description("Port or port range, e.g. '443' or '8000-8999'."),
        Attribute::new("description", AttrType::String).optional(),
    ])
}

pub fn schema() -> Schema {
    Schema::new("A policy governs which tagged systems may talk to each other.")
        .attribute(Attribute::new("id", AttrType::Int).computed())
        .attribute(Attribute::new("description", AttrType::String).required())
        .attribute(Attribute::new("notes", AttrType::String).optional())
        .attribute(
            Attribute::new("is_enabled", AttrType::Bool)
                .optional()
                .description("Whether the policy is active. Defaults to true."),
        )
        .attribute(
            Attribute::new("sender_tags", AttrType::List(Box::new(AttrType::String))).optional(),
        )
        .attribute(
            Attribute::new("receiver_tags", AttrType::List(Box::new(AttrType::String))).optional(),
        )
        .attribute(
            Attribute::new("acl", AttrType::List(Box::new(acl_object())))
                .optional()
                .description("Ordered list of permitted protocol/port entries."),
        )
        .attribute(
            Attribute::new("trust_requirements", AttrType::List(Box::new(AttrType::Int)))
                .optional()
                .description("Trust requirement ids that must be met by senders."),
        )
}

/// A policy with no ACLs or no tags on either side is valid but permits no
/// traffic; each gap is flagged independently and never blocks the apply.
fn warn_on_empty_lists(plan: &PolicyState, diags: &mut Diagnostics) {
    let description = plan.description.as_deref().unwrap_or_default();
    if plan.acls.is_empty() {
        warn!("Policy '{}' defines no ACLs", description);
        diags.warning(
            "No ACLs defined",
            "This policy permits no traffic until at least one ACL entry is added.",
        );
    }
    if plan.sender_tags.is_empty() {
        warn!("Policy '{}' defines no sender tags", description);
        diags.warning(
            "No Sender Tags defined",
            "This policy matches no sender systems until a sender tag is added.",
        );
    }
    if plan.receiver_tags.is_empty() {
        warn!("Policy '{}' defines no receiver tags", description);
        diags.warning(
            "No Receiver Tags defined",
            "This policy matches no receiver systems until a receiver tag is added.",
        );
    }
}

pub struct PolicyResource {
    provider: Arc<EnclaveProvider>,
}

impl PolicyResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }

    fn to_acls(entries: &[PolicyAclEntry]) -> Result<Vec<PolicyAcl>, TranslateError> {
        entries
            .iter()
            .map(|entry| {
                Ok(PolicyAcl {
                    protocol: parse_protocol(entry.protocol.as_deref().unwrap_or_default())?,
                    ports: entry.ports.as_deref().map(str::to_string),
                    description: entry.description.as_deref().map(str::to_string),
                })
            })
            .collect()
    }

    fn to_create(plan: &PolicyState) -> Result<PolicyCreate, TranslateError> {
        Ok(PolicyCreate {
            description: plan.description.as_deref().unwrap_or_default().to_string(),
            notes: plan.notes.as_deref().map(str::to_string),
            is_enabled: plan.is_enabled.unwrap_or(true),
            sender_tags: plan.sender_tags.clone(),
            receiver_tags: plan.receiver_tags.clone(),
            acls: Self::to_acls(&plan.acls)?,
            trust_requirements: to_trust_requirement_ids(&plan.trust_requirements),
        })
    }

    fn to_patch(plan: &PolicyState) -> Result<PolicyPatch, TranslateError> {
        Ok(PolicyPatch {
            description: plan.description.as_deref().map(str::to_string),
            notes: plan.notes.as_deref().map(str::to_string),
            is_enabled: Some(plan.is_enabled.unwrap_or(true)),
            sender_tags: Some(plan.sender_tags.clone()),
            receiver_tags: Some(plan.receiver_tags.clone()),
            acls: Some(Self::to_acls(&plan.acls)?),
            trust_requirements: Some(to_trust_requirement_ids(&plan.trust_requirements)),
        })
    }

    fn policy_id(state: &PolicyState, diags: &mut Diagnostics) -> Option<PolicyId> {
        match state.id.as_option() {
            Some(id) => Some(PolicyId(*id)),
            None => {
                diags.error(
                    "Missing policy id",
                    "State does not carry an id for this policy.",
                );
                None
            }
        }
    }

    fn write_computed(state: &mut PolicyState, remote: &Policy) {
        state.id = Value::Value(remote.id.0);
    }
}

#[async_trait]
impl Resource for PolicyResource {
    type State = PolicyState;

    fn type_name(&self) -> &'static str {
        "enclave_policy"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        warn_on_empty_lists(&plan, diags);
        let body = match Self::to_create(&plan) {
            Ok(body) => body,
            Err(err) => {
                diags.error("Invalid policy configuration", err.to_string());
                return None;
            }
        };
        match client.create_policy(&body).await {
            Ok(created) => {
                let mut state = plan;
                Self::write_computed(&mut state, &created);
                Some(state)
            }
            Err(err) => {
                diags.error("Error creating policy", format!("Could not create policy: {err}"));
                None
            }
        }
    }

    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let id = Self::policy_id(&state, diags)?;
        match client.get_policy(id).await {
            Ok(remote) => {
                let mut state = state;
                Self::write_computed(&mut state, &remote);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error reading policy",
                    format!("Could not read policy {id}: {err}"),
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
        let id = Self::policy_id(&state, diags)?;
        warn_on_empty_lists(&plan, diags);
        let body = match Self::to_patch(&plan) {
            Ok(body) => body,
            Err(err) => {
                diags.error("Invalid policy configuration", err.to_string());
                return None;
            }
        };
        match client.update_policy(id, &body).await {
            Ok(remote) => {
                let mut next = plan;
                Self::write_computed(&mut next, &remote);
                Some(next)
            }
            Err(err) => {
                diags.error(
                    "Error updating policy",
                    format!("Could not update policy {id}: {err}"),
                );
                None
            }
        }
    }

    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()> {
        let client = self.provider.client(diags).await?;
        let id = Self::policy_id(&state, diags)?;
        match client.delete_policy(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.error(
                    "Error deleting policy",
                    format!("Could not delete policy {id}: {err}"),
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
                    format!("'{id}' is not a numeric policy id."),
                );
                return None;
            }
        };
        Some(PolicyState {
            id: Value::Value(parsed),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclave_client::types::PolicyAclProtocol;

    fn plan_with(description: &str) -> PolicyState {
        PolicyState {
            description: Value::Value(description.into()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_lists_warn_independently() {
        let mut diags = Diagnostics::new();
        warn_on_empty_lists(&plan_with("empty"), &mut diags);
        let summaries: Vec<&str> = diags.warnings().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["No ACLs defined", "No Sender Tags defined", "No Receiver Tags defined"]
        );
        assert!(!diags.has_errors());
    }

    #[test]
    fn populated_lists_do_not_warn() {
        let mut plan = plan_with("full");
        plan.sender_tags = vec!["client".into()];
        plan.receiver_tags = vec!["server".into()];
        plan.acls = vec![PolicyAclEntry {
            protocol: Value::Value("tcp".into()),
            ports: Value::Value("443".into()),
            description: Value::Null,
        }];
        let mut diags = Diagnostics::new();
        warn_on_empty_lists(&plan, &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn enabled_defaults_to_true_when_unset() {
        let body = PolicyResource::to_create(&plan_with("defaults")).unwrap();
        assert!(body.is_enabled);

        let mut disabled = plan_with("off");
        disabled.is_enabled = Value::Value(false);
        let body = PolicyResource::to_create(&disabled).unwrap();
        assert!(!body.is_enabled);
    }

    #[test]
    fn acl_entries_translate_in_order() {
        let mut plan = plan_with("ordered");
        plan.acls = vec![
            PolicyAclEntry {
                protocol: Value::Value("udp".into()),
                ports: Value::Value("53".into()),
                description: Value::Value("dns".into()),
            },
            PolicyAclEntry {
                protocol: Value::Value("tcp".into()),
                ports: Value::Value("443".into()),
                description: Value::Null,
            },
        ];
        let body = PolicyResource::to_create(&plan).unwrap();
        assert_eq!(body.acls[0].protocol, PolicyAclProtocol::Udp);
        assert_eq!(body.acls[1].protocol, PolicyAclProtocol::Tcp);
        assert_eq!(body.acls[1].ports.as_deref(), Some("443"));
    }

    #[test]
    fn bad_protocol_fails_translation() {
        let mut plan = plan_with("bad");
        plan.acls = vec![PolicyAclEntry {
            protocol: Value::Value("sctp".into()),
            ports: Value::Null,
            description: Value::Null,
        }];
        let err = PolicyResource::to_create(&plan).unwrap_err();
        assert_eq!(err, TranslateError::Protocol("sctp".into()));
    }
}
