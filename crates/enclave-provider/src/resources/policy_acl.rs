use std::sync::Arc;

use async_trait::async_trait;

use enclave_plugin::{AttrType, Attribute, Diagnostics, Resource, Schema, ValueString};

use crate::provider::EnclaveProvider;

/// State for `enclave_policy_acl`.
///
/// This resource owns no remote entity: it exists so an ACL entry can be
/// composed as a first-class object and spliced into a policy's `acl` list.
/// Create and update copy the plan into state verbatim; delete only drops
/// state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyAclState {
    pub protocol: ValueString,
    pub ports: ValueString,
    pub description: ValueString,
}

pub fn schema() -> Schema {
    Schema::new("A standalone ACL entry for composing into policy `acl` lists.")
        .attribute(
            Attribute::new("protocol", AttrType::String)
                .required()
                .description("'any', 'tcp', 'udp' or 'icmp'."),
        )
        .attribute(
            Attribute::new("ports", AttrType::String)
                .optional()
                .description("Port or port range, e.g. '443' or '8000-8999'."),
        )
        .attribute(Attribute::new("description", AttrType::String).optional())
}

pub struct PolicyAclResource {
    provider: Arc<EnclaveProvider>,
}

impl PolicyAclResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Resource for PolicyAclResource {
    type State = PolicyAclState;

    fn type_name(&self) -> &'static str {
        "enclave_policy_acl"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        self.provider.ensure_configured(diags).await?;
        Some(plan)
    }

    async fn read(&self, state: Self::State, _diags: &mut Diagnostics) -> Option<Self::State> {
        // Nothing remote to refresh from.
        Some(state)
    }

    async fn update(
        &self,
        _state: Self::State,
        plan: Self::State,
        diags: &mut Diagnostics,
    ) -> Option<Self::State> {
        self.provider.ensure_configured(diags).await?;
        Some(plan)
    }

    async fn delete(&self, _state: Self::State, _diags: &mut Diagnostics) -> Option<()> {
        Some(())
    }

    fn import(&self, _id: &str, diags: &mut Diagnostics) -> Option<Self::State> {
        diags.error(
            "Import not supported",
            "enclave_policy_acl is a local helper resource and cannot be imported.",
        );
        None
    }
}
