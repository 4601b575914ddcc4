use std::sync::Arc;

use async_trait::async_trait;

use enclave_client::types::{DnsZone, DnsZoneCreate, DnsZoneId, DnsZonePatch};
use enclave_plugin::{
    AttrType, Attribute, Diagnostics, Resource, Schema, Value, ValueInt, ValueString,
};

use crate::provider::EnclaveProvider;

/// State for `enclave_dns_zone`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DnsZoneState {
    pub id: ValueInt,
    pub name: ValueString,
    pub notes: ValueString,
}

pub fn schema() -> Schema {
    Schema::new("A DNS zone records can be created under.")
        .attribute(Attribute::new("id", AttrType::Int).computed())
        .attribute(Attribute::new("name", AttrType::String).required())
        .attribute(Attribute::new("notes", AttrType::String).optional())
}

pub struct DnsZoneResource {
    provider: Arc<EnclaveProvider>,
}

impl DnsZoneResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }

    fn to_create(plan: &DnsZoneState) -> DnsZoneCreate {
        DnsZoneCreate {
            name: plan.name.as_deref().unwrap_or_default().to_string(),
            notes: plan.notes.as_deref().map(str::to_string),
        }
    }

    fn to_patch(plan: &DnsZoneState) -> DnsZonePatch {
        DnsZonePatch {
            name: plan.name.as_deref().map(str::to_string),
            notes: plan.notes.as_deref().map(str::to_string),
        }
    }

    fn zone_id(state: &DnsZoneState, diags: &mut Diagnostics) -> Option<DnsZoneId> {
        match state.id.as_option() {
            Some(id) => Some(DnsZoneId(*id)),
            None => {
                diags.error(
                    "Missing DNS zone id",
                    "State does not carry an id for this DNS zone.",
                );
                None
            }
        }
    }

    fn write_computed(state: &mut DnsZoneState, remote: &DnsZone) {
        state.id = Value::Value(remote.id.0);
    }
}

#[async_trait]
impl Resource for DnsZoneResource {
    type State = DnsZoneState;

    fn type_name(&self) -> &'static str {
        "enclave_dns_zone"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        match client.create_dns_zone(&Self::to_create(&plan)).await {
            Ok(created) => {
                let mut state = plan;
                Self::write_computed(&mut state, &created);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error creating DNS zone",
                    format!("Could not create DNS zone: {err}"),
                );
                None
            }
        }
    }

    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let id = Self::zone_id(&state, diags)?;
        match client.get_dns_zone(id).await {
            Ok(remote) => {
                let mut state = state;
                Self::write_computed(&mut state, &remote);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error reading DNS zone",
                    format!("Could not read DNS zone {id}: {err}"),
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
        let id = Self::zone_id(&state, diags)?;
        match client.update_dns_zone(id, &Self::to_patch(&plan)).await {
            Ok(remote) => {
                let mut next = plan;
                Self::write_computed(&mut next, &remote);
                Some(next)
            }
            Err(err) => {
                diags.error(
                    "Error updating DNS zone",
                    format!("Could not update DNS zone {id}: {err}"),
                );
                None
            }
        }
    }

    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()> {
        let client = self.provider.client(diags).await?;
        let id = Self::zone_id(&state, diags)?;
        match client.delete_dns_zone(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.error(
                    "Error deleting DNS zone",
                    format!("Could not delete DNS zone {id}: {err}"),
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
                    format!("'{id}' is not a numeric DNS zone id."),
                );
                return None;
            }
        };
        Some(DnsZoneState {
            id: Value::Value(parsed),
            ..Default::default()
        })
    }
}
