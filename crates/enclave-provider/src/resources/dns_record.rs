use std::sync::Arc;

use async_trait::async_trait;

use enclave_client::types::{DnsRecord, DnsRecordCreate, DnsRecordId, DnsRecordPatch, DnsZoneId};
use enclave_plugin::{
    AttrType, Attribute, Diagnostics, Resource, Schema, Value, ValueInt, ValueString,
};

use crate::provider::EnclaveProvider;

/// Records created without an explicit zone land in the organisation's
/// default zone.
pub const DEFAULT_ZONE: DnsZoneId = DnsZoneId(1);

/// State for `enclave_dns_record`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DnsRecordState {
    pub id: ValueInt,
    pub zone_id: ValueInt,
    pub name: ValueString,
    pub tags: Vec<String>,
    pub systems: Vec<String>,
    pub notes: ValueString,
    /// Assembled by the server from the record name and its zone.
    pub fqdn: ValueString,
}

pub fn schema() -> Schema {
    Schema::new("A DNS record resolvable by enrolled systems.")
        .attribute(Attribute::new("id", AttrType::Int).computed())
        .attribute(
            Attribute::new("zone_id", AttrType::Int)
                .optional()
                .description("Zone to create the record in. Defaults to the default zone."),
        )
        .attribute(Attribute::new("name", AttrType::String).required())
        .attribute(
            Attribute::new("tags", AttrType::List(Box::new(AttrType::String)))
                .optional()
                .description("Tags whose systems the record resolves to."),
        )
        .attribute(
            Attribute::new("systems", AttrType::List(Box::new(AttrType::String)))
                .optional()
                .description("System ids the record resolves to."),
        )
        .attribute(Attribute::new("notes", AttrType::String).optional())
        .attribute(Attribute::new("fqdn", AttrType::String).computed())
}

pub struct DnsRecordResource {
    provider: Arc<EnclaveProvider>,
}

impl DnsRecordResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }

    fn to_create(plan: &DnsRecordState) -> DnsRecordCreate {
        DnsRecordCreate {
            zone_id: plan.zone_id.map(DnsZoneId).unwrap_or(DEFAULT_ZONE),
            name: plan.name.as_deref().unwrap_or_default().to_string(),
            tags: plan.tags.clone(),
            systems: plan.systems.clone(),
            notes: plan.notes.as_deref().map(str::to_string),
        }
    }

    fn to_patch(plan: &DnsRecordState) -> DnsRecordPatch {
        DnsRecordPatch {
            zone_id: Some(plan.zone_id.map(DnsZoneId).unwrap_or(DEFAULT_ZONE)),
            name: plan.name.as_deref().map(str::to_string),
            tags: Some(plan.tags.clone()),
            systems: Some(plan.systems.clone()),
            notes: plan.notes.as_deref().map(str::to_string),
        }
    }

    fn record_id(state: &DnsRecordState, diags: &mut Diagnostics) -> Option<DnsRecordId> {
        match state.id.as_option() {
            Some(id) => Some(DnsRecordId(*id)),
            None => {
                diags.error(
                    "Missing DNS record id",
                    "State does not carry an id for this DNS record.",
                );
                None
            }
        }
    }

    fn write_computed(state: &mut DnsRecordState, remote: &DnsRecord) {
        state.id = Value::Value(remote.id.0);
        state.fqdn = Value::Value(remote.fqdn.clone());
    }
}

#[async_trait]
impl Resource for DnsRecordResource {
    type State = DnsRecordState;

    fn type_name(&self) -> &'static str {
        "enclave_dns_record"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        match client.create_dns_record(&Self::to_create(&plan)).await {
            Ok(created) => {
                let mut state = plan;
                Self::write_computed(&mut state, &created);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error creating DNS record",
                    format!("Could not create DNS record: {err}"),
                );
                None
            }
        }
    }

    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let id = Self::record_id(&state, diags)?;
        match client.get_dns_record(id).await {
            Ok(remote) => {
                let mut state = state;
                Self::write_computed(&mut state, &remote);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error reading DNS record",
                    format!("Could not read DNS record {id}: {err}"),
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
        let id = Self::record_id(&state, diags)?;
        match client.update_dns_record(id, &Self::to_patch(&plan)).await {
            Ok(remote) => {
                let mut next = plan;
                Self::write_computed(&mut next, &remote);
                Some(next)
            }
            Err(err) => {
                diags.error(
                    "Error updating DNS record",
                    format!("Could not update DNS record {id}: {err}"),
                );
                None
            }
        }
    }

    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()> {
        let client = self.provider.client(diags).await?;
        let id = Self::record_id(&state, diags)?;
        match client.delete_dns_record(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.error(
                    "Error deleting DNS record",
                    format!("Could not delete DNS record {id}: {err}"),
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
                    format!("'{id}' is not a numeric DNS record id."),
                );
                return None;
            }
        };
        Some(DnsRecordState {
            id: Value::Value(parsed),
            ..Default::default()
        })
    }
}
