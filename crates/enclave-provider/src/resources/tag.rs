use std::sync::Arc;

use async_trait::async_trait;

use enclave_client::types::{Tag, TagCreate, TagPatch, TagRef};
use enclave_plugin::{AttrType, Attribute, Diagnostics, Resource, Schema, Value, ValueString};

use crate::provider::EnclaveProvider;
use crate::translate::to_trust_requirement_ids;

/// State for `enclave_tag`. Tags are keyed by their server-assigned `ref`
/// string rather than a numeric id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagState {
    pub tag_ref: ValueString,
    pub name: ValueString,
    pub colour: ValueString,
    pub notes: ValueString,
    pub trust_requirements: Vec<i64>,
}

pub fn schema() -> Schema {
    Schema::new("A label attachable to systems and referenced by policies and DNS records.")
        .attribute(Attribute::new("ref", AttrType::String).computed())
        .attribute(Attribute::new("name", AttrType::String).required())
        .attribute(
            Attribute::new("colour", AttrType::String)
                .optional()
                .description("Hex colour shown in the portal, e.g. '#2EC4B6'."),
        )
        .attribute(Attribute::new("notes", AttrType::String).optional())
        .attribute(
            Attribute::new("trust_requirements", AttrType::List(Box::new(AttrType::Int)))
                .optional()
                .description("Trust requirement ids systems must meet to carry this tag."),
        )
}

pub struct TagResource {
    provider: Arc<EnclaveProvider>,
}

impl TagResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }

    fn to_create(plan: &TagState) -> TagCreate {
        TagCreate {
            tag: plan.name.as_deref().unwrap_or_default().to_string(),
            colour: plan.colour.as_deref().map(str::to_string),
            notes: plan.notes.as_deref().map(str::to_string),
            trust_requirements: to_trust_requirement_ids(&plan.trust_requirements),
        }
    }

    fn to_patch(plan: &TagState) -> TagPatch {
        TagPatch {
            tag: plan.name.as_deref().map(str::to_string),
            colour: plan.colour.as_deref().map(str::to_string),
            notes: plan.notes.as_deref().map(str::to_string),
            trust_requirements: Some(to_trust_requirement_ids(&plan.trust_requirements)),
        }
    }

    fn tag_ref(state: &TagState, diags: &mut Diagnostics) -> Option<TagRef> {
        match state.tag_ref.as_deref() {
            Some(r) if !r.is_empty() => Some(TagRef::new(r)),
            _ => {
                diags.error(
                    "Missing tag ref",
                    "State does not carry a ref for this tag.",
                );
                None
            }
        }
    }

    fn write_computed(state: &mut TagState, remote: &Tag) {
        state.tag_ref = Value::Value(remote.tag_ref.as_str().to_string());
    }
}

#[async_trait]
impl Resource for TagResource {
    type State = TagState;

    fn type_name(&self) -> &'static str {
        "enclave_tag"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        match client.create_tag(&Self::to_create(&plan)).await {
            Ok(created) => {
                let mut state = plan;
                Self::write_computed(&mut state, &created);
                Some(state)
            }
            Err(err) => {
                diags.error("Error creating tag", format!("Could not create tag: {err}"));
                None
            }
        }
    }

    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let tag_ref = Self::tag_ref(&state, diags)?;
        match client.get_tag(&tag_ref).await {
            Ok(remote) => {
                let mut state = state;
                Self::write_computed(&mut state, &remote);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error reading tag",
                    format!("Could not read tag {tag_ref}: {err}"),
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
        let tag_ref = Self::tag_ref(&state, diags)?;
        match client.update_tag(&tag_ref, &Self::to_patch(&plan)).await {
            Ok(remote) => {
                let mut next = plan;
                Self::write_computed(&mut next, &remote);
                Some(next)
            }
            Err(err) => {
                diags.error(
                    "Error updating tag",
                    format!("Could not update tag {tag_ref}: {err}"),
                );
                None
            }
        }
    }

    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()> {
        let client = self.provider.client(diags).await?;
        let tag_ref = Self::tag_ref(&state, diags)?;
        match client.delete_tag(&tag_ref).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.error(
                    "Error deleting tag",
                    format!("Could not delete tag {tag_ref}: {err}"),
                );
                None
            }
        }
    }

    /// The imported identifier is the tag's ref string, passed through
    /// verbatim.
    fn import(&self, id: &str, _diags: &mut Diagnostics) -> Option<Self::State> {
        Some(TagState {
            tag_ref: Value::Value(id.to_string()),
            ..Default::default()
        })
    }
}
