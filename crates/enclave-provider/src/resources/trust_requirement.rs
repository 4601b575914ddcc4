use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use enclave_client::types::{
    TrustCondition, TrustRequirement, TrustRequirementCreate, TrustRequirementId,
    TrustRequirementPatch, TrustRequirementSettings, TrustRequirementType,
};
use enclave_plugin::{
    AttrType, Attribute, Diagnostics, Resource, Schema, Value, ValueBool, ValueInt, ValueString,
};

use crate::provider::EnclaveProvider;
use crate::translate::{parse_authority, Authority, TranslateError};

/// One user-supplied claim/value pair. Submitted to the server in the order
/// configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomClaim {
    pub claim: String,
    pub value: String,
}

/// The `user_authentication` block of a trust requirement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserAuthenticationState {
    pub authority: ValueString,
    pub azure_tenant_id: ValueString,
    pub azure_group_id: ValueString,
    pub mfa: ValueBool,
    pub custom_claims: Vec<CustomClaim>,
}

/// State for `enclave_trust_requirement`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrustRequirementState {
    pub id: ValueInt,
    pub description: ValueString,
    pub notes: ValueString,
    pub user_authentication: Option<UserAuthenticationState>,
}

fn user_authentication_object() -> AttrType {
    AttrType::Object(vec![
        Attribute::new("authority", AttrType::String)
            .required()
            .description("'portal' or 'azure'."),
        Attribute::new("azure_tenant_id", AttrType::String).optional(),
        Attribute::new("azure_group_id", AttrType::String).optional(),
        Attribute::new("mfa", AttrType::Bool)
            .optional()
            .description("Require a multi-factor authentication claim."),
        Attribute::new(
            "custom_claims",
            AttrType::List(Box::new(AttrType::Object(vec![
                Attribute::new("claim", AttrType::String).required(),
                Attribute::new("value", AttrType::String).required(),
            ]))),
        )
        .optional(),
    ])
}

pub fn schema() -> Schema {
    Schema::new("A condition set systems' users must satisfy to gain access.")
        .attribute(Attribute::new("id", AttrType::Int).computed())
        .attribute(Attribute::new("description", AttrType::String).required())
        .attribute(Attribute::new("notes", AttrType::String).optional())
        .attribute(
            Attribute::new("user_authentication", user_authentication_object())
                .optional()
                .description("How users authenticate and which claims they must carry."),
        )
}

/// Assemble the wire settings from a `user_authentication` block.
///
/// Portal authority carries no conditions. Azure authority builds an ordered
/// condition list: the `groups` claim first, then the `amr`/`mfa` marker
/// when `mfa` is set and true, then the custom claims in input order.
/// The order is load-bearing; the server evaluates conditions as submitted.
pub fn build_settings(
    auth: Option<&UserAuthenticationState>,
) -> Result<TrustRequirementSettings, TranslateError> {
    let auth = auth.ok_or(TranslateError::MissingUserAuthentication)?;
    let authority = match auth.authority.as_deref() {
        Some(value) => parse_authority(value)?,
        None => return Err(TranslateError::MissingUserAuthentication),
    };

    let mut settings = TrustRequirementSettings::default();
    settings
        .configuration
        .insert("authority".to_string(), authority.as_str().to_string());

    match authority {
        Authority::Portal => {}
        Authority::Azure => {
            settings.configuration.insert(
                "tenantId".to_string(),
                auth.azure_tenant_id.as_deref().unwrap_or_default().to_string(),
            );
            settings.conditions.push(TrustCondition {
                claim: "groups".to_string(),
                value: auth.azure_group_id.as_deref().unwrap_or_default().to_string(),
            });
            if auth.mfa.unwrap_or(false) {
                settings.conditions.push(TrustCondition {
                    claim: "amr".to_string(),
                    value: "mfa".to_string(),
                });
            }
            for claim in &auth.custom_claims {
                settings.conditions.push(TrustCondition {
                    claim: claim.claim.clone(),
                    value: claim.value.clone(),
                });
            }
        }
    }
    Ok(settings)
}

/// Portal authority ignores the azure-specific fields; flag them rather than
/// silently dropping them.
fn warn_on_ignored_azure_fields(auth: &UserAuthenticationState, diags: &mut Diagnostics) {
    let is_portal = matches!(
        auth.authority.as_deref(),
        Some(a) if a.eq_ignore_ascii_case("portal")
    );
    let has_azure_fields = auth.azure_tenant_id.is_value()
        || auth.azure_group_id.is_value()
        || auth.mfa.is_value()
        || !auth.custom_claims.is_empty();
    if is_portal && has_azure_fields {
        warn!("Trust requirement uses portal authority but sets azure-specific fields");
        diags.warning(
            "Azure fields ignored",
            "authority is 'portal'; azure_tenant_id, azure_group_id, mfa and \
             custom_claims have no effect and will not be submitted.",
        );
    }
}

pub struct TrustRequirementResource {
    provider: Arc<EnclaveProvider>,
}

impl TrustRequirementResource {
    pub fn new(provider: Arc<EnclaveProvider>) -> Self {
        Self { provider }
    }

    fn to_create(plan: &TrustRequirementState) -> Result<TrustRequirementCreate, TranslateError> {
        Ok(TrustRequirementCreate {
            description: plan.description.as_deref().unwrap_or_default().to_string(),
            notes: plan.notes.as_deref().map(str::to_string),
            requirement_type: TrustRequirementType::UserAuthentication,
            settings: build_settings(plan.user_authentication.as_ref())?,
        })
    }

    fn to_patch(plan: &TrustRequirementState) -> Result<TrustRequirementPatch, TranslateError> {
        Ok(TrustRequirementPatch {
            description: plan.description.as_deref().map(str::to_string),
            notes: plan.notes.as_deref().map(str::to_string),
            settings: Some(build_settings(plan.user_authentication.as_ref())?),
        })
    }

    fn requirement_id(
        state: &TrustRequirementState,
        diags: &mut Diagnostics,
    ) -> Option<TrustRequirementId> {
        match state.id.as_option() {
            Some(id) => Some(TrustRequirementId(*id)),
            None => {
                diags.error(
                    "Missing trust requirement id",
                    "State does not carry an id for this trust requirement.",
                );
                None
            }
        }
    }

    fn write_computed(state: &mut TrustRequirementState, remote: &TrustRequirement) {
        state.id = Value::Value(remote.id.0);
    }
}

#[async_trait]
impl Resource for TrustRequirementResource {
    type State = TrustRequirementState;

    fn type_name(&self) -> &'static str {
        "enclave_trust_requirement"
    }

    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        if let Some(auth) = &plan.user_authentication {
            warn_on_ignored_azure_fields(auth, diags);
        }
        let body = match Self::to_create(&plan) {
            Ok(body) => body,
            Err(err) => {
                diags.error("Invalid trust requirement configuration", err.to_string());
                return None;
            }
        };
        match client.create_trust_requirement(&body).await {
            Ok(created) => {
                let mut state = plan;
                Self::write_computed(&mut state, &created);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error creating trust requirement",
                    format!("Could not create trust requirement: {err}"),
                );
                None
            }
        }
    }

    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State> {
        let client = self.provider.client(diags).await?;
        let id = Self::requirement_id(&state, diags)?;
        match client.get_trust_requirement(id).await {
            Ok(remote) => {
                let mut state = state;
                Self::write_computed(&mut state, &remote);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Error reading trust requirement",
                    format!("Could not read trust requirement {id}: {err}"),
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
        let id = Self::requirement_id(&state, diags)?;
        if let Some(auth) = &plan.user_authentication {
            warn_on_ignored_azure_fields(auth, diags);
        }
        let body = match Self::to_patch(&plan) {
            Ok(body) => body,
            Err(err) => {
                diags.error("Invalid trust requirement configuration", err.to_string());
                return None;
            }
        };
        match client.update_trust_requirement(id, &body).await {
            Ok(remote) => {
                let mut next = plan;
                Self::write_computed(&mut next, &remote);
                Some(next)
            }
            Err(err) => {
                diags.error(
                    "Error updating trust requirement",
                    format!("Could not update trust requirement {id}: {err}"),
                );
                None
            }
        }
    }

    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()> {
        let client = self.provider.client(diags).await?;
        let id = Self::requirement_id(&state, diags)?;
        match client.delete_trust_requirement(id).await {
            Ok(()) => Some(()),
            Err(err) => {
                diags.error(
                    "Error deleting trust requirement",
                    format!("Could not delete trust requirement {id}: {err}"),
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
                    format!("'{id}' is not a numeric trust requirement id."),
                );
                return None;
            }
        };
        Some(TrustRequirementState {
            id: Value::Value(parsed),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azure_auth() -> UserAuthenticationState {
        UserAuthenticationState {
            authority: Value::Value("azure".into()),
            azure_tenant_id: Value::Value("tenant-1".into()),
            azure_group_id: Value::Value("group-1".into()),
            mfa: Value::Null,
            custom_claims: vec![],
        }
    }

    #[test]
    fn portal_settings_have_no_conditions() {
        let auth = UserAuthenticationState {
            authority: Value::Value("portal".into()),
            // Azure fields present but meaningless for portal.
            azure_tenant_id: Value::Value("tenant-1".into()),
            azure_group_id: Value::Value("group-1".into()),
            mfa: Value::Value(true),
            custom_claims: vec![CustomClaim {
                claim: "x".into(),
                value: "y".into(),
            }],
        };
        let settings = build_settings(Some(&auth)).unwrap();
        assert!(settings.conditions.is_empty());
        assert_eq!(settings.configuration.len(), 1);
        assert_eq!(settings.configuration.get("authority").map(String::as_str), Some("portal"));
    }

    #[test]
    fn azure_groups_condition_comes_first() {
        let settings = build_settings(Some(&azure_auth())).unwrap();
        assert_eq!(
            settings.configuration.get("tenantId").map(String::as_str),
            Some("tenant-1")
        );
        assert_eq!(settings.conditions[0].claim, "groups");
        assert_eq!(settings.conditions[0].value, "group-1");
    }

    #[test]
    fn mfa_condition_follows_groups() {
        let mut auth = azure_auth();
        auth.mfa = Value::Value(true);
        let settings = build_settings(Some(&auth)).unwrap();
        assert_eq!(settings.conditions.len(), 2);
        assert_eq!(
            settings.conditions[1],
            TrustCondition {
                claim: "amr".into(),
                value: "mfa".into()
            }
        );
    }

    #[test]
    fn no_amr_condition_without_mfa() {
        let unset = build_settings(Some(&azure_auth())).unwrap();
        assert!(unset.conditions.iter().all(|c| c.claim != "amr"));

        let mut auth = azure_auth();
        auth.mfa = Value::Value(false);
        let explicit_false = build_settings(Some(&auth)).unwrap();
        assert!(explicit_false.conditions.iter().all(|c| c.claim != "amr"));
    }

    #[test]
    fn custom_claims_append_in_input_order() {
        let mut auth = azure_auth();
        auth.mfa = Value::Value(true);
        auth.custom_claims = vec![
            CustomClaim {
                claim: "department".into(),
                value: "engineering".into(),
            },
            CustomClaim {
                claim: "country".into(),
                value: "nz".into(),
            },
        ];
        let settings = build_settings(Some(&auth)).unwrap();
        let claims: Vec<&str> = settings.conditions.iter().map(|c| c.claim.as_str()).collect();
        assert_eq!(claims, vec!["groups", "amr", "department", "country"]);
    }

    #[test]
    fn missing_user_authentication_block_is_an_error() {
        assert_eq!(
            build_settings(None),
            Err(TranslateError::MissingUserAuthentication)
        );

        let empty = UserAuthenticationState::default();
        assert_eq!(
            build_settings(Some(&empty)),
            Err(TranslateError::MissingUserAuthentication)
        );
    }

    #[test]
    fn unknown_authority_is_an_error() {
        let mut auth = azure_auth();
        auth.authority = Value::Value("okta".into());
        assert_eq!(
            build_settings(Some(&auth)),
            Err(TranslateError::Authority("okta".into()))
        );
    }

    #[test]
    fn portal_with_azure_fields_warns() {
        let auth = UserAuthenticationState {
            authority: Value::Value("portal".into()),
            azure_tenant_id: Value::Value("tenant-1".into()),
            ..Default::default()
        };
        let mut diags = Diagnostics::new();
        warn_on_ignored_azure_fields(&auth, &mut diags);
        assert!(!diags.has_errors());
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(diags.warnings().next().unwrap().summary, "Azure fields ignored");
    }

    #[test]
    fn azure_authority_does_not_warn() {
        let mut diags = Diagnostics::new();
        warn_on_ignored_azure_fields(&azure_auth(), &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn user_authentication_block_is_optional_in_the_schema() {
        // The missing-block case is reported by build_settings, not by the
        // schema; a required block would reject it before validation runs.
        let schema = schema();
        let block = schema.attr("user_authentication").unwrap();
        assert!(block.optional);
        assert!(!block.required);

        let attrs = match &block.attr_type {
            AttrType::Object(attrs) => attrs,
            other => panic!("unexpected attr type: {other:?}"),
        };
        let mfa = attrs.iter().find(|a| a.name == "mfa").unwrap();
        assert_eq!(mfa.attr_type, AttrType::Bool);
        assert!(mfa.optional);
    }
}
