use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use enclave_client::types::AccountOrganisation;
use enclave_client::{Client, OrgClient, DEFAULT_BASE_URL};
use enclave_plugin::{
    AttrType, Attribute, Diagnostics, Provider, ResourceType, Schema, ValueString,
};

use crate::resources;

/// Provider block contents as the host hands them over. Every field is a
/// [`ValueString`] because any of them may still be unknown while the plan
/// that produces them is being applied.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub token: ValueString,
    pub organisation: ValueString,
    pub url: ValueString,
}

enum ProviderState {
    Unconfigured,
    Configured(Arc<OrgClient>),
}

/// The `enclave` provider. Starts unconfigured; [`Provider::configure`]
/// validates the token, resolves the organisation to act in and swaps in a
/// client bound to it. Resource handlers share the provider through an
/// [`Arc`] and fetch the client per operation.
pub struct EnclaveProvider {
    state: RwLock<ProviderState>,
}

impl EnclaveProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(ProviderState::Unconfigured),
        })
    }

    /// The organisation-bound client, or a "Provider not configured" error
    /// diagnostic when configuration has not completed.
    pub(crate) async fn client(&self, diags: &mut Diagnostics) -> Option<Arc<OrgClient>> {
        match &*self.state.read().await {
            ProviderState::Configured(client) => Some(Arc::clone(client)),
            ProviderState::Unconfigured => {
                diags.error(
                    "Provider not configured",
                    "The provider has not been configured before apply, likely because its \
                     configuration depends on an unknown value from another resource. Apply \
                     the resource that produces the value first.",
                );
                None
            }
        }
    }

    /// Like [`EnclaveProvider::client`] for handlers that only need to know
    /// configuration completed.
    pub(crate) async fn ensure_configured(&self, diags: &mut Diagnostics) -> Option<()> {
        self.client(diags).await.map(|_| ())
    }
}

/// Pick the organisation the provider should bind to. With access to exactly
/// one organisation no selection is needed; with more than one the
/// `organisation` setting must name one, by id or by display name.
fn resolve_organisation(
    mut orgs: Vec<AccountOrganisation>,
    wanted: Option<&str>,
    diags: &mut Diagnostics,
) -> Option<AccountOrganisation> {
    if orgs.is_empty() {
        diags.error(
            "No organisations found",
            "The supplied token does not have access to any organisations.",
        );
        return None;
    }

    match wanted {
        None => {
            if orgs.len() == 1 {
                return orgs.pop();
            }
            let names: Vec<&str> = orgs.iter().map(|o| o.org_name.as_str()).collect();
            diags.error(
                "Multiple organisations found",
                format!(
                    "The supplied token has access to more than one organisation. Set \
                     `organisation` in the provider configuration to one of: {}.",
                    names.join(", ")
                ),
            );
            None
        }
        Some(wanted) => {
            if let Some(pos) = orgs
                .iter()
                .position(|o| o.org_id.as_str() == wanted || o.org_name == wanted)
            {
                return Some(orgs.swap_remove(pos));
            }
            diags.error(
                "Could not find organisation",
                format!("No accessible organisation matches '{}'.", wanted),
            );
            None
        }
    }
}

#[async_trait]
impl Provider for EnclaveProvider {
    type Config = ProviderConfig;

    fn name(&self) -> &'static str {
        "enclave"
    }

    fn schema(&self) -> Schema {
        Schema::new("Manage Enclave zero-trust network resources.")
            .attribute(
                Attribute::new("token", AttrType::String)
                    .required()
                    .sensitive()
                    .description("Personal access token used to authenticate against the API."),
            )
            .attribute(
                Attribute::new("organisation", AttrType::String)
                    .optional()
                    .description(
                        "Organisation id or name to act in. Only needed when the token has \
                         access to more than one organisation.",
                    ),
            )
            .attribute(
                Attribute::new("url", AttrType::String)
                    .optional()
                    .description("Base URL override for self-hosted deployments."),
            )
    }

    async fn configure(&self, config: Self::Config, diags: &mut Diagnostics) -> Option<()> {
        // Any of the settings may arrive from another resource's output and
        // not be resolvable during the plan that produces it. Stay
        // unconfigured and let resource operations report it.
        if config.token.is_unknown() {
            diags.warning("Unable to create client", "Cannot use unknown value as token.");
            return Some(());
        }
        let token = match config.token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                diags.error("Unable to find token", "Token cannot be an empty string.");
                return None;
            }
        };
        if config.organisation.is_unknown() {
            diags.warning(
                "Unable to create client",
                "Cannot use unknown value as organisation.",
            );
            return Some(());
        }
        if config.url.is_unknown() {
            diags.warning("Unable to create client", "Cannot use unknown value as url.");
            return Some(());
        }

        let base_url = config.url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let account = Client::with_base_url(token, base_url);

        let orgs = match account.organisations().await {
            Ok(orgs) => orgs,
            Err(err) => {
                diags.error(
                    "Error getting organisations",
                    format!(
                        "Could not list the organisations this token can access. Check that \
                         the token is a valid Enclave personal access token: {err}"
                    ),
                );
                return None;
            }
        };

        let org = resolve_organisation(orgs, config.organisation.as_deref(), diags)?;
        info!("Configured for organisation '{}' ({})", org.org_name, org.org_id);

        let client = Arc::new(account.organisation(org.org_id));
        *self.state.write().await = ProviderState::Configured(client);
        Some(())
    }

    fn resource_types(&self) -> Vec<ResourceType> {
        vec![
            ResourceType::new("enclave_enrolment_key", resources::enrolment_key::schema()),
            ResourceType::new("enclave_policy", resources::policy::schema()),
            ResourceType::new("enclave_policy_acl", resources::policy_acl::schema()),
            ResourceType::new("enclave_dns_zone", resources::dns_zone::schema()),
            ResourceType::new("enclave_dns_record", resources::dns_record::schema()),
            ResourceType::new("enclave_tag", resources::tag::schema()),
            ResourceType::new(
                "enclave_trust_requirement",
                resources::trust_requirement::schema(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclave_client::types::OrgId;

    fn org(id: &str, name: &str) -> AccountOrganisation {
        AccountOrganisation {
            org_id: OrgId::new(id),
            org_name: name.to_string(),
            role: None,
        }
    }

    #[test]
    fn single_org_is_selected_without_configuration() {
        let mut diags = Diagnostics::new();
        let picked = resolve_organisation(vec![org("org-1", "Only Org")], None, &mut diags);
        assert_eq!(picked.unwrap().org_id, OrgId::new("org-1"));
        assert!(diags.is_empty());
    }

    #[test]
    fn multiple_orgs_require_explicit_selection() {
        let mut diags = Diagnostics::new();
        let picked = resolve_organisation(
            vec![org("org-1", "First"), org("org-2", "Second")],
            None,
            &mut diags,
        );
        assert!(picked.is_none());
        assert!(diags.has_errors());
        let err = diags.errors().next().unwrap();
        assert_eq!(err.summary, "Multiple organisations found");
        assert!(err.detail.contains("organisation"));
        assert!(err.detail.contains("First"));
        assert!(err.detail.contains("Second"));
    }

    #[test]
    fn organisation_matches_by_id() {
        let mut diags = Diagnostics::new();
        let picked = resolve_organisation(
            vec![org("org-1", "First"), org("org-2", "Second")],
            Some("org-2"),
            &mut diags,
        );
        assert_eq!(picked.unwrap().org_name, "Second");
        assert!(diags.is_empty());
    }

    #[test]
    fn organisation_matches_by_name() {
        let mut diags = Diagnostics::new();
        let picked = resolve_organisation(
            vec![org("org-1", "First"), org("org-2", "Second")],
            Some("First"),
            &mut diags,
        );
        assert_eq!(picked.unwrap().org_id, OrgId::new("org-1"));
        assert!(diags.is_empty());
    }

    #[test]
    fn unmatched_organisation_is_an_error() {
        let mut diags = Diagnostics::new();
        let picked = resolve_organisation(
            vec![org("org-1", "First")],
            Some("nope"),
            &mut diags,
        );
        assert!(picked.is_none());
        assert!(diags.has_errors());
        assert!(diags.errors().next().unwrap().detail.contains("'nope'"));
    }

    #[test]
    fn empty_org_list_is_an_error() {
        let mut diags = Diagnostics::new();
        let picked = resolve_organisation(vec![], None, &mut diags);
        assert!(picked.is_none());
        assert_eq!(diags.errors().next().unwrap().summary, "No organisations found");
    }
}
