use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::types::{
    AccountOrganisation, DnsRecord, DnsRecordCreate, DnsRecordId, DnsRecordPatch, DnsZone,
    DnsZoneCreate, DnsZoneId, DnsZonePatch, EnrolmentKey, EnrolmentKeyCreate, EnrolmentKeyId,
    EnrolmentKeyPatch, OrgId, Policy, PolicyCreate, PolicyId, PolicyPatch, Tag, TagCreate,
    TagPatch, TagRef, TrustRequirement, TrustRequirementCreate, TrustRequirementId,
    TrustRequirementPatch,
};

/// Production API endpoint. Overridden by the provider's `url` setting and
/// by tests pointing at a mock server.
pub const DEFAULT_BASE_URL: &str = "https://api.enclave.io";

// ── Account client ────────────────────────────────────────────────────────────

/// Account-level client: authenticates with a bearer token and lists the
/// organisations that token may act in. Scope it with
/// [`Client::organisation`] before touching any org resources.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct OrgsResponse {
    orgs: Vec<AccountOrganisation>,
}

impl Client {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API host, e.g. a self-hosted
    /// deployment or a mock server in tests.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// The organisations this token can act in.
    pub async fn organisations(&self) -> Result<Vec<AccountOrganisation>, ApiError> {
        let url = format!("{}/account/orgs", self.base_url);
        let resp = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let body: OrgsResponse = decode(resp).await?;
        Ok(body.orgs)
    }

    /// Bind this client to one organisation.
    pub fn organisation(&self, org_id: OrgId) -> OrgClient {
        OrgClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            org_id,
        }
    }
}

// ── Organisation-scoped client ────────────────────────────────────────────────

/// Client bound to one organisation; every request lives under `/org/{id}`.
#[derive(Clone)]
pub struct OrgClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org_id: OrgId,
}

impl OrgClient {
    pub fn org_id(&self) -> &OrgId {
        &self.org_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/org/{}{}", self.base_url, self.org_id, path)
    }

    // ── Enrolment keys ────────────────────────────────────────────────────────

    pub async fn create_enrolment_key(
        &self,
        body: &EnrolmentKeyCreate,
    ) -> Result<EnrolmentKey, ApiError> {
        debug!("Creating enrolment key '{}'", body.description);
        self.post(&self.url("/enrolment-keys"), body).await
    }

    pub async fn get_enrolment_key(&self, id: EnrolmentKeyId) -> Result<EnrolmentKey, ApiError> {
        self.get(&self.url(&format!("/enrolment-keys/{}", id))).await
    }

    pub async fn update_enrolment_key(
        &self,
        id: EnrolmentKeyId,
        body: &EnrolmentKeyPatch,
    ) -> Result<EnrolmentKey, ApiError> {
        debug!("Updating enrolment key {}", id);
        self.patch(&self.url(&format!("/enrolment-keys/{}", id)), body)
            .await
    }

    /// Enrolment keys are never hard-deleted; disabling revokes the key
    /// while keeping its enrolment history.
    pub async fn disable_enrolment_key(
        &self,
        id: EnrolmentKeyId,
    ) -> Result<EnrolmentKey, ApiError> {
        debug!("Disabling enrolment key {}", id);
        self.put(&self.url(&format!("/enrolment-keys/{}/disable", id)))
            .await
    }

    // ── Policies ──────────────────────────────────────────────────────────────

    pub async fn create_policy(&self, body: &PolicyCreate) -> Result<Policy, ApiError> {
        debug!("Creating policy '{}'", body.description);
        self.post(&self.url("/policies"), body).await
    }

    pub async fn get_policy(&self, id: PolicyId) -> Result<Policy, ApiError> {
        self.get(&self.url(&format!("/policies/{}", id))).await
    }

    pub async fn update_policy(
        &self,
        id: PolicyId,
        body: &PolicyPatch,
    ) -> Result<Policy, ApiError> {
        debug!("Updating policy {}", id);
        self.patch(&self.url(&format!("/policies/{}", id)), body).await
    }

    pub async fn delete_policy(&self, id: PolicyId) -> Result<(), ApiError> {
        debug!("Deleting policy {}", id);
        self.delete(&self.url(&format!("/policies/{}", id))).await
    }

    // ── DNS zones ─────────────────────────────────────────────────────────────

    pub async fn create_dns_zone(&self, body: &DnsZoneCreate) -> Result<DnsZone, ApiError> {
        debug!("Creating DNS zone '{}'", body.name);
        self.post(&self.url("/dns/zones"), body).await
    }

    pub async fn get_dns_zone(&self, id: DnsZoneId) -> Result<DnsZone, ApiError> {
        self.get(&self.url(&format!("/dns/zones/{}", id))).await
    }

    pub async fn update_dns_zone(
        &self,
        id: DnsZoneId,
        body: &DnsZonePatch,
    ) -> Result<DnsZone, ApiError> {
        debug!("Updating DNS zone {}", id);
        self.patch(&self.url(&format!("/dns/zones/{}", id)), body).await
    }

    pub async fn delete_dns_zone(&self, id: DnsZoneId) -> Result<(), ApiError> {
        debug!("Deleting DNS zone {}", id);
        self.delete(&self.url(&format!("/dns/zones/{}", id))).await
    }

    // ── DNS records ───────────────────────────────────────────────────────────

    pub async fn create_dns_record(&self, body: &DnsRecordCreate) -> Result<DnsRecord, ApiError> {
        debug!("Creating DNS record '{}' in zone {}", body.name, body.zone_id);
        self.post(&self.url("/dns/records"), body).await
    }

    pub async fn get_dns_record(&self, id: DnsRecordId) -> Result<DnsRecord, ApiError> {
        self.get(&self.url(&format!("/dns/records/{}", id))).await
    }

    pub async fn update_dns_record(
        &self,
        id: DnsRecordId,
        body: &DnsRecordPatch,
    ) -> Result<DnsRecord, ApiError> {
        debug!("Updating DNS record {}", id);
        self.patch(&self.url(&format!("/dns/records/{}", id)), body)
            .await
    }

    pub async fn delete_dns_record(&self, id: DnsRecordId) -> Result<(), ApiError> {
        debug!("Deleting DNS record {}", id);
        self.delete(&self.url(&format!("/dns/records/{}", id))).await
    }

    // ── Tags ──────────────────────────────────────────────────────────────────

    pub async fn create_tag(&self, body: &TagCreate) -> Result<Tag, ApiError> {
        debug!("Creating tag '{}'", body.tag);
        self.post(&self.url("/tags"), body).await
    }

    pub async fn get_tag(&self, tag_ref: &TagRef) -> Result<Tag, ApiError> {
        self.get(&self.url(&format!("/tags/{}", tag_ref))).await
    }

    pub async fn update_tag(&self, tag_ref: &TagRef, body: &TagPatch) -> Result<Tag, ApiError> {
        debug!("Updating tag {}", tag_ref);
        self.patch(&self.url(&format!("/tags/{}", tag_ref)), body).await
    }

    pub async fn delete_tag(&self, tag_ref: &TagRef) -> Result<(), ApiError> {
        debug!("Deleting tag {}", tag_ref);
        self.delete(&self.url(&format!("/tags/{}", tag_ref))).await
    }

    // ── Trust requirements ────────────────────────────────────────────────────

    pub async fn create_trust_requirement(
        &self,
        body: &TrustRequirementCreate,
    ) -> Result<TrustRequirement, ApiError> {
        debug!("Creating trust requirement '{}'", body.description);
        self.post(&self.url("/trust-requirements"), body).await
    }

    pub async fn get_trust_requirement(
        &self,
        id: TrustRequirementId,
    ) -> Result<TrustRequirement, ApiError> {
        self.get(&self.url(&format!("/trust-requirements/{}", id)))
            .await
    }

    pub async fn update_trust_requirement(
        &self,
        id: TrustRequirementId,
        body: &TrustRequirementPatch,
    ) -> Result<TrustRequirement, ApiError> {
        debug!("Updating trust requirement {}", id);
        self.patch(&self.url(&format!("/trust-requirements/{}", id)), body)
            .await
    }

    pub async fn delete_trust_requirement(&self, id: TrustRequirementId) -> Result<(), ApiError> {
        debug!("Deleting trust requirement {}", id);
        self.delete(&self.url(&format!("/trust-requirements/{}", id)))
            .await
    }

    // ── Request helpers ───────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        decode(resp).await
    }

    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn patch<T, B>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .http
            .patch(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn put<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.http.put(url).bearer_auth(&self.token).send().await?;
        decode(resp).await
    }

    async fn delete(&self, url: &str) -> Result<(), ApiError> {
        let resp = self.http.delete(url).bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }
        Ok(())
    }
}

// ── Response handling ─────────────────────────────────────────────────────────

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: extract_message(&body),
        });
    }
    Ok(resp.json::<T>().await?)
}

/// Pull the server's own description out of an error body where possible.
/// Both `{"message": "..."}` and problem-details `{"title": "..."}` shapes
/// are understood; anything else is passed through raw.
fn extract_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
        if let Some(title) = v.get("title").and_then(|t| t.as_str()) {
            return title.to_string();
        }
    }
    body.to_string()
}
