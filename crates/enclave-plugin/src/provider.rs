use async_trait::async_trait;

use crate::diagnostics::Diagnostics;
use crate::resource::ResourceType;
use crate::schema::Schema;

/// The provider itself: configuration plus the set of resource kinds it
/// serves. The host calls `configure` exactly once before dispatching any
/// resource operation.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider-level configuration record.
    type Config: Send + 'static;

    fn name(&self) -> &'static str;

    /// Schema for the provider configuration block.
    fn schema(&self) -> Schema;

    /// Validate credentials and bind the provider to its backing service.
    ///
    /// Returns `None` (with an error diagnostic) when configuration fails.
    /// May return `Some(())` with a warning while leaving the provider
    /// unconfigured, e.g. when a config value is still unknown; resource
    /// operations then fail fast until a later configure succeeds.
    async fn configure(&self, config: Self::Config, diags: &mut Diagnostics) -> Option<()>;

    /// Resource kinds this provider serves, as name/schema descriptors.
    fn resource_types(&self) -> Vec<ResourceType>;
}
