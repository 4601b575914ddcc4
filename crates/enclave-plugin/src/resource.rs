use async_trait::async_trait;

use crate::diagnostics::Diagnostics;
use crate::schema::Schema;

/// Name and schema pair the host uses to register a resource kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceType {
    pub name: &'static str,
    pub schema: Schema,
}

impl ResourceType {
    pub fn new(name: &'static str, schema: Schema) -> Self {
        Self { name, schema }
    }
}

/// One resource kind's CRUD handler.
///
/// Every method records failures in `diags` and returns `None`; a `None`
/// without an error diagnostic is a bug in the implementation. Warnings may
/// accompany a successful return. On `create`/`read`/`update` the returned
/// state is what the host persists; on a successful `delete` the host drops
/// the resource from tracked state unconditionally.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Flat state record for this resource kind.
    type State: Send + 'static;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Create the remote entity from the planned state and return the state
    /// to persist, computed fields filled in from the response.
    async fn create(&self, plan: Self::State, diags: &mut Diagnostics) -> Option<Self::State>;

    /// Fetch the current remote representation and overwrite the state's
    /// computed fields. The host calls this on every refresh.
    async fn read(&self, state: Self::State, diags: &mut Diagnostics) -> Option<Self::State>;

    /// Patch the remote entity to match `plan`. `state` carries the prior
    /// persisted state, which is where the identifier comes from.
    async fn update(
        &self,
        state: Self::State,
        plan: Self::State,
        diags: &mut Diagnostics,
    ) -> Option<Self::State>;

    /// Remove (or disable) the remote entity.
    async fn delete(&self, state: Self::State, diags: &mut Diagnostics) -> Option<()>;

    /// Seed state from an imported identifier; the next read hydrates the
    /// rest. No remote call is made here.
    fn import(&self, id: &str, diags: &mut Diagnostics) -> Option<Self::State>;
}
