//! Terraform-style provider for the Enclave zero-trust network platform.
//!
//! The provider binds an API token to one organisation and exposes that
//! organisation's resources (enrolment keys, policies, DNS zones and
//! records, tags, trust requirements) as declarative CRUD resources for a
//! plugin host to drive. Handlers are straight sequences: decode the plan,
//! translate to the API request shape, call the client, map the response
//! back into state.

pub mod provider;
pub mod resources;
pub mod translate;

pub use provider::{EnclaveProvider, ProviderConfig};
