pub mod diagnostics;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod value;


pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use provider::Provider;
pub use resource::{Resource, ResourceType};
pub use schema::{AttrType, Attribute, Schema};
pub use value::{Value, ValueBool, ValueInt, ValueString};
