//! One handler per resource kind. Each follows the same shape: decode the
//! plan, translate enums, call the remote client, write computed fields back
//! into state, and surface any failure as a diagnostic.

pub mod dns_record;
pub mod dns_zone;
pub mod enrolment_key;
pub mod policy;
pub mod policy_acl;
pub mod tag;
pub mod trust_requirement;
