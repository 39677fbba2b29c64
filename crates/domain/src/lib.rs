//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod role;
mod security;
mod survey;
mod user;

pub use role::{ADMIN_ROLE_NAME, Role, RoleId, RoleName};
pub use security::{Grant, Permission, ServiceDescriptor};
pub use survey::{
    FloorEntry, PropertyNumber, PropertyRange, Survey, SurveyId, SurveySelector, WardNumber,
};
pub use user::{EmailAddress, UserId};
