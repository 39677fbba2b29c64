use std::str::FromStr;

use wardbook_core::AppError;
use wardbook_domain::RoleId;

pub mod health;
pub mod reports;
pub mod roles;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

fn parse_role_id(value: &str) -> Result<RoleId, AppError> {
    uuid::Uuid::from_str(value.trim())
        .map(RoleId::from_uuid)
        .map_err(|_| AppError::Validation(format!("invalid role id '{value}'")))
}
