use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::database::models::{Profile, UserId};
use crate::database::UserStore;
use crate::error::ServiceError;

const USER_NOT_FOUND: &str = "User not found";

/// Body of `PUT /api/profile`. Omitted (or null) fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
}

/// Reads and edits the caller's own identity record
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn get(&self, caller: UserId) -> Result<Profile, ServiceError> {
        let user = self
            .users
            .find_by_id(caller)
            .await?
            .ok_or(ServiceError::NotFound(USER_NOT_FOUND))?;
        Ok(user.into())
    }

    /// Apply supplied fields and return the caller's email as it now stands
    pub async fn update(
        &self,
        caller: UserId,
        request: UpdateProfileRequest,
    ) -> Result<String, ServiceError> {
        let Some(email) = request.email else {
            // Nothing supplied; still confirm the caller exists
            let profile = self.get(caller).await?;
            return Ok(profile.email);
        };

        let email = validate_email(&email)?;
        let user = self
            .users
            .update_email(caller, email)
            .await?
            .ok_or(ServiceError::NotFound(USER_NOT_FOUND))?;
        info!("Updated email for user {}", caller);
        Ok(user.email)
    }
}

pub(crate) fn validate_email(raw: &str) -> Result<&str, ServiceError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ServiceError::invalid_field("email", "email must not be empty"));
    }
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(ServiceError::invalid_field("email", "email is not a valid address"));
    }
    Ok(email)
}
