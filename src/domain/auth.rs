use crate::error::{PlanitError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

impl LoginPayload {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(PlanitError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub f_name: String,
    pub l_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterPayload {
    pub fn validate(&self) -> Result<()> {
        let required = [&self.f_name, &self.l_name, &self.email, &self.password];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(PlanitError::Validation("All fields are required".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(PlanitError::Validation("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub f_name: String,
    pub l_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    pub token: String,
    pub user: UserProfile,
}
