use super::ApiClient;
use crate::error::{InspectError, Result, ADMIN_ONLY_MESSAGE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use thermal_inspect_common::types::User;
use thermal_inspect_common::validation::validate_new_user;

#[derive(Serialize)]
struct LoginRequest<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    name: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    occupation: Option<&'a str>,
}

impl ApiClient {
    /// `POST /auth/login`; the returned user carries the session token.
    pub async fn login(&self, name: &str, password: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() || password.is_empty() {
            return Err(InspectError::Validation(
                "Name and password are required".to_string(),
            ));
        }
        let user: User = self
            .send_json(Method::POST, "/auth/login", &LoginRequest { name, password })
            .await?;
        if user.token.is_empty() {
            return Err(InspectError::Api {
                status: 200,
                message: "Login response did not include a token".to_string(),
            });
        }
        Ok(user)
    }

    /// `POST /admin/users`; only admins may call it.
    pub async fn create_user(&self, name: &str, password: &str, occupation: Option<&str>) -> Result<Value> {
        validate_new_user(name, password)?;
        let body = CreateUserRequest {
            name: name.trim(),
            password,
            occupation: occupation.map(str::trim).filter(|s| !s.is_empty()),
        };
        self.send_json(Method::POST, "/admin/users", &body)
            .await
            .map_err(|e| match e {
                InspectError::Forbidden(_) => InspectError::Forbidden(ADMIN_ONLY_MESSAGE.to_string()),
                other => other,
            })
    }
}
