use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{ApiError, ApiResult};

/// Header Moira's web auth proxy reads the user login from.
pub const LOGIN_HEADER: &str = "X-Webauth-User";

/// Authentication options for the Moira API.
///
/// Headers are layered lowest to highest: `login`, then `custom`, so a custom
/// header can override the login header.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Extra headers sent with every request.
    pub custom: BTreeMap<String, String>,
    /// Basic auth user. Only used together with `password`.
    pub user: Option<String>,
    pub password: Option<String>,
    /// Login forwarded as `X-Webauth-User`.
    pub login: Option<String>,
}

impl AuthConfig {
    /// Basic auth credentials, if both halves are configured.
    pub fn basic(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Default headers for the HTTP client.
    pub fn headers(&self) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(login) = &self.login {
            insert_header(&mut headers, LOGIN_HEADER, login)?;
        }
        for (name, value) in &self.custom {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> ApiResult<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    headers.insert(header_name, header_value);
    Ok(())
}
