//! Media store credentials.
//!
//! Credentials are resolved on every request. A missing environment is a
//! structured 400 from the gateway, not a startup failure.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::error::GatewayError;

pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
pub const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
pub const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";
/// Combined form: `cloudinary://<key>:<secret>@<cloud>`.
pub const ENV_URL: &str = "CLOUDINARY_URL";

const URL_SCHEME: &str = "cloudinary";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolves credentials through `lookup`, preferring the combined URL.
    ///
    /// Empty values count as missing. Error messages only ever name the
    /// variables involved.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get(ENV_URL) {
            return Self::parse_url(&url);
        }

        let cloud_name = get(ENV_CLOUD_NAME)
            .ok_or_else(|| GatewayError::Configuration(format!("Missing env: {ENV_CLOUD_NAME}")))?;
        match (get(ENV_API_KEY), get(ENV_API_SECRET)) {
            (Some(api_key), Some(api_secret)) => Ok(Self {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => Err(GatewayError::Configuration(format!(
                "Missing env: {ENV_API_KEY} and/or {ENV_API_SECRET}"
            ))),
        }
    }

    fn parse_url(raw: &str) -> Result<Self, GatewayError> {
        let malformed = || {
            GatewayError::Configuration(format!(
                "Malformed env: {ENV_URL} (expected {URL_SCHEME}://<key>:<secret>@<cloud>)"
            ))
        };
        let url = Url::parse(raw).map_err(|_| malformed())?;
        if url.scheme() != URL_SCHEME {
            return Err(malformed());
        }
        let decode = |part: &str| {
            percent_decode_str(part)
                .decode_utf8()
                .map(|v| v.into_owned())
                .map_err(|_| malformed())
        };

        let cloud_name = decode(url.host_str().unwrap_or_default())?;
        let api_key = decode(url.username())?;
        let api_secret = decode(url.password().unwrap_or_default())?;
        if cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            cloud_name,
            api_key,
            api_secret,
        })
    }
}

/// Source of credentials consulted on each gateway request.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials, GatewayError>;
}

/// Reads credentials from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials, GatewayError> {
        Credentials::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Fixed credentials supplied by the embedding program.
impl CredentialProvider for Credentials {
    fn credentials(&self) -> Result<Credentials, GatewayError> {
        Ok(self.clone())
    }
}

impl CredentialProvider for HashMap<String, String> {
    fn credentials(&self) -> Result<Credentials, GatewayError> {
        Credentials::from_lookup(|key| self.get(key).cloned())
    }
}
