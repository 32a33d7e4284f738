use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const BASIC_PREFIX: &str = "basic:";
const API_KEY_PREFIX: &str = "apiKey:";

/// Where an API key travels on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

impl ApiKeyLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Query => "query",
        }
    }
}

impl FromStr for ApiKeyLocation {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "header" => Ok(ApiKeyLocation::Header),
            "query" => Ok(ApiKeyLocation::Query),
            other => Err(ConfigError::InvalidApiKeyLocation {
                value: other.to_owned(),
            }),
        }
    }
}

/// A credential as handed from the authentication phase to every virtual
/// user.
///
/// The string form is tagged: `basic:<b64>`, `apiKey:<location>:<key>:<value>`
/// or a bare bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthToken {
    Basic(String),
    ApiKey {
        location: ApiKeyLocation,
        key: String,
        value: String,
    },
    Bearer(String),
}

impl AuthToken {
    /// Encodes `username:password` with the padded standard base64 alphabet.
    #[must_use]
    pub fn basic(username: &str, password: &str) -> Self {
        AuthToken::Basic(STANDARD.encode(format!("{}:{}", username, password)))
    }

    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// The header this credential adds, if any.
    #[must_use]
    pub fn header(&self) -> Option<(String, String)> {
        match self {
            AuthToken::Basic(encoded) => {
                Some(("Authorization".to_owned(), format!("Basic {}", encoded)))
            }
            AuthToken::ApiKey {
                location: ApiKeyLocation::Header,
                key,
                value,
            } => Some((key.clone(), value.clone())),
            AuthToken::ApiKey {
                location: ApiKeyLocation::Query,
                ..
            } => None,
            AuthToken::Bearer(token) => {
                Some(("Authorization".to_owned(), format!("Bearer {}", token)))
            }
        }
    }

    /// The query pair this credential adds, if any.
    #[must_use]
    pub fn query_pair(&self) -> Option<(&str, &str)> {
        match self {
            AuthToken::ApiKey {
                location: ApiKeyLocation::Query,
                key,
                value,
            } => Some((key.as_str(), value.as_str())),
            AuthToken::ApiKey {
                location: ApiKeyLocation::Header,
                ..
            }
            | AuthToken::Basic(_)
            | AuthToken::Bearer(_) => None,
        }
    }
}

impl FromStr for AuthToken {
    type Err = ConfigError;

    /// Parses the tagged form. Only the first three colons of an API key
    /// token separate fields, so values may contain colons.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MalformedToken` for an `apiKey:` token with
    /// fewer than four fields and `ConfigError::InvalidApiKeyLocation` for an
    /// unknown location.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if let Some(encoded) = raw.strip_prefix(BASIC_PREFIX) {
            return Ok(AuthToken::Basic(encoded.to_owned()));
        }
        if !raw.starts_with(API_KEY_PREFIX) {
            return Ok(AuthToken::Bearer(raw.to_owned()));
        }

        let mut parts = raw.splitn(4, ':').skip(1);
        let (Some(location), Some(key), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ConfigError::MalformedToken {
                reason: "apiKey token needs location, key and value",
            });
        };
        let location = location.parse::<ApiKeyLocation>()?;
        Ok(AuthToken::ApiKey {
            location,
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthToken::Basic(encoded) => write!(f, "{}{}", BASIC_PREFIX, encoded),
            AuthToken::ApiKey {
                location,
                key,
                value,
            } => write!(
                f,
                "{}{}:{}:{}",
                API_KEY_PREFIX,
                location.as_str(),
                key,
                value
            ),
            AuthToken::Bearer(token) => f.write_str(token),
        }
    }
}
