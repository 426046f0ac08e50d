use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::Span;

use super::defaults::Colors;

/// Top-level config file. Stored as config.toml, one table per profile.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, Configuration>,
}

/// Connection settings for a single profile.
///
/// Keys in the file use the kebab-case aliases (`okta-org`, `odbc-path`, ...),
/// and the same aliases name the fields in validation diagnostics. Missing
/// keys come back empty so the validator reports them, not the parser.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Configuration {
    #[serde(skip)]
    pub profile: String,
    #[serde(deserialize_with = "bool_like")]
    pub default: String,
    pub account: String,
    pub database: String,
    pub warehouse: String,
    pub schema: String,
    pub oauth: bool,
    pub generic: bool,
    pub okta_org: String,
    pub odbc_path: String,
    pub odbc_driver: String,
    pub client_id: String,
    pub role: String,
    pub issuer_url: String,
    pub redirect_uri: String,
    pub username: String,

    // -- Runtime fields, never read from or written to the file ---------------
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub home_dir: Option<PathBuf>,
    /// Span every log event about this profile is recorded under.
    #[serde(skip, default = "Span::none")]
    pub span: Span,
    #[serde(skip)]
    pub colors: Colors,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            profile: String::new(),
            default: String::new(),
            account: String::new(),
            database: String::new(),
            warehouse: String::new(),
            schema: String::new(),
            oauth: false,
            generic: false,
            okta_org: String::new(),
            odbc_path: String::new(),
            odbc_driver: String::new(),
            client_id: String::new(),
            role: String::new(),
            issuer_url: String::new(),
            redirect_uri: String::new(),
            username: String::new(),
            password: String::new(),
            home_dir: None,
            span: Span::none(),
            colors: Colors::default(),
        }
    }
}

impl Configuration {
    /// Whether the `default` flag holds a truthy value.
    pub fn is_default(&self) -> bool {
        matches!(
            self.default.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        )
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("profile", &self.profile)
            .field("default", &self.default)
            .field("account", &self.account)
            .field("database", &self.database)
            .field("warehouse", &self.warehouse)
            .field("schema", &self.schema)
            .field("oauth", &self.oauth)
            .field("generic", &self.generic)
            .field("okta_org", &self.okta_org)
            .field("odbc_path", &self.odbc_path)
            .field("odbc_driver", &self.odbc_driver)
            .field("client_id", &self.client_id)
            .field("role", &self.role)
            .field("issuer_url", &self.issuer_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("home_dir", &self.home_dir)
            .field("colors", &self.colors)
            .finish()
    }
}

/// The `default` flag is written both as `default = true` and `default = "true"`.
fn bool_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Text(String),
    }

    Ok(match BoolLike::deserialize(deserializer)? {
        BoolLike::Bool(b) => b.to_string(),
        BoolLike::Text(s) => s,
    })
}

/// Access token handed back by the identity provider's token endpoint.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Lifetime in seconds, counted from when the token was issued.
    pub expires_in: u64,
    pub access_token: String,
}

impl Credentials {
    /// Unix time (seconds) at which a token issued at `issued_at` stops working.
    pub fn expires_at(&self, issued_at: u64) -> u64 {
        issued_at.saturating_add(self.expires_in)
    }

    pub fn is_expired(&self, issued_at: u64, now: u64) -> bool {
        now >= self.expires_at(issued_at)
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("expires_in", &self.expires_in)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
