use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use validator::ValidateEmail;

use super::defaults::Tone;
use super::types::Configuration;

/// Parameters that only matter when signing in through the identity provider.
pub const OAUTH_PARAMS: &[&str] = &["okta-org", "client-id", "issuer-url", "redirect-uri"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Url,
    Uri,
    Email,
}

/// One row of the rule table: the field's config key, how to read it, and
/// the format it must have once present.
struct Rule {
    field: &'static str,
    value: fn(&Configuration) -> &str,
    format: Option<Format>,
}

// Every field listed here is required. Order is the order violations are reported in.
const RULES: &[Rule] = &[
    Rule {
        field: "account",
        value: |c| c.account.as_str(),
        format: None,
    },
    Rule {
        field: "database",
        value: |c| c.database.as_str(),
        format: None,
    },
    Rule {
        field: "warehouse",
        value: |c| c.warehouse.as_str(),
        format: None,
    },
    Rule {
        field: "okta-org",
        value: |c| c.okta_org.as_str(),
        format: Some(Format::Url),
    },
    Rule {
        field: "odbc-path",
        value: |c| c.odbc_path.as_str(),
        format: None,
    },
    Rule {
        field: "odbc-driver",
        value: |c| c.odbc_driver.as_str(),
        format: None,
    },
    Rule {
        field: "client-id",
        value: |c| c.client_id.as_str(),
        format: None,
    },
    Rule {
        field: "role",
        value: |c| c.role.as_str(),
        format: None,
    },
    Rule {
        field: "issuer-url",
        value: |c| c.issuer_url.as_str(),
        format: Some(Format::Url),
    },
    Rule {
        field: "redirect-uri",
        value: |c| c.redirect_uri.as_str(),
        format: Some(Format::Uri),
    },
    Rule {
        field: "username",
        value: |c| c.username.as_str(),
        format: Some(Format::Email),
    },
];

impl Rule {
    fn check(&self, config: &Configuration) -> Option<ViolationKind> {
        let value = (self.value)(config);
        if value.is_empty() {
            return Some(ViolationKind::Missing);
        }

        match self.format? {
            Format::Url if !is_url(value) => Some(ViolationKind::InvalidUrl),
            Format::Uri if !is_uri(value) => Some(ViolationKind::InvalidUri),
            Format::Email if !String::from(value).validate_email() => {
                Some(ViolationKind::InvalidEmail)
            }
            _ => None,
        }
    }
}

/// Any absolute URL, whatever the scheme. The fragment plays no part.
fn is_url(value: &str) -> bool {
    let without_fragment = value.split('#').next().unwrap_or_default();
    !without_fragment.is_empty() && Url::parse(without_fragment).is_ok()
}

/// An absolute URI of any scheme, or an absolute path.
fn is_uri(value: &str) -> bool {
    value.starts_with('/') || Url::parse(value).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    InvalidUrl,
    InvalidUri,
    InvalidEmail,
}

/// A single field that failed its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    /// Config key of the offending field.
    pub field: &'static str,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn is_oauth(&self) -> bool {
        OAUTH_PARAMS.contains(&self.field)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Missing => write!(f, "{} is required", self.field),
            ViolationKind::InvalidUrl => write!(f, "{} must be a valid URL", self.field),
            ViolationKind::InvalidUri => write!(f, "{} must be a valid URI", self.field),
            ViolationKind::InvalidEmail => {
                write!(f, "{} must be a valid email address", self.field)
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("validation failed: {}", join_fields(.violations))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

fn join_fields(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.field)
        .collect::<Vec<_>>()
        .join(", ")
}

/// How OAuth parameter violations are treated when OAuth mode is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OAuthExemption {
    /// Drop each OAuth violation and keep reporting the rest.
    #[default]
    PerField,
    /// The first OAuth violation passes the whole configuration, discarding
    /// every other violation. Kept for configurations that relied on it.
    SuppressAll,
}

/// Stateless; build one wherever it is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    exemption: OAuthExemption,
}

impl Validator {
    pub fn new(exemption: OAuthExemption) -> Self {
        Self { exemption }
    }

    /// Violations that would fail `config`, without printing anything.
    pub fn check(&self, config: &Configuration) -> Vec<Violation> {
        self.run(config, |_| {})
    }

    /// Check `config`, printing one line per violation to stdout in the
    /// failure color.
    pub fn validate(&self, config: &Configuration) -> Result<(), ValidationError> {
        let violations = self.run(config, |violation| {
            println!(
                "{}",
                config
                    .colors
                    .paint(Tone::Failure, &format!("Parameter {}", violation))
            );
        });

        if violations.is_empty() {
            debug!(parent: &config.span, "configuration is valid");
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    fn run(&self, config: &Configuration, mut report: impl FnMut(&Violation)) -> Vec<Violation> {
        let mut reported = Vec::new();

        for rule in RULES {
            let Some(kind) = rule.check(config) else {
                continue;
            };
            let violation = Violation {
                field: rule.field,
                kind,
            };

            if !config.oauth && violation.is_oauth() {
                match self.exemption {
                    OAuthExemption::PerField => {
                        debug!(parent: &config.span, field = violation.field, "oauth disabled, skipping");
                        continue;
                    }
                    OAuthExemption::SuppressAll => {
                        warn!(
                            parent: &config.span,
                            field = violation.field,
                            discarded = reported.len(),
                            "oauth disabled, accepting configuration"
                        );
                        return Vec::new();
                    }
                }
            }

            report(&violation);
            reported.push(violation);
        }

        reported
    }
}

/// Validate `config` with the default exemption policy.
pub fn validate(config: &Configuration) -> Result<(), ValidationError> {
    Validator::default().validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::apply_defaults;

    fn valid_config() -> Configuration {
        let mut config = Configuration {
            account: "a".to_string(),
            database: "d".to_string(),
            warehouse: "w".to_string(),
            odbc_path: "/p".to_string(),
            odbc_driver: "drv".to_string(),
            role: "r".to_string(),
            username: "u@x.com".to_string(),
            oauth: false,
            ..Default::default()
        };
        apply_defaults(&mut config);
        config
    }

    fn with_oauth(mut config: Configuration) -> Configuration {
        config.oauth = true;
        config.okta_org = "https://acme.okta.com".to_string();
        config.client_id = "0oa1b2c3".to_string();
        config.issuer_url = "https://acme.okta.com/oauth2/default".to_string();
        config.redirect_uri = "http://localhost:8080/callback".to_string();
        config
    }

    #[test]
    fn minimal_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn malformed_username_fails() {
        let config = Configuration {
            username: "not-an-email".to_string(),
            ..valid_config()
        };

        let err = validate(&config).unwrap_err();
        assert_eq!(err.fields(), vec!["username"]);
        assert_eq!(err.violations()[0].kind, ViolationKind::InvalidEmail);
        assert_eq!(err.to_string(), "validation failed: username");
    }

    #[test]
    fn each_required_field_is_enforced() {
        let clears: &[(&str, fn(&mut Configuration))] = &[
            ("account", |c| c.account.clear()),
            ("database", |c| c.database.clear()),
            ("warehouse", |c| c.warehouse.clear()),
            ("odbc-path", |c| c.odbc_path.clear()),
            ("odbc-driver", |c| c.odbc_driver.clear()),
            ("role", |c| c.role.clear()),
            ("username", |c| c.username.clear()),
        ];

        for (field, clear) in clears {
            for oauth in [false, true] {
                let mut config = if oauth {
                    with_oauth(valid_config())
                } else {
                    valid_config()
                };
                clear(&mut config);

                let violations = Validator::default().check(&config);
                assert_eq!(
                    violations,
                    vec![Violation {
                        field: *field,
                        kind: ViolationKind::Missing
                    }],
                    "clearing {} with oauth={}",
                    field,
                    oauth
                );
            }
        }
    }

    #[test]
    fn whitespace_counts_as_present() {
        let config = Configuration {
            role: "   ".to_string(),
            ..valid_config()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn schema_is_optional() {
        let config = Configuration {
            schema: String::new(),
            ..valid_config()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn oauth_fields_ignored_when_oauth_disabled() {
        let config = Configuration {
            okta_org: "not a url".to_string(),
            issuer_url: "acme".to_string(),
            redirect_uri: "::".to_string(),
            client_id: String::new(),
            ..valid_config()
        };

        assert!(Validator::new(OAuthExemption::PerField).validate(&config).is_ok());
        assert!(Validator::new(OAuthExemption::SuppressAll).validate(&config).is_ok());
    }

    #[test]
    fn complete_oauth_config_passes() {
        assert!(validate(&with_oauth(valid_config())).is_ok());
    }

    #[test]
    fn oauth_enabled_requires_oauth_fields() {
        let config = Configuration {
            oauth: true,
            ..valid_config()
        };

        for exemption in [OAuthExemption::PerField, OAuthExemption::SuppressAll] {
            let err = Validator::new(exemption).validate(&config).unwrap_err();
            assert_eq!(
                err.fields(),
                vec!["okta-org", "client-id", "issuer-url", "redirect-uri"]
            );
            assert!(err
                .violations()
                .iter()
                .all(|v| v.kind == ViolationKind::Missing));
        }
    }

    #[test]
    fn oauth_enabled_rejects_malformed_oauth_fields() {
        let mut config = with_oauth(valid_config());
        config.okta_org = "acme.okta.com".to_string();
        config.issuer_url = "#default".to_string();
        config.redirect_uri = "callback".to_string();

        let violations = Validator::default().check(&config);
        assert_eq!(
            violations,
            vec![
                Violation {
                    field: "okta-org",
                    kind: ViolationKind::InvalidUrl
                },
                Violation {
                    field: "issuer-url",
                    kind: ViolationKind::InvalidUrl
                },
                Violation {
                    field: "redirect-uri",
                    kind: ViolationKind::InvalidUri
                },
            ]
        );
    }

    #[test]
    fn url_fields_accept_any_scheme() {
        let mut config = with_oauth(valid_config());
        for url in [
            "mailto:admin@acme.com",
            "file:///etc/x",
            "urn:okta:org",
            "https://acme.okta.com/oauth2/default#section",
        ] {
            config.okta_org = url.to_string();
            config.issuer_url = url.to_string();
            assert!(validate(&config).is_ok(), "{} should be a URL", url);
        }
    }

    #[test]
    fn each_oauth_field_is_enforced_when_oauth_enabled() {
        let clears: &[(&str, fn(&mut Configuration))] = &[
            ("okta-org", |c| c.okta_org.clear()),
            ("client-id", |c| c.client_id.clear()),
            ("issuer-url", |c| c.issuer_url.clear()),
            ("redirect-uri", |c| c.redirect_uri.clear()),
        ];

        for (field, clear) in clears {
            let mut config = with_oauth(valid_config());
            clear(&mut config);

            let err = validate(&config).unwrap_err();
            assert_eq!(
                err.violations(),
                &[Violation {
                    field: *field,
                    kind: ViolationKind::Missing
                }],
                "clearing {}",
                field
            );
        }
    }

    #[test]
    fn redirect_uri_accepts_custom_scheme_and_path() {
        let mut config = with_oauth(valid_config());
        config.redirect_uri = "com.acme.app:/callback".to_string();
        assert!(validate(&config).is_ok());

        config.redirect_uri = "/callback".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn per_field_exemption_still_reports_other_fields() {
        let config = Configuration {
            account: String::new(),
            okta_org: "not a url".to_string(),
            ..valid_config()
        };

        let err = Validator::new(OAuthExemption::PerField)
            .validate(&config)
            .unwrap_err();
        assert_eq!(err.fields(), vec!["account"]);
    }

    #[test]
    fn suppress_all_exemption_discards_every_violation() {
        let config = Configuration {
            account: String::new(),
            username: "nope".to_string(),
            okta_org: "not a url".to_string(),
            ..valid_config()
        };

        let validator = Validator::new(OAuthExemption::SuppressAll);
        assert!(validator.check(&config).is_empty());
        assert!(validator.validate(&config).is_ok());
    }

    #[test]
    fn suppress_all_needs_an_oauth_violation_to_fire() {
        let config = with_oauth(Configuration {
            account: String::new(),
            ..valid_config()
        });
        let config = Configuration {
            oauth: false,
            ..config
        };

        let err = Validator::new(OAuthExemption::SuppressAll)
            .validate(&config)
            .unwrap_err();
        assert_eq!(err.fields(), vec!["account"]);
    }

    #[test]
    fn violations_follow_table_order() {
        let config = Configuration {
            oauth: true,
            ..Configuration::default()
        };

        let fields: Vec<_> = Validator::default()
            .check(&config)
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "account",
                "database",
                "warehouse",
                "okta-org",
                "odbc-path",
                "odbc-driver",
                "client-id",
                "role",
                "issuer-url",
                "redirect-uri",
                "username",
            ]
        );
    }

    #[test]
    fn violation_messages() {
        let missing = Violation {
            field: "role",
            kind: ViolationKind::Missing,
        };
        let bad_uri = Violation {
            field: "redirect-uri",
            kind: ViolationKind::InvalidUri,
        };
        assert_eq!(missing.to_string(), "role is required");
        assert_eq!(bad_uri.to_string(), "redirect-uri must be a valid URI");
    }
}
