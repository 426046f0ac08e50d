use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info_span};

use super::types::{Configuration, ProfilesFile};

const CONFIG_FILE: &str = "config.toml";

/// Environment variable the password is read from. It is never stored in the file.
pub const PASSWORD_ENV: &str = "WHCONNECT_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no profiles configured in {}", .path.display())]
    NoProfiles { path: PathBuf },
    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile { name: String, available: String },
    #[error("no default profile set (available: {available})")]
    NoDefaultProfile { available: String },
    #[error("more than one profile is marked default: {names}")]
    AmbiguousDefault { names: String },
}

pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store backed by `<config dir>/whconnect/config.toml`.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("whconnect");

        Ok(Self::with_path(config_dir.join(CONFIG_FILE)))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// A missing file reads as an empty set of profiles.
    pub fn load_file(&self) -> Result<ProfilesFile, ConfigError> {
        if !self.config_path.exists() {
            return Ok(ProfilesFile::default());
        }
        let contents = fs::read_to_string(&self.config_path).map_err(|source| {
            ConfigError::Read {
                path: self.config_path.clone(),
                source,
            }
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Load a profile and fill in its runtime fields. Defaults are not applied
    /// and nothing is validated.
    pub fn load_profile(&self, name: Option<&str>) -> Result<Configuration, ConfigError> {
        let file = self.load_file()?;
        if file.profiles.is_empty() {
            return Err(ConfigError::NoProfiles {
                path: self.config_path.clone(),
            });
        }

        let (name, mut config) = resolve_profile(file, name)?;
        debug!(profile = %name, path = %self.config_path.display(), "loaded profile");

        config.span = info_span!("profile", name = %name);
        config.profile = name;
        config.home_dir = dirs::home_dir();
        config.password = std::env::var(PASSWORD_ENV).unwrap_or_default();
        Ok(config)
    }
}

/// Pick a profile: the named one, else the one marked default, else the only one.
pub fn resolve_profile(
    file: ProfilesFile,
    name: Option<&str>,
) -> Result<(String, Configuration), ConfigError> {
    let mut profiles = file.profiles;

    let chosen = match name {
        Some(name) => name.to_string(),
        None => {
            let defaults: Vec<&String> = profiles
                .iter()
                .filter(|(_, config)| config.is_default())
                .map(|(name, _)| name)
                .collect();

            match defaults.as_slice() {
                [only] => (*only).clone(),
                [] if profiles.len() == 1 => profiles.keys().next().cloned().unwrap_or_default(),
                [] => {
                    return Err(ConfigError::NoDefaultProfile {
                        available: profile_names(&profiles),
                    })
                }
                many => {
                    return Err(ConfigError::AmbiguousDefault {
                        names: many
                            .iter()
                            .map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
                }
            }
        }
    };

    if !profiles.contains_key(&chosen) {
        return Err(ConfigError::UnknownProfile {
            available: profile_names(&profiles),
            name: chosen,
        });
    }
    let config = profiles.remove(&chosen).unwrap_or_default();
    Ok((chosen, config))
}

fn profile_names(profiles: &BTreeMap<String, Configuration>) -> String {
    profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
