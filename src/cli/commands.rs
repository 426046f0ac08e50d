use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use whconnect::config::{
    apply_defaults, ConfigStore, Configuration, OAuthExemption, ProfilesFile, Tone, Validator,
};

fn open_store(config_path: Option<&Path>) -> Result<ConfigStore> {
    match config_path {
        Some(path) => Ok(ConfigStore::with_path(path)),
        None => Ok(ConfigStore::new()?),
    }
}

pub fn cmd_check(
    config_path: Option<&Path>,
    profile: Option<&str>,
    legacy_exemption: bool,
) -> Result<()> {
    let store = open_store(config_path)?;
    let mut config = store.load_profile(profile)?;
    apply_defaults(&mut config);

    let exemption = if legacy_exemption {
        OAuthExemption::SuppressAll
    } else {
        OAuthExemption::PerField
    };

    Validator::new(exemption)
        .validate(&config)
        .with_context(|| format!("profile '{}' is not usable", config.profile))?;

    info!(parent: &config.span, oauth = config.oauth, generic = config.generic, "profile validated");
    println!(
        "{}",
        config
            .colors
            .paint(Tone::Success, &format!("Profile {} is valid", config.profile))
    );
    Ok(())
}

pub fn cmd_show(config_path: Option<&Path>, profile: Option<&str>) -> Result<()> {
    let store = open_store(config_path)?;
    let config = store.load_profile(profile)?;
    print!("{}", render_profile(config)?);
    Ok(())
}

/// The profile as it would appear in the config file. The password is never included.
fn render_profile(config: Configuration) -> Result<String> {
    let mut file = ProfilesFile::default();
    file.profiles.insert(config.profile.clone(), config);
    toml::to_string_pretty(&file).context("Failed to render profile")
}

pub fn cmd_profiles(config_path: Option<&Path>) -> Result<()> {
    let store = open_store(config_path)?;
    let file = store.load_file()?;

    if file.profiles.is_empty() {
        eprintln!(
            "No profiles configured. Add one to {} to get started.",
            store.path().display()
        );
        return Ok(());
    }

    // BTreeMap keeps the names sorted.
    for (name, config) in &file.profiles {
        let marker = if config.is_default() { " *" } else { "" };
        println!("{}{} ({}, {})", name, marker, config.account, auth_mode(config));
    }

    Ok(())
}

fn auth_mode(config: &Configuration) -> &'static str {
    if config.oauth {
        "oauth"
    } else if config.generic {
        "generic"
    } else {
        "password"
    }
}
