use timecore_core::util::normalize_text_option;
use timecore_core::ReportScope;

use crate::cli::ConfigCommands;
use crate::config_profiles::{default_config_path, CliProfilesConfig};
use crate::error::CliError;

/// Values given to `config init`; unset fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub api_base_url: Option<String>,
    pub scope: Option<ReportScope>,
    pub page_size: Option<u32>,
    pub poll_interval_secs: Option<u64>,
    pub session_cookie: Option<String>,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            default_scope,
            page_size,
            poll_interval,
            session,
            no_activate,
        } => run_config_init(
            global_profile,
            ProfileUpdate {
                api_base_url,
                scope: default_scope,
                page_size,
                poll_interval_secs: poll_interval,
                session_cookie: session,
            },
            !no_activate,
        ),
        ConfigCommands::Show { json } => run_config_show(global_profile, json),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    update: ProfileUpdate,
    activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    apply_profile_update(&mut config, &profile_name, update, activate)?;

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    Ok(())
}

/// Merge `update` into the named profile and check that it yields a usable
/// client config.
pub fn apply_profile_update(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    update: ProfileUpdate,
    activate: bool,
) -> Result<(), CliError> {
    let profile = config.profile_mut_or_default(profile_name);
    if let Some(url) = normalize_text_option(update.api_base_url) {
        profile.api_base_url = Some(url);
    }
    if let Some(scope) = update.scope {
        profile.scope = Some(scope);
    }
    if let Some(page_size) = update.page_size {
        profile.page_size = Some(page_size);
    }
    if let Some(interval) = update.poll_interval_secs {
        profile.poll_interval_secs = Some(interval);
    }
    if let Some(session) = normalize_text_option(update.session_cookie) {
        profile.session_cookie = Some(session);
    }

    profile.client_config(|_| None)?;

    if activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

pub fn run_config_show(global_profile: Option<&str>, as_json: bool) -> Result<(), CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    let name = profiles.resolve_profile_name(global_profile);
    let path = default_config_path().map_err(CliError::Config)?;
    let config = profiles
        .profile(&name)
        .cloned()
        .unwrap_or_default()
        .client_config(|key| std::env::var(key).ok())?;

    if as_json {
        let output = serde_json::json!({
            "profile": name,
            "configPath": path.display().to_string(),
            "apiBaseUrl": config.api_base_url,
            "scope": config.scope,
            "pageSize": config.page_size,
            "pollIntervalSecs": config.poll_interval_secs,
            "requestTimeoutSecs": config.request_timeout_secs,
            "session": config.session_cookie.is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Profile:        {name}");
        println!("Config file:    {}", path.display());
        println!("API base URL:   {}", config.api_base_url);
        println!("Scope:          {}", config.scope);
        println!("Page size:      {}", config.page_size);
        println!("Poll interval:  {}s", config.poll_interval_secs);
        println!(
            "Session:        {}",
            if config.session_cookie.is_some() { "set" } else { "not set" }
        );
    }
    Ok(())
}
