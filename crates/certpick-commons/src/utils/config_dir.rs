use std::{
    env,
    path::PathBuf,
};

pub const CONFIG_DIR_ENV: &str = "CERTPICK_CONFIG";
pub const USER_STORES_ENV: &str = "CERTPICK_USER_STORES";
pub const MACHINE_STORES_ENV: &str = "CERTPICK_MACHINE_STORES";

pub fn get_config_dir() -> Result<PathBuf, String> {
    if let Ok(config_dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(config_dir));
    }

    if let Some(xdg_config_home) = env::var_os("XDG_CONFIG_HOME") {
        let mut path = PathBuf::from(xdg_config_home);
        path.push("certpick");
        return Ok(path);
    }

    if let Some(home_dir) = dirs::home_dir() {
        let mut path = home_dir;
        path.push(".certpick");
        return Ok(path);
    }

    Err("Unable to determine the configuration directory".to_string())
}

pub fn get_settings_path() -> Result<PathBuf, String> {
    let mut config_path = get_config_dir()?;
    config_path.push("settings.json");
    Ok(config_path)
}

/// Root directory holding the current user's file-backed stores, one
/// sub-directory per store name.
pub fn get_user_store_root() -> Result<PathBuf, String> {
    if let Ok(root) = env::var(USER_STORES_ENV) {
        return Ok(PathBuf::from(root));
    }

    let mut path = get_config_dir()?;
    path.push("stores");
    Ok(path)
}

pub fn get_machine_store_root() -> PathBuf {
    if let Ok(root) = env::var(MACHINE_STORES_ENV) {
        return PathBuf::from(root);
    }

    default_machine_store_root()
}

#[cfg(windows)]
fn default_machine_store_root() -> PathBuf {
    let program_data =
        env::var_os("ProgramData").unwrap_or_else(|| "C:\\ProgramData".into());
    PathBuf::from(program_data).join("certpick").join("stores")
}

#[cfg(not(windows))]
fn default_machine_store_root() -> PathBuf {
    PathBuf::from("/etc/certpick/stores")
}
