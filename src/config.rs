use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::http::Timeouts;

pub const DEFAULT_API_BASE: &str = "https://dramabox.sansekai.my.id/api";
pub const DEFAULT_PLAYER: &str = "mpv";
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const API_BASE_ENV: &str = "DRAMABOX_API_BASE";
pub const PLAYER_ENV: &str = "DRAMABOX_PLAYER";
pub const LOG_FILTER_ENV: &str = "DRAMABOX_LOG";

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) api_base: String,
    pub(crate) player: PathBuf,
    pub(crate) timeouts: Timeouts,
}

impl Config {
    /// Command-line flag first, then environment, then built-in default.
    pub(crate) fn resolve(api_base_flag: Option<&str>) -> Self {
        Self {
            api_base: resolve_api_base(api_base_flag, env::var(API_BASE_ENV).ok().as_deref()),
            player: resolve_player_from_env(env::var_os(PLAYER_ENV)),
            timeouts: Timeouts::default(),
        }
    }
}

pub fn resolve_api_base(flag: Option<&str>, env_value: Option<&str>) -> String {
    [flag, env_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_API_BASE)
        .trim_end_matches('/')
        .to_string()
}

pub fn resolve_player_from_env(env_value: Option<OsString>) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_PLAYER),
    }
}

pub fn log_filter_from_env() -> String {
    resolve_log_filter(env::var(LOG_FILTER_ENV).ok().as_deref())
}

pub fn resolve_log_filter(env_value: Option<&str>) -> String {
    env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_prefers_flag_then_env_then_default() {
        assert_eq!(
            resolve_api_base(Some("http://flag.test"), Some("http://env.test")),
            "http://flag.test"
        );
        assert_eq!(resolve_api_base(None, Some("http://env.test")), "http://env.test");
        assert_eq!(resolve_api_base(None, None), DEFAULT_API_BASE);
    }

    #[test]
    fn api_base_ignores_blank_values_and_trims_slashes() {
        assert_eq!(
            resolve_api_base(Some("  "), Some("http://env.test/api/")),
            "http://env.test/api"
        );
        assert_eq!(resolve_api_base(Some(""), Some("")), DEFAULT_API_BASE);
    }

    #[test]
    fn player_uses_env_override_when_present() {
        assert_eq!(
            resolve_player_from_env(Some(OsString::from("/usr/bin/vlc"))),
            PathBuf::from("/usr/bin/vlc")
        );
        assert_eq!(
            resolve_player_from_env(Some(OsString::new())),
            PathBuf::from(DEFAULT_PLAYER)
        );
        assert_eq!(resolve_player_from_env(None), PathBuf::from(DEFAULT_PLAYER));
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(resolve_log_filter(None), "info");
        assert_eq!(resolve_log_filter(Some(" ")), "info");
        assert_eq!(resolve_log_filter(Some("dramabox_tui=debug")), "dramabox_tui=debug");
    }
}
