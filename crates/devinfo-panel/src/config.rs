use std::{io, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use devinfo_connector::{parse_base_url, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::state::View;

const URL_ENV: &str = "PIECES_OS_URL";
const TIMEOUT_ENV: &str = "DEVINFO_TIMEOUT_MS";
const VIEW_ENV: &str = "DEVINFO_VIEW";
const LOG_STDERR_ENV: &str = "DEVINFO_LOG_STDERR";

#[derive(Parser, Debug, Default)]
#[command(name = "devinfo", about = "Pieces OS connection status panel")]
pub struct Args {
    /// Pieces OS base URL (default http://localhost:1000)
    #[arg(long, default_value = "")]
    pub url: String,
    /// Request timeout for the HTTP client, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Initial view: connection or developer
    #[arg(long, default_value = "")]
    pub view: String,
    /// Print the settled view once and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub timeout: Duration,
    pub view: View,
    pub once: bool,
    pub log_stderr: bool,
}

pub fn load_config() -> Result<Config> {
    resolve_config(Args::parse(), |key| std::env::var(key).ok())
}

/// Flags win over environment, environment over defaults.
pub fn resolve_config<F>(args: Args, env: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let raw_url = non_empty(Some(args.url))
        .or_else(|| non_empty(env(URL_ENV)))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url =
        parse_base_url(&raw_url).with_context(|| format!("invalid Pieces OS url {raw_url:?}"))?;

    let timeout_ms = match args.timeout_ms {
        Some(ms) => Some(ms),
        None => match non_empty(env(TIMEOUT_ENV)) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid {TIMEOUT_ENV}={raw:?}"))?,
            ),
            None => None,
        },
    };
    let timeout = match timeout_ms {
        Some(0) => return Err(anyhow!("request timeout must be greater than 0 ms")),
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_TIMEOUT,
    };

    let view = match non_empty(Some(args.view)).or_else(|| non_empty(env(VIEW_ENV))) {
        Some(raw) => View::parse(&raw)
            .ok_or_else(|| anyhow!("unknown view {raw:?} (expected connection or developer)"))?,
        None => View::Connection,
    };

    let log_stderr = env(LOG_STDERR_ENV)
        .as_deref()
        .and_then(parse_bool_flag)
        .unwrap_or(false);

    Ok(Config {
        base_url,
        timeout,
        view,
        once: args.once,
        log_stderr,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// The panel owns the terminal, so logs are discarded unless printing once
/// or explicitly routed to stderr.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.once || config.log_stderr {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_local_service() {
        let config = resolve_config(Args::default(), env_of(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:1000/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.view, View::Connection);
        assert!(!config.once);
        assert!(!config.log_stderr);
    }

    #[test]
    fn environment_fills_unset_flags() {
        let env = env_of(&[
            ("PIECES_OS_URL", "http://127.0.0.1:39300"),
            ("DEVINFO_TIMEOUT_MS", "2500"),
            ("DEVINFO_VIEW", "developer"),
            ("DEVINFO_LOG_STDERR", "yes"),
        ]);
        let config = resolve_config(Args::default(), env).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:39300/");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.view, View::Developer);
        assert!(config.log_stderr);
    }

    #[test]
    fn flags_override_environment() {
        let args = Args {
            url: "http://localhost:5323".to_string(),
            timeout_ms: Some(100),
            view: "connection".to_string(),
            once: true,
        };
        let env = env_of(&[
            ("PIECES_OS_URL", "http://127.0.0.1:39300"),
            ("DEVINFO_TIMEOUT_MS", "2500"),
            ("DEVINFO_VIEW", "developer"),
        ]);
        let config = resolve_config(args, env).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5323/");
        assert_eq!(config.timeout, Duration::from_millis(100));
        assert_eq!(config.view, View::Connection);
        assert!(config.once);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for pair in [
            ("DEVINFO_TIMEOUT_MS", "soon"),
            ("DEVINFO_VIEW", "assets"),
            ("PIECES_OS_URL", "localhost"),
            ("DEVINFO_TIMEOUT_MS", "0"),
        ] {
            assert!(
                resolve_config(Args::default(), env_of(&[pair])).is_err(),
                "{pair:?} should be rejected"
            );
        }
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let args = Args {
            timeout_ms: Some(0),
            ..Args::default()
        };
        assert!(resolve_config(args, env_of(&[])).is_err());
    }

    #[test]
    fn bool_flags_parse_common_spellings() {
        assert_eq!(parse_bool_flag(" ON "), Some(true));
        assert_eq!(parse_bool_flag("0"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
