use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tracing::{info, warn};

use crate::optimizer::PackingConfig;
use crate::types::validation::validate_selector_tolerance;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "STACK_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "STACK_PLANNER_API_PORT";

    fn from_env() -> Self {
        let (bind_ip, display_host) = parse_host(env_string(Self::HOST_VAR));
        let port = parse_port(env_string(Self::PORT_VAR));
        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

fn parse_host(raw: Option<String>) -> (IpAddr, String) {
    let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    match raw {
        None => (default_ip, ApiConfig::DEFAULT_HOST.to_string()),
        Some(value) => match value.parse::<IpAddr>() {
            Ok(ip) => (ip, value),
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    ApiConfig::HOST_VAR,
                    value,
                    err,
                    ApiConfig::DEFAULT_HOST
                );
                (default_ip, ApiConfig::DEFAULT_HOST.to_string())
            }
        },
    }
}

fn parse_port(raw: Option<String>) -> u16 {
    match raw {
        Some(raw) => match raw.parse::<u16>() {
            Ok(value) if value != 0 => value,
            Ok(_) => {
                warn!(
                    "{} must not be 0. Using {}.",
                    ApiConfig::PORT_VAR,
                    ApiConfig::DEFAULT_PORT
                );
                ApiConfig::DEFAULT_PORT
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}'): {}. Using {}.",
                    ApiConfig::PORT_VAR,
                    raw,
                    err,
                    ApiConfig::DEFAULT_PORT
                );
                ApiConfig::DEFAULT_PORT
            }
        },
        None => ApiConfig::DEFAULT_PORT,
    }
}

/// Configuration for the exact stack optimizer.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const MARGIN_VAR: &'static str = "STACK_PLANNER_MARGIN";
    const SELECTOR_TOLERANCE_VAR: &'static str = "STACK_PLANNER_SELECTOR_TOLERANCE";
    const TIME_LIMIT_VAR: &'static str = "STACK_PLANNER_TIME_LIMIT_SECS";
    const VERIFY_PLANS_VAR: &'static str = "STACK_PLANNER_VERIFY_PLANS";

    fn from_env() -> Self {
        let margin = load_f64_with_warning(
            Self::MARGIN_VAR,
            PackingConfig::DEFAULT_MARGIN,
            |value| value >= 0.0,
            "must not be negative",
            "Clearance margin enlarges every item edge",
        );

        let selector_tolerance = load_f64_with_warning(
            Self::SELECTOR_TOLERANCE_VAR,
            PackingConfig::DEFAULT_SELECTOR_TOLERANCE,
            |value| validate_selector_tolerance(value).is_ok(),
            "must be between 0 and 0.5",
            "Adjusted selector tolerance may misread solver output",
        );

        let time_limit = env_string(Self::TIME_LIMIT_VAR).and_then(|raw| {
            parse_time_limit(&raw).or_else(|| {
                warn!(
                    "{} contains invalid value '{}': must be a positive number of seconds. Solving without a time limit.",
                    Self::TIME_LIMIT_VAR,
                    raw
                );
                None
            })
        });

        let verify_plans = env_string(Self::VERIFY_PLANS_VAR)
            .and_then(|raw| parse_bool(&raw, Self::VERIFY_PLANS_VAR))
            .unwrap_or(PackingConfig::DEFAULT_VERIFY_PLANS);

        let packing = PackingConfig::builder()
            .margin(margin)
            .selector_tolerance(selector_tolerance)
            .time_limit(time_limit)
            .verify_plans(verify_plans)
            .build();

        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl From<PackingConfig> for OptimizerConfig {
    fn from(packing: PackingConfig) -> Self {
        Self { packing }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_time_limit(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !value.is_finite() || !validator(value) {
                    warn!(
                        "{} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        info!("{} ({} = {}).", notice, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
