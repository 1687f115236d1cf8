use crate::error::RuntimeError;
use std::time::Duration;

const DEFAULT_LOG_GROUP_PREFIX: &str = "API-Gateway-Execution-Logs_";
const DEFAULT_SCHEDULE: &str = "rate(10 minutes)";

/// `Poll` bounds a fixed-interval polling loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poll {
    /// Time to wait between attempts
    pub interval: Duration,
    /// Number of attempts before giving up
    pub max_attempts: u32,
}

impl Poll {
    /// Polling used while a Logs Insights query runs.
    pub const QUERY: Poll = Poll {
        interval: Duration::from_secs(1),
        max_attempts: 300,
    };

    /// Polling used while shared RAM resources become visible.
    pub const SHARED_RESOURCES: Poll = Poll {
        interval: Duration::from_millis(50),
        max_attempts: 600,
    };

    /// Polling used while a new traffic mirror filter accepts rules.
    pub const FILTER_RULES: Poll = Poll {
        interval: Duration::from_millis(50),
        max_attempts: 100,
    };
}

/// Settings for the log shipping function.
#[derive(Clone, Debug, PartialEq)]
pub struct ShipperConfig {
    /// Collector endpoint that receives the shipped logs
    pub endpoint: String,
    /// Name of the function the schedule invokes
    pub function_name: String,
    /// Prefix of the API Gateway execution log groups
    pub log_group_prefix: String,
    /// EventBridge schedule expression
    pub schedule_expression: String,
}

impl ShipperConfig {
    /// Load the configuration from the function environment.
    pub fn from_env() -> Result<ShipperConfig, RuntimeError> {
        Ok(ShipperConfig {
            endpoint: required("LOGS_ENDPOINT")?,
            function_name: required("AWS_LAMBDA_FUNCTION_NAME")?,
            log_group_prefix: optional("LOG_GROUP_PREFIX", DEFAULT_LOG_GROUP_PREFIX),
            schedule_expression: optional("SCHEDULE_EXPRESSION", DEFAULT_SCHEDULE),
        })
    }
}

/// Settings shared by the traffic mirroring functions.
#[derive(Clone, Debug, PartialEq)]
pub struct MirrorConfig {
    /// Account allowed to share the transit gateway and mirror target
    pub trusted_account: String,
    /// CIDR routed through the transit gateway
    pub route_destination: String,
}

impl MirrorConfig {
    /// Load the configuration from the function environment.
    pub fn from_env() -> Result<MirrorConfig, RuntimeError> {
        Ok(MirrorConfig {
            trusted_account: required("TRUSTED_ACCOUNT_ID")?,
            route_destination: required("ROUTE_DESTINATION_CIDR")?,
        })
    }
}

/// Instance mirrored by the instance variant.
pub fn source_instance_from_env() -> Result<String, RuntimeError> {
    required("SOURCE_INSTANCE_ID")
}

/// Interfaces mirrored by the load balancer variant.
pub fn interface_ids_from_env() -> Result<Vec<String>, RuntimeError> {
    let ids = split_ids(&required("NETWORK_INTERFACE_IDS")?);
    if ids.is_empty() {
        return Err(RuntimeError::MissingEnv("NETWORK_INTERFACE_IDS".into()));
    }
    Ok(ids)
}

fn required(name: &str) -> Result<String, RuntimeError> {
    std::env::var(name).map_err(|_| RuntimeError::MissingEnv(name.into()))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn split_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
