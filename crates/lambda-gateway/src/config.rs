use std::{fmt, path::Path, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub const DEFAULT_NAMESPACE: &str = "nuclio";

const DOCKER_MARKER: &str = "/.dockerenv";

/// How function calls reach the function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokeMethod {
    /// Proxied by the dashboard's invocation endpoint.
    #[default]
    Dashboard,
    /// Straight to the function's HTTP port.
    Direct,
}

impl InvokeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvokeMethod::Dashboard => "dashboard",
            InvokeMethod::Direct => "direct",
        }
    }
}

impl FromStr for InvokeMethod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(InvokeMethod::Dashboard),
            "direct" => Ok(InvokeMethod::Direct),
            other => Err(GatewayError::InvalidConfig(format!(
                "unknown invoke method: {other}"
            ))),
        }
    }
}

impl fmt::Display for InvokeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard location and call policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Namespace the functions are deployed in.
    pub namespace: String,
    /// Bound for every request, including function calls.
    pub timeout_ms: u64,
    pub invoke: InvokeMethod,
    /// Host for direct calls; detected when unset.
    pub direct_host: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8070,
            namespace: DEFAULT_NAMESPACE.to_string(),
            timeout_ms: 120_000,
            invoke: InvokeMethod::Dashboard,
            direct_host: None,
        }
    }
}

impl GatewayConfig {
    /// Defaults overlaid with `LAMBDA_NUCLIO_*` variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        let mut cfg = Self::default();
        cfg.overlay_env()?;
        Ok(cfg)
    }

    /// Override fields that have a `LAMBDA_NUCLIO_*` variable set.
    pub fn overlay_env(&mut self) -> Result<(), GatewayError> {
        self.overlay(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    pub fn overlay<F>(&mut self, lookup: F) -> Result<(), GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LAMBDA_NUCLIO_SCHEME") {
            self.scheme = v;
        }
        if let Some(v) = lookup("LAMBDA_NUCLIO_HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("LAMBDA_NUCLIO_PORT") {
            self.port = parse_number("LAMBDA_NUCLIO_PORT", &v)?;
        }
        if let Some(v) = lookup("LAMBDA_NUCLIO_NAMESPACE") {
            self.namespace = v;
        }
        if let Some(v) = lookup("LAMBDA_NUCLIO_TIMEOUT_MS") {
            self.timeout_ms = parse_number("LAMBDA_NUCLIO_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("LAMBDA_NUCLIO_INVOKE") {
            self.invoke = v.parse()?;
        }
        if let Some(v) = lookup("LAMBDA_NUCLIO_DIRECT_HOST") {
            self.direct_host = Some(v);
        }
        Ok(())
    }

    /// Base URL of the dashboard, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whole seconds for the invoke timeout header, at least one.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_ms.div_ceil(1000).max(1)
    }

    /// Host used for direct calls.
    pub fn direct_host(&self) -> String {
        match &self.direct_host {
            Some(host) => host.clone(),
            None if Path::new(DOCKER_MARKER).exists() => "host.docker.internal".to_string(),
            None => "localhost".to_string(),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, GatewayError> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::InvalidConfig(format!("{key} is not a valid number: {value}")))
}
