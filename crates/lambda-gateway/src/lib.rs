//! Function registry backed by a nuclio dashboard.
mod config;
pub use config::{DEFAULT_NAMESPACE, GatewayConfig, InvokeMethod};

mod error;
pub use error::GatewayError;

mod request;
pub use request::{Target, invocation_target};

mod gateway;
pub use gateway::NuclioGateway;
