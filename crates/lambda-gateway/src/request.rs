use reqwest::header::{HeaderMap, HeaderValue};

use lambda_model::FunctionDescriptor;

use crate::{
    config::{GatewayConfig, InvokeMethod},
    error::GatewayError,
};

const FUNCTIONS_PATH: &str = "/api/functions";
const INVOCATIONS_PATH: &str = "/api/function_invocations";
const PROJECT_NAME: &str = "cvat";

const PROJECT_HEADER: &str = "x-nuclio-project-name";
const NAMESPACE_HEADER: &str = "x-nuclio-function-namespace";
const INVOKE_VIA_HEADER: &str = "x-nuclio-invoke-via";
const INVOKE_TIMEOUT_HEADER: &str = "x-nuclio-invoke-timeout";
const FUNCTION_NAME_HEADER: &str = "x-nuclio-function-name";
const PATH_HEADER: &str = "x-nuclio-path";

/// Where a call goes and what it carries besides the body.
#[derive(Debug, Clone)]
pub struct Target {
    pub url: String,
    pub headers: HeaderMap,
}

/// Headers sent with every request.
pub(crate) fn base_headers(cfg: &GatewayConfig) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();
    headers.insert(PROJECT_HEADER, HeaderValue::from_static(PROJECT_NAME));
    headers.insert(NAMESPACE_HEADER, header_value(&cfg.namespace)?);
    headers.insert(INVOKE_VIA_HEADER, HeaderValue::from_static("domain-name"));
    headers.insert(
        INVOKE_TIMEOUT_HEADER,
        header_value(&format!("{}s", cfg.timeout_secs()))?,
    );
    Ok(headers)
}

pub(crate) fn functions_url(cfg: &GatewayConfig) -> String {
    format!("{}{FUNCTIONS_PATH}", cfg.base_url())
}

pub(crate) fn function_url(cfg: &GatewayConfig, id: &str) -> String {
    format!("{}{FUNCTIONS_PATH}/{id}", cfg.base_url())
}

/// URL and headers for calling `function` with the configured method.
pub fn invocation_target(
    cfg: &GatewayConfig,
    function: &FunctionDescriptor,
) -> Result<Target, GatewayError> {
    let mut headers = base_headers(cfg)?;
    let url = match cfg.invoke {
        InvokeMethod::Dashboard => {
            headers.insert(FUNCTION_NAME_HEADER, header_value(&function.id)?);
            headers.insert(PATH_HEADER, HeaderValue::from_static("/"));
            format!("{}{INVOCATIONS_PATH}", cfg.base_url())
        }
        InvokeMethod::Direct => {
            let port = function.port.ok_or_else(|| GatewayError::MissingPort {
                function: function.id.clone(),
            })?;
            format!("http://{}:{port}", cfg.direct_host())
        }
    };
    Ok(Target { url, headers })
}

fn header_value(value: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(value)
        .map_err(|_| GatewayError::InvalidConfig(format!("not a valid header value: {value:?}")))
}
