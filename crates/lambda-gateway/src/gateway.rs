use async_trait::async_trait;
use reqwest::{Client, Response, header::HeaderMap};
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use lambda_core::{CoreError, CoreResult, TransportError, invoke::Payload, ports::FunctionRegistry};
use lambda_model::FunctionDescriptor;

use crate::{
    config::GatewayConfig,
    error::GatewayError,
    request::{base_headers, function_url, functions_url, invocation_target},
};

/// Nuclio dashboard client implementing the function registry.
///
/// Every request, function calls included, is bounded by the configured
/// timeout. Non-2xx answers surface as upstream failures with their status.
pub struct NuclioGateway {
    client: Client,
    config: GatewayConfig,
    headers: HeaderMap,
}

impl NuclioGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Self::with_client(client, config)
    }

    /// Reuse an existing client and its connection pool.
    pub fn with_client(client: Client, config: GatewayConfig) -> Result<Self, GatewayError> {
        let headers = base_headers(&config)?;
        Ok(Self {
            client,
            config,
            headers,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn get_json(&self, url: String) -> Result<Value, GatewayError> {
        trace!(%url, "dashboard request");
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn post_json(&self, function: &FunctionDescriptor, payload: &Payload) -> Result<Value, GatewayError> {
        let target = invocation_target(&self.config, function)?;
        trace!(url = %target.url, "function call");
        let response = self
            .client
            .post(target.url)
            .headers(target.headers)
            .json(payload)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response(response: Response) -> Result<Value, GatewayError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl FunctionRegistry for NuclioGateway {
    #[instrument(level = "debug", skip(self))]
    async fn list(&self) -> CoreResult<Vec<FunctionDescriptor>> {
        let data = self.get_json(functions_url(&self.config)).await?;
        let Value::Object(items) = data else {
            return Err(TransportError::Decode("function list is not an object".into()).into());
        };

        let mut out = Vec::with_capacity(items.len());
        for (key, raw) in items {
            match FunctionDescriptor::from_raw(&raw) {
                Ok(function) => out.push(function),
                Err(e) => warn!(function = %key, error = %e, "skipping function with invalid descriptor"),
            }
        }
        debug!(functions = out.len(), "functions listed");
        Ok(out)
    }

    #[instrument(level = "debug", skip(self))]
    async fn get(&self, id: &str) -> CoreResult<FunctionDescriptor> {
        let raw = self.get_json(function_url(&self.config, id)).await?;
        FunctionDescriptor::from_raw(&raw).map_err(|e| {
            warn!(function = %id, error = %e, "invalid function descriptor");
            CoreError::not_found(format!("{id} lambda function is not found: {e}"))
        })
    }

    async fn invoke(&self, function: &FunctionDescriptor, payload: &Payload) -> CoreResult<Value> {
        Ok(self.post_json(function, payload).await?)
    }
}
