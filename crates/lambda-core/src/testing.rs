//! Shared doubles for unit tests.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use lambda_model::FunctionDescriptor;

use crate::{
    error::{CoreError, CoreResult},
    invoke::Payload,
    metrics::noop_metrics,
    memory::{MemoryFrames, MemoryStore},
    pipeline::RunContext,
    ports::FunctionRegistry,
};

type Responder = dyn Fn(&Payload) -> CoreResult<Value> + Send + Sync;

/// Registry with fixed functions and a scripted response.
pub(crate) struct StubRegistry {
    functions: Vec<FunctionDescriptor>,
    respond: Box<Responder>,
    pub(crate) calls: Mutex<Vec<Payload>>,
}

impl StubRegistry {
    pub(crate) fn new<F>(functions: Vec<FunctionDescriptor>, respond: F) -> Self
    where
        F: Fn(&Payload) -> CoreResult<Value> + Send + Sync + 'static,
    {
        Self {
            functions,
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl FunctionRegistry for StubRegistry {
    async fn list(&self) -> CoreResult<Vec<FunctionDescriptor>> {
        Ok(self.functions.clone())
    }

    async fn get(&self, id: &str) -> CoreResult<FunctionDescriptor> {
        self.functions
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(id))
    }

    async fn invoke(&self, _: &FunctionDescriptor, payload: &Payload) -> CoreResult<Value> {
        self.calls.lock().unwrap().push(payload.clone());
        (self.respond)(payload)
    }
}

pub(crate) fn context(
    function: FunctionDescriptor,
    task: lambda_model::TaskMeta,
    segment: Option<lambda_model::SegmentMeta>,
    registry: Arc<StubRegistry>,
    store: Arc<MemoryStore>,
) -> RunContext {
    RunContext {
        function,
        task,
        segment,
        registry,
        frames: Arc::new(MemoryFrames::uniform("img")),
        store,
        metrics: noop_metrics(),
    }
}
