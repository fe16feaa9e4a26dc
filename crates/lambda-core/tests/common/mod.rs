#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use lambda_core::{
    CoreError, CoreResult,
    invoke::Payload,
    memory::{MemoryCatalog, MemoryFrames, MemoryStore},
    ports::{AnnotationStore, FunctionRegistry},
    service::LambdaService,
};
use lambda_model::{
    CommitMode, FunctionDescriptor, JobStatus, JobView, LabeledData, Scope, TaskLabel,
    TaskLabelSchema, TaskMeta,
};

type Respond = dyn Fn(&Payload) -> CoreResult<Value> + Send + Sync;

/// Function registry answering every call through a closure.
///
/// With a gate, every call consumes one permit before answering, so a test
/// decides how many calls get through.
pub struct ScriptedRegistry {
    functions: Vec<FunctionDescriptor>,
    respond: Box<Respond>,
    gate: Option<Arc<Semaphore>>,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedRegistry {
    pub fn new<F>(functions: Vec<FunctionDescriptor>, respond: F) -> Self
    where
        F: Fn(&Payload) -> CoreResult<Value> + Send + Sync + 'static,
    {
        Self {
            functions,
            respond: Box::new(respond),
            gate: None,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FunctionRegistry for ScriptedRegistry {
    async fn list(&self) -> CoreResult<Vec<FunctionDescriptor>> {
        Ok(self.functions.clone())
    }

    async fn get(&self, id: &str) -> CoreResult<FunctionDescriptor> {
        self.functions
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("{id} lambda function is not found")))
    }

    async fn invoke(&self, _: &FunctionDescriptor, payload: &Payload) -> CoreResult<Value> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))?
                .forget();
        }
        let out = (self.respond)(payload);
        self.completed.fetch_add(1, Ordering::SeqCst);
        out
    }
}

/// Store that refuses every commit.
#[derive(Default)]
pub struct RejectingStore;

#[async_trait]
impl AnnotationStore for RejectingStore {
    async fn data(&self, _: Scope) -> CoreResult<LabeledData> {
        Ok(LabeledData::default())
    }

    async fn commit(&self, _: Scope, _: LabeledData, _: CommitMode) -> CoreResult<()> {
        Err(CoreError::Store("shapes: invalid points".into()))
    }

    async fn delete(&self, _: Scope) -> CoreResult<()> {
        Ok(())
    }
}

pub fn labels() -> TaskLabelSchema {
    TaskLabelSchema::new()
        .with_label("car", TaskLabel::new(1))
        .with_label("person", TaskLabel::new(2))
}

pub fn task(id: u64, size: u64) -> TaskMeta {
    TaskMeta::new(id, size).with_labels(labels())
}

pub fn service(
    registry: Arc<ScriptedRegistry>,
    catalog: MemoryCatalog,
    store: Arc<dyn AnnotationStore>,
) -> LambdaService {
    LambdaService::builder(
        registry,
        Arc::new(catalog),
        Arc::new(MemoryFrames::uniform("frame")),
        store,
    )
    .build()
}

pub fn store(store: &Arc<MemoryStore>) -> Arc<dyn AnnotationStore> {
    store.clone()
}

/// Poll a job until it reaches `status`.
pub async fn wait_status(svc: &LambdaService, view: &JobView, status: JobStatus) -> JobView {
    let id = view.id.to_string();
    for _ in 0..1000 {
        if let Ok(view) = svc.get_job(&id) {
            if view.status == status {
                return view;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never reached {status}");
}

pub async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never became true");
}
