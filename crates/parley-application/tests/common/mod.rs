//! Hand-written collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parley_application::AppStore;
use parley_core::api::{
    AssistantApi, CreateSessionRequest, CreateSessionResponse, QueryOptions, QueryResponse,
};
use parley_core::error::{ParleyError, Result};
use parley_core::state::StoreSnapshot;
use parley_infrastructure::InMemoryStateRepository;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// What the next `query` call does.
pub enum QueryStep {
    Reply(QueryResponse),
    Fail(ParleyError),
    /// Waits for the gate to open, then replies.
    Gated(Arc<Notify>, QueryResponse),
}

/// Scripted assistant API.
///
/// `create_session` pops scripted responses, falling back to sequential ids
/// `s1`, `s2`, ... Queries pop scripted steps and echo when the script is empty.
#[derive(Default)]
pub struct MockApi {
    create_script: Mutex<VecDeque<Result<CreateSessionResponse>>>,
    query_script: Mutex<VecDeque<QueryStep>>,
    created: AtomicUsize,
    pub session_names: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<(String, QueryOptions)>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_create(&self, response: Result<CreateSessionResponse>) {
        self.create_script.lock().unwrap().push_back(response);
    }

    pub fn script_query(&self, step: QueryStep) {
        self.query_script.lock().unwrap().push_back(step);
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl AssistantApi for MockApi {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionResponse> {
        self.session_names.lock().unwrap().push(request.name);
        if let Some(scripted) = self.create_script.lock().unwrap().pop_front() {
            return scripted;
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CreateSessionResponse::ok(format!("s{n}")))
    }

    async fn query(&self, content: &str, options: &QueryOptions) -> Result<QueryResponse> {
        self.queries
            .lock()
            .unwrap()
            .push((content.to_string(), options.clone()));

        let step = self.query_script.lock().unwrap().pop_front();
        match step {
            Some(QueryStep::Reply(response)) => Ok(response),
            Some(QueryStep::Fail(err)) => Err(err),
            Some(QueryStep::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Ok(QueryResponse::text(format!("echo: {content}"))),
        }
    }
}

pub fn new_store(api: Arc<MockApi>) -> (AppStore, Arc<InMemoryStateRepository>) {
    let repository = Arc::new(InMemoryStateRepository::new());
    let store = AppStore::new(api, repository.clone());
    (store, repository)
}

/// Waits until the published snapshot satisfies `predicate`.
pub async fn wait_until<F>(store: &AppStore, predicate: F)
where
    F: FnMut(&Arc<StoreSnapshot>) -> bool,
{
    let mut rx = store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for store state")
        .expect("store dropped");
}
