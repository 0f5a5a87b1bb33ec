//! Scripted `CandidateApi` for controller and poll tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api_client::{CandidateApi, MultipartPayload};
use crate::errors::AppError;
use crate::models::CandidateId;

type Scripted = Result<Value, AppError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(Vec<(&'static str, String)>),
    Get(String),
    Create(Value),
    Upload(Vec<String>),
    Update(String, Value),
    Status(String, String),
}

#[derive(Default)]
pub struct ScriptedApi {
    lists: Mutex<VecDeque<(Duration, Scripted)>>,
    gets: Mutex<VecDeque<Scripted>>,
    writes: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn push_list(&self, response: Scripted) {
        self.push_list_after(Duration::ZERO, response);
    }

    /// Queues a list response that resolves only after `delay`.
    pub fn push_list_after(&self, delay: Duration, response: Scripted) {
        self.lists.lock().unwrap().push_back((delay, response));
    }

    pub fn push_get(&self, response: Scripted) {
        self.gets.lock().unwrap().push_back(response);
    }

    /// Response for the next create/upload/update/status call.
    pub fn push_write(&self, response: Scripted) {
        self.writes.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Get(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_write(&self) -> Scripted {
        self.writes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }
}

fn exhausted() -> Scripted {
    Err(AppError::Validation("no scripted response left".to_string()))
}

#[async_trait]
impl CandidateApi for ScriptedApi {
    async fn list_candidates(&self, params: &[(&'static str, String)]) -> Result<Value, AppError> {
        self.record(Call::List(params.to_vec()));
        let next = self.lists.lock().unwrap().pop_front();
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => exhausted(),
        }
    }

    async fn get_candidate(&self, id: &CandidateId) -> Result<Value, AppError> {
        self.record(Call::Get(id.to_string()));
        let next = self.gets.lock().unwrap().pop_front();
        next.unwrap_or_else(exhausted)
    }

    async fn create_candidate(&self, payload: &Value) -> Result<Value, AppError> {
        self.record(Call::Create(payload.clone()));
        self.next_write()
    }

    async fn upload_candidate(&self, payload: MultipartPayload) -> Result<Value, AppError> {
        let names = payload.field_names().into_iter().map(String::from).collect();
        self.record(Call::Upload(names));
        self.next_write()
    }

    async fn update_candidate(
        &self,
        id: &CandidateId,
        payload: &Value,
    ) -> Result<Value, AppError> {
        self.record(Call::Update(id.to_string(), payload.clone()));
        self.next_write()
    }

    async fn update_status(&self, id: &CandidateId, status: &str) -> Result<Value, AppError> {
        self.record(Call::Status(id.to_string(), status.to_string()));
        self.next_write()
    }
}
