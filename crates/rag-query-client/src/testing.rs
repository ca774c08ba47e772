//! In-memory [`QueryApi`] used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

use crate::api::QueryApi;
use crate::error::QueryError;
use crate::models::{Query, SubmitQueryRequest};

#[derive(Default)]
pub(crate) struct FakeApi {
    queries: Mutex<HashMap<String, Query>>,
    pub(crate) submitted: Mutex<Vec<SubmitQueryRequest>>,
    /// Scripted `get_query` results, consumed front to back before the map.
    scripted: Mutex<VecDeque<Result<Query, QueryError>>>,
    submit_error: Mutex<Option<QueryError>>,
    gate: Option<Notify>,
    next_id: AtomicUsize,
    pub(crate) get_calls: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `submit_query` waits for [`FakeApi::release`] before answering.
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn fail_next_submit(&self, err: QueryError) {
        *lock(&self.submit_error) = Some(err);
    }

    pub(crate) fn script(&self, result: Result<Query, QueryError>) {
        lock(&self.scripted).push_back(result);
    }

    pub(crate) fn complete(&self, query_id: &str, answer: &str, sources: &[&str]) {
        if let Some(q) = lock(&self.queries).get_mut(query_id) {
            q.is_complete = true;
            q.answer_text = Some(answer.to_owned());
            q.sources = sources.iter().map(|s| s.to_string()).collect();
        }
    }

    pub(crate) fn last_submitted(&self) -> Option<SubmitQueryRequest> {
        lock(&self.submitted).last().cloned()
    }
}

impl QueryApi for FakeApi {
    async fn submit_query(&self, query_text: &str, user_id: &str) -> Result<Query, QueryError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = lock(&self.submit_error).take() {
            return Err(err);
        }
        lock(&self.submitted).push(SubmitQueryRequest {
            query_text: query_text.to_owned(),
            user_id: user_id.to_owned(),
        });

        let id = format!("q{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let query = Query::pending(&id, query_text, user_id);
        lock(&self.queries).insert(id, query.clone());
        Ok(query)
    }

    async fn get_query(&self, query_id: &str) -> Result<Query, QueryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = lock(&self.scripted).pop_front() {
            return result;
        }
        lock(&self.queries)
            .get(query_id)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(query_id.to_owned()))
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
