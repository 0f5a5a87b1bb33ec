//! Candidate list controller. Owns the paged, filtered candidate view and
//! mediates every candidate mutation.
//!
//! Flow for a mutation: call API → update the in-memory list (optimistically
//! for uploads) → emit `candidates-updated` so independent views refetch.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Overlapping fetches are fenced by a generation counter: only the
//! most recently issued request may write its response.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api_client::{CandidateApi, MultipartPayload};
use crate::candidates::envelope::{decode_list, decode_record};
use crate::candidates::poll::{poll_until_parsed, PollPolicy};
use crate::errors::AppError;
use crate::events::{EventName, NotificationBus};
use crate::models::{
    Candidate, CandidateFilters, CandidateId, CandidateListQuery, FetchOverrides,
};

/// Snapshot of everything a view renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateListState {
    pub items: Vec<Candidate>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub filters: CandidateFilters,
    pub loading: bool,
    pub error: Option<String>,
}

impl CandidateListState {
    fn new(query: CandidateListQuery) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: query.page,
            limit: query.limit,
            filters: query.filters,
            loading: false,
            error: None,
        }
    }

    fn query(&self) -> CandidateListQuery {
        CandidateListQuery {
            page: self.page,
            limit: self.limit,
            filters: self.filters.clone(),
        }
    }

    fn position_of(&self, id: &CandidateId) -> Option<usize> {
        self.items.iter().position(|c| c.id() == Some(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Wait for server-side resume parsing before settling.
    pub poll: bool,
    /// Overrides the controller's poll policy for this upload.
    pub policy: Option<PollPolicy>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            poll: true,
            policy: None,
        }
    }
}

impl UploadOptions {
    pub fn without_polling() -> Self {
        Self {
            poll: false,
            policy: None,
        }
    }
}

pub struct CandidateListController {
    api: Arc<dyn CandidateApi>,
    bus: Arc<NotificationBus>,
    poll_policy: PollPolicy,
    state: Mutex<CandidateListState>,
    generation: AtomicU64,
    disposed: CancellationToken,
}

impl CandidateListController {
    pub fn new(api: Arc<dyn CandidateApi>, bus: Arc<NotificationBus>, page_size: u32) -> Self {
        Self::with_poll_policy(api, bus, page_size, PollPolicy::default())
    }

    pub fn with_poll_policy(
        api: Arc<dyn CandidateApi>,
        bus: Arc<NotificationBus>,
        page_size: u32,
        poll_policy: PollPolicy,
    ) -> Self {
        Self {
            api,
            bus,
            poll_policy,
            state: Mutex::new(CandidateListState::new(CandidateListQuery::new(page_size))),
            generation: AtomicU64::new(0),
            disposed: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> CandidateListState {
        self.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_cancelled()
    }

    /// Stops in-flight polls at their next sleep and freezes local state.
    /// Requests already on the wire still complete; their results are dropped.
    pub fn dispose(&self) {
        self.disposed.cancel();
    }

    // ────────────────────────────────────────────────────────────────────
    // Queries
    // ────────────────────────────────────────────────────────────────────

    /// Fetches a page with `overrides` merged over the current query.
    ///
    /// Never fails: a transport or server error keeps the previous list and
    /// records a readable message in `error`.
    pub async fn fetch(&self, overrides: FetchOverrides) -> CandidateListState {
        let (generation, query) = {
            let mut state = self.lock();
            if self.is_disposed() {
                return state.clone();
            }
            let query = state.query().merged(&overrides);
            state.loading = true;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, query)
        };

        let params = query.to_params();
        debug!("Fetching candidates (generation {generation}): {params:?}");
        let result = self.api.list_candidates(&params).await;

        let mut state = self.lock();
        if self.is_disposed() {
            state.loading = false;
            return state.clone();
        }
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!("Discarding stale candidate list response (generation {generation})");
            return state.clone();
        }

        state.loading = false;
        match result {
            Ok(body) => {
                let page = decode_list(body);
                state.items = page.items;
                state.total = page.total;
                state.page = query.page;
                state.limit = query.limit;
                state.filters = query.filters;
                state.error = None;
            }
            Err(e) => {
                warn!("Failed to fetch candidates: {e}");
                state.error = Some(e.user_message());
            }
        }
        state.clone()
    }

    /// Re-fetches the current page with unchanged filters.
    pub async fn refresh(&self) -> CandidateListState {
        self.fetch(FetchOverrides::default()).await
    }

    /// Applies new filters; the page resets to 1 when they differ.
    pub async fn set_filters(&self, filters: CandidateFilters) -> CandidateListState {
        self.fetch(FetchOverrides::filters(filters)).await
    }

    pub async fn set_page(&self, page: u32) -> CandidateListState {
        self.fetch(FetchOverrides::page(page)).await
    }

    // ────────────────────────────────────────────────────────────────────
    // Mutations
    // ────────────────────────────────────────────────────────────────────

    /// Creates a candidate from a multipart form carrying a resume.
    ///
    /// The resume is renamed onto the canonical `file` field, a placeholder is
    /// shown at the top of the list, and (unless disabled) the record is
    /// polled until the server finishes parsing. Returns the settled record.
    pub async fn upload(
        &self,
        mut payload: MultipartPayload,
        options: UploadOptions,
    ) -> Result<Candidate, AppError> {
        payload.normalize_resume_field();
        let submitted = payload.text_fields();

        let body = self.api.upload_candidate(payload).await.map_err(|e| {
            warn!("Candidate upload failed: {e}");
            e
        })?;

        let created = decode_record(body);
        let server_id = created.as_ref().and_then(|c| c.id().cloned());
        let placeholder = optimistic_record(created, submitted);
        let placeholder_id = placeholder.id().cloned();
        self.insert_front(placeholder.clone());

        let settled = match server_id {
            _ if placeholder.has_parsed_resume() => placeholder,
            Some(id) if options.poll => {
                let policy = options.policy.unwrap_or(self.poll_policy);
                let outcome =
                    poll_until_parsed(self.api.as_ref(), &id, policy, &self.disposed).await;
                match outcome.record {
                    Some(record) => {
                        if let Some(placeholder_id) = &placeholder_id {
                            self.replace(placeholder_id, record.clone());
                        }
                        record
                    }
                    None => placeholder,
                }
            }
            _ => placeholder,
        };

        info!(
            "Candidate {} uploaded (parsed: {})",
            settled.id().map(CandidateId::as_str).unwrap_or("?"),
            settled.has_parsed_resume()
        );
        self.notify(Some(settled.clone().into_value()));
        Ok(settled)
    }

    /// Creates a candidate from a JSON payload (no resume file).
    pub async fn create_candidate(&self, payload: Value) -> Result<Candidate, AppError> {
        let body = self.api.create_candidate(&payload).await.map_err(|e| {
            warn!("Candidate creation failed: {e}");
            e
        })?;

        let submitted = match payload {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        let record = optimistic_record(decode_record(body), submitted);
        self.insert_front(record.clone());
        self.notify(Some(record.clone().into_value()));
        Ok(record)
    }

    /// Replaces a candidate. If the server answers without a record the local
    /// entry is merged with `payload` instead.
    pub async fn update_candidate(
        &self,
        id: &CandidateId,
        payload: Value,
    ) -> Result<Candidate, AppError> {
        let body = self
            .api
            .update_candidate(id, &payload)
            .await
            .map_err(|e| {
                warn!("Update of candidate {id} failed: {e}");
                e
            })?;

        let record = match decode_record(body) {
            Some(record) => record,
            None => self.merged_locally(id, payload),
        };
        self.replace(id, record.clone());
        self.notify(Some(record.clone().into_value()));
        Ok(record)
    }

    /// Changes only the status. The local entry's other fields are left as-is.
    pub async fn update_status(&self, id: &CandidateId, status: &str) -> Result<(), AppError> {
        self.api.update_status(id, status).await.map_err(|e| {
            warn!("Status change for candidate {id} failed: {e}");
            e
        })?;

        self.write(|state| {
            if let Some(pos) = state.position_of(id) {
                state.items[pos].set_status(status);
            }
        });
        self.notify(Some(json!({ "id": id, "status": status })));
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────
    // Local state helpers
    // ────────────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, CandidateListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against local state unless the controller has been disposed.
    fn write(&self, f: impl FnOnce(&mut CandidateListState)) {
        if self.is_disposed() {
            return;
        }
        f(&mut self.lock());
    }

    fn insert_front(&self, record: Candidate) {
        self.write(|state| {
            state.items.insert(0, record);
            state.total += 1;
        });
    }

    fn replace(&self, id: &CandidateId, record: Candidate) {
        self.write(|state| match state.position_of(id) {
            Some(pos) => state.items[pos] = record,
            None => debug!("Candidate {id} no longer in the visible list; skipping replace"),
        });
    }

    fn merged_locally(&self, id: &CandidateId, payload: Value) -> Candidate {
        let mut fields = {
            let state = self.lock();
            state
                .position_of(id)
                .map(|pos| state.items[pos].fields().clone())
                .unwrap_or_default()
        };
        if let Value::Object(changes) = payload {
            fields.extend(changes);
        }
        fields.insert("id".to_string(), Value::String(id.to_string()));
        Candidate::from_fields(fields)
    }

    fn notify(&self, payload: Option<Value>) {
        self.bus.emit(EventName::CandidatesUpdated, payload);
    }
}

/// The record to show before the server confirms: what it returned, or what
/// was submitted. Always carries an id (temporary if the server gave none).
fn optimistic_record(created: Option<Candidate>, submitted: Map<String, Value>) -> Candidate {
    let mut record = created.unwrap_or_else(|| Candidate::from_fields(submitted));
    record.ensure_id();
    record
}
