use serde::{Deserialize, Serialize};

use crate::models::candidate::Candidate;

/// Default page size when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filters accepted by `GET /candidates`.
///
/// Unset or blank values are never sent; the server treats an absent
/// parameter as "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilters {
    pub q: Option<String>,
    pub status: Option<String>,
    pub job_id: Option<String>,
    pub applied_job: Option<String>,
    /// Tri-state: `Some(true)` direct only, `Some(false)` non-direct only, `None` both.
    pub is_direct: Option<bool>,
}

impl CandidateFilters {
    pub fn search(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_applied_job(mut self, applied_job: impl Into<String>) -> Self {
        self.applied_job = Some(applied_job.into());
        self
    }

    pub fn with_direct(mut self, is_direct: Option<bool>) -> Self {
        self.is_direct = is_direct;
        self
    }

    /// Query parameters in wire order, blank values dropped.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let text = [
            ("q", &self.q),
            ("status", &self.status),
            ("job_id", &self.job_id),
            ("applied_job", &self.applied_job),
        ];
        for (key, value) in text {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((key, v.to_string()));
            }
        }
        if let Some(direct) = self.is_direct {
            params.push(("is_direct", direct.to_string()));
        }
        params
    }
}

/// Current paging/filter view state of the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateListQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: CandidateFilters,
}

impl Default for CandidateListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            filters: CandidateFilters::default(),
        }
    }
}

impl CandidateListQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            ..Self::default()
        }
    }

    /// Applies partial overrides. A filter change always lands on page 1,
    /// even when a page is given alongside it.
    pub fn merged(&self, overrides: &FetchOverrides) -> Self {
        let filters = overrides
            .filters
            .clone()
            .unwrap_or_else(|| self.filters.clone());
        let page = if filters != self.filters {
            1
        } else {
            overrides.page.unwrap_or(self.page)
        };
        Self {
            page: page.max(1),
            limit: overrides.limit.unwrap_or(self.limit).max(1),
            filters,
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        params.extend(self.filters.to_params());
        params
    }
}

/// Partial update applied on top of the current query for one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOverrides {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub filters: Option<CandidateFilters>,
}

impl FetchOverrides {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn filters(filters: CandidateFilters) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }
}

/// Normalized page of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateListResult {
    pub items: Vec<Candidate>,
    pub total: u64,
}
