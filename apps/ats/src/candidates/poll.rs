//! Waits for server-side resume parsing to finish after an upload.
//!
//! Sequential: sleep, fetch, check; one request in flight at a time. When the
//! budget runs out (or the token is cancelled) one last fetch is made so the
//! caller always gets the freshest record the server has.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api_client::CandidateApi;
use crate::candidates::envelope::decode_record;
use crate::errors::AppError;
use crate::models::{Candidate, CandidateId};

pub const DEFAULT_POLL_ATTEMPTS: u32 = 12;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Scheduled fetches before the final unconditional one.
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    /// Latest record fetched. `None` only when every fetch failed.
    pub record: Option<Candidate>,
    /// Total fetches issued, including the final one.
    pub fetches: u32,
    pub parsed: bool,
    pub cancelled: bool,
}

pub async fn poll_until_parsed(
    api: &dyn CandidateApi,
    id: &CandidateId,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> PollOutcome {
    let mut fetches = 0;
    let mut cancelled = false;

    for attempt in 1..=policy.attempts {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Poll for candidate {id} cancelled before attempt {attempt}");
                cancelled = true;
                break;
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }

        fetches += 1;
        match fetch_record(api, id).await {
            Ok(Some(record)) if record.has_parsed_resume() => {
                info!("Resume for candidate {id} parsed after {attempt} attempt(s)");
                return PollOutcome {
                    record: Some(record),
                    fetches,
                    parsed: true,
                    cancelled,
                };
            }
            Ok(_) => debug!("Candidate {id} not parsed yet (attempt {attempt})"),
            Err(e) => debug!("Poll attempt {attempt} for candidate {id} failed: {e}"),
        }
    }

    fetches += 1;
    let record = match fetch_record(api, id).await {
        Ok(record) => record,
        Err(e) => {
            warn!("Final fetch for candidate {id} failed: {e}");
            None
        }
    };
    let parsed = record.as_ref().is_some_and(Candidate::has_parsed_resume);
    if !parsed {
        info!("Resume for candidate {id} still unparsed after {fetches} fetches");
    }

    PollOutcome {
        record,
        fetches,
        parsed,
        cancelled,
    }
}

async fn fetch_record(
    api: &dyn CandidateApi,
    id: &CandidateId,
) -> Result<Option<Candidate>, AppError> {
    Ok(decode_record(api.get_candidate(id).await?))
}
