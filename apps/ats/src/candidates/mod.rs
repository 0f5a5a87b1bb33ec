//! Candidate list state, response decoding and post-upload polling.

pub mod controller;
pub mod envelope;
pub mod poll;

#[cfg(test)]
mod testing;

pub use controller::{CandidateListController, CandidateListState, UploadOptions};
pub use envelope::{decode_list, decode_record};
pub use poll::{
    poll_until_parsed, PollOutcome, PollPolicy, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};
