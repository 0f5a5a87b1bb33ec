pub mod bulk;
pub mod candidate;
pub mod query;

pub use bulk::{BulkValidationError, RowErrorGroup};
pub use candidate::{Candidate, CandidateId};
pub use query::{CandidateFilters, CandidateListQuery, CandidateListResult, FetchOverrides};
