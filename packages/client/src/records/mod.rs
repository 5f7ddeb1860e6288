//! Records decoded from API responses.

mod issues;
mod report_details;
mod report_types;
mod strinteger;

use serde::de::DeserializeOwned;

use crate::error::Result;

pub use issues::{Avatar, Issue, IssueRequestType, Issues, Media, Metadata, Pagination, Reporter, Transitions};
pub use report_details::{Question, QuestionType, ReportDetails, SelectValue};
pub use report_types::{ReportType, ReportTypes};
pub use strinteger::Strinteger;

/// A top-level response body.
pub trait JsonContainer: DeserializeOwned {
    /// Decode from raw JSON. Dates are ISO 8601.
    fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// A record carrying a server-assigned identifier.
pub trait Identified {
    fn identifier(&self) -> &Strinteger;
}
