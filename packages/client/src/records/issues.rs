use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Identified, JsonContainer, Strinteger};

/// One page of issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issues {
    pub metadata: Metadata,
    pub issues: Vec<Issue>,
}

impl JsonContainer for Issues {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub entries: u64,
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    pub next_page: Option<u32>,
    pub next_page_url: Option<Url>,
    pub previous_page: Option<u32>,
    pub previous_page_url: Option<Url>,
}

impl Pagination {
    pub fn has_next_page(&self) -> bool {
        self.next_page.is_some()
    }
}

/// A reported problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Strinteger,
    pub status: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub rating: i64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub reopened_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub shortened_url: Option<Url>,
    pub url: Url,
    pub html_url: Url,
    pub comment_url: Option<Url>,
    pub flag_url: Option<Url>,
    pub request_type: Option<IssueRequestType>,
    pub transitions: Option<Transitions>,
    pub reporter: Reporter,
    pub media: Media,
}

impl Identified for Issue {
    fn identifier(&self) -> &Strinteger {
        &self.id
    }
}

/// The report type an issue was filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequestType {
    pub id: Strinteger,
    pub title: String,
    pub organization: Option<String>,
    pub url: Option<Url>,
    pub related_issues_url: Option<Url>,
}

/// Status-change endpoints available to the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transitions {
    pub close_url: Option<Url>,
    pub open_url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    pub id: Option<i64>,
    pub name: String,
    pub witty_title: String,
    pub role: String,
    pub civic_points: Option<i64>,
    pub avatar: Avatar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub full: Url,
    pub square_100x100: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub video_url: Option<Url>,
    pub image_full: Option<Url>,
    pub image_square_100x100: Option<Url>,
    pub representative_image_url: Option<Url>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "metadata": {"pagination": {"entries": 1, "page": 1, "per_page": 20, "pages": 1,
                                    "next_page": null, "next_page_url": null,
                                    "previous_page": null, "previous_page_url": null}},
        "issues": [{
            "id": "77",
            "status": "Closed",
            "rating": 0,
            "created_at": "2018-01-02T03:04:05Z",
            "closed_at": "2018-01-03T00:00:00+02:00",
            "url": "https://seeclickfix.com/api/v2/issues/77",
            "html_url": "https://seeclickfix.com/issues/77",
            "reporter": {
                "name": "Anonymous", "witty_title": "", "role": "Anonymous",
                "avatar": {"full": "https://example.com/a.png", "square_100x100": "https://example.com/b.png"}
            },
            "media": {}
        }]
    }"#;

    #[test]
    fn optional_fields_may_be_absent() {
        let issues = Issues::decode(MINIMAL.as_bytes()).unwrap();
        assert!(!issues.metadata.pagination.has_next_page());

        let issue = &issues.issues[0];
        assert_eq!(issue.identifier().to_int().unwrap(), 77);
        assert!(issue.summary.is_none());
        assert!(issue.request_type.is_none());
        assert!(issue.transitions.is_none());
        assert!(issue.reporter.id.is_none());
        assert!(issue.media.image_full.is_none());
    }

    #[test]
    fn dates_are_normalized_to_utc() {
        let issues = Issues::decode(MINIMAL.as_bytes()).unwrap();
        let issue = &issues.issues[0];
        assert_eq!(issue.created_at.to_rfc3339(), "2018-01-02T03:04:05+00:00");
        assert_eq!(
            issue.closed_at.unwrap().to_rfc3339(),
            "2018-01-02T22:00:00+00:00"
        );
    }

    #[test]
    fn missing_required_field_fails() {
        let broken = MINIMAL.replace(r#""status": "Closed","#, "");
        assert!(Issues::decode(broken.as_bytes()).is_err());
    }
}
