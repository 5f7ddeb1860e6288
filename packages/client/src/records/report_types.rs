use serde::{Deserialize, Serialize};
use url::Url;

use super::{Identified, JsonContainer, Strinteger};

/// Report types available at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTypes {
    pub request_types: Vec<ReportType>,
}

impl JsonContainer for ReportTypes {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportType {
    pub id: Strinteger,
    pub title: String,
    pub private_visibility: Option<bool>,
    pub organization: Option<String>,
    pub url: Option<Url>,
    pub potential_duplicate_issues_url: Option<Url>,
}

impl Identified for ReportType {
    fn identifier(&self) -> &Strinteger {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mixed_identifiers() {
        let json = br#"{"request_types": [
            {"id": 121, "title": "Pothole", "organization": "City of Detroit",
             "url": "https://seeclickfix.com/api/v2/request_types/121"},
            {"id": "other", "title": "Other", "private_visibility": true}
        ]}"#;
        let types = ReportTypes::decode(json).unwrap();
        assert_eq!(types.request_types.len(), 2);
        assert_eq!(types.request_types[0].identifier().to_int().unwrap(), 121);
        assert_eq!(types.request_types[1].id, Strinteger::from("other"));
        assert_eq!(types.request_types[1].private_visibility, Some(true));
        assert!(types.request_types[1].url.is_none());
    }

    #[test]
    fn empty_list() {
        let types = ReportTypes::decode(br#"{"request_types": []}"#).unwrap();
        assert!(types.request_types.is_empty());
    }
}
