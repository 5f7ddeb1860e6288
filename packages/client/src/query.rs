//! Issue search parameters.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::location::Location;

/// Largest page the API will return.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Open,
    Acknowledged,
    Closed,
    Archived,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Acknowledged => "acknowledged",
            Status::Closed => "closed",
            Status::Archived => "archived",
        }
    }
}

/// Field to sort results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    UpdatedAt,
    CreatedAt,
    Rating,
    Distance,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::UpdatedAt => "updated_at",
            Order::CreatedAt => "created_at",
            Order::Rating => "rating",
            Order::Distance => "distance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Status, Order, Direction);

/// Filters for `GET /issues`. Unset fields are not sent.
#[derive(Debug, Default)]
pub struct IssuesQuery {
    location: Option<Box<dyn Location>>,
    page: Option<u32>,
    per_page: Option<u32>,
    statuses: Vec<Status>,
    sort: Option<Order>,
    direction: Option<Direction>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    updated_after: Option<DateTime<Utc>>,
    updated_before: Option<DateTime<Utc>>,
    search: Option<String>,
    request_types: Vec<i64>,
    details: bool,
}

impl IssuesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(mut self, location: impl Location + 'static) -> Self {
        self.location = Some(Box::new(location));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Page size, clamped to [`MAX_PER_PAGE`].
    pub fn per_page(mut self, count: u32) -> Self {
        self.per_page = Some(count.min(MAX_PER_PAGE));
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn sort(mut self, order: Order, direction: Direction) -> Self {
        self.sort = Some(order);
        self.direction = Some(direction);
        self
    }

    pub fn created_after(mut self, date: DateTime<Utc>) -> Self {
        self.after = Some(date);
        self
    }

    pub fn created_before(mut self, date: DateTime<Utc>) -> Self {
        self.before = Some(date);
        self
    }

    pub fn updated_after(mut self, date: DateTime<Utc>) -> Self {
        self.updated_after = Some(date);
        self
    }

    pub fn updated_before(mut self, date: DateTime<Utc>) -> Self {
        self.updated_before = Some(date);
        self
    }

    /// Free-text search over summary and description.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn request_type(mut self, id: i64) -> Self {
        self.request_types.push(id);
        self
    }

    /// Ask the server to embed question answers in each issue.
    pub fn details(mut self, details: bool) -> Self {
        self.details = details;
        self
    }

    /// Render as query arguments in a stable order.
    pub fn query_arguments(&self) -> Result<Vec<(String, String)>> {
        let mut arguments = match &self.location {
            Some(location) => location.query_arguments()?,
            None => Vec::new(),
        };

        let mut push = |key: &str, value: String| arguments.push((key.to_string(), value));

        if let Some(page) = self.page {
            push("page", page.to_string());
        }
        if let Some(per_page) = self.per_page {
            push("per_page", per_page.to_string());
        }
        if !self.statuses.is_empty() {
            push("status", join(self.statuses.iter().map(Status::as_str)));
        }
        if let Some(sort) = self.sort {
            push("sort", sort.as_str().to_string());
        }
        if let Some(direction) = self.direction {
            push("sort_direction", direction.as_str().to_string());
        }
        for (key, date) in [
            ("after", self.after),
            ("before", self.before),
            ("updated_at_after", self.updated_after),
            ("updated_at_before", self.updated_before),
        ] {
            if let Some(date) = date {
                push(key, date.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
        }
        if let Some(search) = &self.search {
            push("search", search.clone());
        }
        if !self.request_types.is_empty() {
            let ids: Vec<String> = self.request_types.iter().map(i64::to_string).collect();
            push("request_types", ids.join(","));
        }
        if self.details {
            push("details", "true".to_string());
        }

        Ok(arguments)
    }
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{Address, Point};
    use crate::Error;
    use chrono::TimeZone;

    fn rendered(query: &IssuesQuery) -> Vec<String> {
        query
            .query_arguments()
            .unwrap()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }

    #[test]
    fn empty_query_sends_nothing() {
        assert!(IssuesQuery::new().query_arguments().unwrap().is_empty());
    }

    #[test]
    fn full_query() {
        let query = IssuesQuery::new()
            .location(Address::new("48219"))
            .page(2)
            .per_page(50)
            .status(Status::Open)
            .status(Status::Acknowledged)
            .sort(Order::CreatedAt, Direction::Descending)
            .created_after(Utc.with_ymd_and_hms(2017, 12, 1, 0, 0, 0).unwrap())
            .search("pothole")
            .request_type(121)
            .request_type(18605)
            .details(true);

        assert_eq!(
            rendered(&query),
            vec![
                "address=48219",
                "page=2",
                "per_page=50",
                "status=open,acknowledged",
                "sort=created_at",
                "sort_direction=DESC",
                "after=2017-12-01T00:00:00Z",
                "search=pothole",
                "request_types=121,18605",
                "details=true",
            ]
        );
    }

    #[test]
    fn per_page_is_clamped() {
        let query = IssuesQuery::new().per_page(500);
        assert_eq!(rendered(&query), vec!["per_page=100"]);
    }

    #[test]
    fn duplicate_status_sent_once() {
        let query = IssuesQuery::new().status(Status::Closed).status(Status::Closed);
        assert_eq!(rendered(&query), vec!["status=closed"]);
    }

    #[test]
    fn updated_range() {
        let query = IssuesQuery::new()
            .updated_after(Utc.with_ymd_and_hms(2018, 1, 1, 12, 30, 0).unwrap())
            .updated_before(Utc.with_ymd_and_hms(2018, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(
            rendered(&query),
            vec![
                "updated_at_after=2018-01-01T12:30:00Z",
                "updated_at_before=2018-02-01T00:00:00Z",
            ]
        );
    }

    #[test]
    fn invalid_location_fails() {
        let query = IssuesQuery::new().location(Point::new(f64::NAN, 1.0));
        assert!(matches!(
            query.query_arguments(),
            Err(Error::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn enum_display() {
        assert_eq!(Status::Archived.to_string(), "archived");
        assert_eq!(Order::Distance.to_string(), "distance");
        assert_eq!(Direction::Ascending.to_string(), "ASC");
    }
}
