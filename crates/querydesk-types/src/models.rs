use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a submitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

impl QueryStatus {
    pub const ALL: [QueryStatus; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }

    /// Human-facing label for dashboards.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for QueryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            // Older forms posted underscored values.
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A help request submitted by a guest or a logged-in student.
///
/// Guest and student submissions share this one entity; `student_id` is
/// `None` for guests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: QueryStatus,
    pub response: Option<String>,
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Admin account. The raw password is never held here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_stored_values() {
        for status in QueryStatus::ALL {
            assert_eq!(status.as_str().parse::<QueryStatus>().unwrap(), status);
        }
        assert_eq!("in_progress".parse::<QueryStatus>().unwrap(), QueryStatus::InProgress);
        assert!("closed".parse::<QueryStatus>().is_err());
    }

    #[test]
    fn query_serializes_status_in_kebab_case() {
        let query = Query {
            id: 7,
            name: "Ann".into(),
            email: "ann@x.com".into(),
            message: "Help".into(),
            status: QueryStatus::InProgress,
            response: None,
            student_id: None,
            created_at: DateTime::<Utc>::default(),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["response"], serde_json::Value::Null);
        assert_eq!(json["id"], 7);
    }
}
