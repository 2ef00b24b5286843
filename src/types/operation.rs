use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Lifecycle of an `Operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    Waiting,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Failed,
}

impl OperationState {
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationState::Waiting => "Waiting",
            OperationState::InProgress => "In_Progress",
            OperationState::Completed => "Completed",
            OperationState::Failed => "Failed",
        }
    }
}

impl FromStr for OperationState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Waiting" => Ok(OperationState::Waiting),
            "In_Progress" => Ok(OperationState::InProgress),
            "Completed" => Ok(OperationState::Completed),
            "Failed" => Ok(OperationState::Failed),
            _ => Err(ParseEnumError {
                kind: "operation state",
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of entity an `Operation` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationResourceType {
    GitopsEngineInstance,
    ManagedEnvironment,
    Application,
}

impl OperationResourceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationResourceType::GitopsEngineInstance => "GitopsEngineInstance",
            OperationResourceType::ManagedEnvironment => "ManagedEnvironment",
            OperationResourceType::Application => "Application",
        }
    }
}

impl FromStr for OperationResourceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GitopsEngineInstance" => Ok(OperationResourceType::GitopsEngineInstance),
            "ManagedEnvironment" => Ok(OperationResourceType::ManagedEnvironment),
            "Application" => Ok(OperationResourceType::Application),
            _ => Err(ParseEnumError {
                kind: "operation resource type",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse::<$ty>()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_text_enum!(OperationState);
sql_text_enum!(OperationResourceType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_state_parse() {
        assert_eq!(
            "In_Progress".parse::<OperationState>(),
            Ok(OperationState::InProgress)
        );
        assert_eq!(OperationState::InProgress.to_string(), "In_Progress");
        assert!("in_progress".parse::<OperationState>().is_err());
    }

    #[test]
    fn test_resource_type_parse() {
        assert_eq!(
            "GitopsEngineInstance".parse::<OperationResourceType>(),
            Ok(OperationResourceType::GitopsEngineInstance)
        );
        let err = "Cluster".parse::<OperationResourceType>().unwrap_err();
        assert_eq!(err.to_string(), "unrecognized operation resource type: 'Cluster'");
    }

    #[test]
    fn test_serde_uses_storage_names() {
        let json = serde_json::to_string(&OperationState::InProgress).unwrap();
        assert_eq!(json, "\"In_Progress\"");
    }
}
