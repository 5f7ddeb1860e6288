use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An identifier the API sends as either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Strinteger {
    Integer(i64),
    String(String),
}

impl Strinteger {
    /// The identifier as an integer, parsing the string form if needed.
    pub fn to_int(&self) -> Result<i64> {
        match self {
            Strinteger::Integer(value) => Ok(*value),
            Strinteger::String(value) => {
                value
                    .trim()
                    .parse()
                    .map_err(|_| Error::StrintegerConversion {
                        value: value.clone(),
                    })
            }
        }
    }
}

impl fmt::Display for Strinteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strinteger::Integer(value) => write!(f, "{}", value),
            Strinteger::String(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Strinteger {
    fn from(value: i64) -> Self {
        Strinteger::Integer(value)
    }
}

impl From<String> for Strinteger {
    fn from(value: String) -> Self {
        Strinteger::String(value)
    }
}

impl From<&str> for Strinteger {
    fn from(value: &str) -> Self {
        Strinteger::String(value.to_string())
    }
}
