// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-style record identifier: a three character key prefix followed by
/// a zero-padded row number, fifteen characters in total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_row(key_prefix: &str, row: i64) -> Self {
        Self(format!("{key_prefix}{row:0>12}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Row number encoded after `key_prefix`, if the id carries that prefix.
    pub fn row_number(&self, key_prefix: &str) -> Option<i64> {
        self.0.strip_prefix(key_prefix)?.parse().ok()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
