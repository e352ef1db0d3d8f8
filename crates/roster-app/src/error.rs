// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;
use thiserror::Error;

use crate::RecordId;

/// Local input problem caught before anything reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{label} is required")]
    Required { field: String, label: String },
    #[error("{label} must be a number, got {value:?}")]
    NotANumber {
        field: String,
        label: String,
        value: String,
    },
    #[error("{object} has no field named {field:?}")]
    UnknownField { object: String, field: String },
    #[error("{label} is not sortable")]
    NotSortable { field: String, label: String },
}

/// A remote operation was rejected (network, permission, server validation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("record {id} is not in the current list -- reload and retry")]
    NotFound { id: RecordId },
    #[error("no edit in progress")]
    NoEdit,
    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}
