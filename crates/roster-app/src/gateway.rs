// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::rc::Rc;

use crate::{FieldMap, GatewayError, ListQuery, Record, RecordId};

/// Remote create/read/update/delete boundary for one record type.
///
/// `list_records(None)` returns the whole set; with a query the gateway
/// applies search, sort and pagination itself and returns one page.
pub trait RecordGateway {
    fn list_records(&self, query: Option<&ListQuery>) -> Result<Vec<Record>, GatewayError>;
    fn create_record(&self, fields: &FieldMap) -> Result<Record, GatewayError>;
    fn update_record(&self, record: &Record) -> Result<(), GatewayError>;
    fn delete_record(&self, id: &RecordId) -> Result<(), GatewayError>;

    /// Records whose `parent_field` holds `parent`. The default scans the
    /// whole set.
    fn list_children(
        &self,
        parent_field: &str,
        parent: &RecordId,
    ) -> Result<Vec<Record>, GatewayError> {
        Ok(self
            .list_records(None)?
            .into_iter()
            .filter(|record| record.display_value(parent_field) == parent.as_str())
            .collect())
    }
}

impl<G: RecordGateway + ?Sized> RecordGateway for Rc<G> {
    fn list_records(&self, query: Option<&ListQuery>) -> Result<Vec<Record>, GatewayError> {
        (**self).list_records(query)
    }

    fn create_record(&self, fields: &FieldMap) -> Result<Record, GatewayError> {
        (**self).create_record(fields)
    }

    fn update_record(&self, record: &Record) -> Result<(), GatewayError> {
        (**self).update_record(record)
    }

    fn delete_record(&self, id: &RecordId) -> Result<(), GatewayError> {
        (**self).delete_record(id)
    }

    fn list_children(
        &self,
        parent_field: &str,
        parent: &RecordId,
    ) -> Result<Vec<Record>, GatewayError> {
        (**self).list_children(parent_field, parent)
    }
}

impl<G: RecordGateway + ?Sized> RecordGateway for &G {
    fn list_records(&self, query: Option<&ListQuery>) -> Result<Vec<Record>, GatewayError> {
        (**self).list_records(query)
    }

    fn create_record(&self, fields: &FieldMap) -> Result<Record, GatewayError> {
        (**self).create_record(fields)
    }

    fn update_record(&self, record: &Record) -> Result<(), GatewayError> {
        (**self).update_record(record)
    }

    fn delete_record(&self, id: &RecordId) -> Result<(), GatewayError> {
        (**self).delete_record(id)
    }

    fn list_children(
        &self,
        parent_field: &str,
        parent: &RecordId,
    ) -> Result<Vec<Record>, GatewayError> {
        (**self).list_children(parent_field, parent)
    }
}
