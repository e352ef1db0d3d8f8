// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, warn};

use crate::{
    LoadState, Record, RecordGateway, RecordId, RecordSchema, Refresh, SortDirection,
    ValidationError, ViewError, sort_records,
};

/// Child records of whichever parent is selected in another view, e.g. the
/// contacts of the account open in the details modal.
pub struct RelatedListViewModel<G> {
    gateway: G,
    schema: &'static RecordSchema,
    parent_field: &'static str,
    parent: Option<RecordId>,
    records: Vec<Record>,
    state: LoadState,
    error: Option<ViewError>,
}

impl<G: RecordGateway> RelatedListViewModel<G> {
    pub fn new(
        gateway: G,
        schema: &'static RecordSchema,
        parent_field: &str,
    ) -> Result<Self, ValidationError> {
        let parent_field = schema.require_field(parent_field)?.name;
        Ok(Self {
            gateway,
            schema,
            parent_field,
            parent: None,
            records: Vec::new(),
            state: LoadState::Idle,
            error: None,
        })
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn parent(&self) -> Option<&RecordId> {
        self.parent.as_ref()
    }

    /// Sorted by the child schema's default sort field.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn empty_notice(&self) -> Option<String> {
        (self.state == LoadState::Ready && self.records.is_empty())
            .then(|| format!("No related {}.", self.schema.plural_label))
    }

    /// Follows a selection. Returns `true` when a fetch was issued; the same
    /// parent already loaded is left alone.
    pub fn set_parent(&mut self, selected: Option<&Record>) -> bool {
        let next = selected.map(|record| record.id.clone());
        if next == self.parent && self.state == LoadState::Ready {
            return false;
        }
        if next != self.parent {
            self.records.clear();
        }
        self.parent = next;
        if self.parent.is_none() {
            self.state = LoadState::Idle;
            self.error = None;
            return false;
        }
        self.load();
        true
    }

    pub fn load(&mut self) {
        let Some(parent) = self.parent.as_ref() else {
            return;
        };
        self.state = LoadState::Loading;
        match self.gateway.list_children(self.parent_field, parent) {
            Ok(mut records) => {
                sort_records(&mut records, self.schema.default_sort, SortDirection::Asc);
                debug!(
                    object = self.schema.object_api_name,
                    %parent,
                    rows = records.len(),
                    "related records loaded"
                );
                self.records = records;
                self.error = None;
                self.state = LoadState::Ready;
            }
            Err(error) => {
                warn!(
                    object = self.schema.object_api_name,
                    %parent,
                    %error,
                    "related records failed to load"
                );
                self.error = Some(ViewError::Gateway(error));
                self.state = LoadState::Error;
            }
        }
    }
}

impl<G: RecordGateway> Refresh for RelatedListViewModel<G> {
    fn refresh(&mut self) {
        self.load();
    }
}
