// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    FieldDescriptor, GatewayError, ListQuery, LoadState, Notification, Notifier, PageReference,
    PagingMode, Record, RecordGateway, RecordId, RecordSchema, Refresh, SortDirection, ViewError,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub mode: PagingMode,
    pub page_size: usize,
    pub load_timeout: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            mode: PagingMode::Client,
            page_size: DEFAULT_PAGE_SIZE,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

/// Handle for one issued load. Only the most recently issued ticket may
/// apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    token: u64,
    query: Option<ListQuery>,
}

impl LoadTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn query(&self) -> Option<&ListQuery> {
        self.query.as_ref()
    }
}

/// Search, sort and page the visible rows were produced with.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AppliedView {
    search_key: String,
    sort_field: &'static str,
    sort_direction: SortDirection,
    page_index: usize,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    token: u64,
    started_at: Instant,
}

/// Records whose searchable fields contain `key`, ignoring case. An empty
/// key keeps everything.
pub fn filter_records(records: &[Record], schema: &RecordSchema, key: &str) -> Vec<Record> {
    if key.is_empty() {
        return records.to_vec();
    }
    let needle = key.to_lowercase();
    records
        .iter()
        .filter(|record| {
            schema
                .searchable_fields()
                .any(|field| record.display_value(field.name).to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Stable sort on the lowercased stringified value of `field`.
pub fn sort_records(records: &mut [Record], field: &str, direction: SortDirection) {
    records.sort_by(|left, right| {
        let order = compare_field(left, right, field);
        match direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        }
    });
}

fn compare_field(left: &Record, right: &Record, field: &str) -> Ordering {
    left.display_value(field)
        .to_lowercase()
        .cmp(&right.display_value(field).to_lowercase())
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Slice of `records` shown on 1-based `page_index`.
pub fn page_slice(records: &[Record], page_index: usize, page_size: usize) -> &[Record] {
    let start = page_index
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(records.len());
    let end = start.saturating_add(page_size).min(records.len());
    &records[start..end]
}

/// Searchable, sortable, paginated view over one gateway's records.
pub struct ListViewModel<G> {
    gateway: G,
    schema: &'static RecordSchema,
    options: ListOptions,
    master: Vec<Record>,
    search_key: String,
    sort_field: &'static str,
    sort_direction: SortDirection,
    page_index: usize,
    page: Vec<Record>,
    filtered_count: usize,
    server_has_next: bool,
    state: LoadState,
    error: Option<ViewError>,
    editing: Option<Record>,
    selected: Option<Record>,
    applied: AppliedView,
    last_token: u64,
    in_flight: Option<InFlight>,
    notifier: Option<Notifier>,
}

impl<G: RecordGateway> ListViewModel<G> {
    pub fn new(gateway: G, schema: &'static RecordSchema, options: ListOptions) -> Self {
        let options = ListOptions {
            page_size: options.page_size.max(1),
            ..options
        };
        Self {
            gateway,
            schema,
            options,
            master: Vec::new(),
            search_key: String::new(),
            sort_field: schema.default_sort,
            sort_direction: SortDirection::Asc,
            page_index: 1,
            page: Vec::new(),
            filtered_count: 0,
            server_has_next: false,
            state: LoadState::Idle,
            error: None,
            editing: None,
            selected: None,
            applied: AppliedView {
                search_key: String::new(),
                sort_field: schema.default_sort,
                sort_direction: SortDirection::Asc,
                page_index: 1,
            },
            last_token: 0,
            in_flight: None,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn columns(&self) -> &'static [FieldDescriptor] {
        self.schema.fields
    }

    pub fn mode(&self) -> PagingMode {
        self.options.mode
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Cached result of the last successful load.
    pub fn records(&self) -> &[Record] {
        &self.master
    }

    /// Derived page currently visible.
    pub fn page(&self) -> &[Record] {
        &self.page
    }

    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    pub fn sort(&self) -> (&'static str, SortDirection) {
        (self.sort_field, self.sort_direction)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.options.page_size
    }

    /// Records matching the current search. In server mode only the current
    /// page is known.
    pub fn filtered_count(&self) -> usize {
        self.filtered_count
    }

    /// Page count, known only when pages are derived locally.
    pub fn total_pages(&self) -> Option<usize> {
        match self.options.mode {
            PagingMode::Client => Some(total_pages(self.filtered_count, self.page_size())),
            PagingMode::Server => None,
        }
    }

    pub fn has_next_page(&self) -> bool {
        match self.options.mode {
            PagingMode::Client => {
                self.page_index < total_pages(self.filtered_count, self.page_size())
            }
            PagingMode::Server => self.server_has_next,
        }
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 1
    }

    pub fn empty_notice(&self) -> Option<String> {
        (self.state == LoadState::Ready && self.page.is_empty())
            .then(|| format!("No {} found.", self.schema.plural_label))
    }

    pub fn editing(&self) -> Option<&Record> {
        self.editing.as_ref()
    }

    pub fn selected(&self) -> Option<&Record> {
        self.selected.as_ref()
    }

    pub fn is_modal_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn current_query(&self) -> ListQuery {
        ListQuery {
            search_key: self.search_key.clone(),
            sort_field: self.sort_field.to_owned(),
            sort_direction: self.sort_direction,
            page_offset: (self.page_index - 1) * self.page_size(),
            page_size: self.page_size(),
        }
    }

    /// Marks the list as loading and hands out the ticket the result must be
    /// applied with. Any earlier ticket becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.last_token += 1;
        let token = self.last_token;
        self.in_flight = Some(InFlight {
            token,
            started_at: Instant::now(),
        });
        self.state = LoadState::Loading;
        let query = match self.options.mode {
            PagingMode::Client => None,
            PagingMode::Server => Some(self.current_query()),
        };
        debug!(
            object = self.schema.object_api_name,
            token,
            mode = self.options.mode.as_str(),
            "list load issued"
        );
        LoadTicket { token, query }
    }

    /// Applies a gateway result. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Record>, GatewayError>,
    ) -> bool {
        let current = self.in_flight.is_some_and(|in_flight| in_flight.token == ticket.token);
        if !current {
            debug!(
                object = self.schema.object_api_name,
                token = ticket.token,
                latest = self.last_token,
                "discarding stale list response"
            );
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(records) => {
                debug!(
                    object = self.schema.object_api_name,
                    token = ticket.token,
                    rows = records.len(),
                    "list load applied"
                );
                self.server_has_next = self.options.mode == PagingMode::Server
                    && records.len() == self.page_size();
                self.master = records;
                self.error = None;
                self.state = LoadState::Ready;
                self.recompute();
                self.applied = self.current_view();
            }
            Err(error) => {
                warn!(
                    object = self.schema.object_api_name,
                    token = ticket.token,
                    %error,
                    "list load failed"
                );
                self.fail_load(ViewError::Gateway(error));
            }
        }
        true
    }

    /// Runs one load to completion. A gateway that answers after
    /// `load_timeout` counts as timed out and its rows are dropped.
    pub fn load(&mut self) {
        let ticket = self.begin_load();
        let result = self.gateway.list_records(ticket.query());
        if self.expire_overdue(Instant::now()) {
            return;
        }
        self.finish_load(ticket, result);
    }

    /// Reloads with the last used parameters.
    pub fn refresh(&mut self) {
        self.load();
    }

    /// Fails an outstanding load that has run past the configured timeout.
    /// A response arriving afterwards is discarded.
    pub fn expire_overdue(&mut self, now: Instant) -> bool {
        let Some(in_flight) = self.in_flight else {
            return false;
        };
        if now.saturating_duration_since(in_flight.started_at) < self.options.load_timeout {
            return false;
        }
        warn!(
            object = self.schema.object_api_name,
            token = in_flight.token,
            "list load timed out"
        );
        self.in_flight = None;
        self.fail_load(ViewError::Timeout {
            timeout: self.options.load_timeout,
        });
        true
    }

    pub fn set_search_key(&mut self, key: impl Into<String>) {
        self.search_key = key.into();
        self.page_index = 1;
        self.apply_change();
    }

    pub fn set_sort(&mut self, field: &str, direction: SortDirection) -> Result<(), ViewError> {
        let field = self.schema.sortable_field(field)?;
        self.sort_field = field.name;
        self.sort_direction = direction;
        self.apply_change();
        Ok(())
    }

    /// Returns whether the visible page moved. A failed server fetch leaves
    /// the list on the page it was showing.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        let from = self.page_index;
        self.page_index += 1;
        self.apply_change();
        self.page_index != from
    }

    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous_page() {
            return false;
        }
        let from = self.page_index;
        self.page_index -= 1;
        self.apply_change();
        self.page_index != from
    }

    /// Snapshots a cached record for editing. Unknown ids are ignored.
    pub fn begin_edit(&mut self, id: &RecordId) -> bool {
        let Some(record) = self.find(id) else {
            debug!(object = self.schema.object_api_name, %id, "edit target not found");
            return false;
        };
        self.editing = Some(record.clone());
        true
    }

    /// Updates one field of the edit snapshot from raw input.
    pub fn set_edit_field(&mut self, name: &str, raw: &str) -> Result<bool, ViewError> {
        let field = self.schema.require_field(name)?;
        let value = field.parse_input(raw)?;
        let Some(editing) = self.editing.as_mut() else {
            return Ok(false);
        };
        match value {
            Some(value) => {
                editing.fields.insert(field.name.to_owned(), value);
            }
            None => {
                editing.fields.remove(field.name);
            }
        }
        Ok(true)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.editing.take().is_some()
    }

    /// Sends the edit snapshot to the gateway. The snapshot survives any
    /// failure.
    pub fn commit_edit(&mut self) -> Result<(), ViewError> {
        let Some(record) = self.editing.as_ref() else {
            return Err(self.surface(ViewError::NoEdit));
        };
        if let Err(error) = self.schema.check_required(&record.fields) {
            return Err(self.surface(error.into()));
        }
        let id = record.id.clone();
        if let Err(error) = self.gateway.update_record(record) {
            return Err(self.surface(error.into()));
        }

        info!(object = self.schema.object_api_name, %id, "record updated");
        self.editing = None;
        self.error = None;
        self.emit(Notification::RecordUpdated);
        self.load();
        Ok(())
    }

    pub fn delete(&mut self, id: &RecordId) -> Result<(), ViewError> {
        if self.find(id).is_none() {
            return Err(self.surface(ViewError::NotFound { id: id.clone() }));
        }
        if let Err(error) = self.gateway.delete_record(id) {
            return Err(self.surface(error.into()));
        }

        info!(object = self.schema.object_api_name, %id, "record deleted");
        if self.selected.as_ref().is_some_and(|record| &record.id == id) {
            self.selected = None;
        }
        if self.editing.as_ref().is_some_and(|record| &record.id == id) {
            self.editing = None;
        }
        self.error = None;
        self.emit(Notification::RecordDeleted);
        self.load();
        Ok(())
    }

    pub fn open_details(&mut self, id: &RecordId) -> bool {
        let Some(record) = self.find(id) else {
            return false;
        };
        self.selected = Some(record.clone());
        true
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    /// Navigation target for the record shown in the details modal.
    pub fn record_page(&self) -> Option<PageReference> {
        self.selected
            .as_ref()
            .map(|record| PageReference::record_view(self.schema, record.id.clone()))
    }

    fn find(&self, id: &RecordId) -> Option<&Record> {
        self.master.iter().find(|record| &record.id == id)
    }

    fn apply_change(&mut self) {
        match self.options.mode {
            PagingMode::Client => self.recompute(),
            PagingMode::Server => self.load(),
        }
    }

    fn current_view(&self) -> AppliedView {
        AppliedView {
            search_key: self.search_key.clone(),
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            page_index: self.page_index,
        }
    }

    /// In server mode the rows on screen still belong to the last applied
    /// query, so the parameters go back to it.
    fn fail_load(&mut self, error: ViewError) {
        self.error = Some(error);
        self.state = LoadState::Error;
        if self.options.mode == PagingMode::Server && self.current_view() != self.applied {
            debug!(
                object = self.schema.object_api_name,
                page_index = self.applied.page_index,
                "restoring last applied list parameters"
            );
            let applied = self.applied.clone();
            self.search_key = applied.search_key;
            self.sort_field = applied.sort_field;
            self.sort_direction = applied.sort_direction;
            self.page_index = applied.page_index;
        }
    }

    fn recompute(&mut self) {
        match self.options.mode {
            PagingMode::Server => {
                self.filtered_count = self.master.len();
                self.page = self.master.clone();
            }
            PagingMode::Client => {
                let mut filtered = filter_records(&self.master, self.schema, &self.search_key);
                sort_records(&mut filtered, self.sort_field, self.sort_direction);
                self.filtered_count = filtered.len();
                let pages = total_pages(filtered.len(), self.page_size());
                self.page_index = self.page_index.clamp(1, pages);
                self.page = page_slice(&filtered, self.page_index, self.page_size()).to_vec();
            }
        }
    }

    fn surface(&mut self, error: ViewError) -> ViewError {
        warn!(object = self.schema.object_api_name, %error, "list action failed");
        self.error = Some(error.clone());
        error
    }

    fn emit(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            notifier.emit(notification);
        }
    }
}

impl<G: RecordGateway> Refresh for ListViewModel<G> {
    fn refresh(&mut self) {
        ListViewModel::refresh(self);
    }
}
