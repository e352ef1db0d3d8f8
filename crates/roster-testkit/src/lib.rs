// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use roster_app::{
    ACCOUNT_SCHEMA, CONTACT_PARENT_FIELD, CONTACT_SCHEMA, FieldMap, FieldValue, GatewayError,
    ListQuery, Record, RecordGateway, RecordId, RecordSchema, STUDENT_SCHEMA, filter_records,
    sort_records,
};
use std::cell::{Cell, RefCell};
use std::time::Duration;

pub const PHONETIC_NAMES: [&str; 12] = [
    "Alice", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India", "Juliet",
    "Kilo", "Lima",
];

const INDUSTRIES: [&str; 3] = ["Energy", "Banking", "Education"];

pub fn account(row: i64, name: &str, industry: &str) -> Record {
    Record::new(RecordId::from_row(ACCOUNT_SCHEMA.key_prefix, row), FieldMap::new())
        .with("Name", FieldValue::text(name))
        .with("Industry", FieldValue::text(industry))
}

pub fn student(row: i64, name: &str, email: &str, class: Option<&str>) -> Record {
    let record = Record::new(RecordId::from_row(STUDENT_SCHEMA.key_prefix, row), FieldMap::new())
        .with("Name", FieldValue::text(name))
        .with("Email__c", FieldValue::text(email));
    match class {
        Some(class) => record.with("Class__c", FieldValue::text(class)),
        None => record,
    }
}

pub fn contact(row: i64, name: &str, account_row: Option<i64>) -> Record {
    let record = Record::new(RecordId::from_row(CONTACT_SCHEMA.key_prefix, row), FieldMap::new())
        .with("Name", FieldValue::text(name));
    match account_row {
        Some(account_row) => record.with(
            CONTACT_PARENT_FIELD,
            FieldValue::text(RecordId::from_row(ACCOUNT_SCHEMA.key_prefix, account_row).as_str()),
        ),
        None => record,
    }
}

/// Twelve accounts named "Alice".."Lima" in insertion order, industries
/// cycling Energy, Banking, Education.
pub fn phonetic_accounts() -> Vec<Record> {
    PHONETIC_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| account(index as i64 + 1, name, INDUSTRIES[index % INDUSTRIES.len()]))
        .collect()
}

/// Seven students: three in class A, two in B, one in C, one unassigned.
pub fn class_roster() -> Vec<Record> {
    vec![
        student(1, "Ada Lovelace", "ada@example.edu", Some("A")),
        student(2, "Grace Hopper", "grace@example.edu", Some("B")),
        student(3, "Alan Turing", "alan@example.edu", Some("A")),
        student(4, "Edsger Dijkstra", "edsger@example.edu", Some("C")),
        student(5, "Barbara Liskov", "barbara@example.edu", Some("B")),
        student(6, "Donald Knuth", "donald@example.edu", Some("A")),
        student(7, "Ken Thompson", "ken@example.edu", None),
    ]
}

/// Contacts of the phonetic accounts: two for Alice (row 1), one for Bravo
/// (row 2), one with no account.
pub fn account_contacts() -> Vec<Record> {
    vec![
        contact(1, "Zoe Park", Some(1)),
        contact(2, "Sam Ortiz", Some(2)),
        contact(3, "Ines Duarte", Some(1)),
        contact(4, "Lee Walsh", None),
    ]
}

pub fn names(records: &[Record]) -> Vec<String> {
    records.iter().map(Record::name).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCall {
    List,
    Create,
    Update,
    Delete,
}

/// In-memory gateway with call counters, one-shot failure injection and an
/// optional delay on list calls.
pub struct ScriptedGateway {
    schema: &'static RecordSchema,
    records: RefCell<Vec<Record>>,
    next_row: Cell<i64>,
    failures: RefCell<Vec<(GatewayCall, String)>>,
    calls: RefCell<Vec<GatewayCall>>,
    queries: RefCell<Vec<Option<ListQuery>>>,
    list_latency: Cell<Duration>,
}

impl ScriptedGateway {
    pub fn new(schema: &'static RecordSchema) -> Self {
        Self::with_records(schema, Vec::new())
    }

    pub fn with_records(schema: &'static RecordSchema, records: Vec<Record>) -> Self {
        let next_row = records
            .iter()
            .filter_map(|record| record.id.row_number(schema.key_prefix))
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            schema,
            records: RefCell::new(records),
            next_row: Cell::new(next_row),
            failures: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            queries: RefCell::new(Vec::new()),
            list_latency: Cell::new(Duration::ZERO),
        }
    }

    /// The next `call` fails with `message`; later calls succeed again.
    pub fn fail_next(&self, call: GatewayCall, message: &str) {
        self.failures.borrow_mut().push((call, message.to_owned()));
    }

    /// Every later list call blocks for `latency` before answering.
    pub fn set_list_latency(&self, latency: Duration) {
        self.list_latency.set(latency);
    }

    pub fn calls(&self, call: GatewayCall) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|recorded| **recorded == call)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn last_query(&self) -> Option<ListQuery> {
        self.queries.borrow().last().cloned().flatten()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    pub fn replace_records(&self, records: Vec<Record>) {
        *self.records.borrow_mut() = records;
    }

    fn enter(&self, call: GatewayCall) -> Result<(), GatewayError> {
        self.calls.borrow_mut().push(call);
        let mut failures = self.failures.borrow_mut();
        if let Some(index) = failures.iter().position(|(failing, _)| *failing == call) {
            let (_, message) = failures.remove(index);
            return Err(GatewayError::new(message));
        }
        Ok(())
    }
}

impl RecordGateway for ScriptedGateway {
    fn list_records(&self, query: Option<&ListQuery>) -> Result<Vec<Record>, GatewayError> {
        self.queries.borrow_mut().push(query.cloned());
        self.enter(GatewayCall::List)?;
        let latency = self.list_latency.get();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        let records = self.records.borrow();
        let Some(query) = query else {
            return Ok(records.clone());
        };
        let mut matching = filter_records(&records, self.schema, &query.search_key);
        sort_records(&mut matching, &query.sort_field, query.sort_direction);
        Ok(matching
            .into_iter()
            .skip(query.page_offset)
            .take(query.page_size)
            .collect())
    }

    fn create_record(&self, fields: &FieldMap) -> Result<Record, GatewayError> {
        self.enter(GatewayCall::Create)?;
        self.schema
            .check_required(fields)
            .map_err(|error| GatewayError::new(format!("Required fields are missing: {error}")))?;
        let row = self.next_row.get();
        self.next_row.set(row + 1);
        let record = Record::new(RecordId::from_row(self.schema.key_prefix, row), fields.clone());
        self.records.borrow_mut().push(record.clone());
        Ok(record)
    }

    fn update_record(&self, record: &Record) -> Result<(), GatewayError> {
        self.enter(GatewayCall::Update)?;
        let mut records = self.records.borrow_mut();
        let existing = records
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or_else(|| GatewayError::new(format!("entity {} is deleted", record.id)))?;
        *existing = record.clone();
        Ok(())
    }

    fn delete_record(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.enter(GatewayCall::Delete)?;
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|record| &record.id != id);
        if records.len() == before {
            return Err(GatewayError::new(format!("entity {id} is deleted")));
        }
        Ok(())
    }
}
