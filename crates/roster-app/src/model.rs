// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{RecordId, ValidationError};

pub const NAME_FIELD: &str = "Name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Stringified form used for display, search and sort.
    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => format_number(*value),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn with(mut self, field: &str, value: FieldValue) -> Self {
        self.fields.insert(field.to_owned(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Stringified value of `field`; missing values read as the empty string.
    pub fn display_value(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(FieldValue::display)
            .unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.display_value(NAME_FIELD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub sortable: bool,
    pub searchable: bool,
    pub required: bool,
}

impl FieldDescriptor {
    const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            sortable: false,
            searchable: false,
            required: false,
        }
    }

    const fn number(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Number,
            ..Self::text(name, label)
        }
    }

    const fn sortable(self) -> Self {
        Self {
            sortable: true,
            ..self
        }
    }

    const fn searchable(self) -> Self {
        Self {
            searchable: true,
            ..self
        }
    }

    const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Parses raw input for this field. Empty input yields `None`.
    pub fn parse_input(&self, raw: &str) -> Result<Option<FieldValue>, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match self.kind {
            FieldKind::Text => Ok(Some(FieldValue::Text(raw.to_owned()))),
            FieldKind::Number => trimmed
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(|value| Some(FieldValue::Number(value)))
                .ok_or_else(|| ValidationError::NotANumber {
                    field: self.name.to_owned(),
                    label: self.label.to_owned(),
                    value: raw.to_owned(),
                }),
        }
    }
}

/// Fixed field layout of one record type exposed by the gateway.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub object_api_name: &'static str,
    pub label: &'static str,
    pub plural_label: &'static str,
    pub key_prefix: &'static str,
    pub default_sort: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl RecordSchema {
    pub fn all() -> [&'static Self; 3] {
        [&ACCOUNT_SCHEMA, &STUDENT_SCHEMA, &CONTACT_SCHEMA]
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn require_field(&self, name: &str) -> Result<&'static FieldDescriptor, ValidationError> {
        self.field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                object: self.object_api_name.to_owned(),
                field: name.to_owned(),
            })
    }

    pub fn searchable_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> + use<> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().filter(|field| field.searchable)
    }

    pub fn sortable_field(&self, name: &str) -> Result<&'static FieldDescriptor, ValidationError> {
        let field = self.require_field(name)?;
        if !field.sortable {
            return Err(ValidationError::NotSortable {
                field: field.name.to_owned(),
                label: field.label.to_owned(),
            });
        }
        Ok(field)
    }

    /// First required field missing from `fields`, if any.
    pub fn check_required(&self, fields: &FieldMap) -> Result<(), ValidationError> {
        for field in self.fields.iter().filter(|field| field.required) {
            let present = fields
                .get(field.name)
                .is_some_and(|value| !value.display().trim().is_empty());
            if !present {
                return Err(ValidationError::Required {
                    field: field.name.to_owned(),
                    label: field.label.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Looks a schema up by API name or plural label, ignoring case.
    pub fn lookup(name: &str) -> Option<&'static Self> {
        Self::all().into_iter().find(|schema| {
            schema.object_api_name.eq_ignore_ascii_case(name)
                || schema.plural_label.eq_ignore_ascii_case(name)
        })
    }
}

pub static ACCOUNT_SCHEMA: RecordSchema = RecordSchema {
    object_api_name: "Account",
    label: "Account",
    plural_label: "accounts",
    key_prefix: "001",
    default_sort: NAME_FIELD,
    fields: &[
        FieldDescriptor::text(NAME_FIELD, "Account Name")
            .sortable()
            .searchable()
            .required(),
        FieldDescriptor::text("Industry", "Industry")
            .sortable()
            .searchable(),
        FieldDescriptor::text("Phone", "Phone"),
        FieldDescriptor::text("Website", "Website"),
        FieldDescriptor::number("NumberOfEmployees", "Employees"),
    ],
};

pub static STUDENT_SCHEMA: RecordSchema = RecordSchema {
    object_api_name: "Student__c",
    label: "Student",
    plural_label: "students",
    key_prefix: "a00",
    default_sort: NAME_FIELD,
    fields: &[
        FieldDescriptor::text(NAME_FIELD, "Name")
            .sortable()
            .searchable()
            .required(),
        FieldDescriptor::text("Email__c", "Email")
            .sortable()
            .searchable(),
        FieldDescriptor::text("Class__c", "Class").sortable(),
        FieldDescriptor::text("Phone__c", "Phone"),
    ],
};

/// Field on a contact naming the account it belongs to.
pub const CONTACT_PARENT_FIELD: &str = "AccountId";

pub static CONTACT_SCHEMA: RecordSchema = RecordSchema {
    object_api_name: "Contact",
    label: "Contact",
    plural_label: "contacts",
    key_prefix: "003",
    default_sort: NAME_FIELD,
    fields: &[
        FieldDescriptor::text(NAME_FIELD, "Name")
            .sortable()
            .searchable()
            .required(),
        FieldDescriptor::text("Title", "Title").sortable(),
        FieldDescriptor::text("Email", "Email").searchable(),
        FieldDescriptor::text("Phone", "Phone"),
        FieldDescriptor::text(CONTACT_PARENT_FIELD, "Account"),
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Where search, sort and pagination are computed. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PagingMode {
    /// Fetch the whole set once and derive pages in memory.
    #[default]
    Client,
    /// Send search/sort/page parameters with every fetch.
    Server,
}

impl PagingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Self::Client),
            "server" => Some(Self::Server),
            _ => None,
        }
    }
}

/// Server-side list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search_key: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub page_offset: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Error,
}

#[cfg(test)]
mod tests {
    use super::{
        ACCOUNT_SCHEMA, CONTACT_SCHEMA, FieldMap, FieldValue, PagingMode, Record, RecordSchema,
        STUDENT_SCHEMA, SortDirection,
    };
    use crate::ValidationError;

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(FieldValue::Number(250.0).display(), "250");
        assert_eq!(FieldValue::Number(2.5).display(), "2.5");
        assert_eq!(FieldValue::text("Acme").display(), "Acme");
    }

    #[test]
    fn missing_field_displays_as_empty() {
        let record = Record::new("001000000000001", FieldMap::new());
        assert_eq!(record.display_value("Industry"), "");
    }

    #[test]
    fn number_field_rejects_non_numeric_input() {
        let field = ACCOUNT_SCHEMA
            .field("NumberOfEmployees")
            .expect("employees field");
        assert_eq!(
            field.parse_input(" 120 ").expect("numeric input"),
            Some(FieldValue::Number(120.0))
        );
        assert!(matches!(
            field.parse_input("lots"),
            Err(ValidationError::NotANumber { .. })
        ));
        assert_eq!(field.parse_input("   ").expect("blank input"), None);
    }

    #[test]
    fn text_field_keeps_raw_input() {
        let field = ACCOUNT_SCHEMA.field("Phone").expect("phone field");
        assert_eq!(
            field.parse_input(" 555-0100").expect("text input"),
            Some(FieldValue::text(" 555-0100"))
        );
    }

    #[test]
    fn check_required_flags_blank_name() {
        let mut fields = FieldMap::new();
        fields.insert("Name".to_owned(), FieldValue::text("  "));
        let error = STUDENT_SCHEMA
            .check_required(&fields)
            .expect_err("blank name should fail");
        assert_eq!(error.to_string(), "Name is required");
    }

    #[test]
    fn sortable_field_rejects_plain_columns() {
        assert!(ACCOUNT_SCHEMA.sortable_field("Industry").is_ok());
        assert!(matches!(
            ACCOUNT_SCHEMA.sortable_field("Phone"),
            Err(ValidationError::NotSortable { .. })
        ));
        assert!(matches!(
            ACCOUNT_SCHEMA.sortable_field("Revenue"),
            Err(ValidationError::UnknownField { .. })
        ));
    }

    #[test]
    fn lookup_accepts_api_name_and_plural() {
        assert_eq!(RecordSchema::lookup("account"), Some(&ACCOUNT_SCHEMA));
        assert_eq!(RecordSchema::lookup("Students"), Some(&STUDENT_SCHEMA));
        assert_eq!(RecordSchema::lookup("Contact"), Some(&CONTACT_SCHEMA));
        assert_eq!(RecordSchema::lookup("opportunities"), None);
    }

    #[test]
    fn enum_parsing() {
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::parse("up"), None);
        assert_eq!(PagingMode::parse("server"), Some(PagingMode::Server));
        assert_eq!(PagingMode::default(), PagingMode::Client);
    }
}
