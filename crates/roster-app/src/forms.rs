// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{
    FieldMap, Notification, Notifier, Record, RecordGateway, RecordSchema, ValidationError,
    ViewError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
    Info,
}

impl ToastVariant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_owned(),
            message: message.into(),
            variant: ToastVariant::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_owned(),
            message: message.into(),
            variant: ToastVariant::Error,
        }
    }
}

/// Creation form bound to one gateway.
pub struct FormViewModel<G> {
    gateway: G,
    schema: &'static RecordSchema,
    values: BTreeMap<&'static str, String>,
    toasts: Vec<Toast>,
    error: Option<ViewError>,
    notifier: Option<Notifier>,
}

impl<G: RecordGateway> FormViewModel<G> {
    pub fn new(gateway: G, schema: &'static RecordSchema) -> Self {
        Self {
            gateway,
            schema,
            values: blank_values(schema),
            toasts: Vec::new(),
            error: None,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }

    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let field = self.schema.require_field(name)?;
        self.values.insert(field.name, value.into());
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(String::is_empty)
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    /// Validates and creates the record. On failure every typed value is
    /// kept and no notification goes out.
    pub fn submit(&mut self) -> Result<Record, ViewError> {
        let fields = match self.build_fields() {
            Ok(fields) => fields,
            Err(error) => return Err(self.fail(error.into())),
        };

        let created = match self.gateway.create_record(&fields) {
            Ok(created) => created,
            Err(error) => return Err(self.fail(error.into())),
        };

        info!(
            object = self.schema.object_api_name,
            id = %created.id,
            "record created"
        );
        self.values = blank_values(self.schema);
        self.error = None;
        self.toasts.push(Toast::success(format!(
            "{} created successfully: {}",
            self.schema.label,
            created.name()
        )));
        if let Some(notifier) = &self.notifier {
            notifier.emit(Notification::RecordCreated);
        }
        Ok(created)
    }

    fn build_fields(&self) -> Result<FieldMap, ValidationError> {
        let mut fields = FieldMap::new();
        for field in self.schema.fields {
            let raw = self.values.get(field.name).map_or("", String::as_str);
            if let Some(value) = field.parse_input(raw)? {
                fields.insert(field.name.to_owned(), value);
            }
        }
        self.schema.check_required(&fields)?;
        Ok(fields)
    }

    fn fail(&mut self, error: ViewError) -> ViewError {
        warn!(object = self.schema.object_api_name, %error, "form submit failed");
        self.toasts.push(Toast::error(error.to_string()));
        self.error = Some(error.clone());
        error
    }
}

fn blank_values(schema: &'static RecordSchema) -> BTreeMap<&'static str, String> {
    schema
        .fields
        .iter()
        .map(|field| (field.name, String::new()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{FormViewModel, ToastVariant};
    use crate::{
        ACCOUNT_SCHEMA, FieldMap, FieldValue, GatewayError, ListQuery, Record, RecordGateway,
        RecordId, STUDENT_SCHEMA, ValidationError, ViewError,
    };
    use std::cell::RefCell;

    #[derive(Default)]
    struct EchoGateway {
        created: RefCell<Vec<FieldMap>>,
        reject_with: Option<&'static str>,
    }

    impl RecordGateway for EchoGateway {
        fn list_records(&self, _query: Option<&ListQuery>) -> Result<Vec<Record>, GatewayError> {
            Ok(Vec::new())
        }

        fn create_record(&self, fields: &FieldMap) -> Result<Record, GatewayError> {
            if let Some(message) = self.reject_with {
                return Err(GatewayError::new(message));
            }
            self.created.borrow_mut().push(fields.clone());
            Ok(Record::new(RecordId::from_row("001", 1), fields.clone()))
        }

        fn update_record(&self, _record: &Record) -> Result<(), GatewayError> {
            Ok(())
        }

        fn delete_record(&self, _id: &RecordId) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut form = FormViewModel::new(EchoGateway::default(), &STUDENT_SCHEMA);
        assert!(matches!(
            form.set_field("classValue", "A"),
            Err(ValidationError::UnknownField { .. })
        ));
    }

    #[test]
    fn number_fields_are_parsed_and_blank_optionals_omitted() {
        let gateway = EchoGateway::default();
        let mut form = FormViewModel::new(&gateway, &ACCOUNT_SCHEMA);
        form.set_field("Name", "Acme").expect("set name");
        form.set_field("NumberOfEmployees", "250").expect("set employees");

        form.submit().expect("submit succeeds");

        let created = gateway.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(
            created[0].get("NumberOfEmployees"),
            Some(&FieldValue::Number(250.0))
        );
        assert!(!created[0].contains_key("Phone"));
    }

    #[test]
    fn non_numeric_input_blocks_submission() {
        let gateway = EchoGateway::default();
        let mut form = FormViewModel::new(&gateway, &ACCOUNT_SCHEMA);
        form.set_field("Name", "Acme").expect("set name");
        form.set_field("NumberOfEmployees", "many").expect("set employees");

        let error = form.submit().expect_err("bad number should fail");
        assert!(matches!(
            error,
            ViewError::Validation(ValidationError::NotANumber { .. })
        ));
        assert!(gateway.created.borrow().is_empty());
        assert_eq!(form.field("NumberOfEmployees"), Some("many"));
    }

    #[test]
    fn success_toast_names_the_created_record() {
        let mut form = FormViewModel::new(EchoGateway::default(), &ACCOUNT_SCHEMA);
        form.set_field("Name", "Acme").expect("set name");
        form.submit().expect("submit succeeds");

        let toasts = form.take_toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].variant, ToastVariant::Success);
        assert_eq!(toasts[0].message, "Account created successfully: Acme");
        assert!(form.take_toasts().is_empty());
        assert!(form.is_blank());
    }

    #[test]
    fn gateway_rejection_surfaces_message_and_keeps_fields() {
        let gateway = EchoGateway {
            reject_with: Some("duplicate value found"),
            ..EchoGateway::default()
        };
        let mut form = FormViewModel::new(&gateway, &STUDENT_SCHEMA);
        form.set_field("Name", "Ada").expect("set name");
        form.set_field("Email__c", "ada@example.com").expect("set email");

        let error = form.submit().expect_err("gateway rejects");
        assert_eq!(error.to_string(), "duplicate value found");
        assert_eq!(form.field("Name"), Some("Ada"));
        assert_eq!(form.field("Email__c"), Some("ada@example.com"));

        let toasts = form.take_toasts();
        assert_eq!(toasts[0].variant, ToastVariant::Error);
        assert_eq!(toasts[0].title, "Error");
        assert_eq!(toasts[0].message, "duplicate value found");
    }
}
