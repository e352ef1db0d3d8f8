// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use roster_app::{
    ACCOUNT_SCHEMA, FieldValue, FormViewModel, ListOptions, ListViewModel, RecordId,
    RefreshCoordinator, STUDENT_SCHEMA, ToastVariant, ValidationError, ViewError,
};
use roster_testkit::{GatewayCall, ScriptedGateway, names, phonetic_accounts};
use std::cell::RefCell;
use std::rc::Rc;

type AccountList = ListViewModel<Rc<ScriptedGateway>>;

fn accounts() -> Rc<ScriptedGateway> {
    Rc::new(ScriptedGateway::with_records(
        &ACCOUNT_SCHEMA,
        phonetic_accounts(),
    ))
}

fn loaded_list(gateway: &Rc<ScriptedGateway>) -> AccountList {
    let mut list = ListViewModel::new(Rc::clone(gateway), &ACCOUNT_SCHEMA, ListOptions::default());
    list.load();
    list
}

fn id_of(list: &AccountList, name: &str) -> RecordId {
    list.records()
        .iter()
        .find(|record| record.name() == name)
        .map(|record| record.id.clone())
        .expect("fixture record present")
}

#[test]
fn edit_commit_updates_and_reloads() {
    let gateway = accounts();
    let mut coordinator = RefreshCoordinator::new();
    let mut list = loaded_list(&gateway).with_notifier(coordinator.notifier());
    let id = id_of(&list, "Charlie");

    assert!(list.begin_edit(&id));
    assert!(list.set_edit_field("Industry", "Retail").expect("known field"));
    list.set_edit_field("NumberOfEmployees", "42")
        .expect("numeric input");
    list.commit_edit().expect("commit succeeds");

    assert!(list.editing().is_none());
    assert_eq!(gateway.calls(GatewayCall::Update), 1);
    assert_eq!(gateway.calls(GatewayCall::List), 2);
    let updated = list
        .records()
        .iter()
        .find(|record| record.id == id)
        .expect("updated record listed");
    assert_eq!(updated.display_value("Industry"), "Retail");
    assert_eq!(updated.get("NumberOfEmployees"), Some(&FieldValue::Number(42.0)));
    assert_eq!(coordinator.pump(), 1);
}

#[test]
fn begin_edit_with_unknown_id_changes_nothing() {
    let gateway = accounts();
    let mut list = loaded_list(&gateway);

    assert!(!list.begin_edit(&RecordId::new("001000000000099")));
    assert!(list.editing().is_none());
    assert_eq!(list.set_edit_field("Industry", "Retail"), Ok(false));
    assert!(matches!(list.commit_edit(), Err(ViewError::NoEdit)));
    assert_eq!(gateway.calls(GatewayCall::Update), 0);
}

#[test]
fn failed_commit_keeps_the_edit_snapshot() {
    let gateway = accounts();
    let mut list = loaded_list(&gateway);
    let id = id_of(&list, "Delta");
    list.begin_edit(&id);
    list.set_edit_field("Phone", "555-0100").expect("known field");

    gateway.fail_next(GatewayCall::Update, "record is locked");
    let error = list.commit_edit().expect_err("update rejected");

    assert_eq!(error.to_string(), "record is locked");
    assert_eq!(list.error_message().as_deref(), Some("record is locked"));
    let editing = list.editing().expect("snapshot kept");
    assert_eq!(editing.display_value("Phone"), "555-0100");
    assert_eq!(gateway.calls(GatewayCall::List), 1);
}

#[test]
fn clearing_a_required_field_blocks_commit() {
    let gateway = accounts();
    let mut list = loaded_list(&gateway);
    let id = id_of(&list, "Echo");
    list.begin_edit(&id);
    list.set_edit_field("Name", "  ").expect("known field");

    let error = list.commit_edit().expect_err("name required");
    assert!(matches!(
        error,
        ViewError::Validation(ValidationError::Required { .. })
    ));
    assert_eq!(gateway.calls(GatewayCall::Update), 0);
    assert!(list.editing().is_some());
}

#[test]
fn cancel_edit_discards_snapshot() {
    let gateway = accounts();
    let mut list = loaded_list(&gateway);
    let id = id_of(&list, "Golf");
    list.begin_edit(&id);

    assert!(list.cancel_edit());
    assert!(!list.cancel_edit());
    assert_eq!(gateway.calls(GatewayCall::Update), 0);
}

#[test]
fn delete_of_uncached_id_never_reaches_gateway() {
    let gateway = accounts();
    let mut list = loaded_list(&gateway);

    let error = list
        .delete(&RecordId::new("001000000000099"))
        .expect_err("unknown id");
    assert!(matches!(error, ViewError::NotFound { .. }));
    assert!(error.to_string().contains("reload and retry"));
    assert_eq!(gateway.calls(GatewayCall::Delete), 0);
}

#[test]
fn failed_delete_leaves_list_untouched() {
    let gateway = accounts();
    let mut coordinator = RefreshCoordinator::new();
    let mut list = loaded_list(&gateway).with_notifier(coordinator.notifier());
    let before = list.page().to_vec();
    let id = id_of(&list, "Alice");

    gateway.fail_next(GatewayCall::Delete, "entity is referenced by open cases");
    assert!(list.delete(&id).is_err());

    assert_eq!(list.page(), before.as_slice());
    assert_eq!(list.records().len(), 12);
    assert_eq!(coordinator.pump(), 0);
}

#[test]
fn delete_notifies_once_and_sibling_refreshes_once() {
    let source = accounts();
    let sibling_gateway = accounts();
    let mut coordinator = RefreshCoordinator::new();

    let mut list = loaded_list(&source).with_notifier(coordinator.notifier());
    let sibling = Rc::new(RefCell::new(loaded_list(&sibling_gateway)));
    coordinator.refresh_on_change(Rc::downgrade(&sibling));
    assert_eq!(sibling_gateway.calls(GatewayCall::List), 1);

    let id = id_of(&list, "Bravo");
    assert!(list.open_details(&id));
    list.delete(&id).expect("delete succeeds");

    assert!(!list.is_modal_open());
    assert!(!names(list.records()).contains(&"Bravo".to_owned()));
    assert_eq!(source.calls(GatewayCall::Delete), 1);

    assert_eq!(coordinator.pump(), 1);
    assert_eq!(sibling_gateway.calls(GatewayCall::List), 2);
    assert_eq!(coordinator.pump(), 0);
    assert_eq!(sibling_gateway.calls(GatewayCall::List), 2);
}

#[test]
fn form_with_blank_required_field_never_calls_gateway() {
    let gateway = Rc::new(ScriptedGateway::new(&STUDENT_SCHEMA));
    let mut coordinator = RefreshCoordinator::new();
    let mut form = FormViewModel::new(Rc::clone(&gateway), &STUDENT_SCHEMA)
        .with_notifier(coordinator.notifier());
    form.set_field("Email__c", "ada@example.edu").expect("known field");
    form.set_field("Class__c", "A").expect("known field");

    let error = form.submit().expect_err("name is required");
    assert!(matches!(
        error,
        ViewError::Validation(ValidationError::Required { .. })
    ));
    assert_eq!(error.to_string(), "Name is required");
    assert_eq!(gateway.total_calls(), 0);
    assert_eq!(form.field("Email__c"), Some("ada@example.edu"));
    assert_eq!(form.field("Class__c"), Some("A"));
    assert_eq!(coordinator.pump(), 0);
}

#[test]
fn created_record_refreshes_the_list_exactly_once() {
    let gateway = accounts();
    let mut coordinator = RefreshCoordinator::new();
    let list = Rc::new(RefCell::new(loaded_list(&gateway)));
    coordinator.refresh_on_created(Rc::downgrade(&list));

    let mut form = FormViewModel::new(Rc::clone(&gateway), &ACCOUNT_SCHEMA)
        .with_notifier(coordinator.notifier());
    form.set_field("Name", "Mike").expect("known field");
    form.set_field("Industry", "Shipping").expect("known field");
    let created = form.submit().expect("create succeeds");

    assert!(form.is_blank());
    let toasts = form.take_toasts();
    assert_eq!(toasts[0].variant, ToastVariant::Success);
    assert_eq!(toasts[0].message, "Account created successfully: Mike");

    assert_eq!(gateway.calls(GatewayCall::List), 1);
    assert_eq!(coordinator.pump(), 1);
    assert_eq!(gateway.calls(GatewayCall::List), 2);

    let list = list.borrow();
    assert_eq!(list.records().len(), 13);
    assert!(list.records().iter().any(|record| record.id == created.id));
}

#[test]
fn rejected_create_sends_no_notification() {
    let gateway = accounts();
    let mut coordinator = RefreshCoordinator::new();
    let list = Rc::new(RefCell::new(loaded_list(&gateway)));
    coordinator.refresh_on_created(Rc::downgrade(&list));

    let mut form = FormViewModel::new(Rc::clone(&gateway), &ACCOUNT_SCHEMA)
        .with_notifier(coordinator.notifier());
    form.set_field("Name", "Mike").expect("known field");
    gateway.fail_next(GatewayCall::Create, "duplicate value found");

    assert!(form.submit().is_err());
    assert_eq!(form.field("Name"), Some("Mike"));
    assert_eq!(coordinator.pump(), 0);
    assert_eq!(gateway.calls(GatewayCall::List), 1);
}

#[test]
fn notification_to_unmounted_list_is_ignored() {
    let gateway = accounts();
    let mut coordinator = RefreshCoordinator::new();
    let list = Rc::new(RefCell::new(loaded_list(&gateway)));
    coordinator.refresh_on_created(Rc::downgrade(&list));
    drop(list);

    let mut form = FormViewModel::new(Rc::clone(&gateway), &ACCOUNT_SCHEMA)
        .with_notifier(coordinator.notifier());
    form.set_field("Name", "November").expect("known field");
    form.submit().expect("create succeeds");

    assert_eq!(coordinator.pump(), 1);
    assert_eq!(gateway.calls(GatewayCall::List), 1);
}
