// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use roster_app::{
    ChartKind, DashboardViewModel, FormViewModel, LoadState, RefreshCoordinator, STUDENT_SCHEMA,
};
use roster_testkit::{GatewayCall, ScriptedGateway, class_roster};
use std::cell::RefCell;
use std::rc::Rc;

fn roster() -> Rc<ScriptedGateway> {
    Rc::new(ScriptedGateway::with_records(&STUDENT_SCHEMA, class_roster()))
}

#[test]
fn counts_students_per_class() {
    let gateway = roster();
    let mut dashboard = DashboardViewModel::new(Rc::clone(&gateway));
    dashboard.load();

    assert_eq!(dashboard.state(), LoadState::Ready);
    let counts = dashboard.counts();
    assert_eq!(counts.total, 7);
    assert_eq!(counts.per_class, [3, 2, 1]);
    assert_eq!(gateway.last_query(), None);
}

#[test]
fn chart_is_built_once_from_loaded_counts() {
    let gateway = roster();
    let mut dashboard = DashboardViewModel::new(Rc::clone(&gateway));
    assert!(dashboard.chart().is_none());
    dashboard.load();

    assert!(dashboard.init_chart());
    assert!(!dashboard.init_chart());
    let chart = dashboard.chart().expect("chart built");
    assert_eq!(chart.kind, ChartKind::Pie);
    assert_eq!(chart.data, vec![3, 2, 1]);
    assert_eq!(chart.revision, 0);
}

#[test]
fn new_student_updates_chart_through_coordinator() {
    let gateway = roster();
    let mut coordinator = RefreshCoordinator::new();
    let dashboard = Rc::new(RefCell::new(DashboardViewModel::new(Rc::clone(&gateway))));
    {
        let mut dashboard = dashboard.borrow_mut();
        dashboard.load();
        dashboard.init_chart();
    }
    coordinator.refresh_on_created(Rc::downgrade(&dashboard));

    let mut form = FormViewModel::new(Rc::clone(&gateway), &STUDENT_SCHEMA)
        .with_notifier(coordinator.notifier());
    form.set_field("Name", "Frances Allen").expect("known field");
    form.set_field("Class__c", "C").expect("known field");
    form.submit().expect("create succeeds");
    assert_eq!(coordinator.pump(), 1);

    let dashboard = dashboard.borrow();
    assert_eq!(dashboard.counts().total, 8);
    let chart = dashboard.chart().expect("chart built");
    assert_eq!(chart.data, vec![3, 2, 2]);
    assert_eq!(chart.revision, 1);
}

#[test]
fn student_outside_known_classes_only_moves_total() {
    let gateway = roster();
    let mut dashboard = DashboardViewModel::new(Rc::clone(&gateway));
    dashboard.load();
    dashboard.init_chart();

    let mut form = FormViewModel::new(Rc::clone(&gateway), &STUDENT_SCHEMA);
    form.set_field("Name", "John Backus").expect("known field");
    form.set_field("Class__c", "D").expect("known field");
    form.submit().expect("create succeeds");
    dashboard.load();

    assert_eq!(dashboard.counts().total, 8);
    assert_eq!(dashboard.chart().map(|chart| chart.revision), Some(0));
}

#[test]
fn failed_reload_keeps_previous_counts() {
    let gateway = roster();
    let mut dashboard = DashboardViewModel::new(Rc::clone(&gateway));
    dashboard.load();

    gateway.fail_next(GatewayCall::List, "Unable to reach server");
    dashboard.load();

    assert_eq!(dashboard.state(), LoadState::Error);
    assert_eq!(
        dashboard.error().map(ToString::to_string).as_deref(),
        Some("Unable to reach server")
    );
    assert_eq!(dashboard.counts().per_class, [3, 2, 1]);
}
