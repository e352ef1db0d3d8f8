// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use tracing::{debug, warn};

use crate::{LoadState, Record, RecordGateway, Refresh, ViewError};

pub const CLASS_FIELD: &str = "Class__c";
pub const CLASSES: [&str; 3] = ["A", "B", "C"];
const CHART_COLORS: [&str; 3] = ["#ff6384", "#36a2eb", "#ffcd56"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClassCounts {
    pub total: usize,
    pub per_class: [usize; 3],
}

impl ClassCounts {
    /// Counts records by exact `Class__c` value; other classes only add to
    /// the total.
    pub fn from_records(records: &[Record]) -> Self {
        let mut per_class = [0; 3];
        for record in records {
            let class = record.display_value(CLASS_FIELD);
            if let Some(index) = CLASSES.iter().position(|name| *name == class) {
                per_class[index] += 1;
            }
        }
        Self {
            total: records.len(),
            per_class,
        }
    }

    pub fn class(&self, name: &str) -> usize {
        CLASSES
            .iter()
            .position(|class| *class == name)
            .map_or(0, |index| self.per_class[index])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
}

/// Chart payload handed to the external renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub data: Vec<usize>,
    pub background_colors: Vec<&'static str>,
    pub revision: u64,
}

impl ChartData {
    pub fn class_pie(counts: &ClassCounts) -> Self {
        Self {
            kind: ChartKind::Pie,
            labels: CLASSES.iter().map(|class| format!("Class {class}")).collect(),
            data: counts.per_class.to_vec(),
            background_colors: CHART_COLORS.to_vec(),
            revision: 0,
        }
    }

    /// Replaces the dataset; bumps `revision` only when values changed.
    pub fn update(&mut self, counts: &ClassCounts) -> bool {
        if self.data == counts.per_class {
            return false;
        }
        self.data = counts.per_class.to_vec();
        self.revision += 1;
        true
    }
}

/// Student totals and the per-class pie chart.
pub struct DashboardViewModel<G> {
    gateway: G,
    counts: ClassCounts,
    chart: Option<ChartData>,
    state: LoadState,
    error: Option<ViewError>,
}

impl<G: RecordGateway> DashboardViewModel<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            counts: ClassCounts::default(),
            chart: None,
            state: LoadState::Idle,
            error: None,
        }
    }

    pub fn counts(&self) -> ClassCounts {
        self.counts
    }

    pub fn chart(&self) -> Option<&ChartData> {
        self.chart.as_ref()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    /// Builds the chart from the current counts. Only the first call does
    /// anything.
    pub fn init_chart(&mut self) -> bool {
        if self.chart.is_some() {
            return false;
        }
        self.chart = Some(ChartData::class_pie(&self.counts));
        true
    }

    /// Reloads every student; counts from a failed load are kept.
    pub fn load(&mut self) {
        self.state = LoadState::Loading;
        match self.gateway.list_records(None) {
            Ok(records) => {
                self.counts = ClassCounts::from_records(&records);
                if let Some(chart) = self.chart.as_mut()
                    && chart.update(&self.counts)
                {
                    debug!(revision = chart.revision, "class chart updated");
                }
                self.error = None;
                self.state = LoadState::Ready;
            }
            Err(error) => {
                warn!(%error, "dashboard load failed");
                self.error = Some(error.into());
                self.state = LoadState::Error;
            }
        }
    }
}

impl<G: RecordGateway> Refresh for DashboardViewModel<G> {
    fn refresh(&mut self) {
        self.load();
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartData, ClassCounts};
    use crate::{FieldMap, FieldValue, Record};

    fn student(id: &str, class: Option<&str>) -> Record {
        let record = Record::new(id, FieldMap::new()).with("Name", FieldValue::text(id));
        match class {
            Some(class) => record.with("Class__c", FieldValue::text(class)),
            None => record,
        }
    }

    #[test]
    fn counts_use_exact_class_match() {
        let records = vec![
            student("1", Some("A")),
            student("2", Some("a")),
            student("3", Some("B")),
            student("4", None),
            student("5", Some("C")),
            student("6", Some("A")),
        ];
        let counts = ClassCounts::from_records(&records);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.per_class, [2, 1, 1]);
        assert_eq!(counts.class("B"), 1);
        assert_eq!(counts.class("D"), 0);
    }

    #[test]
    fn chart_revision_moves_only_on_change() {
        let counts = ClassCounts {
            total: 3,
            per_class: [1, 1, 1],
        };
        let mut chart = ChartData::class_pie(&counts);
        assert_eq!(chart.labels, vec!["Class A", "Class B", "Class C"]);
        assert!(!chart.update(&counts));
        assert_eq!(chart.revision, 0);

        let changed = ClassCounts {
            total: 4,
            per_class: [2, 1, 1],
        };
        assert!(chart.update(&changed));
        assert_eq!(chart.revision, 1);
        assert_eq!(chart.data, vec![2, 1, 1]);
    }
}
