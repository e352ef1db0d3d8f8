// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use roster_app::{
    ACCOUNT_SCHEMA, CLASSES, CONTACT_PARENT_FIELD, CONTACT_SCHEMA, ChartData, ClassCounts,
    DashboardViewModel, FieldDescriptor, FormViewModel, ListOptions, ListViewModel, LoadState,
    PagingMode, Record, RecordGateway, RecordId, RecordSchema, RefreshCoordinator,
    RelatedListViewModel, STUDENT_SCHEMA, SortDirection,
};
use roster_db::{Store, StoreGateway};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::iter;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListArgs),
    Create {
        schema: &'static RecordSchema,
        values: Vec<(String, String)>,
    },
    Delete {
        schema: &'static RecordSchema,
        id: RecordId,
    },
    Show {
        schema: &'static RecordSchema,
        id: RecordId,
    },
    Dashboard {
        json: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    pub schema: &'static RecordSchema,
    pub search: Option<String>,
    pub sort: Option<(String, SortDirection)>,
    pub page: usize,
    pub json: bool,
}

impl Command {
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        let mut words = words.iter().map(|word| AsRef::<str>::as_ref(word));
        let name = words.next().ok_or_else(|| {
            anyhow!("missing command; expected list, show, create, delete, or dashboard")
        })?;

        match name {
            "list" => {
                let mut args = ListArgs {
                    schema: parse_object(words.next())?,
                    search: None,
                    sort: None,
                    page: 1,
                    json: false,
                };
                while let Some(word) = words.next() {
                    match word {
                        "--search" => {
                            let value = words
                                .next()
                                .ok_or_else(|| anyhow!("--search requires a value"))?;
                            args.search = Some(value.to_owned());
                        }
                        "--sort" => {
                            let value = words
                                .next()
                                .ok_or_else(|| anyhow!("--sort requires FIELD or FIELD:asc|desc"))?;
                            args.sort = Some(parse_sort(value)?);
                        }
                        "--page" => {
                            let value = words
                                .next()
                                .ok_or_else(|| anyhow!("--page requires a page number"))?;
                            args.page = value
                                .parse::<usize>()
                                .ok()
                                .filter(|page| *page > 0)
                                .ok_or_else(|| {
                                    anyhow!("--page must be a positive integer, got {value:?}")
                                })?;
                        }
                        "--json" => args.json = true,
                        other => bail!(
                            "unknown list option {other:?}; \
                             expected --search, --sort, --page, or --json"
                        ),
                    }
                }
                Ok(Self::List(args))
            }
            "create" => {
                let schema = parse_object(words.next())?;
                let values = words
                    .map(|word| {
                        word.split_once('=')
                            .map(|(field, value)| (field.to_owned(), value.to_owned()))
                            .ok_or_else(|| anyhow!("expected Field=Value, got {word:?}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if values.is_empty() {
                    bail!("create needs at least one Field=Value pair, for example Name=Acme");
                }
                Ok(Self::Create { schema, values })
            }
            "delete" | "show" => {
                let schema = parse_object(words.next())?;
                let id = words
                    .next()
                    .ok_or_else(|| anyhow!("{name} requires a record id"))?;
                if let Some(extra) = words.next() {
                    bail!("unexpected argument {extra:?} after record id");
                }
                let id = RecordId::new(id);
                Ok(if name == "show" {
                    Self::Show { schema, id }
                } else {
                    Self::Delete { schema, id }
                })
            }
            "dashboard" => {
                let mut json = false;
                for word in words {
                    match word {
                        "--json" => json = true,
                        other => bail!("unknown dashboard option {other:?}; expected --json"),
                    }
                }
                Ok(Self::Dashboard { json })
            }
            other => bail!(
                "unknown command {other:?}; expected list, show, create, delete, or dashboard"
            ),
        }
    }
}

const OBJECT_NAMES: &str = "accounts, students or contacts";

fn parse_object(word: Option<&str>) -> Result<&'static RecordSchema> {
    let name = word.ok_or_else(|| anyhow!("missing object name; expected {OBJECT_NAMES}"))?;
    RecordSchema::lookup(name)
        .ok_or_else(|| anyhow!("unknown object {name:?}; expected {OBJECT_NAMES}"))
}

/// Child object listed under a record of `parent`, with the field that
/// points back at the parent.
fn related_object(parent: &RecordSchema) -> Option<(&'static RecordSchema, &'static str)> {
    (parent == &ACCOUNT_SCHEMA).then_some((&CONTACT_SCHEMA, CONTACT_PARENT_FIELD))
}

fn parse_sort(raw: &str) -> Result<(String, SortDirection)> {
    match raw.split_once(':') {
        Some((field, direction)) => {
            let direction = SortDirection::parse(direction).ok_or_else(|| {
                anyhow!("sort direction must be asc or desc, got {direction:?}")
            })?;
            Ok((field.to_owned(), direction))
        }
        None => Ok((raw.to_owned(), SortDirection::Asc)),
    }
}

/// Runs one command against the store through the view-models.
pub struct Runtime {
    store: Rc<Store>,
    options: ListOptions,
}

impl Runtime {
    pub fn new(store: Rc<Store>, options: ListOptions) -> Self {
        Self { store, options }
    }

    pub fn execute(&self, command: &Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::List(args) => self.list_records(args, out),
            Command::Create { schema, values } => self.create_record(*schema, values, out),
            Command::Delete { schema, id } => self.delete_record(*schema, id, out),
            Command::Show { schema, id } => self.show_record(*schema, id, out),
            Command::Dashboard { json } => self.dashboard(*json, out),
        }
    }

    fn gateway(&self, schema: &'static RecordSchema) -> StoreGateway {
        StoreGateway::new(Rc::clone(&self.store), schema)
    }

    fn list_view(&self, schema: &'static RecordSchema) -> ListViewModel<StoreGateway> {
        ListViewModel::new(self.gateway(schema), schema, self.options.clone())
    }

    fn list_records(&self, args: &ListArgs, out: &mut dyn Write) -> Result<()> {
        let mut list = self.list_view(args.schema);
        list.load();
        if let Some(search) = &args.search {
            list.set_search_key(search.as_str());
        }
        if let Some((field, direction)) = &args.sort {
            list.set_sort(field, *direction)?;
        }
        while list.page_index() < args.page && list.next_page() {}
        ensure_loaded(&list)?;

        if args.json {
            write_json(&list, out)
        } else {
            write_table(&list, out)
        }
    }

    fn create_record(
        &self,
        schema: &'static RecordSchema,
        values: &[(String, String)],
        out: &mut dyn Write,
    ) -> Result<()> {
        let mut coordinator = RefreshCoordinator::new();
        let list = Rc::new(RefCell::new(self.list_view(schema)));
        list.borrow_mut().load();
        coordinator.refresh_on_created(Rc::downgrade(&list));

        let mut form =
            FormViewModel::new(self.gateway(schema), schema).with_notifier(coordinator.notifier());
        for (field, value) in values {
            form.set_field(field, value.as_str())?;
        }
        let created = form
            .submit()
            .with_context(|| format!("create {} failed", schema.label))?;
        for toast in form.take_toasts() {
            writeln!(out, "{}: {}", toast.title, toast.message)?;
        }

        let dispatched = coordinator.pump();
        debug!(id = %created.id, dispatched, "create finished");
        let list = list.borrow();
        ensure_loaded(&*list)?;
        write_table(&*list, out)
    }

    /// Deletes through a full client-side list so any stored id resolves,
    /// then prints the configured list refreshed by the coordinator.
    fn delete_record(
        &self,
        schema: &'static RecordSchema,
        id: &RecordId,
        out: &mut dyn Write,
    ) -> Result<()> {
        let mut coordinator = RefreshCoordinator::new();
        let visible = Rc::new(RefCell::new(self.list_view(schema)));
        visible.borrow_mut().load();
        coordinator.refresh_on_change(Rc::downgrade(&visible));

        let mut source = ListViewModel::new(
            self.gateway(schema),
            schema,
            ListOptions {
                mode: PagingMode::Client,
                ..self.options.clone()
            },
        )
        .with_notifier(coordinator.notifier());
        source.load();
        ensure_loaded(&source)?;
        source.delete(id)?;
        writeln!(out, "Deleted {} {id}", schema.label)?;

        let dispatched = coordinator.pump();
        debug!(%id, dispatched, "delete finished");
        let visible = visible.borrow();
        ensure_loaded(&*visible)?;
        write_table(&*visible, out)
    }

    /// Details of one record, then its related records when the object has
    /// any.
    fn show_record(
        &self,
        schema: &'static RecordSchema,
        id: &RecordId,
        out: &mut dyn Write,
    ) -> Result<()> {
        let mut list = ListViewModel::new(
            self.gateway(schema),
            schema,
            ListOptions {
                mode: PagingMode::Client,
                ..self.options.clone()
            },
        );
        list.load();
        ensure_loaded(&list)?;
        list.open_details(id);
        let (Some(record), Some(page)) = (list.selected(), list.record_page()) else {
            bail!(
                "{} {id} not found; `roster list {}` shows the stored ids",
                schema.label,
                schema.plural_label
            );
        };

        writeln!(out, "{} {id}", schema.label)?;
        for field in schema.fields {
            if let Some(value) = record.get(field.name) {
                writeln!(out, "  {}: {}", field.label, value.display())?;
            }
        }
        writeln!(out, "  Record page: {}", page.url_path())?;

        let Some((child, parent_field)) = related_object(schema) else {
            return Ok(());
        };
        let mut related = RelatedListViewModel::new(self.gateway(child), child, parent_field)?;
        related.set_parent(list.selected());
        if let Some(error) = related.error() {
            bail!("load related {} failed: {error}", child.plural_label);
        }
        writeln!(out)?;
        if let Some(notice) = related.empty_notice() {
            writeln!(out, "{notice}")?;
            return Ok(());
        }
        writeln!(out, "Related {} ({})", child.plural_label, related.records().len())?;
        write_grid(out, child.fields, related.records())
    }

    fn dashboard(&self, json: bool, out: &mut dyn Write) -> Result<()> {
        let mut dashboard = DashboardViewModel::new(self.gateway(&STUDENT_SCHEMA));
        dashboard.load();
        if let Some(error) = dashboard.error() {
            bail!("load students failed: {error}");
        }
        dashboard.init_chart();

        let counts = dashboard.counts();
        if json {
            serde_json::to_writer_pretty(
                &mut *out,
                &DashboardOutput {
                    counts,
                    chart: dashboard.chart(),
                },
            )
            .context("encode dashboard as JSON")?;
            writeln!(out)?;
            return Ok(());
        }

        writeln!(out, "Students: {}", counts.total)?;
        for class in CLASSES {
            writeln!(out, "Class {class}: {}", counts.class(class))?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DashboardOutput<'a> {
    counts: ClassCounts,
    chart: Option<&'a ChartData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListOutput<'a> {
    object: &'static str,
    search: &'a str,
    sort_field: &'static str,
    sort_direction: &'static str,
    page: usize,
    total_pages: Option<usize>,
    has_next_page: bool,
    records: &'a [Record],
}

fn ensure_loaded<G: RecordGateway>(list: &ListViewModel<G>) -> Result<()> {
    if list.state() == LoadState::Error
        && let Some(error) = list.error()
    {
        bail!("load {} failed: {error}", list.schema().plural_label);
    }
    Ok(())
}

fn write_json<G: RecordGateway>(list: &ListViewModel<G>, out: &mut dyn Write) -> Result<()> {
    let (sort_field, sort_direction) = list.sort();
    let output = ListOutput {
        object: list.schema().object_api_name,
        search: list.search_key(),
        sort_field,
        sort_direction: sort_direction.as_str(),
        page: list.page_index(),
        total_pages: list.total_pages(),
        has_next_page: list.has_next_page(),
        records: list.page(),
    };
    serde_json::to_writer_pretty(&mut *out, &output).context("encode list as JSON")?;
    writeln!(out)?;
    Ok(())
}

fn write_table<G: RecordGateway>(list: &ListViewModel<G>, out: &mut dyn Write) -> Result<()> {
    if let Some(notice) = list.empty_notice() {
        writeln!(out, "{notice}")?;
        return Ok(());
    }

    write_grid(out, list.columns(), list.page())?;

    match list.total_pages() {
        Some(total) => writeln!(
            out,
            "Page {} of {total} ({} {})",
            list.page_index(),
            list.filtered_count(),
            list.schema().plural_label
        )?,
        None if list.has_next_page() => {
            writeln!(out, "Page {} (more available)", list.page_index())?
        }
        None => writeln!(out, "Page {}", list.page_index())?,
    }
    Ok(())
}

fn write_grid(out: &mut dyn Write, columns: &[FieldDescriptor], records: &[Record]) -> Result<()> {
    let headers: Vec<String> = iter::once("Id")
        .chain(columns.iter().map(|column| column.label))
        .map(str::to_owned)
        .collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            iter::once(record.id.to_string())
                .chain(columns.iter().map(|column| record.display_value(column.name)))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = (0..headers.len())
        .map(|index| {
            iter::once(&headers)
                .chain(&rows)
                .map(|row| row[index].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    write_row(out, &headers, &widths)?;
    for row in &rows {
        write_row(out, row, &widths)?;
    }
    Ok(())
}

fn write_row(out: &mut dyn Write, cells: &[String], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}", width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}
