// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use roster_app::{
    ACCOUNT_SCHEMA, CONTACT_PARENT_FIELD, CONTACT_SCHEMA, FieldDescriptor, FieldKind, FieldMap,
    FieldValue, GatewayError, ListQuery, Record, RecordGateway, RecordId, RecordSchema,
    STUDENT_SCHEMA,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

pub const APP_NAME: &str = "roster";

const BOOKKEEPING_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Scalar SQL function lowercasing its argument with Unicode rules, so
/// paged search and sort fold case the same way the in-memory path does.
const FOLD_FUNCTION: &str = "roster_fold";

/// Maps one record schema onto its table. Column order is the select order
/// after `id`.
struct TableSpec {
    table: &'static str,
    columns: &'static [(&'static str, &'static str)],
}

static ACCOUNT_TABLE: TableSpec = TableSpec {
    table: "accounts",
    columns: &[
        ("Name", "name"),
        ("Industry", "industry"),
        ("Phone", "phone"),
        ("Website", "website"),
        ("NumberOfEmployees", "number_of_employees"),
    ],
};

static STUDENT_TABLE: TableSpec = TableSpec {
    table: "students",
    columns: &[
        ("Name", "name"),
        ("Email__c", "email"),
        ("Class__c", "class"),
        ("Phone__c", "phone"),
    ],
};

static CONTACT_TABLE: TableSpec = TableSpec {
    table: "contacts",
    columns: &[
        ("Name", "name"),
        ("Title", "title"),
        ("Email", "email"),
        ("Phone", "phone"),
        (CONTACT_PARENT_FIELD, "account_id"),
    ],
};

static TABLES: [&TableSpec; 3] = [&ACCOUNT_TABLE, &STUDENT_TABLE, &CONTACT_TABLE];

impl TableSpec {
    fn for_schema(schema: &RecordSchema) -> Result<&'static Self> {
        match schema.object_api_name {
            "Account" => Ok(&ACCOUNT_TABLE),
            "Student__c" => Ok(&STUDENT_TABLE),
            "Contact" => Ok(&CONTACT_TABLE),
            other => bail!("no table stores {other} records"),
        }
    }

    fn column(&self, field: &str) -> Result<&'static str> {
        self.columns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| anyhow!("table `{}` has no column for field {field:?}", self.table))
    }

    fn column_names(&self) -> impl Iterator<Item = &'static str> + use<> {
        let columns: &'static [(&'static str, &'static str)] = self.columns;
        columns.iter().map(|(_, column)| *column)
    }

    fn select_list(&self) -> String {
        std::iter::once("id")
            .chain(self.column_names())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Name, industry, phone, website, employees.
type DemoAccount = (&'static str, &'static str, &'static str, &'static str, f64);

const DEMO_ACCOUNTS: [DemoAccount; 8] = [
    ("Burlington Textiles", "Apparel", "(336) 222-7000", "www.burlington.com", 9000.0),
    ("Dickenson plc", "Consulting", "(785) 241-6200", "dickenson-consulting.com", 120.0),
    ("Edge Communications", "Electronics", "(512) 757-6000", "www.edgecomm.com", 1000.0),
    (
        "Express Logistics",
        "Transportation",
        "(503) 421-7800",
        "www.expresslogistics.com",
        12300.0,
    ),
    ("GenePoint", "Biotechnology", "(650) 867-3450", "www.genepoint.com", 265.0),
    ("Grand Hotels & Resorts", "Hospitality", "(312) 596-1000", "www.grandhotels.com", 5600.0),
    ("Pyramid Construction", "Construction", "(014) 427-4427", "www.pyramid.com", 2680.0),
    ("United Oil & Gas", "Energy", "(212) 842-5500", "www.uos.com", 145000.0),
];

/// Name, title, email, name of the account the contact belongs to.
const DEMO_CONTACTS: [(&str, &str, &str, &str); 10] = [
    ("Jack Rogers", "VP, Facilities", "jrogers@burlington.com", "Burlington Textiles"),
    ("Andy Young", "SVP, Operations", "a_young@dickenson.com", "Dickenson plc"),
    ("Rose Gonzalez", "SVP, Procurement", "rose@edge.com", "Edge Communications"),
    ("Sean Forbes", "CFO", "sean@edge.com", "Edge Communications"),
    ("Josh Davis", "Director, Warehouse Mgmt", "j.davis@expressl.net", "Express Logistics"),
    ("Edna Frank", "VP, Technology", "efrank@genepoint.com", "GenePoint"),
    ("Tim Barr", "SVP, Finance", "barr_tim@grandhotels.com", "Grand Hotels & Resorts"),
    ("Pat Stumuller", "SVP, Finance", "pat@pyramid.net", "Pyramid Construction"),
    ("Stella Pavlova", "SVP, Production", "spavlova@uog.com", "United Oil & Gas"),
    ("Arthur Song", "CEO", "asong@uog.com", "United Oil & Gas"),
];

const DEMO_STUDENTS: [(&str, &str, &str); 9] = [
    ("Ada Lovelace", "ada@example.edu", "A"),
    ("Alan Turing", "alan@example.edu", "A"),
    ("Barbara Liskov", "barbara@example.edu", "B"),
    ("Claude Shannon", "claude@example.edu", "C"),
    ("Donald Knuth", "donald@example.edu", "A"),
    ("Edsger Dijkstra", "edsger@example.edu", "B"),
    ("Frances Allen", "frances@example.edu", "C"),
    ("Grace Hopper", "grace@example.edu", "B"),
    ("John McCarthy", "john@example.edu", "A"),
];

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the SQLite file at `path`. `:memory:` is
    /// accepted as well.
    pub fn open(path: &Path) -> Result<Self> {
        validate_db_path(&path.to_string_lossy())?;
        Self::with_connection(Connection::open(path).with_context(|| {
            format!("sqlite could not open {}", path.display())
        })?)
    }

    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("sqlite in-memory open")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        tune_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates the schema on an empty database, or checks an existing one
    /// has every table and column the store reads.
    pub fn bootstrap(&self) -> Result<()> {
        if user_table_count(&self.conn)? == 0 {
            debug!("empty database, creating schema");
            return self
                .conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create roster schema");
        }
        check_schema(&self.conn)
    }

    /// Inserts sample accounts, students and contacts into empty tables.
    /// Contacts attach to the demo account with the matching name.
    pub fn seed_demo_data(&self) -> Result<()> {
        if self.count(&ACCOUNT_SCHEMA)? == 0 {
            for (name, industry, phone, website, employees) in DEMO_ACCOUNTS {
                let fields = FieldMap::from([
                    ("Name".to_owned(), FieldValue::text(name)),
                    ("Industry".to_owned(), FieldValue::text(industry)),
                    ("Phone".to_owned(), FieldValue::text(phone)),
                    ("Website".to_owned(), FieldValue::text(website)),
                    ("NumberOfEmployees".to_owned(), FieldValue::Number(employees)),
                ]);
                self.create(&ACCOUNT_SCHEMA, &fields)
                    .with_context(|| format!("seed demo account {name}"))?;
            }
        }
        if self.count(&STUDENT_SCHEMA)? == 0 {
            for (name, email, class) in DEMO_STUDENTS {
                let fields = FieldMap::from([
                    ("Name".to_owned(), FieldValue::text(name)),
                    ("Email__c".to_owned(), FieldValue::text(email)),
                    ("Class__c".to_owned(), FieldValue::text(class)),
                ]);
                self.create(&STUDENT_SCHEMA, &fields)
                    .with_context(|| format!("seed demo student {name}"))?;
            }
        }
        if self.count(&CONTACT_SCHEMA)? == 0 {
            let accounts = self.list(&ACCOUNT_SCHEMA, None)?;
            let account_id = |wanted: &str| {
                accounts
                    .iter()
                    .find(|account| account.name() == wanted)
                    .map(|account| account.id.clone())
            };
            for (name, title, email, account_name) in DEMO_CONTACTS {
                let mut fields = FieldMap::from([
                    ("Name".to_owned(), FieldValue::text(name)),
                    ("Title".to_owned(), FieldValue::text(title)),
                    ("Email".to_owned(), FieldValue::text(email)),
                ]);
                if let Some(id) = account_id(account_name) {
                    fields.insert(
                        CONTACT_PARENT_FIELD.to_owned(),
                        FieldValue::text(id.as_str()),
                    );
                }
                self.create(&CONTACT_SCHEMA, &fields)
                    .with_context(|| format!("seed demo contact {name}"))?;
            }
        }
        info!(
            accounts = DEMO_ACCOUNTS.len(),
            students = DEMO_STUDENTS.len(),
            contacts = DEMO_CONTACTS.len(),
            "demo data ready"
        );
        Ok(())
    }

    pub fn count(&self, schema: &RecordSchema) -> Result<usize> {
        let spec = TableSpec::for_schema(schema)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", spec.table), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("count {}", spec.table))?;
        usize::try_from(count).with_context(|| format!("negative row count for {}", spec.table))
    }

    /// Every record in insertion order when `query` is `None`; otherwise one
    /// filtered, sorted page.
    pub fn list(&self, schema: &RecordSchema, query: Option<&ListQuery>) -> Result<Vec<Record>> {
        let spec = TableSpec::for_schema(schema)?;
        let mut sql = format!("SELECT {} FROM {}", spec.select_list(), spec.table);
        let mut bindings: Vec<Value> = Vec::new();

        match query {
            None => sql.push_str(" ORDER BY id ASC"),
            Some(query) => {
                if !query.search_key.is_empty() {
                    let clauses = schema
                        .searchable_fields()
                        .map(|field| {
                            spec.column(field.name)
                                .map(|column| format!("instr({FOLD_FUNCTION}({column}), ?1) > 0"))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    if !clauses.is_empty() {
                        sql.push_str(&format!(" WHERE ({})", clauses.join(" OR ")));
                        bindings.push(Value::Text(query.search_key.to_lowercase()));
                    }
                }

                let field = schema.sortable_field(&query.sort_field)?;
                let column = spec.column(field.name)?;
                let limit = bindings.len() + 1;
                sql.push_str(&format!(
                    " ORDER BY {FOLD_FUNCTION}(COALESCE({column}, '')) {}, id ASC",
                    query.sort_direction.as_str(),
                ));
                sql.push_str(&format!(" LIMIT ?{limit} OFFSET ?{}", limit + 1));
                bindings.push(Value::Integer(
                    i64::try_from(query.page_size).context("page size out of range")?,
                ));
                bindings.push(Value::Integer(
                    i64::try_from(query.page_offset).context("page offset out of range")?,
                ));
            }
        }

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare {} query", spec.table))?;
        let rows = stmt
            .query_map(params_from_iter(bindings.iter()), |row| {
                read_record(row, schema, spec)
            })
            .with_context(|| format!("query {}", spec.table))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect {}", spec.table))
    }

    /// Records of `schema` whose `parent_field` holds `parent`, oldest first.
    pub fn list_children(
        &self,
        schema: &RecordSchema,
        parent_field: &str,
        parent: &RecordId,
    ) -> Result<Vec<Record>> {
        let spec = TableSpec::for_schema(schema)?;
        let column = spec.column(parent_field)?;
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM {} WHERE {column} = ?1 ORDER BY id ASC",
                spec.select_list(),
                spec.table
            ))
            .with_context(|| format!("prepare {} lookup by {parent_field}", spec.table))?;
        let rows = stmt
            .query_map([parent.as_str()], |row| read_record(row, schema, spec))
            .with_context(|| format!("query {} of {parent}", spec.table))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect {} of {parent}", spec.table))
    }

    pub fn get(&self, schema: &RecordSchema, id: &RecordId) -> Result<Option<Record>> {
        let spec = TableSpec::for_schema(schema)?;
        let row = row_id(schema, id)?;
        self.conn
            .query_row(
                &format!("SELECT {} FROM {} WHERE id = ?", spec.select_list(), spec.table),
                params![row],
                |row| read_record(row, schema, spec),
            )
            .optional()
            .with_context(|| format!("load {} {id}", schema.label))
    }

    pub fn create(&self, schema: &RecordSchema, fields: &FieldMap) -> Result<Record> {
        let spec = TableSpec::for_schema(schema)?;
        let mut bindings = column_values(schema, spec, fields)?;
        let now = now_rfc3339()?;
        bindings.push(Value::Text(now.clone()));
        bindings.push(Value::Text(now));

        let columns = spec.column_names().collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; bindings.len()].join(", ");
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} ({columns}, created_at, updated_at) VALUES ({placeholders})",
                    spec.table
                ),
                params_from_iter(bindings.iter()),
            )
            .with_context(|| format!("insert {}", schema.label))?;

        let id = RecordId::from_row(schema.key_prefix, self.conn.last_insert_rowid());
        self.get(schema, &id)?
            .ok_or_else(|| anyhow!("{} {id} missing right after insert", schema.label))
    }

    /// Replaces every stored field with the record's values; absent fields
    /// become NULL.
    pub fn update(&self, schema: &RecordSchema, record: &Record) -> Result<()> {
        let spec = TableSpec::for_schema(schema)?;
        let row = row_id(schema, &record.id)?;
        let mut bindings = column_values(schema, spec, &record.fields)?;
        bindings.push(Value::Text(now_rfc3339()?));
        bindings.push(Value::Integer(row));

        let assignments = spec
            .column_names()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let rows_affected = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET {assignments}, updated_at = ? WHERE id = ?",
                    spec.table
                ),
                params_from_iter(bindings.iter()),
            )
            .with_context(|| format!("update {} {}", schema.label, record.id))?;
        if rows_affected == 0 {
            bail!(
                "{} {} not found -- it may have been deleted; reload and retry",
                schema.label,
                record.id
            );
        }
        Ok(())
    }

    pub fn delete(&self, schema: &RecordSchema, id: &RecordId) -> Result<()> {
        let spec = TableSpec::for_schema(schema)?;
        let row = row_id(schema, id)?;
        let rows_affected = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?", spec.table),
                params![row],
            )
            .with_context(|| format!("delete {} {id}", schema.label))?;
        if rows_affected == 0 {
            bail!(
                "{} {id} not found -- it may have been deleted; reload and retry",
                schema.label
            );
        }
        Ok(())
    }
}

/// [`RecordGateway`] over one table of a shared [`Store`].
pub struct StoreGateway {
    store: Rc<Store>,
    schema: &'static RecordSchema,
}

impl StoreGateway {
    pub fn new(store: Rc<Store>, schema: &'static RecordSchema) -> Self {
        Self { store, schema }
    }

    pub fn schema(&self) -> &'static RecordSchema {
        self.schema
    }
}

impl RecordGateway for StoreGateway {
    fn list_records(&self, query: Option<&ListQuery>) -> Result<Vec<Record>, GatewayError> {
        let records = self.store.list(self.schema, query).map_err(gateway_error)?;
        debug!(
            object = self.schema.object_api_name,
            rows = records.len(),
            paged = query.is_some(),
            "store list"
        );
        Ok(records)
    }

    fn create_record(&self, fields: &FieldMap) -> Result<Record, GatewayError> {
        self.store.create(self.schema, fields).map_err(gateway_error)
    }

    fn update_record(&self, record: &Record) -> Result<(), GatewayError> {
        self.store.update(self.schema, record).map_err(gateway_error)
    }

    fn delete_record(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.store.delete(self.schema, id).map_err(gateway_error)
    }

    fn list_children(
        &self,
        parent_field: &str,
        parent: &RecordId,
    ) -> Result<Vec<Record>, GatewayError> {
        let records = self
            .store
            .list_children(self.schema, parent_field, parent)
            .map_err(gateway_error)?;
        debug!(
            object = self.schema.object_api_name,
            %parent,
            rows = records.len(),
            "store children"
        );
        Ok(records)
    }
}

fn gateway_error(error: anyhow::Error) -> GatewayError {
    GatewayError::new(format!("{error:#}"))
}

/// `ROSTER_DB_PATH`, else `<data dir>/roster/roster.db`.
pub fn default_db_path() -> Result<PathBuf> {
    if let Some(explicit) = env::var_os("ROSTER_DB_PATH") {
        return Ok(PathBuf::from(explicit));
    }
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("no platform data directory; set ROSTER_DB_PATH instead"))?;
    let dir = base.join(APP_NAME);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir.join("roster.db"))
}

/// Accepts plain filesystem paths and `:memory:`. URI forms and query
/// strings are refused since SQLite would otherwise interpret them.
pub fn validate_db_path(path: &str) -> Result<()> {
    match path {
        "" => bail!("empty database path"),
        ":memory:" => return Ok(()),
        _ => {}
    }
    let uri_scheme = path
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty() && scheme.chars().all(|ch| ch.is_ascii_alphabetic()));
    if let Some(scheme) = uri_scheme {
        bail!("{path:?} looks like a URI ({scheme}://); give a file path");
    }
    if path.starts_with("file:") || path.contains('?') {
        bail!("{path:?} looks like a URI; give a file path without `file:` or `?` options");
    }
    Ok(())
}

fn read_record(
    row: &rusqlite::Row<'_>,
    schema: &RecordSchema,
    spec: &TableSpec,
) -> rusqlite::Result<Record> {
    let rowid: i64 = row.get(0)?;
    let mut fields = FieldMap::new();
    for (index, (field, _)) in spec.columns.iter().enumerate() {
        if let Some(value) = field_value(row.get_ref(index + 1)?) {
            fields.insert((*field).to_owned(), value);
        }
    }
    Ok(Record::new(
        RecordId::from_row(schema.key_prefix, rowid),
        fields,
    ))
}

fn field_value(value: ValueRef<'_>) -> Option<FieldValue> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(value) => Some(FieldValue::Number(value as f64)),
        ValueRef::Real(value) => Some(FieldValue::Number(value)),
        ValueRef::Text(value) => Some(FieldValue::Text(
            String::from_utf8_lossy(value).into_owned(),
        )),
    }
}

/// Bind values in table column order, after rejecting unknown fields and
/// missing required ones.
fn column_values(schema: &RecordSchema, spec: &TableSpec, fields: &FieldMap) -> Result<Vec<Value>> {
    for name in fields.keys() {
        schema.require_field(name)?;
    }
    schema.check_required(fields)?;
    spec.columns
        .iter()
        .map(|(name, _)| {
            let field = schema.require_field(name)?;
            sql_value(field, fields.get(*name))
        })
        .collect()
}

fn sql_value(field: &FieldDescriptor, value: Option<&FieldValue>) -> Result<Value> {
    let Some(value) = value else {
        return Ok(Value::Null);
    };
    match (field.kind, value) {
        (FieldKind::Number, FieldValue::Number(number)) => Ok(Value::Real(*number)),
        (FieldKind::Number, FieldValue::Text(raw)) => Ok(match field.parse_input(raw)? {
            Some(FieldValue::Number(number)) => Value::Real(number),
            _ => Value::Null,
        }),
        (FieldKind::Text, value) => Ok(Value::Text(value.display())),
    }
}

fn row_id(schema: &RecordSchema, id: &RecordId) -> Result<i64> {
    id.row_number(schema.key_prefix).ok_or_else(|| {
        anyhow!(
            "{id} is not a {} id (expected prefix {})",
            schema.label,
            schema.key_prefix
        )
    })
}

fn user_table_count(conn: &Connection) -> Result<i64> {
    const SQL: &str = "SELECT COUNT(*) FROM sqlite_schema \
        WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'";
    conn.query_row(SQL, [], |row| row.get(0))
        .context("inspect sqlite_schema")
}

/// Column names of `table`; empty when the table does not exist.
fn columns_of(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .context("prepare column lookup")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))
        .with_context(|| format!("read columns of {table}"))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("read columns of {table}"))?;
    Ok(names)
}

fn check_schema(conn: &Connection) -> Result<()> {
    for spec in TABLES {
        let present = columns_of(conn, spec.table)?;
        if present.is_empty() {
            bail!(
                "no `{}` table here; is [storage].db_path pointing at a roster database?",
                spec.table
            );
        }
        let missing: Vec<&str> = BOOKKEEPING_COLUMNS
            .into_iter()
            .chain(spec.column_names())
            .filter(|column| !present.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!("`{}` lacks column(s) {}", spec.table, missing.join(", "));
        }
    }
    Ok(())
}

fn tune_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
        .context("enable WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("set synchronous")?;
    conn.busy_timeout(Duration::from_secs(5))
        .context("set busy timeout")?;
    register_fold(conn)
}

fn register_fold(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        FOLD_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Null | ValueRef::Blob(_) => None,
                ValueRef::Integer(value) => Some(value.to_string()),
                ValueRef::Real(value) => Some(value.to_string()),
                ValueRef::Text(value) => Some(String::from_utf8_lossy(value).to_lowercase()),
            })
        },
    )
    .with_context(|| format!("register sql function {FOLD_FUNCTION}"))
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

#[cfg(test)]
mod tests {
    use super::{FOLD_FUNCTION, Store, TableSpec};
    use roster_app::RecordSchema;

    #[test]
    fn fold_function_lowercases_beyond_ascii() -> anyhow::Result<()> {
        let store = Store::open_memory()?;
        let folded: Option<String> = store.connection().query_row(
            &format!("SELECT {FOLD_FUNCTION}(?1)"),
            ["ÉLAN Ünter STRASSE"],
            |row| row.get(0),
        )?;
        assert_eq!(folded.as_deref(), Some("élan ünter strasse"));

        let null: Option<String> = store.connection().query_row(
            &format!("SELECT {FOLD_FUNCTION}(NULL)"),
            [],
            |row| row.get(0),
        )?;
        assert_eq!(null, None);
        Ok(())
    }

    #[test]
    fn every_schema_field_has_a_column() {
        for schema in RecordSchema::all() {
            let spec = TableSpec::for_schema(schema).expect("table for schema");
            for field in schema.fields {
                assert!(spec.column(field.name).is_ok(), "{} unmapped", field.name);
            }
            assert_eq!(spec.columns.len(), schema.fields.len());
        }
    }
}
