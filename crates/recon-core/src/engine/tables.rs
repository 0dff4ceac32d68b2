use std::path::Path;

use polars::prelude::{Column, DataFrame, NamedFrom, PlSmallStr, Series};
use postgres::types::Type;
use postgres::{NoTls, SimpleQueryMessage};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::engine::ReadOptions;

/// Keys the table reader acts on beyond the connection and relation.
const TABLE_HONOURED_KEYS: &[&str] = &[
    "url",
    "user",
    "password",
    "dbtable",
    "query",
    "queryTimeout",
    "sessionInitStatement",
    "prepareQuery",
];

const SUBQUERY_ALIAS: &str = "recon_subquery";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TableBackend {
    Postgres(String),
    Sqlite(String),
}

/// How a column's text values become a polars column. Numbers and booleans are
/// typed so they render as text the same way file columns of that type do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
}

/// Rows read from a relation, every value held as text.
#[derive(Debug, Default)]
pub(crate) struct TextTable {
    pub columns: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TextTable {
    pub fn into_frame(self) -> Result<DataFrame, String> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len());
        for (index, name) in self.columns.iter().enumerate() {
            let values: Vec<Option<&str>> = self
                .rows
                .iter()
                .map(|row| row.get(index).and_then(|value| value.as_deref()))
                .collect();
            let kind = self.kinds.get(index).copied().unwrap_or(ColumnKind::Text);
            let series = typed_series(name, kind, &values)
                .map_err(|value| format!("column {name}: cannot read {value:?} as {kind:?}"))?;
            columns.push(series.into());
        }
        DataFrame::new(columns).map_err(|err| err.to_string())
    }
}

fn typed_series<'a>(
    name: &str,
    kind: ColumnKind,
    values: &[Option<&'a str>],
) -> Result<Series, &'a str> {
    let name = PlSmallStr::from(name);
    Ok(match kind {
        ColumnKind::Text => Series::new(name, values),
        ColumnKind::Integer => Series::new(name, parse_all(values, |v| v.parse::<i64>().ok())?),
        ColumnKind::Float => Series::new(name, parse_all(values, |v| v.parse::<f64>().ok())?),
        ColumnKind::Boolean => Series::new(name, parse_all(values, parse_pg_bool)?),
    })
}

fn parse_all<'a, T>(
    values: &[Option<&'a str>],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<Option<T>>, &'a str> {
    values
        .iter()
        .map(|value| match value {
            None => Ok(None),
            Some(text) => parse(text).map(Some).ok_or(*text),
        })
        .collect()
}

fn parse_pg_bool(value: &str) -> Option<bool> {
    match value {
        "t" | "true" => Some(true),
        "f" | "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn backend_for(url: &str) -> Result<TableBackend, String> {
    let url = url.strip_prefix("jdbc:").unwrap_or(url);
    if url.starts_with("postgresql://") || url.starts_with("postgres://") {
        return Ok(TableBackend::Postgres(url.to_string()));
    }
    if let Some(path) = url.strip_prefix("sqlite:") {
        let path = path.strip_prefix("//").unwrap_or(path);
        if path.is_empty() {
            return Err("sqlite url needs a database path".to_string());
        }
        return Ok(TableBackend::Sqlite(path.to_string()));
    }
    let scheme = url.split(':').next().unwrap_or(url);
    Err(format!(
        "unsupported database url scheme {scheme} (supported: postgresql, sqlite)"
    ))
}

/// The statement Spark would issue for the relation: the table itself, or the
/// query wrapped as a subquery.
pub(crate) fn select_statement(options: &ReadOptions) -> Result<String, String> {
    let select = match (options.get("dbtable"), options.get("query")) {
        (Some(table), None) => format!("SELECT * FROM {table}"),
        (None, Some(query)) => format!("SELECT * FROM ({query}) AS {SUBQUERY_ALIAS}"),
        _ => return Err("exactly one of dbtable or query is required".to_string()),
    };
    Ok(match options.get("prepareQuery") {
        Some(prepare) => format!("{prepare} {select}"),
        None => select,
    })
}

pub(crate) fn read_table(options: &ReadOptions) -> Result<TextTable, String> {
    for key in options.keys() {
        if !TABLE_HONOURED_KEYS.contains(&key.as_str()) {
            tracing::debug!(option = %key, "table option ignored by local engine");
        }
    }
    let url = options
        .get("url")
        .ok_or_else(|| "url is required".to_string())?;
    let statement = select_statement(options)?;
    match backend_for(url)? {
        TableBackend::Postgres(conn) => read_postgres(&conn, &statement, options),
        TableBackend::Sqlite(path) => read_sqlite(Path::new(&path), &statement, options),
    }
}

fn read_postgres(conn: &str, statement: &str, options: &ReadOptions) -> Result<TextTable, String> {
    let mut config: postgres::Config = conn
        .parse()
        .map_err(|err| format!("invalid postgres url: {err}"))?;
    if let Some(user) = options.get("user") {
        config.user(user);
    }
    if let Some(password) = options.get("password") {
        config.password(password);
    }
    let mut client = config
        .connect(NoTls)
        .map_err(|err| format!("connection failed: {err}"))?;

    if let Some(seconds) = options.get("queryTimeout") {
        let millis = seconds
            .parse::<u64>()
            .map_err(|_| format!("queryTimeout must be a whole number of seconds, got {seconds}"))?
            .saturating_mul(1000);
        client
            .batch_execute(&format!("SET statement_timeout = {millis}"))
            .map_err(|err| format!("cannot apply queryTimeout: {err}"))?;
    }
    if let Some(init) = options.get("sessionInitStatement") {
        client
            .batch_execute(init)
            .map_err(|err| format!("sessionInitStatement failed: {err}"))?;
    }

    // Simple-query rows carry no types; the prepared statement describes them.
    let described = client
        .prepare(statement)
        .map_err(|err| format!("query failed: {err}"))?;
    let mut table = TextTable {
        columns: described
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect(),
        kinds: described
            .columns()
            .iter()
            .map(|column| postgres_kind(column.type_()))
            .collect(),
        rows: Vec::new(),
    };
    let messages = client
        .simple_query(statement)
        .map_err(|err| format!("query failed: {err}"))?;
    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            let values = (0..row.len())
                .map(|index| row.get(index).map(str::to_string))
                .collect();
            table.rows.push(values);
        }
    }
    Ok(table)
}

fn postgres_kind(ty: &Type) -> ColumnKind {
    if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 || *ty == Type::OID {
        ColumnKind::Integer
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
        ColumnKind::Float
    } else if *ty == Type::BOOL {
        ColumnKind::Boolean
    } else {
        ColumnKind::Text
    }
}

fn read_sqlite(path: &Path, statement: &str, options: &ReadOptions) -> Result<TextTable, String> {
    if !path.is_file() {
        return Err(format!("sqlite database {} does not exist", path.display()));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|err| format!("cannot open {}: {err}", path.display()))?;
    if let Some(init) = options.get("sessionInitStatement") {
        conn.execute_batch(init)
            .map_err(|err| format!("sessionInitStatement failed: {err}"))?;
    }
    let mut stmt = conn
        .prepare(statement)
        .map_err(|err| format!("query failed: {err}"))?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();
    let mut rows = stmt.query([]).map_err(|err| format!("query failed: {err}"))?;
    let mut kinds: Vec<Option<ColumnKind>> = vec![None; width];
    let mut rendered = Vec::new();
    while let Some(row) = rows.next().map_err(|err| format!("row fetch failed: {err}"))? {
        let mut texts = Vec::with_capacity(width);
        for (index, kind) in kinds.iter_mut().enumerate() {
            let value = row
                .get_ref(index)
                .map_err(|err| format!("cannot read column {index}: {err}"))?;
            *kind = widen(*kind, ValueKind::of(value));
            texts.push(sqlite_text(value));
        }
        rendered.push(texts);
    }
    Ok(TextTable {
        columns,
        kinds: kinds
            .into_iter()
            .map(|kind| kind.unwrap_or(ColumnKind::Text))
            .collect(),
        rows: rendered,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Null,
    Integer,
    Real,
    Other,
}

impl ValueKind {
    fn of(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ValueKind::Null,
            ValueRef::Integer(_) => ValueKind::Integer,
            ValueRef::Real(_) => ValueKind::Real,
            ValueRef::Text(_) | ValueRef::Blob(_) => ValueKind::Other,
        }
    }
}

/// SQLite types values, not columns: all integers is an integer column, numbers
/// with at least one real is a float column, anything else stays text.
fn widen(current: Option<ColumnKind>, value: ValueKind) -> Option<ColumnKind> {
    match (current, value) {
        (Some(ColumnKind::Text), _) | (_, ValueKind::Other) => Some(ColumnKind::Text),
        (_, ValueKind::Null) => current,
        (None | Some(ColumnKind::Integer), ValueKind::Integer) => Some(ColumnKind::Integer),
        (_, ValueKind::Integer | ValueKind::Real) => Some(ColumnKind::Float),
    }
}

fn sqlite_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(value) => Some(value.to_string()),
        // "10.0", not "10"
        ValueRef::Real(value) => Some(format!("{value:?}")),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(bytes.iter().map(|byte| format!("{byte:02x}")).collect()),
    }
}
