use crate::config::tree::ConfigNode;
use crate::config::{DatasourceKind, FileFormat, Granularity, Setting, ValidationType};
use crate::errors::{ConfigError, Violation};

type Entries = [(String, ConfigNode)];

const ROOT_KEYS: &[&str] = &["setting", "source", "target"];
const SETTING_KEYS: &[&str] = &[
    "validation_name",
    "validation_threshold",
    "validate_content",
    "defaulttimedelay",
    "default_time_delay_seconds",
    "source_name",
    "destination_name",
    "summary_log",
    "summary_log_path_template",
    "granularity",
    "validation_type",
];
const DATASOURCE_KEYS: &[&str] = &["type", "file_config", "database_config"];
const FILE_CONFIG_KEYS: &[&str] = &["format", "path", "options"];
const DATABASE_CONFIG_KEYS: &[&str] = &["format", "options"];

/// Collects every violation found while walking the tree.
#[derive(Debug, Default)]
pub(crate) struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.items.push(Violation::new(field, message));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn into_error(self) -> ConfigError {
        ConfigError::from_violations(self.items)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ConfigDraft {
    pub setting: Option<Setting>,
    pub source: Option<DatasourceDraft>,
    pub target: Option<DatasourceDraft>,
}

#[derive(Debug)]
pub(crate) struct DatasourceDraft {
    pub ctx: String,
    pub kind: Option<DatasourceKind>,
    pub file: Option<FileDraft>,
    pub database: Option<DatabaseDraft>,
}

#[derive(Debug, Default)]
pub(crate) struct FileDraft {
    pub format: Option<FileFormat>,
    pub path: Option<String>,
    pub options: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub(crate) struct DatabaseDraft {
    pub options: Option<DatabaseOptionsDraft>,
}

#[derive(Debug, Default)]
pub(crate) struct DatabaseOptionsDraft {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dbtable: Option<String>,
    pub query: Option<String>,
    pub driver: Option<String>,
    pub partition_column: Option<String>,
    pub lower_bound: Option<i64>,
    pub upper_bound: Option<i64>,
    pub num_partitions: Option<i64>,
    pub tuning: Vec<(String, String)>,
}

pub(crate) fn parse_root(tree: &ConfigNode, v: &mut Violations) -> ConfigDraft {
    let Some(root) = section(Some(tree), "root", true, v) else {
        return ConfigDraft::default();
    };
    check_known_keys(root, "root", ROOT_KEYS, v);
    ConfigDraft {
        setting: parse_setting(lookup(root, "setting"), v),
        source: parse_datasource(lookup(root, "source"), "source", v),
        target: parse_datasource(lookup(root, "target"), "target", v),
    }
}

fn parse_setting(node: Option<&ConfigNode>, v: &mut Violations) -> Option<Setting> {
    let ctx = "setting";
    let entries = section(node, ctx, true, v)?;
    check_known_keys(entries, ctx, SETTING_KEYS, v);

    let validation_name = required_text(entries, "validation_name", ctx, v);
    let validation_threshold = required_int(entries, "validation_threshold", ctx, v).and_then(
        |value| match u8::try_from(value) {
            Ok(threshold) if threshold <= 100 => Some(threshold),
            _ => {
                v.push(
                    field(ctx, "validation_threshold"),
                    format!("must be between 0 and 100, got {value}"),
                );
                None
            }
        },
    );
    let validate_content = opt_bool(entries, "validate_content", ctx, v).unwrap_or(false);

    let delay_key = aliased_key(entries, "defaulttimedelay", "default_time_delay_seconds", ctx, v);
    let default_time_delay_seconds = match opt_int(entries, delay_key, ctx, v) {
        None => Some(0),
        Some(value) => match u64::try_from(value) {
            Ok(delay) => Some(delay),
            Err(_) => {
                v.push(
                    field(ctx, delay_key),
                    format!("must be zero or positive, got {value}"),
                );
                None
            }
        },
    };

    let source_name = required_text(entries, "source_name", ctx, v);
    let destination_name = required_text(entries, "destination_name", ctx, v);
    let summary_key = aliased_key(entries, "summary_log", "summary_log_path_template", ctx, v);
    let summary_log_path_template = required_text(entries, summary_key, ctx, v);
    let granularity = opt_choice(
        entries,
        "granularity",
        ctx,
        Granularity::ALLOWED,
        Granularity::parse,
        v,
    )
    .unwrap_or(Granularity::Hourly);
    let validation_type = required_choice(
        entries,
        "validation_type",
        ctx,
        ValidationType::ALLOWED,
        ValidationType::parse,
        v,
    );

    Some(Setting {
        validation_name: validation_name?,
        validation_threshold: validation_threshold?,
        validate_content,
        default_time_delay_seconds: default_time_delay_seconds?,
        source_name: source_name?,
        destination_name: destination_name?,
        summary_log_path_template: summary_log_path_template?,
        granularity,
        validation_type: validation_type?,
    })
}

fn parse_datasource(
    node: Option<&ConfigNode>,
    ctx: &str,
    v: &mut Violations,
) -> Option<DatasourceDraft> {
    let entries = section(node, ctx, true, v)?;
    check_known_keys(entries, ctx, DATASOURCE_KEYS, v);

    let kind = required_choice(
        entries,
        "type",
        ctx,
        DatasourceKind::ALLOWED,
        DatasourceKind::parse,
        v,
    );

    let file_ctx = field(ctx, "file_config");
    let file = present(lookup(entries, "file_config"))
        .map(|node| parse_file_config(node, &file_ctx, v));
    let database_ctx = field(ctx, "database_config");
    let database = present(lookup(entries, "database_config"))
        .map(|node| parse_database_config(node, &database_ctx, v));

    Some(DatasourceDraft {
        ctx: ctx.to_string(),
        kind,
        file,
        database,
    })
}

fn parse_file_config(node: &ConfigNode, ctx: &str, v: &mut Violations) -> FileDraft {
    let Some(entries) = section(Some(node), ctx, true, v) else {
        return FileDraft::default();
    };
    check_known_keys(entries, ctx, FILE_CONFIG_KEYS, v);
    let format = required_choice(entries, "format", ctx, FileFormat::ALLOWED, FileFormat::parse, v);
    FileDraft {
        format,
        path: required_text(entries, "path", ctx, v),
        options: option_entries(lookup(entries, "options"), &field(ctx, "options"), v),
    }
}

fn parse_database_config(node: &ConfigNode, ctx: &str, v: &mut Violations) -> DatabaseDraft {
    let Some(entries) = section(Some(node), ctx, true, v) else {
        return DatabaseDraft::default();
    };
    check_known_keys(entries, ctx, DATABASE_CONFIG_KEYS, v);
    if let Some(format) = required_text(entries, "format", ctx, v) {
        if format != "jdbc" {
            v.push(
                field(ctx, "format"),
                format!("unsupported value {format} (allowed: jdbc)"),
            );
        }
    }
    let options_ctx = field(ctx, "options");
    let options = section(lookup(entries, "options"), &options_ctx, true, v)
        .map(|entries| parse_database_options(entries, &options_ctx, v));
    DatabaseDraft { options }
}

fn parse_database_options(entries: &Entries, ctx: &str, v: &mut Violations) -> DatabaseOptionsDraft {
    let tuning = entries
        .iter()
        .filter(|(key, _)| !crate::config::types::DATABASE_STRUCTURAL_KEYS.contains(&key.as_str()))
        .filter_map(|(key, node)| scalar_entry(key, node, ctx, v))
        .collect();

    DatabaseOptionsDraft {
        url: required_text(entries, "url", ctx, v),
        user: opt_text(entries, "user", ctx, v),
        password: opt_text(entries, "password", ctx, v),
        dbtable: opt_text(entries, "dbtable", ctx, v),
        query: opt_text(entries, "query", ctx, v),
        driver: opt_text(entries, "driver", ctx, v),
        partition_column: opt_text(entries, "partitionColumn", ctx, v),
        lower_bound: opt_int(entries, "lowerBound", ctx, v),
        upper_bound: opt_int(entries, "upperBound", ctx, v),
        num_partitions: opt_int(entries, "numPartitions", ctx, v),
        tuning,
    }
}

/// Raw `key -> text` pairs of an options block. Empty values count as unset.
fn option_entries(node: Option<&ConfigNode>, ctx: &str, v: &mut Violations) -> Vec<(String, String)> {
    let Some(entries) = section(present(node), ctx, false, v) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|(key, node)| scalar_entry(key, node, ctx, v))
        .collect()
}

fn scalar_entry(
    key: &str,
    node: &ConfigNode,
    ctx: &str,
    v: &mut Violations,
) -> Option<(String, String)> {
    match node {
        ConfigNode::Empty => None,
        ConfigNode::Text(text) => Some((key.to_string(), text.clone())),
        other => {
            v.push(
                field(ctx, key),
                format!("expected a scalar value, got {}", other.kind()),
            );
            None
        }
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn field(ctx: &str, key: &str) -> String {
    format!("{ctx}.{key}")
}

fn lookup<'a>(entries: &'a Entries, key: &str) -> Option<&'a ConfigNode> {
    entries
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value)
}

fn present(node: Option<&ConfigNode>) -> Option<&ConfigNode> {
    match node {
        None | Some(ConfigNode::Empty) => None,
        Some(node) => Some(node),
    }
}

fn section<'a>(
    node: Option<&'a ConfigNode>,
    ctx: &str,
    required: bool,
    v: &mut Violations,
) -> Option<&'a Entries> {
    match node {
        None => {
            if required {
                v.push(ctx, "missing required section");
            }
            None
        }
        Some(ConfigNode::Map(entries)) => Some(entries.as_slice()),
        Some(ConfigNode::Empty) => Some(&[]),
        Some(other) => {
            v.push(ctx, format!("expected map, got {}", other.kind()));
            None
        }
    }
}

fn check_known_keys(entries: &Entries, ctx: &str, allowed: &[&str], v: &mut Violations) {
    for (key, _) in entries {
        if !allowed.contains(&key.as_str()) {
            v.push(
                field(ctx, key),
                format!("unknown field (allowed: {})", allowed.join(", ")),
            );
        }
    }
}

/// Picks the key to read when a field accepts an alternate spelling. Both being set is a conflict.
fn aliased_key<'k>(
    entries: &Entries,
    primary: &'k str,
    alias: &'k str,
    ctx: &str,
    v: &mut Violations,
) -> &'k str {
    let has_primary = present(lookup(entries, primary)).is_some();
    let has_alias = present(lookup(entries, alias)).is_some();
    match (has_primary, has_alias) {
        (true, true) => {
            v.push(
                field(ctx, alias),
                format!("conflicts with {}; set only one", field(ctx, primary)),
            );
            primary
        }
        (false, true) => alias,
        _ => primary,
    }
}

fn scalar<'a>(entries: &'a Entries, key: &str, ctx: &str, v: &mut Violations) -> Option<&'a str> {
    match lookup(entries, key)? {
        node if is_blank(node) => None,
        ConfigNode::Text(text) => Some(text.as_str()),
        other => {
            v.push(
                field(ctx, key),
                format!("expected a scalar value, got {}", other.kind()),
            );
            None
        }
    }
}

fn is_blank(node: &ConfigNode) -> bool {
    match node {
        ConfigNode::Empty => true,
        ConfigNode::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Reports a missing or blank required field. Non-scalar values are left to the typed readers.
fn require(entries: &Entries, key: &str, ctx: &str, v: &mut Violations) -> bool {
    match lookup(entries, key) {
        None => {
            v.push(field(ctx, key), "missing required field");
            false
        }
        Some(node) if is_blank(node) => {
            v.push(field(ctx, key), "must not be empty");
            false
        }
        Some(_) => true,
    }
}

fn required_text(entries: &Entries, key: &str, ctx: &str, v: &mut Violations) -> Option<String> {
    if !require(entries, key, ctx, v) {
        return None;
    }
    opt_text(entries, key, ctx, v)
}

fn opt_text(entries: &Entries, key: &str, ctx: &str, v: &mut Violations) -> Option<String> {
    scalar(entries, key, ctx, v).map(str::to_string)
}

fn opt_int(entries: &Entries, key: &str, ctx: &str, v: &mut Violations) -> Option<i64> {
    let text = scalar(entries, key, ctx, v)?;
    match text.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            v.push(field(ctx, key), format!("expected integer, got {text:?}"));
            None
        }
    }
}

fn required_int(entries: &Entries, key: &str, ctx: &str, v: &mut Violations) -> Option<i64> {
    if !require(entries, key, ctx, v) {
        return None;
    }
    opt_int(entries, key, ctx, v)
}

fn opt_bool(entries: &Entries, key: &str, ctx: &str, v: &mut Violations) -> Option<bool> {
    let text = scalar(entries, key, ctx, v)?;
    match parse_bool(text) {
        Some(value) => Some(value),
        None => {
            v.push(field(ctx, key), format!("expected boolean, got {text:?}"));
            None
        }
    }
}

fn opt_choice<T>(
    entries: &Entries,
    key: &str,
    ctx: &str,
    allowed: &[&str],
    parse: fn(&str) -> Option<T>,
    v: &mut Violations,
) -> Option<T> {
    let text = scalar(entries, key, ctx, v)?;
    match parse(text.trim()) {
        Some(value) => Some(value),
        None => {
            v.push(
                field(ctx, key),
                format!("unsupported value {text} (allowed: {})", allowed.join(", ")),
            );
            None
        }
    }
}

fn required_choice<T>(
    entries: &Entries,
    key: &str,
    ctx: &str,
    allowed: &[&str],
    parse: fn(&str) -> Option<T>,
    v: &mut Violations,
) -> Option<T> {
    if !require(entries, key, ctx, v) {
        return None;
    }
    opt_choice(entries, key, ctx, allowed, parse, v)
}
