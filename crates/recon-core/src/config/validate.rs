use crate::config::parse::{field, parse_bool, parse_root, DatabaseOptionsDraft, DatasourceDraft, FileDraft, Violations};
use crate::config::tree::ConfigNode;
use crate::config::types::{OptionKind, OptionSpec, DATABASE_TUNING_OPTIONS};
use crate::config::{
    Credentials, DatabaseDatasetConfig, DatabaseOptions, Datasource, DatasourceKind,
    FileDatasetConfig, FileFormat, FileOptions, OptionSet, OptionValue, Partitioning,
    RunArguments, Setting, TableOrQuery, ValidationConfig,
};
use crate::ConfigError;

/// Runs the structural pass and the cross-field pass over a loaded tree. All
/// violations from both passes are reported together.
pub(crate) fn build_config(tree: &ConfigNode, args: RunArguments) -> Result<ValidationConfig, ConfigError> {
    let mut violations = Violations::default();
    let draft = parse_root(tree, &mut violations);

    let source = draft
        .source
        .and_then(|source| build_datasource(source, &mut violations));
    let target = draft
        .target
        .and_then(|target| build_datasource(target, &mut violations));

    if let (Some(setting), Some(source), Some(target)) = (&draft.setting, &source, &target) {
        check_validation_type(setting, source, target, &mut violations);
    }

    if !violations.is_empty() {
        return Err(violations.into_error());
    }
    match (draft.setting, source, target) {
        (Some(setting), Some(source), Some(target)) => Ok(ValidationConfig {
            args,
            setting,
            source,
            target,
        }),
        _ => Err(ConfigError::new("config", "configuration is incomplete")),
    }
}

fn build_datasource(draft: DatasourceDraft, v: &mut Violations) -> Option<Datasource> {
    let ctx = draft.ctx;
    let built = match (draft.file, draft.database) {
        (Some(_), Some(_)) => {
            v.push(
                ctx.as_str(),
                "file_config and database_config are mutually exclusive; set exactly one",
            );
            return None;
        }
        (None, None) => {
            let expected = match draft.kind {
                Some(DatasourceKind::Database) => "database_config",
                Some(DatasourceKind::File) => "file_config",
                None => "file_config or database_config",
            };
            v.push(ctx.as_str(), format!("{expected} is required"));
            return None;
        }
        (Some(file), None) => {
            build_file_config(file, &field(&ctx, "file_config"), v).map(Datasource::File)
        }
        (None, Some(database)) => database
            .options
            .and_then(|options| {
                build_database_options(options, &field(&ctx, "database_config.options"), v)
            })
            .map(|options| Datasource::Database(DatabaseDatasetConfig { options })),
    };

    let kind = draft.kind?;
    let datasource = built?;
    if datasource.kind() != kind {
        v.push(
            field(&ctx, "type"),
            format!(
                "type {} requires {}_config, got {}_config",
                kind.as_str(),
                config_prefix(kind),
                config_prefix(datasource.kind())
            ),
        );
        return None;
    }
    Some(datasource)
}

fn config_prefix(kind: DatasourceKind) -> &'static str {
    match kind {
        DatasourceKind::File => "file",
        DatasourceKind::Database => "database",
    }
}

fn build_file_config(draft: FileDraft, ctx: &str, v: &mut Violations) -> Option<FileDatasetConfig> {
    let format = draft.format?;
    let values = build_option_set(
        &draft.options,
        format.option_specs(),
        &field(ctx, "options"),
        &format!("format {}", format.as_str()),
        v,
    );
    let options = match format {
        FileFormat::Csv => FileOptions::Csv(values),
        FileFormat::Parquet => FileOptions::Parquet(values),
    };
    Some(FileDatasetConfig {
        path_template: draft.path?,
        options,
    })
}

fn build_database_options(
    draft: DatabaseOptionsDraft,
    ctx: &str,
    v: &mut Violations,
) -> Option<DatabaseOptions> {
    let relation = match (draft.dbtable, draft.query) {
        (Some(table), None) => Some(TableOrQuery::Table(table)),
        (None, Some(query)) => Some(TableOrQuery::Query(query)),
        (Some(_), Some(_)) => {
            v.push(ctx, "dbtable and query are mutually exclusive; set only one");
            None
        }
        (None, None) => {
            v.push(ctx, "one of dbtable or query is required");
            None
        }
    };

    let mut tuning = build_option_set(
        &draft.tuning,
        DATABASE_TUNING_OPTIONS,
        ctx,
        "database options",
        v,
    );

    let partitioning = match (
        draft.partition_column,
        draft.lower_bound,
        draft.upper_bound,
        draft.num_partitions,
    ) {
        (None, None, None, None) => None,
        (None, None, None, Some(num_partitions)) => {
            tuning.insert("numPartitions", OptionValue::Int(num_partitions));
            None
        }
        (Some(column), Some(lower_bound), Some(upper_bound), Some(num_partitions)) => {
            if lower_bound > upper_bound {
                v.push(
                    field(ctx, "lowerBound"),
                    format!("must not exceed upperBound ({lower_bound} > {upper_bound})"),
                );
            }
            if num_partitions < 1 {
                v.push(
                    field(ctx, "numPartitions"),
                    format!("must be at least 1, got {num_partitions}"),
                );
            }
            Some(Partitioning {
                column,
                lower_bound,
                upper_bound,
                num_partitions,
            })
        }
        _ => {
            v.push(
                ctx,
                "partitionColumn, lowerBound, upperBound and numPartitions must be set together",
            );
            None
        }
    };
    if partitioning.is_some() && matches!(relation, Some(TableOrQuery::Query(_))) {
        v.push(
            field(ctx, "partitionColumn"),
            "cannot be combined with query; use dbtable",
        );
    }

    let credentials = match (draft.user, draft.password) {
        (None, None) => None,
        (user, password) => Some(Credentials { user, password }),
    };

    Some(DatabaseOptions {
        url: draft.url?,
        credentials,
        relation: relation?,
        driver: draft.driver,
        partitioning,
        tuning,
    })
}

fn build_option_set(
    entries: &[(String, String)],
    specs: &[OptionSpec],
    ctx: &str,
    scope: &str,
    v: &mut Violations,
) -> OptionSet {
    let mut options = OptionSet::default();
    for (key, raw) in entries {
        let Some(spec) = specs.iter().find(|spec| spec.key == key) else {
            v.push(field(ctx, key), format!("unknown option for {scope}"));
            continue;
        };
        match coerce(spec.kind, raw) {
            Ok(value) => options.insert(spec.key, value),
            Err(message) => v.push(field(ctx, key), message),
        }
    }
    options
}

fn coerce(kind: OptionKind, raw: &str) -> Result<OptionValue, String> {
    match kind {
        OptionKind::Text => Ok(OptionValue::Text(raw.to_string())),
        OptionKind::Bool => parse_bool(raw)
            .map(OptionValue::Bool)
            .ok_or_else(|| format!("expected boolean, got {raw:?}")),
        OptionKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(OptionValue::Int)
            .map_err(|_| format!("expected integer, got {raw:?}")),
        OptionKind::Float => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(OptionValue::Float(value)),
            _ => Err(format!("expected number, got {raw:?}")),
        },
        OptionKind::OneOf(allowed) => {
            let trimmed = raw.trim();
            if allowed.contains(&trimmed) {
                Ok(OptionValue::Text(trimmed.to_string()))
            } else {
                Err(format!(
                    "unsupported value {trimmed} (allowed: {})",
                    allowed.join(", ")
                ))
            }
        }
    }
}

fn check_validation_type(
    setting: &Setting,
    source: &Datasource,
    target: &Datasource,
    v: &mut Violations,
) {
    let (expected_source, expected_target) = setting.validation_type.kinds();
    let sides = [
        ("source", expected_source, source.kind()),
        ("target", expected_target, target.kind()),
    ];
    for (side, expected, actual) in sides {
        if expected != actual {
            v.push(
                "setting.validation_type",
                format!(
                    "{} expects a {} {side}, but {side}.type is {}",
                    setting.validation_type.as_str(),
                    expected.as_str(),
                    actual.as_str()
                ),
            );
        }
    }
}
