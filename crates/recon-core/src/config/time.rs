use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::config::parse::Violations;
use crate::config::{Datasource, Granularity, TableOrQuery, ValidationConfig, ValidationRun};
use crate::ConfigError;

pub const OVERRIDE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_override_datetime(value: &str) -> Result<NaiveDateTime, ConfigError> {
    NaiveDateTime::parse_from_str(value.trim(), OVERRIDE_DATETIME_FORMAT).map_err(|err| {
        ConfigError::new(
            "args.datetime",
            format!("expected YYYY-MM-DD HH:MM:SS, got {value:?} ({err})"),
        )
    })
}

/// Floors `ts` to the start of its month, day or hour.
pub fn truncate(ts: NaiveDateTime, granularity: Granularity) -> NaiveDateTime {
    let date = ts.date();
    match granularity {
        Granularity::Monthly => date
            .with_day(1)
            .unwrap_or(date)
            .and_time(NaiveTime::default()),
        Granularity::Daily => date.and_time(NaiveTime::default()),
        Granularity::Hourly => date.and_time(
            NaiveTime::from_hms_opt(ts.hour(), 0, 0).unwrap_or_default(),
        ),
    }
}

/// The timestamp a run validates: the override if given, else `now` minus the
/// configured delay, floored to the granularity.
pub fn process_datetime(
    override_datetime: Option<&str>,
    delay_seconds: u64,
    granularity: Granularity,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, ConfigError> {
    let base = match override_datetime {
        Some(value) => parse_override_datetime(value)?,
        None => {
            let delay = i64::try_from(delay_seconds)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .and_then(|delay| now.checked_sub_signed(delay));
            delay.ok_or_else(|| {
                ConfigError::new(
                    "setting.defaulttimedelay",
                    format!("delay of {delay_seconds} seconds is out of range"),
                )
            })?
        }
    };
    Ok(truncate(base, granularity))
}

/// Expands strftime directives in `template`. Unknown directives are an error
/// naming `field`, never passed through literally.
pub fn render_template(
    template: &str,
    ts: NaiveDateTime,
    field: &str,
) -> Result<String, ConfigError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::new(
            field,
            format!("invalid strftime directive in {template:?}"),
        ));
    }
    let mut rendered = String::with_capacity(template.len());
    write!(rendered, "{}", ts.format_with_items(items.into_iter())).map_err(|_| {
        ConfigError::new(
            field,
            format!("directive in {template:?} needs a time zone, which a local timestamp lacks"),
        )
    })?;
    Ok(rendered)
}

/// Turns a validated config into a run: derives the process timestamp and
/// renders every templated field once. Render failures are collected.
pub fn resolve(config: ValidationConfig, now: NaiveDateTime) -> Result<ValidationRun, ConfigError> {
    let ValidationConfig {
        args,
        setting,
        source,
        target,
    } = config;
    let ts = process_datetime(
        args.override_datetime.as_deref(),
        setting.default_time_delay_seconds,
        setting.granularity,
        now,
    )?;

    let mut violations = Violations::default();
    let summary_log_path = render_into(
        &setting.summary_log_path_template,
        ts,
        "setting.summary_log",
        &mut violations,
    );
    let source = render_datasource(source, ts, "source", &mut violations);
    let target = render_datasource(target, ts, "target", &mut violations);
    if !violations.is_empty() {
        return Err(violations.into_error());
    }

    Ok(ValidationRun {
        args,
        setting,
        source,
        target,
        process_datetime: ts,
        summary_log_path: summary_log_path.unwrap_or_default(),
    })
}

fn render_into(
    template: &str,
    ts: NaiveDateTime,
    field: &str,
    violations: &mut Violations,
) -> Option<String> {
    match render_template(template, ts, field) {
        Ok(rendered) => Some(rendered),
        Err(err) => {
            for violation in err.violations {
                violations.push(violation.field, violation.message);
            }
            None
        }
    }
}

fn render_datasource(
    datasource: Datasource,
    ts: NaiveDateTime,
    side: &str,
    violations: &mut Violations,
) -> Datasource {
    match datasource {
        Datasource::File(mut file) => {
            let field = format!("{side}.file_config.path");
            if let Some(path) = render_into(&file.path_template, ts, &field, violations) {
                file.path_template = path;
            }
            Datasource::File(file)
        }
        Datasource::Database(mut database) => {
            if let TableOrQuery::Query(query) = &mut database.options.relation {
                let field = format!("{side}.database_config.options.query");
                if let Some(rendered) = render_into(query, ts, &field, violations) {
                    *query = rendered;
                }
            }
            Datasource::Database(database)
        }
    }
}
