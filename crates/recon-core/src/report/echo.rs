use serde_json::{json, Map, Value};

use crate::config::{Datasource, ValidationRun, OVERRIDE_DATETIME_FORMAT};
use crate::read::ReadRequest;

/// The resolved run as JSON for verbose logging. Unset optionals are left out
/// and the database password is masked.
pub fn run_echo(run: &ValidationRun) -> Value {
    let args = run.args();
    let setting = run.setting();

    let mut args_echo = Map::new();
    args_echo.insert(
        "config".to_string(),
        Value::String(args.config_path.display().to_string()),
    );
    if let Some(datetime) = &args.override_datetime {
        args_echo.insert("datetime".to_string(), Value::String(datetime.clone()));
    }
    args_echo.insert("verbose".to_string(), Value::Bool(args.verbose));
    args_echo.insert(
        "spark_master".to_string(),
        Value::String(args.compute_master.as_str().to_string()),
    );

    json!({
        "args": Value::Object(args_echo),
        "setting": {
            "validation_name": setting.validation_name,
            "validation_threshold": setting.validation_threshold,
            "validate_content": setting.validate_content,
            "defaulttimedelay": setting.default_time_delay_seconds,
            "source_name": setting.source_name,
            "destination_name": setting.destination_name,
            "summary_log": run.summary_log_path(),
            "granularity": setting.granularity.as_str(),
            "validation_type": setting.validation_type.as_str(),
        },
        "source": datasource_echo(run.source()),
        "target": datasource_echo(run.target()),
        "process_datetime": run
            .process_datetime()
            .format(OVERRIDE_DATETIME_FORMAT)
            .to_string(),
    })
}

fn datasource_echo(datasource: &Datasource) -> Value {
    let request = ReadRequest::from_datasource(datasource);
    let options: Map<String, Value> = request
        .redacted_options()
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    match datasource {
        Datasource::File(file) => json!({
            "type": "file",
            "file_config": {
                "format": file.format().as_str(),
                "path": file.path_template,
                "options": options,
            },
        }),
        Datasource::Database(_) => json!({
            "type": "database",
            "database_config": {
                "format": crate::config::DatabaseDatasetConfig::FORMAT,
                "options": options,
            },
        }),
    }
}
