use std::path::PathBuf;

use chrono::NaiveDate;
use recon_core::config::{config_from_tree, parse_yaml, resolve, ComputeMaster, RunArguments};
use recon_core::report::run_echo;

#[test]
fn echo_masks_password_and_shows_rendered_values() {
    let yaml = r#"
setting:
  validation_name: orders
  validation_threshold: 1
  source_name: a
  destination_name: b
  summary_log: /summary/%Y%m%d
  granularity: daily
  validation_type: jdbc-jdbc
source:
  type: database
  database_config:
    format: jdbc
    options:
      url: jdbc:postgresql://db/a
      user: etl
      password: hunter2
      dbtable: orders
target:
  type: database
  database_config:
    format: jdbc
    options:
      url: jdbc:postgresql://db/b
      query: select * from orders
"#;
    let tree = parse_yaml(yaml).expect("yaml");
    let args = RunArguments {
        config_path: PathBuf::from("/etc/recon/orders.yml"),
        override_datetime: Some("2024-05-02 03:04:05".to_string()),
        verbose: true,
        compute_master: ComputeMaster::Local,
    };
    let config = config_from_tree(&tree, args).expect("config");
    let now = NaiveDate::from_ymd_opt(2030, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("now");
    let run = resolve(config, now).expect("resolve");

    let echo = run_echo(&run);
    let text = echo.to_string();
    assert!(!text.contains("hunter2"));
    assert_eq!(echo["source"]["database_config"]["options"]["password"], "***");
    assert_eq!(echo["source"]["database_config"]["options"]["user"], "etl");
    assert_eq!(echo["setting"]["summary_log"], "/summary/20240502");
    assert_eq!(echo["process_datetime"], "2024-05-02 00:00:00");
    assert_eq!(echo["args"]["spark_master"], "local");
    assert!(echo["target"]["database_config"]["options"].get("password").is_none());
}
