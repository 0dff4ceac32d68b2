mod parse;
mod time;
mod tree;
mod types;
mod validate;

pub use time::{
    parse_override_datetime, process_datetime, render_template, resolve, truncate,
    OVERRIDE_DATETIME_FORMAT,
};
pub use tree::{load_config_tree, parse_xml, parse_yaml, ConfigNode};
pub use types::*;

use crate::ConfigError;

/// Loads the config file named in `args` and validates it. Templates are not
/// rendered yet; see [`resolve`].
pub fn load_config(args: RunArguments) -> Result<ValidationConfig, ConfigError> {
    let tree = load_config_tree(&args.config_path)?;
    validate::build_config(&tree, args)
}

/// Validates an already loaded tree. Used when the config does not come from disk.
pub fn config_from_tree(tree: &ConfigNode, args: RunArguments) -> Result<ValidationConfig, ConfigError> {
    validate::build_config(tree, args)
}
