use std::path::Path;

use yaml_rust2::{Yaml, YamlLoader};

use crate::ConfigError;

/// Nested mapping produced by the config loaders. XML and YAML documents both
/// collapse into this shape so the validators never see the source format.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Empty,
    Text(String),
    Map(Vec<(String, ConfigNode)>),
    List(Vec<ConfigNode>),
}

impl ConfigNode {
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Map(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConfigNode::Empty => "empty value",
            ConfigNode::Text(_) => "scalar",
            ConfigNode::Map(_) => "map",
            ConfigNode::List(_) => "list",
        }
    }
}

pub fn load_config_tree(path: &Path) -> Result<ConfigNode, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        ConfigError::new(
            "config",
            format!("cannot read {}: {err}", path.display()),
        )
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("yml") | Some("yaml") => parse_yaml(&contents),
        _ => parse_xml(&contents),
    }
}

/// The root element's children form the top-level mapping. Repeated sibling tags
/// become a list in document order.
pub fn parse_xml(contents: &str) -> Result<ConfigNode, ConfigError> {
    let doc = roxmltree::Document::parse(contents)
        .map_err(|err| ConfigError::new("config", format!("malformed XML: {err}")))?;
    Ok(xml_element(doc.root_element()))
}

fn xml_element(node: roxmltree::Node<'_, '_>) -> ConfigNode {
    let mut children = node.children().filter(|child| child.is_element()).peekable();
    if children.peek().is_none() {
        let text: String = node
            .children()
            .filter(|child| child.is_text())
            .filter_map(|child| child.text())
            .collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ConfigNode::Empty;
        }
        return ConfigNode::Text(trimmed.to_string());
    }

    let mut entries = Vec::new();
    for child in children {
        push_entry(&mut entries, child.tag_name().name(), xml_element(child));
    }
    ConfigNode::Map(entries)
}

fn push_entry(entries: &mut Vec<(String, ConfigNode)>, key: &str, value: ConfigNode) {
    let existing = entries.iter_mut().find(|(name, _)| name == key);
    match existing {
        Some((_, ConfigNode::List(items))) => items.push(value),
        Some((_, slot)) => {
            let first = std::mem::replace(slot, ConfigNode::Empty);
            *slot = ConfigNode::List(vec![first, value]);
        }
        None => entries.push((key.to_string(), value)),
    }
}

pub fn parse_yaml(contents: &str) -> Result<ConfigNode, ConfigError> {
    let docs = YamlLoader::load_from_str(contents)
        .map_err(|err| ConfigError::new("config", format!("malformed YAML: {err}")))?;
    match docs.as_slice() {
        [] => Err(ConfigError::new("config", "YAML is empty")),
        [doc] => Ok(yaml_node(doc)),
        _ => Err(ConfigError::new(
            "config",
            "YAML contains multiple documents; expected one",
        )),
    }
}

fn yaml_node(value: &Yaml) -> ConfigNode {
    match value {
        Yaml::Hash(hash) => ConfigNode::Map(
            hash.iter()
                .map(|(key, value)| (yaml_scalar(key).unwrap_or_default(), yaml_node(value)))
                .collect(),
        ),
        Yaml::Array(items) => ConfigNode::List(items.iter().map(yaml_node).collect()),
        other => match yaml_scalar(other) {
            Some(text) => ConfigNode::Text(text),
            None => ConfigNode::Empty,
        },
    }
}

fn yaml_scalar(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(value) | Yaml::Real(value) => Some(value.clone()),
        Yaml::Integer(value) => Some(value.to_string()),
        Yaml::Boolean(value) => Some(value.to_string()),
        _ => None,
    }
}
