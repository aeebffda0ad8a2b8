//! Compose file ingestion.
//!
//! Produces the [`ConfigModel`] the layout pass works on. Both the short and
//! the long compose syntaxes are accepted for `ports`, `environment`,
//! `volumes` and `depends_on`; everything is normalized to plain strings.

use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{Error, Result};

/// Service name → descriptor, in document order.
pub type ConfigModel = IndexMap<String, ServiceDescriptor>;

/// One entry of the `services` mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Always the key under `services`, never read from the body.
    #[serde(skip_deserializing)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_ports",
        skip_serializing_if = "Option::is_none"
    )]
    pub ports: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "de_environment",
        skip_serializing_if = "Option::is_none"
    )]
    pub environment: Option<IndexMap<String, String>>,
    #[serde(
        default,
        deserialize_with = "de_volumes",
        skip_serializing_if = "Option::is_none"
    )]
    pub volumes: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "de_depends_on",
        skip_serializing_if = "Option::is_none"
    )]
    pub depends_on: Option<Vec<String>>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn dependencies(&self) -> &[String] {
        self.depends_on.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: Option<IndexMap<String, Option<ServiceDescriptor>>>,
}

/// Parse a compose document into a [`ConfigModel`].
///
/// A document without a `services` key (or an empty document) yields an empty
/// model.
pub fn parse_compose(content: &str) -> Result<ConfigModel> {
    let document: Value =
        serde_yaml::from_str(content).map_err(|e| Error::Compose(e.to_string()))?;

    let file: ComposeFile = match document {
        Value::Null => return Ok(ConfigModel::new()),
        Value::Mapping(_) => {
            serde_yaml::from_value(document).map_err(|e| Error::Compose(e.to_string()))?
        }
        _ => {
            return Err(Error::Compose(
                "top level of the document must be a mapping".to_string(),
            ));
        }
    };

    // `name:` with an empty body is a service with no settings
    let services = file
        .services
        .unwrap_or_default()
        .into_iter()
        .map(|(name, service)| {
            let mut service = service.unwrap_or_default();
            service.name = name.clone();
            (name, service)
        })
        .collect();
    Ok(services)
}

/// Read and parse a compose file from disk.
pub fn load_compose(path: impl AsRef<Path>) -> Result<ConfigModel> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_compose(&content)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn mapping_str(map: &serde_yaml::Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(scalar_to_string).filter(|s| !s.is_empty())
}

fn expect_sequence<E: de::Error>(value: Value, field: &str) -> std::result::Result<Vec<Value>, E> {
    match value {
        Value::Sequence(items) => Ok(items),
        other => Err(E::custom(format!(
            "`{}` must be a list, found {}",
            field,
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn de_ports<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut ports = Vec::new();
    for item in expect_sequence::<D::Error>(value, "ports")? {
        let port = match &item {
            // Long syntax: { target, published, protocol }
            Value::Mapping(map) => {
                let target = mapping_str(map, "target")
                    .ok_or_else(|| D::Error::custom("port mapping is missing `target`"))?;
                match mapping_str(map, "published") {
                    Some(published) => format!("{published}:{target}"),
                    None => target,
                }
            }
            other => scalar_to_string(other).ok_or_else(|| {
                D::Error::custom(format!("unsupported port entry: {}", kind(other)))
            })?,
        };
        ports.push(port);
    }
    Ok(Some(ports))
}

fn de_environment<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<IndexMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut env = IndexMap::new();
    match value {
        Value::Mapping(map) => {
            for (key, val) in map {
                let key = scalar_to_string(&key)
                    .ok_or_else(|| D::Error::custom("environment keys must be scalars"))?;
                let val = scalar_to_string(&val).ok_or_else(|| {
                    D::Error::custom(format!("environment value for `{key}` must be a scalar"))
                })?;
                env.insert(key, val);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                let entry = scalar_to_string(&item)
                    .ok_or_else(|| D::Error::custom("environment entries must be strings"))?;
                match entry.split_once('=') {
                    Some((key, val)) => env.insert(key.to_string(), val.to_string()),
                    None => env.insert(entry, String::new()),
                };
            }
        }
        other => {
            return Err(D::Error::custom(format!(
                "`environment` must be a mapping or a list, found {}",
                kind(&other)
            )));
        }
    }
    Ok(Some(env))
}

fn de_volumes<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut volumes = Vec::new();
    for item in expect_sequence::<D::Error>(value, "volumes")? {
        let volume = match &item {
            Value::String(s) => s.clone(),
            // Long syntax: { type, source, target, read_only }
            Value::Mapping(map) => {
                let target = mapping_str(map, "target")
                    .ok_or_else(|| D::Error::custom("volume mapping is missing `target`"))?;
                match mapping_str(map, "source") {
                    Some(source) => format!("{source}:{target}"),
                    None => target,
                }
            }
            other => {
                return Err(D::Error::custom(format!(
                    "unsupported volume entry: {}",
                    kind(other)
                )));
            }
        };
        volumes.push(volume);
    }
    Ok(Some(volumes))
}

fn de_depends_on<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let deps = match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(D::Error::custom(format!(
                    "depends_on entries must be service names, found {}",
                    kind(other)
                ))),
            })
            .collect::<std::result::Result<Vec<_>, D::Error>>()?,
        // Long syntax: service name → { condition, restart }
        Value::Mapping(map) => map
            .keys()
            .map(|key| match key {
                Value::String(s) => Ok(s.clone()),
                other => Err(D::Error::custom(format!(
                    "depends_on keys must be service names, found {}",
                    kind(other)
                ))),
            })
            .collect::<std::result::Result<Vec<_>, D::Error>>()?,
        other => {
            return Err(D::Error::custom(format!(
                "`depends_on` must be a list or a mapping, found {}",
                kind(&other)
            )));
        }
    };
    Ok(Some(deps))
}
