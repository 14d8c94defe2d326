use serde::Deserialize;
use serde::Deserializer;

use crate::constants::DEFAULT_VIRTUAL_NODES;
use crate::Error;
use crate::Result;

#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    /// Namespace of the membership group
    #[serde(default)]
    pub service_name: String,

    /// Bootstrap addresses of the directory service.
    /// Accepts a list or a comma-separated string.
    #[serde(default, deserialize_with = "deserialize_endpoints")]
    pub endpoints: Vec<String>,

    /// Virtual points per member on the hash ring
    #[serde(default = "default_virtual_nodes")]
    pub virtual_nodes: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            endpoints: vec![],
            virtual_nodes: default_virtual_nodes(),
        }
    }
}

impl DirectoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(Error::invalid_config("service_name can't be empty"));
        }

        if self.endpoints.is_empty() {
            return Err(Error::invalid_config("endpoints must contain at least one address"));
        }

        if let Some(blank) = self.endpoints.iter().find(|e| e.trim().is_empty()) {
            return Err(Error::invalid_config(format!("blank endpoint in {:?} ({blank:?})", self.endpoints)));
        }

        if self.virtual_nodes == 0 {
            return Err(Error::invalid_config("virtual_nodes must be at least 1"));
        }

        Ok(())
    }
}

/// Splits a comma-separated endpoint list, trimming whitespace and dropping
/// empty segments.
pub fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEndpoints {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_endpoints<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawEndpoints::deserialize(deserializer)? {
        RawEndpoints::List(list) => list
            .iter()
            .flat_map(|entry| parse_endpoints(entry))
            .collect(),
        RawEndpoints::Csv(raw) => parse_endpoints(&raw),
    })
}

fn default_virtual_nodes() -> usize {
    DEFAULT_VIRTUAL_NODES
}
