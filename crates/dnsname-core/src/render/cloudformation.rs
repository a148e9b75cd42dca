// # CloudFormation Target
//
// Collects rendered resources into a CloudFormation JSON template.
// References to other resources are `Ref` / `Fn::GetAtt` intrinsics keyed by
// logical id, so CloudFormation orders creation correctly.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name written by [`CloudformationTarget::write_to`]
pub const CLOUDFORMATION_FILE_NAME: &str = "dnsname.template.json";

/// Template format version emitted in every document
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Logical ids must be alphanumeric; the resource type is folded in so two
/// resources with the same name but different types do not collide
pub fn logical_id(resource_type: &str, resource_name: &str) -> String {
    resource_type
        .chars()
        .chain(resource_name.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// A value CloudFormation resolves at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// `{"Ref": logical_id}`
    Ref(String),
    /// `{"Fn::GetAtt": [logical_id, attribute]}`
    GetAtt {
        /// Resource logical id
        logical_id: String,
        /// Attribute name
        attribute: String,
    },
    /// A plain string
    Value(String),
}

impl Literal {
    /// Reference another resource
    pub fn reference(resource_type: &str, resource_name: &str) -> Self {
        Self::Ref(logical_id(resource_type, resource_name))
    }

    /// Reference an attribute of another resource
    pub fn get_att(resource_type: &str, resource_name: &str, attribute: &str) -> Self {
        Self::GetAtt {
            logical_id: logical_id(resource_type, resource_name),
            attribute: attribute.to_string(),
        }
    }

    /// A plain string value
    pub fn from_string(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Literal::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Literal::GetAtt {
                logical_id,
                attribute,
            } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                map.end()
            }
            Literal::Value(v) => serializer.serialize_str(v),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Ref(id) => write!(f, "!Ref {}", id),
            Literal::GetAtt {
                logical_id,
                attribute,
            } => write!(f, "!GetAtt {}.{}", logical_id, attribute),
            Literal::Value(v) => f.write_str(v),
        }
    }
}

/// Render target for CloudFormation JSON output
#[derive(Debug, Default)]
pub struct CloudformationTarget {
    /// logical id -> `{"Type": .., "Properties": ..}`
    resources: BTreeMap<String, serde_json::Value>,
}

impl CloudformationTarget {
    /// Create an empty target
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource
    pub fn render_resource<T: Serialize>(
        &mut self,
        resource_type: &str,
        resource_name: &str,
        properties: &T,
    ) -> Result<()> {
        let id = logical_id(resource_type, resource_name);
        if self.resources.contains_key(&id) {
            return Err(Error::invalid_input(format!(
                "duplicate cloudformation resource {}",
                id
            )));
        }

        let body = serde_json::json!({
            "Type": resource_type,
            "Properties": serde_json::to_value(properties)?,
        });

        tracing::debug!("Rendered cloudformation resource {} ({})", id, resource_type);
        self.resources.insert(id, body);
        Ok(())
    }

    /// Look up a rendered resource by type and name
    pub fn resource(&self, resource_type: &str, resource_name: &str) -> Option<&serde_json::Value> {
        self.resources.get(&logical_id(resource_type, resource_name))
    }

    /// Number of rendered resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing has been rendered
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The complete template
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
            "Resources": self.resources,
        })
    }

    /// The complete template, pretty-printed
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Write the template into `dir`, returning the file path
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CLOUDFORMATION_FILE_NAME);
        super::write_atomic(&path, self.to_json_pretty()?.as_bytes()).await?;
        Ok(path)
    }
}
