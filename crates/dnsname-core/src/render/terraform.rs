// # Terraform Target
//
// Collects rendered resources into a Terraform JSON document
// (`*.tf.json`). Cross-resource references are expressed as interpolation
// literals so Terraform keeps the dependency edges between resources.
//
// ## File Format
//
// ```json
// {
//   "resource": {
//     "aws_route53_record": {
//       "api-cluster1-example-com": {
//         "name": "api.cluster1.example.com",
//         "type": "A",
//         "zone_id": "${aws_route53_zone.cluster1-example-com.zone_id}"
//       }
//     }
//   }
// }
// ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name written by [`TerraformTarget::write_to`]
pub const TERRAFORM_FILE_NAME: &str = "dnsname.tf.json";

/// Terraform resource names cannot contain dots or slashes
pub fn sanitize_name(name: &str) -> String {
    name.replace('.', "-").replace('/', "--")
}

/// A value Terraform resolves at plan time
///
/// Serializes as a plain JSON string, either a literal value or a
/// `${type.name.attribute}` interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Literal(String);

impl Literal {
    /// Reference an attribute of another resource
    pub fn property(resource_type: &str, resource_name: &str, prop: &str) -> Self {
        Self(format!(
            "${{{}.{}.{}}}",
            resource_type,
            sanitize_name(resource_name),
            prop
        ))
    }

    /// Reference the `id` of another resource
    pub fn self_link(resource_type: &str, resource_name: &str) -> Self {
        Self::property(resource_type, resource_name, "id")
    }

    /// A literal string value with no dependency
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The serialized form
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Whether this literal references another resource
    pub fn is_reference(&self) -> bool {
        self.0.starts_with("${") && self.0.ends_with('}')
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render target for Terraform JSON output
#[derive(Debug, Default)]
pub struct TerraformTarget {
    /// resource type -> sanitized name -> body
    resources: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl TerraformTarget {
    /// Create an empty target
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource block
    ///
    /// Fails if a resource with the same type and sanitized name was already
    /// rendered: two records collapsing onto one Terraform name would
    /// silently overwrite each other.
    pub fn render_resource<T: Serialize>(
        &mut self,
        resource_type: &str,
        resource_name: &str,
        body: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(body)?;
        let name = sanitize_name(resource_name);

        let by_type = self.resources.entry(resource_type.to_string()).or_default();
        if by_type.contains_key(&name) {
            return Err(Error::invalid_input(format!(
                "duplicate terraform resource {}.{}",
                resource_type, name
            )));
        }

        tracing::debug!("Rendered terraform resource {}.{}", resource_type, name);
        by_type.insert(name, value);
        Ok(())
    }

    /// Look up a rendered resource body
    pub fn resource(&self, resource_type: &str, resource_name: &str) -> Option<&serde_json::Value> {
        self.resources
            .get(resource_type)
            .and_then(|by_type| by_type.get(&sanitize_name(resource_name)))
    }

    /// Number of rendered resources
    pub fn len(&self) -> usize {
        self.resources.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing has been rendered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The complete document
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({ "resource": self.resources })
    }

    /// The complete document, pretty-printed
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Write the document into `dir`, returning the file path
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(TERRAFORM_FILE_NAME);
        super::write_atomic(&path, self.to_json_pretty()?.as_bytes()).await?;
        Ok(path)
    }
}
