//! Check definitions - persisted description of a check, built into a runnable one

use crate::tcp::TcpCheck;
use crate::udp::UdpCheck;
use scorebeat_core::{Check, Error, Metadata, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A check as stored in a definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub check_type: String,
    pub group: String,
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,
    /// Type-specific settings (ip, port, content, payload)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_score_weight() -> f64 {
    1.0
}

impl CheckDefinition {
    /// Parse a definition from YAML
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Metadata every result of this check will carry
    pub fn metadata(&self) -> Metadata {
        Metadata::new(&self.id, &self.name, &self.check_type, &self.group)
            .with_score_weight(self.score_weight)
    }

    /// Attribute value, or "" when unset
    pub fn attribute(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }

    /// Build the runnable check for this definition
    pub fn build(&self) -> Result<Box<dyn Check>> {
        match self.check_type.to_lowercase().as_str() {
            "tcp" => Ok(Box::new(TcpCheck::from_definition(self)?)),
            "udp" => Ok(Box::new(UdpCheck::from_definition(self)?)),
            other => Err(Error::UnknownCheckType {
                check_id: self.id.clone(),
                check_type: other.to_string(),
            }),
        }
    }
}

/// Fail with every field whose value is empty
pub(crate) fn require_attributes(check_id: &str, fields: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingAttributes {
            check_id: check_id.to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_YAML: &str = r#"
id: "web01-tcp-blue1"
name: "Web01 TCP"
type: tcp
group: blue1
score_weight: 2.0
attributes:
  ip: "10.0.1.5"
  port: "7"
  content: "pong"
"#;

    #[test]
    fn test_parse_tcp_definition() {
        let def = CheckDefinition::from_yaml(TCP_YAML).unwrap();
        assert_eq!(def.check_type, "tcp");
        assert_eq!(def.attribute("ip"), "10.0.1.5");
        assert_eq!(def.attribute("payload"), "");

        let metadata = def.metadata();
        assert_eq!(metadata.id, "web01-tcp-blue1");
        assert_eq!(metadata.group, "blue1");
        assert_eq!(metadata.score_weight, 2.0);
    }

    #[test]
    fn test_build_tcp_check() {
        let def = CheckDefinition::from_yaml(TCP_YAML).unwrap();
        let check = def.build().unwrap();
        assert_eq!(check.id(), "web01-tcp-blue1");
        assert_eq!(check.config().metadata.check_type, "tcp");
    }

    #[test]
    fn test_build_udp_check_reports_all_missing() {
        let yaml = r#"
id: "dns01-udp"
name: "DNS01 UDP"
type: UDP
group: red2
attributes:
  ip: "10.0.2.53"
  port: "  "
"#;
        let def = CheckDefinition::from_yaml(yaml).unwrap();
        assert_eq!(def.score_weight, 1.0);

        match def.build() {
            Err(Error::MissingAttributes { check_id, missing }) => {
                assert_eq!(check_id, "dns01-udp");
                assert_eq!(missing, vec!["port", "payload", "content"]);
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected missing attributes"),
        }
    }

    #[test]
    fn test_build_unknown_type() {
        let mut def = CheckDefinition::from_yaml(TCP_YAML).unwrap();
        def.check_type = String::from("http");

        let err = def.build().err().unwrap();
        assert_eq!(err.code(), "UNKNOWN_CHECK_TYPE");
    }
}
