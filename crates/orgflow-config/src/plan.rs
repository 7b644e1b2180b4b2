//! YAML deployment plan
//!
//! ```yaml
//! region: us-east-1
//! stack_prefix: landing-zone
//! organizational_units:
//!   Logging:
//!     parent_id: r-abcd
//!     accounts:
//!       - name: log-archive
//!         email: log-archive@example.com
//!     templates: [logging.yaml]
//!     policies: [p-12345678]
//! ```
//!
//! Units run in the order they appear in the file.

use crate::error::{ConfigError, Result};
use orgflow_cloud::{AccountSpec, CloudError, DeploymentPlan, Stage};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PlanFile {
    region: Option<String>,
    stack_prefix: Option<String>,
    #[serde(default)]
    organizational_units: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitEntry {
    parent_id: String,
    #[serde(default)]
    accounts: Vec<AccountSpec>,
    #[serde(default)]
    templates: Vec<String>,
    #[serde(default)]
    policies: Vec<String>,
}

/// Read and parse the plan at `path`
pub fn load_plan(path: &Path) -> Result<DeploymentPlan> {
    tracing::debug!("Loading plan from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_plan(&content)
}

/// Parse a plan from YAML text
pub fn parse_plan(content: &str) -> Result<DeploymentPlan> {
    let file: PlanFile = serde_yaml::from_str(content)?;

    if file.organizational_units.is_empty() {
        return Err(ConfigError::Invalid(
            "organizational_units must define at least one unit".to_string(),
        ));
    }

    let mut stages = Vec::with_capacity(file.organizational_units.len());
    for (key, value) in file.organizational_units {
        let name = key.as_str().map(str::to_string).ok_or_else(|| {
            ConfigError::Invalid(format!("unit names must be strings, got {key:?}"))
        })?;
        let entry: UnitEntry = serde_yaml::from_value(value)
            .map_err(|e| ConfigError::Invalid(format!("unit '{name}': {e}")))?;

        stages.push(Stage {
            name,
            ou_parent_id: Some(entry.parent_id),
            accounts: entry.accounts,
            templates: entry.templates,
            policy_ids: entry.policies,
        });
    }

    let mut plan = DeploymentPlan::new(stages);
    if let Some(region) = file.region {
        plan = plan.with_region(region);
    }
    if let Some(prefix) = file.stack_prefix {
        plan = plan.with_stack_prefix(prefix);
    }

    plan.validate().map_err(|e| match e {
        CloudError::Configuration(message) => ConfigError::Invalid(message),
        other => ConfigError::Invalid(other.to_string()),
    })?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING_ZONE: &str = r#"
organizational_units:
  Security:
    parent_id: r-abcd
    accounts:
      - name: audit
        email: audit@example.com
    templates:
      - guardduty.yaml
  Logging:
    parent_id: r-abcd
    accounts:
      - name: log-archive
        email: log-archive@example.com
    templates: [logging.yaml]
    policies: [p-denyleave]
  Infrastructure:
    parent_id: r-abcd
"#;

    #[test]
    fn test_units_keep_file_order() {
        let plan = parse_plan(LANDING_ZONE).unwrap();
        let names: Vec<_> = plan.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Security", "Logging", "Infrastructure"]);
    }

    #[test]
    fn test_defaults_and_fields() {
        let plan = parse_plan(LANDING_ZONE).unwrap();
        assert_eq!(plan.region, "us-east-1");
        assert_eq!(plan.stack_prefix, "landing-zone");

        let logging = &plan.stages[1];
        assert_eq!(logging.ou_parent_id.as_deref(), Some("r-abcd"));
        assert_eq!(logging.accounts[0].name, "log-archive");
        assert_eq!(logging.templates, vec!["logging.yaml"]);
        assert_eq!(logging.policy_ids, vec!["p-denyleave"]);

        let infrastructure = &plan.stages[2];
        assert!(infrastructure.accounts.is_empty());
        assert!(infrastructure.templates.is_empty());
    }

    #[test]
    fn test_region_and_prefix_override() {
        let plan = parse_plan(
            "region: eu-west-1\nstack_prefix: lz\norganizational_units:\n  Sandbox:\n    parent_id: r-abcd\n",
        )
        .unwrap();
        assert_eq!(plan.region, "eu-west-1");
        assert_eq!(plan.stack_name("vpc.yaml"), "lz-vpc");
    }

    #[test]
    fn test_missing_units_is_invalid() {
        assert!(matches!(
            parse_plan("region: us-east-1\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_plan("organizational_units: {}\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_parent_id_is_invalid() {
        let err = parse_plan("organizational_units:\n  Logging:\n    accounts: []\n").unwrap_err();
        assert!(err.to_string().contains("Logging"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = parse_plan(
            "organizational_units:\n  Logging:\n    parent_id: r-abcd\n    template: [logging.yaml]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_account_without_email_is_invalid() {
        let err = parse_plan(
            "organizational_units:\n  Logging:\n    parent_id: r-abcd\n    accounts:\n      - name: log-archive\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_config_error_becomes_configuration() {
        let err: CloudError = parse_plan("region: us-east-1\n").unwrap_err().into();
        assert!(matches!(err, CloudError::Configuration(_)));
    }
}
