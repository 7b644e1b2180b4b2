use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const LANDING_ZONE: &str = r#"
region: eu-west-1
organizational_units:
  Logging:
    parent_id: r-abcd
    accounts:
      - name: log-archive
        email: log-archive@example.com
    templates: [logging.yaml]
  Security:
    parent_id: r-abcd
    accounts:
      - name: audit
        email: audit@example.com
    templates: [guardduty.yaml]
    policies: [p-denyleave]
"#;

/// A project directory laid out as `configs/accounts.yaml` + `templates/`
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_accounts_yaml(&self, content: &str) {
        let dir = self.root.path().join("configs");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("accounts.yaml"), content).unwrap();
    }

    pub fn write_template(&self, name: &str, content: &str) {
        let dir = self.root.path().join("templates");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// `orgflow` running inside the project with no ambient config
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("orgflow").unwrap();
        cmd.current_dir(self.path())
            .env_remove("ORGFLOW_CONFIG")
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("NO_COLOR", "1");
        cmd
    }
}
