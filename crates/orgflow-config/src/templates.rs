use crate::error::ConfigError;
use orgflow_cloud::{CloudError, TemplateSource};
use std::path::{Path, PathBuf};

/// Reads templates from a `templates/` directory
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    dir: PathBuf,
}

impl FileTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<project_root>/templates`
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join("templates"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateSource for FileTemplateSource {
    fn load(&self, template_ref: &str) -> orgflow_cloud::Result<String> {
        let path = self.dir.join(template_ref);
        if !path.is_file() {
            return Err(ConfigError::TemplateNotFound(path).into());
        }
        std::fs::read_to_string(&path).map_err(CloudError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_template() {
        let project = tempfile::tempdir().unwrap();
        fs::create_dir(project.path().join("templates")).unwrap();
        fs::write(
            project.path().join("templates/logging.yaml"),
            "Resources: {}\n",
        )
        .unwrap();

        let source = FileTemplateSource::for_project(project.path());
        assert_eq!(source.load("logging.yaml").unwrap(), "Resources: {}\n");
    }

    #[test]
    fn test_missing_template() {
        let project = tempfile::tempdir().unwrap();
        let source = FileTemplateSource::for_project(project.path());

        let err = source.load("missing.yaml").unwrap_err();
        assert!(matches!(err, CloudError::TemplateNotFound(ref p) if p.ends_with("missing.yaml")));
    }
}
