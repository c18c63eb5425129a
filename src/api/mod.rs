//! Typed endpoints of the REST API, one `impl MatrixClient` block per area.

mod category;
mod item;
mod job;
mod project;
mod setting;
mod user;

pub use item::ItemDraft;

use crate::{MatrixClient, MatrixError, Result};

impl MatrixClient {
    /// Fails when the server predates labels (1.6 and older), where labels
    /// are stored in an item field instead.
    pub(crate) async fn ensure_labels_supported(&self) -> Result<()> {
        if self.get_server_version().await?.starts_with("1.6") {
            return Err(MatrixError::InvalidArgument(
                "labels cannot be set this way before version 1.7, they live in a field".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Project part of a path, `all` when none is given.
fn project_or_all(project: Option<&str>) -> &str {
    project.filter(|p| !p.is_empty()).unwrap_or("all")
}

fn require_project(project: &str) -> Result<()> {
    if project.trim().is_empty() {
        return Err(MatrixError::InvalidArgument("missing project".to_owned()));
    }
    Ok(())
}

async fn require_file(path: &std::path::Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(MatrixError::InvalidArgument(format!(
            "not a file: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{project_or_all, require_file, require_project};

    #[test]
    fn empty_project_means_all() {
        assert_eq!(project_or_all(None), "all");
        assert_eq!(project_or_all(Some("")), "all");
        assert_eq!(project_or_all(Some("WHEEL")), "WHEEL");
    }

    #[test]
    fn blank_project_is_rejected() {
        assert!(require_project(" ").is_err());
        assert!(require_project("WHEEL").is_ok());
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(require_file(dir.path()).await.is_err());
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(require_file(&file).await.is_ok());
    }
}
