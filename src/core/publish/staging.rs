//! Geodata staging
//!
//! Attachments are written under `{staging_dir}/{project_id}/` before
//! upload and removed right after. Paths are deterministic, so concurrent
//! publishes of the same project and category share a file.

use crate::domain::{GeodataCategory, ProjectId, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// `{staging_dir}/{project_id}/{category}.geojson`
pub fn staged_geodata_path(
    staging_dir: &Path,
    project_id: ProjectId,
    category: &GeodataCategory,
) -> PathBuf {
    staging_dir
        .join(project_id.to_string())
        .join(category.file_name())
}

/// Write the attachment to its staging path, creating parent directories
pub async fn stage_geodata(
    staging_dir: &Path,
    project_id: ProjectId,
    category: &GeodataCategory,
    content: &[u8],
) -> Result<PathBuf> {
    let path = staged_geodata_path(staging_dir, project_id, category);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if let Err(e) = tokio::fs::write(&path, content).await {
        if let Err(cleanup) = remove_staged(&path).await {
            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial geodata");
        }
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), bytes = content.len(), "Staged geodata");
    Ok(path)
}

/// Delete a staged file; a file that is already gone is not an error
pub async fn remove_staged(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_path_layout() {
        let path = staged_geodata_path(
            Path::new("/tmp/fmtm/odk"),
            ProjectId::new(12),
            &GeodataCategory::new("buildings").unwrap(),
        );
        assert_eq!(path, PathBuf::from("/tmp/fmtm/odk/12/buildings.geojson"));
    }

    #[tokio::test]
    async fn test_stage_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let category = GeodataCategory::new("roads").unwrap();
        let path = stage_geodata(dir.path(), ProjectId::new(3), &category, b"{}")
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");

        remove_staged(&path).await.unwrap();
        assert!(!path.exists());
        // second removal is a no-op
        remove_staged(&path).await.unwrap();
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_write_leaves_nothing_staged() {
        let dir = tempfile::tempdir().unwrap();
        let category = GeodataCategory::new("roads").unwrap();
        let path = staged_geodata_path(dir.path(), ProjectId::new(3), &category);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        // every write to /dev/full fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", &path).unwrap();

        let result = stage_geodata(dir.path(), ProjectId::new(3), &category, b"{}").await;

        assert!(result.is_err());
        assert!(std::fs::symlink_metadata(&path).is_err());
    }
}
