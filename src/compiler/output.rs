//! Output root handling.

use std::path::{Path, PathBuf};

use super::CompileError;

/// Delete and recreate the output root.
pub async fn recreate(root: &Path) -> Result<(), CompileError> {
    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(CompileError::write(root, e)),
    }
    tokio::fs::create_dir_all(root)
        .await
        .map_err(|e| CompileError::write(root, e))
}

/// Write `contents` to `root/rel`, creating parent directories.
pub async fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf, CompileError> {
    let path = root.join(rel);
    ensure_parent(&path).await?;
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| CompileError::write(&path, e))?;
    Ok(path)
}

/// Copy `from` to `root/rel` verbatim.
pub async fn copy(from: &Path, root: &Path, rel: &str) -> Result<PathBuf, CompileError> {
    let path = root.join(rel);
    ensure_parent(&path).await?;
    tokio::fs::copy(from, &path)
        .await
        .map_err(|e| CompileError::read(from, e))?;
    Ok(path)
}

/// Read a source file as UTF-8 text.
pub async fn read_source(path: &Path) -> Result<String, CompileError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CompileError::read(path, e))
}

async fn ensure_parent(path: &Path) -> Result<(), CompileError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CompileError::write(parent, e))?;
    }
    Ok(())
}
