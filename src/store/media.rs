//! Filesystem media store.
//!
//! Imports land in a temporary area under the store root and move to the
//! final area on promotion. Path hints are store-root-relative, with
//! forward slashes regardless of platform.

use crate::error::EngineError;
use crate::store::{IdGenerator, MediaStore};
use crate::tree::{AssetPointer, PointerStatus};
use crate::types::AssetId;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const TEMP_DIR: &str = "temp/doc_units";
const FINAL_DIR: &str = "doc_units/assets";
const RESOLVER: &str = "doc_media";

/// Media store rooted at a project directory.
pub struct FsMediaStore {
    root: PathBuf,
    ids: Arc<dyn IdGenerator>,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            root: root.into(),
            ids,
        }
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.join(TEMP_DIR)
    }

    fn final_dir(&self) -> PathBuf {
        self.root.join(FINAL_DIR)
    }

    /// Store-root-relative hint with forward slashes.
    fn hint_for(&self, path: &Path) -> Result<String, EngineError> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            EngineError::Io(format!("path '{}' is outside the store root", path.display()))
        })?;
        Ok(to_posix(relative))
    }

    fn remove_empty_parents(&self, mut dir: PathBuf, stop: &Path) {
        while dir != *stop && dir.is_dir() {
            if fs::remove_dir(&dir).is_err() {
                break;
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
    }
}

impl MediaStore for FsMediaStore {
    fn import_temporary(&self, source_path: &Path) -> Result<AssetPointer, EngineError> {
        if !source_path.is_file() {
            return Err(EngineError::Io(format!(
                "source file '{}' does not exist",
                source_path.display()
            )));
        }

        let asset_id = AssetId::new(self.ids.generate())?;
        let file_name = match source_path.extension() {
            Some(ext) => format!("{}.{}", asset_id.as_str(), ext.to_string_lossy()),
            None => asset_id.as_str().to_string(),
        };

        let dest_dir = self.temp_dir();
        fs::create_dir_all(&dest_dir)?;
        let dest_path = dest_dir.join(file_name);
        fs::copy(source_path, &dest_path)?;

        Ok(AssetPointer {
            asset_id,
            resolver: RESOLVER.to_string(),
            status: PointerStatus::Temporary,
            path_hint: Some(self.hint_for(&dest_path)?),
        })
    }

    fn promote(&self, pointer: &AssetPointer) -> Result<AssetPointer, EngineError> {
        if pointer.is_final() {
            return Ok(pointer.clone());
        }

        let hint = pointer.path_hint.as_deref().ok_or_else(|| {
            EngineError::InvalidOperation(
                "pointer without path hint cannot be promoted".to_string(),
            )
        })?;

        let source = self.root.join(hint);
        if !source.is_file() {
            return Err(EngineError::NotFound(format!(
                "temporary asset '{hint}' is missing"
            )));
        }

        let dest_dir = self.final_dir();
        fs::create_dir_all(&dest_dir)?;
        let file_name = source.file_name().ok_or_else(|| {
            EngineError::Io(format!("temporary asset '{hint}' has no file name"))
        })?;
        let dest_path = dest_dir.join(file_name);
        fs::rename(&source, &dest_path)?;

        Ok(AssetPointer {
            asset_id: pointer.asset_id.clone(),
            resolver: pointer.resolver.clone(),
            status: PointerStatus::Final,
            path_hint: Some(self.hint_for(&dest_path)?),
        })
    }

    fn resolve_path(&self, pointer: &AssetPointer) -> Result<PathBuf, EngineError> {
        let hint = pointer.path_hint.as_deref().ok_or_else(|| {
            EngineError::InvalidOperation("pointer has no path hint to resolve".to_string())
        })?;
        Ok(self.root.join(hint))
    }

    fn list_final_assets(&self) -> Result<Vec<String>, EngineError> {
        let final_dir = self.final_dir();
        if !final_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut assets = Vec::new();
        for entry in WalkDir::new(&final_dir) {
            let entry = entry.map_err(|err| EngineError::Io(err.to_string()))?;
            if entry.file_type().is_file() {
                assets.push(self.hint_for(entry.path())?);
            }
        }
        assets.sort();
        Ok(assets)
    }

    fn delete_asset(&self, path_hint: &str) -> Result<(), EngineError> {
        let hint_path = Path::new(path_hint);
        let escapes = hint_path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::RootDir));
        if escapes || !hint_path.starts_with(FINAL_DIR) {
            return Err(EngineError::InvalidOperation(format!(
                "cannot delete asset '{path_hint}' outside the final storage area"
            )));
        }

        let target = self.root.join(hint_path);
        if target.is_file() {
            fs::remove_file(&target)?;
            if let Some(parent) = target.parent() {
                self.remove_empty_parents(parent.to_path_buf(), &self.final_dir());
            }
        }
        Ok(())
    }

    fn cleanup_temporary(&self) {
        let temp_dir = self.temp_dir();
        if let Err(err) = fs::remove_dir_all(&temp_dir) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(
                    path = %temp_dir.display(),
                    error = %err,
                    "temporary area cleanup skipped"
                );
            }
        }
    }
}

fn to_posix(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
