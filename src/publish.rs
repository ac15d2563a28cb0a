use anyhow::Context;
use indexmap::IndexMap;
use log::{info, trace};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Writes rendered pages to disk. Remembers what's already been written, and
/// skips any page whose content hasn't changed since the last write.
#[derive(Debug)]
pub struct Publisher {
    output_dir: PathBuf,
    /// Content currently on disk, keyed by path relative to the output dir
    written: IndexMap<PathBuf, String>,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            written: IndexMap::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a page if it changed. Return whether anything was written
    pub fn publish(
        &mut self,
        relative_path: &Path,
        html: String,
    ) -> anyhow::Result<bool> {
        if self.written.get(relative_path) == Some(&html) {
            trace!("{} unchanged", relative_path.display());
            return Ok(false);
        }

        let path = self.output_dir.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Error creating directory {}", parent.display())
            })?;
        }
        info!("Writing {}", path.display());
        fs::write(&path, &html)
            .with_context(|| format!("Error writing {}", path.display()))?;
        self.written.insert(relative_path.to_owned(), html);
        Ok(true)
    }
}
