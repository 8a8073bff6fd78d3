//! Binary attachments such as uploaded RF2 archives.

use crate::{Result, SnowowlError};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores binary blobs by UUID.
pub trait AttachmentRegistry: Send + Sync {
    /// Stores the content of `reader` under `id`, replacing existing content.
    fn upload(&self, id: Uuid, reader: &mut dyn Read) -> Result<()>;

    /// Returns the path of the attachment's content.
    fn get(&self, id: Uuid) -> Result<PathBuf>;

    /// Deletes an attachment; deleting a missing attachment is not an error.
    fn delete(&self, id: Uuid) -> Result<()>;
}

/// Keeps attachments as files in one directory.
#[derive(Debug, Clone)]
pub struct FileAttachmentRegistry {
    root: PathBuf,
}

impl FileAttachmentRegistry {
    /// Uses `root` as storage, creating it if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }
}

impl AttachmentRegistry for FileAttachmentRegistry {
    fn upload(&self, id: Uuid, reader: &mut dyn Read) -> Result<()> {
        let mut file = File::create(self.path(id))?;
        io::copy(reader, &mut file)?;
        tracing::debug!(attachment = %id, "Stored attachment");
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<PathBuf> {
        let path = self.path(id);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SnowowlError::ComponentNotFound {
                doc_type: "attachment".to_string(),
                ids: vec![id.to_string()],
            })
        }
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        match fs::remove_file(self.path(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
