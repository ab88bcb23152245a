//! Per-request scratch directories
//!
//! Every proof request writes its intermediate files into its own directory
//! under the work root. The directory is removed when the [`Scratch`] is
//! dropped, whichever way the request ends.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use remix_common::Result;

pub struct Scratch {
    id: Uuid,
    dir: TempDir,
}

impl Scratch {
    /// Create a fresh directory `<root>/proof-<id>-XXXXXX`
    pub fn create(root: &Path, id: Uuid) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("proof-{}-", id))
            .tempdir_in(root)?;

        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join("input.json")
    }

    pub fn witness_path(&self) -> PathBuf {
        self.dir.path().join("witness.wtns")
    }

    pub fn proof_path(&self) -> PathBuf {
        self.dir.path().join("proof.json")
    }

    pub fn public_path(&self) -> PathBuf {
        self.dir.path().join("public.json")
    }
}
