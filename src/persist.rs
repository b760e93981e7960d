//! Persistence collaborator interface.
//!
//! The engine treats durable storage as an external collaborator behind
//! [`Persister`]: the full entity graph is loaded once at startup and
//! written after every mutation. A mutation is not considered complete
//! until the write returns, and a failed write leaves the live board
//! unchanged (the engine commits the draft only after persisting it).

use crate::board::ChoreBoard;
use crate::error::{ChoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snapshot file schema version.
const SNAPSHOT_VERSION: u32 = 1;

fn default_snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

/// On-disk snapshot envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default = "default_snapshot_version")]
    version: u32,
    #[serde(default)]
    board: ChoreBoard,
}

/// Durable storage for the full entity graph.
pub trait Persister: Send + Sync {
    /// Load the board at startup. `Ok(None)` means no prior state exists.
    fn load(&self) -> Result<Option<ChoreBoard>>;

    /// Durably write the board. Called after every mutation, inside the
    /// mutation gate; the mutation fails if this fails.
    fn persist(&self, board: &ChoreBoard) -> Result<()>;
}

/// JSON-file persister: one pretty-printed snapshot file, rewritten in
/// full on every mutation. Household-sized data, so simplicity wins.
#[derive(Debug, Clone)]
pub struct JsonFilePersister {
    path: PathBuf,
}

impl JsonFilePersister {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform-appropriate default snapshot location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("choreboard").join("board.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persister for JsonFilePersister {
    fn load(&self) -> Result<Option<ChoreBoard>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ChoreError::Persist(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| ChoreError::Persist(format!("cannot parse snapshot: {e}")))?;
        debug!(
            path = %self.path.display(),
            version = snapshot.version,
            "loaded board snapshot"
        );
        Ok(Some(snapshot.board))
    }

    fn persist(&self, board: &ChoreBoard) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChoreError::Persist(format!("cannot create state dir: {e}")))?;
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            board: board.clone(),
        };
        let data = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| ChoreError::Persist(format!("cannot serialize snapshot: {e}")))?;
        std::fs::write(&self.path, data)
            .map_err(|e| ChoreError::Persist(format!("cannot write {}: {e}", self.path.display())))
    }
}

/// No-op persister for tests and ephemeral boards.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPersister;

impl Persister for NullPersister {
    fn load(&self) -> Result<Option<ChoreBoard>> {
        Ok(None)
    }

    fn persist(&self, _board: &ChoreBoard) -> Result<()> {
        Ok(())
    }
}
