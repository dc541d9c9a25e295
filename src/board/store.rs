//! Board cache and persistence.
//!
//! ## BoardStore
//!
//! Caches boards by id behind one read/write lock:
//! - `load` takes the read lock; on a miss it takes the write lock, checks
//!   again, then loads from the backend or starts an empty board
//! - `save` writes the backend, then swaps the cached pointer under the
//!   write lock
//!
//! `execute` runs a command as a copy-on-write transaction. The cached board
//! is cloned (O(1) with persistent maps), the command mutates the clone, and
//! only a successful command is saved and swapped in. A failed command leaves
//! the cache and the durable copy untouched.
//!
//! Commands on the same board id are serialized by a per-board lock;
//! different boards run independently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::debug;

use super::state::BoardState;
use crate::commands::{self, Args, Command, CommandContext, Patch};
use crate::core::error::{BoardError, Result};

/// Durable storage for boards.
pub trait BoardBackend: Send + Sync {
    /// Load a board. `Ok(None)` if it was never saved.
    fn load(&self, board_id: &str) -> Result<Option<BoardState>>;

    fn save(&self, board_id: &str, state: &BoardState) -> Result<()>;
}

/// Backend that keeps boards in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    boards: Mutex<FxHashMap<String, BoardState>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoardBackend for MemoryBackend {
    fn load(&self, board_id: &str) -> Result<Option<BoardState>> {
        Ok(self.boards.lock().get(board_id).cloned())
    }

    fn save(&self, board_id: &str, state: &BoardState) -> Result<()> {
        self.boards.lock().insert(board_id.to_string(), state.clone());
        Ok(())
    }
}

/// On-disk encoding for [`FileBackend`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapshotFormat {
    #[default]
    Json,
    Bincode,
}

impl SnapshotFormat {
    fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
        }
    }
}

/// Backend writing one file per board.
#[derive(Clone, Debug)]
pub struct FileBackend {
    dir: PathBuf,
    format: SnapshotFormat,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a board. Ids are restricted to `[A-Za-z0-9_-]`.
    pub fn path_for(&self, board_id: &str) -> Result<PathBuf> {
        let valid = !board_id.is_empty()
            && board_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(BoardError::bad_argument("boardId", "only letters, digits, '_' and '-' allowed"));
        }
        Ok(self.dir.join(format!("{board_id}.{}", self.format.extension())))
    }
}

impl BoardBackend for FileBackend {
    fn load(&self, board_id: &str) -> Result<Option<BoardState>> {
        let path = self.path_for(board_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let state = match self.format {
            SnapshotFormat::Json => serde_json::from_slice(&bytes)?,
            SnapshotFormat::Bincode => bincode::deserialize(&bytes)?,
        };
        Ok(Some(state))
    }

    fn save(&self, board_id: &str, state: &BoardState) -> Result<()> {
        let path = self.path_for(board_id)?;
        fs::create_dir_all(&self.dir)?;
        let bytes = match self.format {
            SnapshotFormat::Json => serde_json::to_vec_pretty(state)?,
            SnapshotFormat::Bincode => bincode::serialize(state)?,
        };
        // atomic replace
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Cached board access over a backend.
pub struct BoardStore<B: BoardBackend> {
    backend: B,
    cache: RwLock<FxHashMap<String, Arc<BoardState>>>,
    locks: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl<B: BoardBackend> BoardStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: RwLock::new(FxHashMap::default()),
            locks: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a board, loading or creating it on first access.
    pub fn load(&self, board_id: &str) -> Result<Arc<BoardState>> {
        if let Some(state) = self.cache.read().get(board_id) {
            return Ok(Arc::clone(state));
        }

        let mut cache = self.cache.write();
        if let Some(state) = cache.get(board_id) {
            return Ok(Arc::clone(state));
        }
        let state = Arc::new(self.backend.load(board_id)?.unwrap_or_default());
        cache.insert(board_id.to_string(), Arc::clone(&state));
        Ok(state)
    }

    /// Persist a board and make it the cached version.
    pub fn save(&self, board_id: &str, state: BoardState) -> Result<Arc<BoardState>> {
        let mut cache = self.cache.write();
        self.backend.save(board_id, &state)?;
        let state = Arc::new(state);
        cache.insert(board_id.to_string(), Arc::clone(&state));
        Ok(state)
    }

    /// Drop a board from the cache. The next load reads the backend.
    ///
    /// The board's command lock goes too unless a command is holding it.
    pub fn evict(&self, board_id: &str) {
        let mut locks = self.locks.lock();
        if locks.get(board_id).map_or(false, |lock| Arc::strong_count(lock) == 1) {
            locks.remove(board_id);
        }
        drop(locks);
        self.cache.write().remove(board_id);
    }

    fn board_lock(&self, board_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.lock().entry(board_id.to_string()).or_default())
    }

    /// Parse and run a named command against a board.
    pub fn execute(&self, board_id: &str, name: &str, args: &Args, ctx: &CommandContext<'_>) -> Result<Patch> {
        let command = Command::parse(name, args)?;
        self.execute_command(board_id, &command, ctx)
    }

    /// Run a parsed command as a copy-on-write transaction.
    pub fn execute_command(&self, board_id: &str, command: &Command, ctx: &CommandContext<'_>) -> Result<Patch> {
        let lock = self.board_lock(board_id);
        let _guard = lock.lock();

        let base = self.load(board_id)?;
        let mut working = BoardState::clone(&base);
        let patch = commands::execute(&mut working, command, ctx)?;

        self.save(board_id, working)?;
        debug!(board_id, command = command.name(), "board saved");
        Ok(patch)
    }
}
