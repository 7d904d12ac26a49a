//! In-memory nonce -> tx-hash map plus its disk-backed mirror.
//!
//! Grounded on `TransactionTracker.__txs`/`__seen`/`__read_file`/`__write_file`
//! in the reference implementation. The reference rewrites a single open
//! file handle in place; here persistence goes through a temp-file-then-
//! rename instead (tolerated by spec as the more crash-atomic variant),
//! which composes naturally with `tempfile::NamedTempFile::persist`.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tdec_chain::{Nonce, TxHash};

#[derive(Debug, Clone)]
pub struct PendingTx {
    pub tx_hash: TxHash,
    pub first_seen: Instant,
}

/// The in-memory map plus the path of its disk mirror. All mutation goes
/// through `track_one`/`untrack_one` so `first_seen_timestamp` is only
/// ever set once per nonce.
#[derive(Debug)]
pub struct TrackerState {
    entries: HashMap<Nonce, PendingTx>,
    path: PathBuf,
}

impl TrackerState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { entries: HashMap::new(), path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_tracked(&self, nonce: Nonce) -> bool {
        self.entries.contains_key(&nonce)
    }

    pub fn get(&self, nonce: Nonce) -> Option<&PendingTx> {
        self.entries.get(&nonce)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A stable snapshot safe to iterate while the caller mutates the map
    /// via subsequent `track_one`/`untrack_one` calls.
    pub fn snapshot(&self) -> Vec<(Nonce, TxHash)> {
        self.entries.iter().map(|(n, p)| (*n, p.tx_hash.clone())).collect()
    }

    /// Replaces the nonce's tx-hash if already tracked, preserving
    /// `first_seen`; otherwise starts tracking it fresh.
    pub fn track_one(&mut self, nonce: Nonce, tx_hash: TxHash) {
        match self.entries.get_mut(&nonce) {
            Some(existing) => existing.tx_hash = tx_hash,
            None => {
                self.entries.insert(nonce, PendingTx { tx_hash, first_seen: Instant::now() });
            }
        }
    }

    pub fn untrack_one(&mut self, nonce: Nonce) -> Option<PendingTx> {
        self.entries.remove(&nonce)
    }

    /// Seeds the map from a restored disk snapshot without disturbing the
    /// invariant that `first_seen` is set once per nonce — restored
    /// entries start their clock at load time since the original
    /// first-seen instant did not survive the restart.
    pub fn load(&mut self, restored: HashMap<Nonce, TxHash>) {
        for (nonce, tx_hash) in restored {
            self.entries.entry(nonce).or_insert_with(|| PendingTx { tx_hash, first_seen: Instant::now() });
        }
    }

    fn to_disk_map(&self) -> HashMap<String, String> {
        self.entries.iter().map(|(n, p)| (n.to_string(), p.tx_hash.0.clone())).collect()
    }

    /// Rewrites the disk file in full via temp-file-then-rename so a
    /// crash mid-write cannot leave a partially-written, unparseable file
    /// for the next `read` to trip over.
    pub fn persist(&self) -> std::io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &self.to_disk_map())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Reads the nonce -> tx-hash map from disk. A missing file, an empty
/// file, or a parse error all yield an empty map — restoring from disk is
/// best-effort, never fatal to startup.
pub fn read_state_file(path: &Path) -> HashMap<Nonce, TxHash> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return HashMap::new(),
    };
    if contents.trim().is_empty() {
        return HashMap::new();
    }
    let raw: HashMap<String, String> = match serde_json::from_str(&contents) {
        Ok(map) => map,
        Err(_) => return HashMap::new(),
    };
    raw.into_iter()
        .filter_map(|(nonce, hash)| nonce.parse::<Nonce>().ok().map(|n| (n, TxHash(hash))))
        .collect()
}
