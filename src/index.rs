use crate::error::{Result, SearchError};
use crate::posting::Posting;
use crate::storage::{barrel_path, read_rows, Row};
use crate::TermId;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Number of barrels the index builder writes
pub const DEFAULT_SHARD_COUNT: usize = 50;

/// In-memory contents of one barrel: term id -> posting list
pub type Shard = HashMap<TermId, Vec<Posting>>;

/// Route a term id to its barrel
pub fn shard_index_of(term_id: TermId, shard_count: usize) -> usize {
    term_id as usize % shard_count
}

/// Sharded inverted index backed by `barrel_<i>.csv` files.
///
/// Barrels are read lazily, in full, the first time any of their terms is
/// requested and stay cached for the lifetime of the store. Every slot has
/// its own lock so a barrel is parsed at most once even under concurrent
/// first access, while lookups into other barrels proceed.
pub struct ShardStore {
    dir: PathBuf,
    shards: Vec<Mutex<Option<Arc<Shard>>>>,
}

impl ShardStore {
    pub fn new<P: AsRef<Path>>(dir: P, shard_count: usize) -> Result<Self> {
        if shard_count == 0 {
            return Err(SearchError::Config("shard count must be positive".to_string()));
        }

        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            shards: (0..shard_count).map(|_| Mutex::new(None)).collect(),
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard_index_of(&self, term_id: TermId) -> usize {
        shard_index_of(term_id, self.shards.len())
    }

    /// Load a barrel into the cache unless it is already there
    pub fn ensure_shard_loaded(&self, shard_index: usize) -> Result<Arc<Shard>> {
        let slot = self.shards.get(shard_index).ok_or_else(|| {
            SearchError::Config(format!(
                "shard {shard_index} out of range (shard count {})",
                self.shards.len()
            ))
        })?;

        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(shard) = slot.as_ref() {
            return Ok(Arc::clone(shard));
        }

        let path = barrel_path(&self.dir, shard_index);
        let shard = Arc::new(load_shard(&path)?);
        *slot = Some(Arc::clone(&shard));

        Ok(shard)
    }

    /// Posting list of a term; empty when the term has no postings
    pub fn get_postings(&self, term_id: TermId) -> Result<Vec<Posting>> {
        let shard = self.ensure_shard_loaded(self.shard_index_of(term_id))?;
        Ok(shard.get(&term_id).cloned().unwrap_or_default())
    }

    /// Load every barrel up front
    pub fn preload_all(&self) -> Result<()> {
        for shard_index in 0..self.shards.len() {
            self.ensure_shard_loaded(shard_index)?;
        }
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            shard_count: self.shards.len(),
            ..IndexStats::default()
        };

        for slot in &self.shards {
            let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(shard) = slot.as_ref() {
                stats.loaded_shards += 1;
                stats.cached_terms += shard.len();
                stats.cached_postings += shard.values().map(Vec::len).sum::<usize>();
            }
        }

        stats
    }
}

fn load_shard(path: &Path) -> Result<Shard> {
    let start = Instant::now();
    let mut shard = Shard::new();
    let mut skipped = 0usize;

    for row in read_rows(path)? {
        match parse_row(&row) {
            Ok(Some((term_id, postings))) => {
                shard.insert(term_id, postings);
            }
            Ok(None) => skipped += 1,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(path = %path.display(), "skipping barrel row: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        path = %path.display(),
        terms = shard.len(),
        skipped,
        elapsed = ?start.elapsed(),
        "barrel loaded"
    );

    Ok(shard)
}

/// Parse `termID,"doc:meta doc:meta ..."`. `Ok(None)` for rows with fewer
/// than two fields.
fn parse_row(row: &Row) -> Result<Option<(TermId, Vec<Posting>)>> {
    let fields = row.fields();
    if fields.len() < 2 {
        return Ok(None);
    }

    let term_id = fields[0].parse::<TermId>().map_err(|e| {
        SearchError::malformed(row.line, format!("term id {:?}: {e}", fields[0]))
    })?;

    let mut postings = Vec::new();
    for pair in fields[1].split_whitespace() {
        if let Some(posting) = Posting::parse(pair, row.line)? {
            postings.push(posting);
        }
    }

    Ok(Some((term_id, postings)))
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexStats {
    pub shard_count: usize,
    pub loaded_shards: usize,
    pub cached_terms: usize,
    pub cached_postings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_barrel(dir: &Path, shard_index: usize, body: &str) -> anyhow::Result<()> {
        fs::write(
            barrel_path(dir, shard_index),
            format!("Word ID, Doc ID : Bit Array\n{body}"),
        )?;
        Ok(())
    }

    #[test]
    fn test_shard_routing_is_modular() {
        for term_id in [0u32, 1, 49, 50, 77, 1234] {
            for k in 0..4u32 {
                assert_eq!(
                    shard_index_of(term_id, DEFAULT_SHARD_COUNT),
                    shard_index_of(term_id + 50 * k, DEFAULT_SHARD_COUNT)
                );
            }
        }
        assert_eq!(shard_index_of(51, DEFAULT_SHARD_COUNT), 1);
    }

    #[test]
    fn test_get_postings() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_barrel(dir.path(), 1, "1,\"5:515 7:1\"\n51,\"9:2\"\n")?;

        let store = ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?;
        let postings = store.get_postings(1)?;
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].doc_id, 5);
        assert!(postings[0].meta.in_title());
        assert_eq!(postings[0].meta.frequency(), 3);
        assert_eq!(postings[1].doc_id, 7);

        // Same barrel, served from the cache
        assert_eq!(store.get_postings(51)?.len(), 1);
        assert!(store.get_postings(101)?.is_empty());

        let stats = store.stats();
        assert_eq!(store.shard_count(), DEFAULT_SHARD_COUNT);
        assert_eq!(stats.loaded_shards, 1);
        assert_eq!(stats.cached_terms, 2);
        assert_eq!(stats.cached_postings, 3);

        Ok(())
    }

    #[test]
    fn test_get_postings_is_idempotent() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_barrel(dir.path(), 3, "3,\"1:1 2:2 3:3\"\n")?;

        let store = ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?;
        assert_eq!(store.get_postings(3)?, store.get_postings(3)?);

        Ok(())
    }

    #[test]
    fn test_cached_shard_is_not_reread() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_barrel(dir.path(), 2, "2,\"4:1\"\n")?;

        let store = ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?;
        store.ensure_shard_loaded(2)?;
        fs::remove_file(barrel_path(dir.path(), 2))?;

        assert_eq!(store.get_postings(2)?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_malformed_rows_are_skipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_barrel(
            dir.path(),
            0,
            "lonely\nabc,\"1:1\"\n50,\"1:1 x:2\"\n100,\"8:3 nocolon 9:4\"\n",
        )?;

        let store = ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?;
        assert!(store.get_postings(50)?.is_empty());

        let postings = store.get_postings(100)?;
        let docs: Vec<_> = postings.iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![8, 9]);
        assert_eq!(store.stats().cached_terms, 1);

        Ok(())
    }

    #[test]
    fn test_non_utf8_row_is_skipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut body = b"Word ID, Doc ID : Bit Array\n1,\"5:515 7:1\"\n51,\"9:".to_vec();
        body.extend_from_slice(b"\xFF\"\n101,\"3:2\"\n");
        fs::write(barrel_path(dir.path(), 1), body)?;

        let store = ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?;
        assert_eq!(store.get_postings(1)?.len(), 2);
        assert!(store.get_postings(51)?.is_empty());
        assert_eq!(store.get_postings(101)?[0].doc_id, 3);

        Ok(())
    }

    #[test]
    fn test_missing_barrel_is_fatal()-> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?;

        let err = store.get_postings(4).unwrap_err();
        assert!(matches!(err, SearchError::Io { .. }));
        assert_eq!(store.stats().loaded_shards, 0);

        Ok(())
    }

    #[test]
    fn test_concurrent_first_access() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        write_barrel(dir.path(), 6, "6,\"1:1 2:1\"\n56,\"3:1\"\n")?;
        let store = Arc::new(ShardStore::new(dir.path(), DEFAULT_SHARD_COUNT)?);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.get_postings(if i % 2 == 0 { 6 } else { 56 }))
            })
            .collect();
        for handle in handles {
            assert!(!handle.join().expect("thread panicked")?.is_empty());
        }

        assert_eq!(store.stats().loaded_shards, 1);

        Ok(())
    }

    #[test]
    fn test_zero_shards_rejected() {
        assert!(ShardStore::new("/tmp", 0).is_err());
    }
}
