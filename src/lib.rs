// Re-export main components
pub mod api;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod lexicon;
pub mod posting;
pub mod ranking;
pub mod storage;
pub mod tokenizer;

/// Term identifier assigned by the lexicon builder
pub type TermId = u32;
/// Document identifier
pub type DocId = u32;

// Re-export commonly used types
pub use document::{Document, DocumentTable};
pub use engine::{EngineConfig, SearchEngine, SearchHit, SearchOptions, SearchOutcome};
pub use error::{Result, SearchError};
pub use index::{ShardStore, DEFAULT_SHARD_COUNT};
pub use lexicon::Lexicon;
pub use posting::{PackedMeta, Posting};
pub use ranking::{ScoredDocument, Scoring, TfIdfRanker};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_basic_workflow() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let barrels = dir.path().join("barrels");
        fs::create_dir_all(&barrels)?;
        fs::write(dir.path().join("lexicon.csv"), "word,wordID\ncat,1\ndog,2\n")?;
        fs::write(
            barrels.join("barrel_1.csv"),
            "Word ID, Doc ID : Bit Array\n1,\"5:515 7:1\"\n",
        )?;

        let config = EngineConfig {
            data_dir: dir.path().to_path_buf(),
            total_documents: Some(10),
            load_documents: false,
            ..EngineConfig::default()
        };
        let engine = SearchEngine::open(&config)?;

        match engine.search("cat", &SearchOptions::default())? {
            SearchOutcome::Ranked(hits) => {
                assert_eq!(hits.len(), 2);
                assert_eq!(hits[0].doc_id, 5);
                assert!(hits[0].score > hits[1].score);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        Ok(())
    }
}
