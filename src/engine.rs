use crate::document::{Document, DocumentTable};
use crate::error::{Result, SearchError};
use crate::index::{IndexStats, ShardStore, DEFAULT_SHARD_COUNT};
use crate::lexicon::Lexicon;
use crate::ranking::TfIdfRanker;
use crate::storage::IndexPaths;
use crate::tokenizer::Tokenizer;
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding `lexicon.csv`, `documents.csv` and `barrels/`
    pub data_dir: PathBuf,
    pub shard_count: usize,
    /// Collection size used for IDF; defaults to the document table size
    pub total_documents: Option<u64>,
    /// Read every barrel at startup instead of on first use
    pub preload_shards: bool,
    pub load_documents: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            shard_count: DEFAULT_SHARD_COUNT,
            total_documents: None,
            preload_shards: false,
            load_documents: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SearchError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| SearchError::Config(format!("{}: {e}", path.display())))
    }
}

/// Search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub offset: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

/// Result of resolving one query
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// None of the query words is in the lexicon
    NoValidTerms,
    /// No document contains every resolved word
    NoMatchingDocuments,
    Ranked(Vec<SearchHit>),
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub lexicon_terms: usize,
    pub documents: usize,
    pub total_documents: u64,
    pub index: IndexStats,
}

/// Query-serving context: lexicon, barrel cache and document table.
///
/// Shared state is read-only apart from the barrel cache, which handles its
/// own synchronization, so one engine can serve concurrent queries. Each
/// query ranks with its own accumulator.
pub struct SearchEngine {
    lexicon: Lexicon,
    shards: ShardStore,
    documents: DocumentTable,
    total_documents: u64,
    tokenizer: Tokenizer,
}

impl SearchEngine {
    /// Open the persisted index described by `config`
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let paths = IndexPaths::new(&config.data_dir);
        let lexicon = Lexicon::load(&paths.lexicon())?;
        if lexicon.is_empty() {
            tracing::warn!("lexicon is empty; every query will report no valid words");
        }

        let documents = if config.load_documents {
            let documents = DocumentTable::load(&paths.documents())?;
            if documents.is_empty() {
                tracing::warn!("document table is empty; results carry no metadata");
            }
            documents
        } else {
            DocumentTable::default()
        };

        let total_documents = config.total_documents.unwrap_or(documents.len() as u64);
        if total_documents == 0 {
            return Err(SearchError::Config(
                "total document count is unknown; set it or load the document table".to_string(),
            ));
        }

        let shards = ShardStore::new(paths.barrels_dir(), config.shard_count)?;
        if config.preload_shards {
            shards.preload_all()?;
        }

        tracing::info!(
            data_dir = %paths.root().display(),
            total_documents,
            shard_count = shards.shard_count(),
            "search engine ready"
        );

        Ok(Self::from_parts(lexicon, shards, documents, total_documents))
    }

    pub fn from_parts(
        lexicon: Lexicon,
        shards: ShardStore,
        documents: DocumentTable,
        total_documents: u64,
    ) -> Self {
        Self {
            lexicon,
            shards,
            documents,
            total_documents,
            tokenizer: Tokenizer::new(),
        }
    }

    /// Resolve query words to term ids, dropping unknown words
    fn resolve_terms(&self, query: &str) -> Vec<TermId> {
        let mut term_ids = Vec::new();
        for term in self.tokenizer.terms(query) {
            match self.lexicon.term_id(term) {
                Some(id) if !term_ids.contains(&id) => term_ids.push(id),
                Some(_) => {}
                None => tracing::warn!(term, "word not found in lexicon"),
            }
        }
        term_ids
    }

    /// Search for documents containing every query word
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        let start = Instant::now();
        let term_ids = self.resolve_terms(query);
        if term_ids.is_empty() {
            return Ok(SearchOutcome::NoValidTerms);
        }

        let mut ranker = TfIdfRanker::new();
        ranker.set_total_documents(self.total_documents);

        let mut intersection: Option<HashSet<DocId>> = None;
        for &term_id in &term_ids {
            let postings = self.shards.get_postings(term_id)?;
            ranker.ingest_postings(term_id, &postings);

            let docs: HashSet<DocId> = postings.iter().map(|p| p.doc_id).collect();
            intersection = Some(match intersection {
                None => docs,
                Some(current) => current.intersection(&docs).copied().collect(),
            });
        }

        let intersection = intersection.unwrap_or_default();
        if intersection.is_empty() {
            tracing::debug!(query, elapsed = ?start.elapsed(), "no documents contain all terms");
            return Ok(SearchOutcome::NoMatchingDocuments);
        }

        let hits: Vec<SearchHit> = ranker
            .rank_documents(&term_ids)?
            .into_iter()
            .filter(|d| intersection.contains(&d.doc_id) && d.score != 0.0)
            .skip(options.offset)
            .take(options.limit)
            .map(|d| SearchHit {
                doc_id: d.doc_id,
                score: d.score,
                document: self.documents.get(d.doc_id).cloned(),
            })
            .collect();

        tracing::debug!(
            query,
            terms = term_ids.len(),
            candidates = intersection.len(),
            hits = hits.len(),
            elapsed = ?start.elapsed(),
            "query ranked"
        );

        Ok(SearchOutcome::Ranked(hits))
    }

    /// Get a document's metadata by id
    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(doc_id)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            lexicon_terms: self.lexicon.len(),
            documents: self.documents.len(),
            total_documents: self.total_documents,
            index: self.shards.stats(),
        }
    }
}
