use crate::error::{Result, SearchError};
use crate::posting::{PackedMeta, Posting};
use crate::{DocId, TermId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// TF-IDF boost parameters
#[derive(Debug, Clone, Copy)]
pub struct Scoring {
    /// Multiplier for a term that appears in the document title
    pub title_boost: f64,
    /// Multiplier for a term that appears in the tags (ignored when in title)
    pub tag_boost: f64,
    /// Multiplier for documents that contain every query term
    pub all_terms_boost: f64,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            title_boost: 1.5,
            tag_boost: 1.2,
            all_terms_boost: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TermStats {
    frequency: u8,
    in_title: bool,
    in_tag: bool,
}

/// Ranked search result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

/// Per-query TF-IDF accumulator.
///
/// Postings are ingested first, then `rank_documents` scores every document
/// that holds at least one query term. A document's score is the sum of
/// `tf * idf` over the query terms it contains, multiplied by
/// `all_terms_boost` when it contains all of them. Document frequency is
/// the number of ingested documents holding the term, so the ranker must see
/// the complete posting list of each query term.
#[derive(Debug, Default)]
pub struct TfIdfRanker {
    scoring: Scoring,
    documents: HashMap<DocId, HashMap<TermId, TermStats>>,
    total_documents: u64,
}

impl TfIdfRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scoring(scoring: Scoring) -> Self {
        Self {
            scoring,
            ..Self::default()
        }
    }

    /// Size of the whole collection; required before ranking
    pub fn set_total_documents(&mut self, total: u64) {
        self.total_documents = total;
    }

    /// Record one observation of a term in a document. A later observation
    /// of the same pair replaces the earlier one.
    pub fn ingest(&mut self, doc_id: DocId, term_id: TermId, packed_meta: i64) -> Result<()> {
        let meta = PackedMeta::from_raw(packed_meta)?;
        self.record(doc_id, term_id, meta);
        Ok(())
    }

    pub fn ingest_postings(&mut self, term_id: TermId, postings: &[Posting]) {
        for posting in postings {
            self.record(posting.doc_id, term_id, posting.meta);
        }
    }

    fn record(&mut self, doc_id: DocId, term_id: TermId, meta: PackedMeta) {
        self.documents.entry(doc_id).or_default().insert(
            term_id,
            TermStats {
                frequency: meta.frequency(),
                in_title: meta.in_title(),
                in_tag: meta.in_tag(),
            },
        );
    }

    /// `1 + log10(frequency)`, boosted for title or (otherwise) tag hits
    pub fn term_frequency_weight(&self, frequency: u8, in_title: bool, in_tag: bool) -> f64 {
        if frequency == 0 {
            return 0.0;
        }

        let base = 1.0 + (frequency as f64).log10();
        if in_title {
            base * self.scoring.title_boost
        } else if in_tag {
            base * self.scoring.tag_boost
        } else {
            base
        }
    }

    /// `log10(total / document_frequency)`. Not finite for a zero document
    /// frequency; `rank_documents` never asks for one. A frequency above the
    /// total would give a negative weight and is rejected.
    pub fn inverse_document_frequency(&self, document_frequency: usize) -> Result<f64> {
        if self.total_documents == 0 {
            return Err(SearchError::TotalDocumentsUnset);
        }
        if document_frequency as u64 > self.total_documents {
            return Err(SearchError::DocumentFrequencyExceedsTotal {
                document_frequency,
                total: self.total_documents,
            });
        }
        Ok((self.total_documents as f64 / document_frequency as f64).log10())
    }

    /// Number of ingested documents that contain the term
    pub fn document_frequency(&self, term_id: TermId) -> usize {
        self.documents
            .values()
            .filter(|terms| terms.contains_key(&term_id))
            .count()
    }

    /// Number of distinct documents ingested so far
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Score and order every document overlapping the query, best first.
    /// Ties are ordered by ascending document id.
    pub fn rank_documents(&self, query_terms: &[TermId]) -> Result<Vec<ScoredDocument>> {
        if self.total_documents == 0 {
            return Err(SearchError::TotalDocumentsUnset);
        }

        let mut seen = HashSet::new();
        let query: Vec<TermId> = query_terms.iter().copied().filter(|t| seen.insert(*t)).collect();

        let mut idf = HashMap::with_capacity(query.len());
        for &term_id in &query {
            let df = self.document_frequency(term_id);
            if df > 0 {
                idf.insert(term_id, self.inverse_document_frequency(df)?);
            }
        }

        let mut scored_docs = Vec::new();
        for (&doc_id, terms) in &self.documents {
            let mut score = 0.0;
            let mut matched = 0usize;

            for term_id in &query {
                let (Some(stats), Some(idf)) = (terms.get(term_id), idf.get(term_id)) else {
                    continue;
                };
                let tf = self.term_frequency_weight(stats.frequency, stats.in_title, stats.in_tag);
                score += tf * idf;
                matched += 1;
            }

            if matched == 0 {
                continue;
            }
            if matched == query.len() {
                score *= self.scoring.all_terms_boost;
            }

            scored_docs.push(ScoredDocument { doc_id, score });
        }

        scored_docs.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));

        Ok(scored_docs)
    }
}
