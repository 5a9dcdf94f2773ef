use crate::error::Result;
use crate::storage::read_rows;
use crate::TermId;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Read-only term -> term id dictionary
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    terms: HashMap<String, TermId>,
}

impl Lexicon {
    /// Load the lexicon from a `word,wordID[,...]` CSV file.
    ///
    /// Rows that are short or carry a non-numeric id are skipped. A word
    /// listed twice keeps the id from its last row.
    pub fn load(path: &Path) -> Result<Self> {
        let start = Instant::now();
        let mut terms = HashMap::new();
        let mut skipped = 0usize;

        for row in read_rows(path)? {
            let fields = row.fields();
            if fields.len() < 2 {
                skipped += 1;
                continue;
            }

            match fields[1].parse::<TermId>() {
                Ok(id) => {
                    terms.insert(fields[0].to_string(), id);
                }
                Err(e) => {
                    tracing::warn!(line = row.line, "skipping lexicon row: {}", e);
                    skipped += 1;
                }
            }
        }

        tracing::info!(
            path = %path.display(),
            terms = terms.len(),
            skipped,
            elapsed = ?start.elapsed(),
            "lexicon loaded"
        );

        Ok(Self { terms })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, TermId)>,
        S: Into<String>,
    {
        Self {
            terms: entries.into_iter().map(|(t, id)| (t.into(), id)).collect(),
        }
    }

    /// Look up a term exactly as given; `None` when it is not in the lexicon
    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.terms.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_lexicon() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lexicon.csv");
        fs::write(
            &path,
            "word,wordID\ncat,1\ndog,2,extra\nbroken\nbad,-1\nnan,abc\ncat,9\n",
        )?;

        let lexicon = Lexicon::load(&path)?;
        assert_eq!(lexicon.len(), 2);
        assert!(!lexicon.is_empty());
        assert!(Lexicon::default().is_empty());
        assert_eq!(lexicon.term_id("cat"), Some(9));
        assert_eq!(lexicon.term_id("dog"), Some(2));
        assert_eq!(lexicon.term_id("bad"), None);
        assert_eq!(lexicon.term_id("nan"), None);

        Ok(())
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let lexicon = Lexicon::from_entries([("cat", 1)]);
        assert_eq!(lexicon.term_id("cat"), Some(1));
        assert_eq!(lexicon.term_id("Cat"), None);
    }

    #[test]
    fn test_missing_lexicon_is_fatal() {
        assert!(Lexicon::load(Path::new("/nonexistent/lexicon.csv")).is_err());
    }
}
