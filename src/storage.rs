use crate::error::{Result, SearchError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const LEXICON_FILE: &str = "lexicon.csv";
const DOCUMENTS_FILE: &str = "documents.csv";
const BARRELS_DIR: &str = "barrels";

/// On-disk layout of the persisted index artifacts
#[derive(Debug, Clone)]
pub struct IndexPaths {
    root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lexicon(&self) -> PathBuf {
        self.root.join(LEXICON_FILE)
    }

    pub fn documents(&self) -> PathBuf {
        self.root.join(DOCUMENTS_FILE)
    }

    pub fn barrels_dir(&self) -> PathBuf {
        self.root.join(BARRELS_DIR)
    }
}

/// Path of a single shard file: `<dir>/barrel_<index>.csv`
pub fn barrel_path(dir: &Path, shard_index: usize) -> PathBuf {
    dir.join(format!("barrel_{shard_index}.csv"))
}

/// A data row of a CSV artifact with its 1-based line number
#[derive(Debug, Clone)]
pub struct Row {
    pub line: usize,
    pub text: String,
}

impl Row {
    /// Comma-separated fields, trimmed of whitespace and surrounding quotes
    pub fn fields(&self) -> Vec<&str> {
        self.text.split(',').map(clean_field).collect()
    }
}

fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

/// Read every data row of a CSV artifact, skipping the header row.
///
/// Failing to open or read the file is fatal. A row that is not valid
/// UTF-8 is logged and skipped; row contents are not inspected otherwise.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).map_err(|e| SearchError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut rows = Vec::new();
    let mut buf = Vec::new();
    let mut line = 0usize;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SearchError::io(path, e))?;
        if read == 0 {
            break;
        }
        line += 1;
        if line == 1 {
            continue;
        }

        let text = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim_end_matches(['\n', '\r']),
            Err(e) => {
                tracing::warn!(path = %path.display(), line, "skipping row: {}", e);
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        rows.push(Row {
            line,
            text: text.to_string(),
        });
    }

    Ok(rows)
}
