use crate::error::Result;
use crate::storage::read_rows;
use crate::DocId;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Display metadata for an indexed document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub url: String,
    pub tags: String,
}

impl Document {
    pub fn new(id: DocId, title: String, url: String) -> Self {
        Self {
            id,
            title,
            url,
            tags: String::new(),
        }
    }

    pub fn with_tags(mut self, tags: String) -> Self {
        self.tags = tags;
        self
    }
}

/// Document id -> metadata, read from `docID,title,url,tag[,tag...]`
#[derive(Debug, Clone, Default)]
pub struct DocumentTable {
    documents: HashMap<DocId, Document>,
}

impl DocumentTable {
    pub fn load(path: &Path) -> Result<Self> {
        let mut documents = HashMap::new();

        for row in read_rows(path)? {
            // Tags may contain commas, so split the raw text rather than cleaned fields
            let fields: Vec<&str> = row.text.splitn(4, ',').collect();
            if fields.len() < 4 {
                continue;
            }

            let id = match fields[0].trim().parse::<DocId>() {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(line = row.line, "skipping document row: {}", e);
                    continue;
                }
            };

            let doc = Document::new(id, fields[1].to_string(), fields[2].to_string())
                .with_tags(fields[3].to_string());
            documents.insert(id, doc);
        }

        tracing::info!(
            path = %path.display(),
            documents = documents.len(),
            "document table loaded"
        );

        Ok(Self { documents })
    }

    pub fn from_documents<I: IntoIterator<Item = Document>>(docs: I) -> Self {
        Self {
            documents: docs.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
