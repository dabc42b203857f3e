use retrieval::{Analyzer, DocId, Document, DocumentSource};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    title: String,
    body: String,
}

/// Documents read from a JSON/JSONL file or a directory of them.
pub struct JsonSource {
    input: Option<PathBuf>,
    analyzer: Analyzer,
}

impl JsonSource {
    pub fn new(input: Option<PathBuf>, analyzer: Analyzer) -> Self {
        Self { input, analyzer }
    }

    fn files(root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        if root.is_dir() {
            for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                    files.push(p.to_path_buf());
                }
            }
            files.sort();
        } else if root.is_file() {
            files.push(root.to_path_buf());
        }
        files
    }

    fn read_jsonl(&self, file: &Path, out: &mut Vec<Document>) -> retrieval::Result<()> {
        let reader = BufReader::new(File::open(file)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let doc: InputDoc = serde_json::from_str(&line)?;
            out.push(self.to_document(doc));
        }
        Ok(())
    }

    fn read_json(&self, file: &Path, out: &mut Vec<Document>) -> retrieval::Result<()> {
        let reader = BufReader::new(File::open(file)?);
        let json: serde_json::Value = serde_json::from_reader(reader)?;
        match json {
            serde_json::Value::Array(arr) => {
                for v in arr {
                    let doc: InputDoc = serde_json::from_value(v)?;
                    out.push(self.to_document(doc));
                }
            }
            serde_json::Value::Object(_) => {
                let doc: InputDoc = serde_json::from_value(json)?;
                out.push(self.to_document(doc));
            }
            _ => {}
        }
        Ok(())
    }

    fn to_document(&self, doc: InputDoc) -> Document {
        Document::new(doc.id, doc.title, self.analyzer.analyze(&doc.body))
    }
}

impl DocumentSource for JsonSource {
    fn documents(&self) -> retrieval::Result<Vec<Document>> {
        let Some(root) = &self.input else {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no index found and no --input to build one from").into());
        };
        let mut docs = Vec::new();
        for file in Self::files(root) {
            if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                self.read_jsonl(&file, &mut docs)?;
            } else {
                self.read_json(&file, &mut docs)?;
            }
        }
        tracing::info!(num_docs = docs.len(), input = %root.display(), "ingested documents");
        Ok(docs)
    }
}
