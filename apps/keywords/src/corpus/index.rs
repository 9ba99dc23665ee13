//! In-memory term index over a directory of role documents.
//!
//! Scoring is a plain tf-idf sum over the distinct query terms, with a bonus
//! when a term also appears in the document title (the sanitized role name).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::info;

use super::CorpusError;

/// Weight of a title hit relative to a single body occurrence.
const TITLE_BONUS: f64 = 2.0;

/// Words that appear in every retrieval query and carry no signal.
const STOPWORDS: &[&str] = &[
    "a", "all", "an", "and", "for", "in", "of", "on", "or", "the", "to", "with", "role",
    "requirements", "description",
];

#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub text: String,
    term_counts: HashMap<String, u32>,
    title_terms: HashSet<String>,
}

impl Document {
    fn new(title: String, text: String) -> Self {
        let mut term_counts = HashMap::new();
        for term in tokenize(&text) {
            *term_counts.entry(term).or_insert(0) += 1;
        }
        let title_terms = tokenize(&title).collect();
        Self {
            title,
            text,
            term_counts,
            title_terms,
        }
    }

    fn contains(&self, term: &str) -> bool {
        self.term_counts.contains_key(term) || self.title_terms.contains(term)
    }
}

/// The set of documents loaded once at startup.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    documents: Vec<Document>,
    top_k: usize,
}

impl DirectoryCorpus {
    /// Loads every `*.txt` file in `dir`. Invalid UTF-8 is decoded lossily.
    pub fn load(dir: &Path, top_k: usize) -> Result<Self, CorpusError> {
        let io_err = |source| CorpusError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = std::fs::read(&path).map_err(|source| CorpusError::Io {
                path: path.clone(),
                source,
            })?;
            let title = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            documents.push((title, String::from_utf8_lossy(&bytes).into_owned()));
        }

        if documents.is_empty() {
            return Err(CorpusError::EmptyCorpus(dir.to_path_buf()));
        }

        let corpus = Self::from_documents(documents, top_k)?;
        info!("Indexed {} documents from {}", corpus.len(), dir.display());
        Ok(corpus)
    }

    pub fn from_documents(
        documents: Vec<(String, String)>,
        top_k: usize,
    ) -> Result<Self, CorpusError> {
        if documents.is_empty() {
            return Err(CorpusError::EmptyCorpus(Default::default()));
        }
        Ok(Self {
            documents: documents
                .into_iter()
                .map(|(title, text)| Document::new(title, text))
                .collect(),
            top_k: top_k.max(1),
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns up to `top_k` documents with a positive score, best first.
    pub fn search(&self, query: &str) -> Vec<&Document> {
        let terms: HashSet<String> = tokenize(query).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let total = self.documents.len() as f64;
        let idf: HashMap<&str, f64> = terms
            .iter()
            .map(|term| {
                let df = self.documents.iter().filter(|d| d.contains(term)).count();
                (term.as_str(), (1.0 + total / df.max(1) as f64).ln())
            })
            .collect();

        let mut scored: Vec<(f64, &Document)> = self
            .documents
            .iter()
            .map(|doc| {
                let score: f64 = terms
                    .iter()
                    .map(|term| {
                        let weight = idf[term.as_str()];
                        let body = doc
                            .term_counts
                            .get(term)
                            .map(|&tf| 1.0 + (tf as f64).ln())
                            .unwrap_or(0.0);
                        let title = if doc.title_terms.contains(term) {
                            TITLE_BONUS
                        } else {
                            0.0
                        };
                        (body + title) * weight
                    })
                    .sum();
                (score, doc)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|(a, da), (b, db)| b.total_cmp(a).then_with(|| da.title.cmp(&db.title)));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, doc)| doc)
            .collect()
    }
}

/// Formats retrieved documents as a single context block.
pub fn render_context(documents: &[&Document]) -> String {
    documents
        .iter()
        .map(|d| format!("Title: {}\n\n{}", d.title, d.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .map(fold_plural)
}

/// Career titles are plural ("Registered Nurses"), queries usually are not.
/// Folds the common English plural endings so both sides meet.
fn fold_plural(term: String) -> String {
    if term.len() <= 3 {
        return term;
    }
    if let Some(stem) = term.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if ["sses", "ches", "shes", "xes", "zes"]
        .iter()
        .any(|suffix| term.ends_with(suffix))
    {
        return term[..term.len() - 2].to_string();
    }
    if term.ends_with('s') && !["ss", "us", "is"].iter().any(|end| term.ends_with(end)) {
        return term[..term.len() - 1].to_string();
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn docs() -> Vec<(String, String)> {
        vec![
            (
                "Statisticians".to_string(),
                "Apply statistics to data. Statistics, statistics everywhere.".to_string(),
            ),
            (
                "Data Scientists".to_string(),
                "Use statistics and machine learning on data.".to_string(),
            ),
            (
                "Nurses".to_string(),
                "Care for patients in hospitals.".to_string(),
            ),
        ]
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        let terms: Vec<String> =
            tokenize("All requirements and description for role C Data-Scientist").collect();
        assert_eq!(terms, vec!["data", "scientist"]);
    }

    #[test]
    fn test_fold_plural() {
        let fold = |t: &str| fold_plural(t.to_string());
        assert_eq!(fold("nurses"), "nurse");
        assert_eq!(fold("secretaries"), "secretary");
        assert_eq!(fold("processes"), "process");
        assert_eq!(fold("coaches"), "coach");
        assert_eq!(fold("business"), "business");
        assert_eq!(fold("analysis"), "analysis");
        assert_eq!(fold("status"), "status");
        assert_eq!(fold("gas"), "gas");
    }

    #[test]
    fn test_singular_query_matches_plural_title() {
        let corpus = DirectoryCorpus::from_documents(
            vec![
                (
                    "Registered Nurses".to_string(),
                    "Registered nurses care for patients in hospitals.".to_string(),
                ),
                (
                    "Bakers".to_string(),
                    "Mix dough and operate ovens.".to_string(),
                ),
            ],
            3,
        )
        .unwrap();

        let hits = corpus.search("All requirements and description for role Nurse");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Registered Nurses");

        let hits = corpus.search("All requirements and description for role Baker");
        assert_eq!(hits[0].title, "Bakers");
    }

    #[test]
    fn test_title_match_outranks_body_frequency() {
        let corpus = DirectoryCorpus::from_documents(docs(), 3).unwrap();
        let hits = corpus.search("Data Scientists");
        assert_eq!(hits[0].title, "Data Scientists");
        assert!(hits.iter().all(|d| d.title != "Nurses"));
    }

    #[test]
    fn test_top_k_limits_results() {
        let corpus = DirectoryCorpus::from_documents(docs(), 1).unwrap();
        assert_eq!(corpus.search("statistics data").len(), 1);
    }

    #[test]
    fn test_query_of_only_stopwords_matches_nothing() {
        let corpus = DirectoryCorpus::from_documents(docs(), 3).unwrap();
        assert!(corpus.search("all the requirements").is_empty());
    }

    #[test]
    fn test_load_reads_only_txt_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Nurses.txt"), "Care for patients.").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        std::fs::write(dir.path().join("Bakers.txt"), [0x42, 0xff, 0x61, 0x6b, 0x65]).unwrap();

        let corpus = DirectoryCorpus::load(dir.path(), 3).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.search("patients")[0].title, "Nurses");
    }

    #[test]
    fn test_load_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = DirectoryCorpus::load(dir.path(), 3).unwrap_err();
        assert!(matches!(err, CorpusError::EmptyCorpus(_)));
    }

    #[test]
    fn test_render_context_includes_titles() {
        let corpus = DirectoryCorpus::from_documents(docs(), 3).unwrap();
        let text = render_context(&corpus.search("patients"));
        assert!(text.starts_with("Title: Nurses"));
    }
}
