//! Precomputed pair scores, e.g. from an external structural aligner.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SnaError, WeightError};

use super::{read_rows, SourceKind, WeightSource};

/// Symmetric lookup table of `(accession, accession) -> score`.
pub struct PairTableWeight {
    name: String,
    kind: SourceKind,
    scores: HashMap<(String, String), f64>,
    known: HashSet<String>,
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PairTableWeight {
    /// Create an empty alignment-kind table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Alignment,
            scores: HashMap::new(),
            known: HashSet::new(),
        }
    }

    /// Treat the table as another kind of evidence.
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record a score. A pair listed twice keeps its higher score.
    pub fn insert(&mut self, a: &str, b: &str, score: f64) {
        let entry = self.scores.entry(key(a, b)).or_insert(score);
        if score > *entry {
            debug!("Pair ({}, {}) listed twice; keeping {}", a, b, score);
            *entry = score;
        }
        self.known.insert(a.to_string());
        self.known.insert(b.to_string());
    }

    /// Number of scored pairs.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Load `accessionA  accessionB  score` rows from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut table = Self::from_reader(BufReader::new(file), &path.display().to_string())?;
        table.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scores".to_string());
        info!("Loaded {} scored pairs from {}", table.len(), path.display());
        Ok(table)
    }

    /// Load `accessionA  accessionB  score` rows from any reader.
    ///
    /// Scores must be probabilities in [0, 1].
    pub fn from_reader<R: BufRead>(reader: R, label: &str) -> Result<Self> {
        let mut table = Self::new("scores");
        for (line, fields) in read_rows(reader, label, 3)? {
            let score: f64 = fields[2]
                .parse()
                .ok()
                .filter(|s: &f64| s.is_finite() && (0.0..=1.0).contains(s))
                .ok_or_else(|| SnaError::Parse {
                    path: label.to_string(),
                    line,
                    message: format!("score '{}' is not a probability", fields[2]),
                })?;
            table.insert(&fields[0], &fields[1], score);
        }
        Ok(table)
    }
}

impl WeightSource for PairTableWeight {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn score(&self, a: &str, b: &str) -> std::result::Result<f64, WeightError> {
        if !self.known.contains(a) {
            return Err(WeightError::UnknownIdentifier { id: a.to_string() });
        }
        if !self.known.contains(b) {
            return Err(WeightError::UnknownIdentifier { id: b.to_string() });
        }
        self.scores
            .get(&key(a, b))
            .copied()
            .ok_or_else(|| WeightError::MissingPair {
                a: a.to_string(),
                b: b.to_string(),
            })
    }

    fn covers(&self, id: &str) -> bool {
        self.known.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_symmetric_lookup() {
        let table = PairTableWeight::from_reader("P1 P2 0.507\nP3\tP1\t0.2\n".as_bytes(), "mem").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.score("P2", "P1"), Ok(0.507));
        assert_eq!(table.score("P1", "P3"), Ok(0.2));
        assert_eq!(
            table.score("P2", "P3"),
            Err(WeightError::MissingPair {
                a: "P2".to_string(),
                b: "P3".to_string()
            })
        );
        assert!(matches!(table.score("P9", "P1"), Err(WeightError::UnknownIdentifier { .. })));
    }

    #[test]
    fn test_duplicate_keeps_highest() {
        let mut table = PairTableWeight::new("t");
        table.insert("A", "B", 0.3);
        table.insert("B", "A", 0.6);
        table.insert("A", "B", 0.1);
        assert_eq!(table.score("A", "B"), Ok(0.6));
    }

    #[test]
    fn test_rejects_non_probability() {
        assert!(PairTableWeight::from_reader("A B 1.7\n".as_bytes(), "mem").is_err());
        assert!(PairTableWeight::from_reader("A B high\n".as_bytes(), "mem").is_err());
    }

    #[test]
    fn test_from_path_names_source_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ce_scores.tsv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "A\tB\t0.9").unwrap();

        let table = PairTableWeight::from_path(&path).unwrap();
        assert_eq!(table.name(), "ce_scores");
        assert_eq!(table.kind(), SourceKind::Alignment);
    }
}
