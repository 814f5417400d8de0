//! Structural classification weight (SCOP-style hierarchy).
//!
//! Each accession maps to a concise classification string such as
//! `b.23.1.1` (class.fold.superfamily.family) and optionally a domain id.
//! Two proteins score the weight of the most specific level they share.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SnaError, WeightError};

use super::{read_rows, SourceKind, WeightSource};

/// Levels of the classification hierarchy, least specific first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationLevel {
    Class,
    Fold,
    Superfamily,
    Family,
    Domain,
}

impl ClassificationLevel {
    /// Most specific first.
    pub const DESCENDING: [ClassificationLevel; 5] = [
        ClassificationLevel::Domain,
        ClassificationLevel::Family,
        ClassificationLevel::Superfamily,
        ClassificationLevel::Fold,
        ClassificationLevel::Class,
    ];

    /// Number of lineage components this level requires (Domain is separate).
    fn depth(self) -> usize {
        match self {
            ClassificationLevel::Class => 1,
            ClassificationLevel::Fold => 2,
            ClassificationLevel::Superfamily => 3,
            ClassificationLevel::Family => 4,
            ClassificationLevel::Domain => 5,
        }
    }
}

/// Default level weights.
pub fn default_level_weights() -> BTreeMap<ClassificationLevel, f64> {
    BTreeMap::from([
        (ClassificationLevel::Class, 0.05),
        (ClassificationLevel::Fold, 0.1),
        (ClassificationLevel::Superfamily, 0.4),
        (ClassificationLevel::Family, 0.8),
        (ClassificationLevel::Domain, 1.0),
    ])
}

/// Position of one protein in the classification hierarchy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    lineage: Vec<String>,
    domain: Option<String>,
}

impl Classification {
    /// Parse a dotted lineage (`b.23.1.1`, or a prefix such as `b.23`).
    ///
    /// Returns `None` for an empty lineage, an empty component, or more than
    /// four components.
    pub fn parse(sccs: &str, domain: Option<&str>) -> Option<Self> {
        let lineage: Vec<String> = sccs.split('.').map(str::to_string).collect();
        if lineage.len() > 4 || lineage.iter().any(String::is_empty) {
            return None;
        }
        Some(Self {
            lineage,
            domain: domain.filter(|d| !d.is_empty()).map(str::to_string),
        })
    }

    /// Whether both proteins agree at `level`.
    pub fn shares(&self, other: &Classification, level: ClassificationLevel) -> bool {
        if level == ClassificationLevel::Domain {
            return matches!((&self.domain, &other.domain), (Some(a), Some(b)) if a == b);
        }
        let depth = level.depth();
        self.lineage.len() >= depth
            && other.lineage.len() >= depth
            && self.lineage[..depth] == other.lineage[..depth]
    }
}

/// Weight source backed by a classification table.
pub struct ClassificationWeight {
    name: String,
    entries: HashMap<String, Classification>,
    weights: BTreeMap<ClassificationLevel, f64>,
}

impl ClassificationWeight {
    /// Create an empty source with the default level weights.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_weights(name, default_level_weights())
    }

    /// Create an empty source; levels without a weight never match.
    pub fn with_weights(name: impl Into<String>, weights: BTreeMap<ClassificationLevel, f64>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            weights,
        }
    }

    /// Record the classification of an accession, replacing any earlier one.
    pub fn insert(&mut self, accession: impl Into<String>, classification: Classification) {
        self.entries.insert(accession.into(), classification);
    }

    /// Number of classified accessions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load `accession  sccs  [domain]` rows from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let source = Self::from_reader(BufReader::new(file), &path.display().to_string())?;
        info!("Loaded {} classified accessions from {}", source.len(), path.display());
        Ok(source)
    }

    /// Load `accession  sccs  [domain]` rows from any reader.
    pub fn from_reader<R: BufRead>(reader: R, label: &str) -> Result<Self> {
        let mut source = Self::new("classification");
        for (line, fields) in read_rows(reader, label, 2)? {
            let classification = Classification::parse(&fields[1], fields.get(2).map(String::as_str))
                .ok_or_else(|| SnaError::Parse {
                    path: label.to_string(),
                    line,
                    message: format!("invalid classification '{}'", fields[1]),
                })?;
            source.insert(fields[0].clone(), classification);
        }
        Ok(source)
    }

    fn lookup(&self, id: &str) -> std::result::Result<&Classification, WeightError> {
        self.entries
            .get(id)
            .ok_or_else(|| WeightError::UnknownIdentifier { id: id.to_string() })
    }

    /// Most specific weighted level shared by the two accessions.
    pub fn shared_level(&self, a: &str, b: &str) -> std::result::Result<Option<ClassificationLevel>, WeightError> {
        let (ca, cb) = (self.lookup(a)?, self.lookup(b)?);
        Ok(ClassificationLevel::DESCENDING
            .into_iter()
            .find(|&level| self.weights.contains_key(&level) && ca.shares(cb, level)))
    }
}

impl WeightSource for ClassificationWeight {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Database
    }

    fn score(&self, a: &str, b: &str) -> std::result::Result<f64, WeightError> {
        Ok(self
            .shared_level(a, b)?
            .and_then(|level| self.weights.get(&level).copied())
            .unwrap_or(0.0))
    }

    fn covers(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const COW_SPERMADHESIN: &str = "P29392";
    const PIG_SPERMADHESIN: &str = "P35495";
    const HISTO_COLLAGEN: &str = "Q9S0X0";
    const YEAST_KILLER: &str = "P10410";
    const ANTI_FUNGAL: &str = "Q9RCK8";

    const TABLE: &str = "\
# accession  sccs  domain
P29392\tb.23.1.1\td1sfpa_
P35495\tb.23.1.1\td1sppa_
Q9S0X0\tb.23.2.1\td1nqda_
P10410\tb.11.1.2\td1wkta_
Q9RCK8\tb.11.1.6\td1g6ea_
";

    #[test]
    fn test_most_specific_shared_level() {
        let source = ClassificationWeight::from_reader(TABLE.as_bytes(), "mem").unwrap();
        let w = default_level_weights();
        let cases = [
            (COW_SPERMADHESIN, COW_SPERMADHESIN, ClassificationLevel::Domain),
            (COW_SPERMADHESIN, PIG_SPERMADHESIN, ClassificationLevel::Family),
            (COW_SPERMADHESIN, HISTO_COLLAGEN, ClassificationLevel::Fold),
            (PIG_SPERMADHESIN, HISTO_COLLAGEN, ClassificationLevel::Fold),
            (COW_SPERMADHESIN, YEAST_KILLER, ClassificationLevel::Class),
            (COW_SPERMADHESIN, ANTI_FUNGAL, ClassificationLevel::Class),
            (YEAST_KILLER, ANTI_FUNGAL, ClassificationLevel::Superfamily),
        ];
        for (a, b, level) in cases {
            assert_abs_diff_eq!(source.score(a, b).unwrap(), w[&level], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_unweighted_levels_fall_through() {
        let weights = BTreeMap::from([
            (ClassificationLevel::Fold, 0.1),
            (ClassificationLevel::Superfamily, 0.4),
            (ClassificationLevel::Family, 0.8),
        ]);
        let mut source = ClassificationWeight::with_weights("partial", weights);
        source.insert("A", Classification::parse("a.1.1.1", Some("d1")).unwrap());
        source.insert("B", Classification::parse("a.1.1.1", Some("d1")).unwrap());
        source.insert("C", Classification::parse("a.2.1.1", None).unwrap());

        // Same domain, but Domain has no weight: Family is next.
        assert_abs_diff_eq!(source.score("A", "B").unwrap(), 0.8);
        // Only the class is shared and Class has no weight.
        assert_eq!(source.score("A", "C").unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_accession_fails() {
        let source = ClassificationWeight::from_reader(TABLE.as_bytes(), "mem").unwrap();
        assert_eq!(
            source.score("asdfasdfasdf", "sdgoyhljhsadf"),
            Err(WeightError::UnknownIdentifier {
                id: "asdfasdfasdf".to_string()
            })
        );
        assert!(source.covers(YEAST_KILLER));
        assert!(!source.covers("nope"));
    }

    #[test]
    fn test_parse() {
        assert!(Classification::parse("b.23", None).is_some());
        assert!(Classification::parse("b..1", None).is_none());
        assert!(Classification::parse("a.1.1.1.1", None).is_none());
        assert!(ClassificationWeight::from_reader("P1\ta..1\n".as_bytes(), "mem").is_err());
    }

    #[test]
    fn test_partial_lineage_only_matches_its_depth() {
        let a = Classification::parse("b.23", None).unwrap();
        let b = Classification::parse("b.23.1.1", None).unwrap();
        assert!(a.shares(&b, ClassificationLevel::Fold));
        assert!(!a.shares(&b, ClassificationLevel::Superfamily));
    }
}
