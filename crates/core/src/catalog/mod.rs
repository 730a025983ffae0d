//! Local product catalog and free-text resolution to canonical product ids.
//!
//! Resolution runs in two phases. An exact, case-insensitive match on either
//! primary field wins outright. Otherwise every entry is scored by token
//! overlap with its searchable fields, plus a bonus when the whole query is a
//! substring of a primary field, and the best score wins. Ties go to the entry
//! that appears first in the catalog.

mod seed;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::CatalogEntry;

pub use seed::builtin_entries;

/// Tokens of this many characters or fewer are ignored during partial matching.
const MIN_TOKEN_CHARS: usize = 2;
const PRIMARY_SUBSTRING_BONUS: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub score: u32,
    pub entry_id: i64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("catalog file `{0}` contains no products")]
    Empty(PathBuf),
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<CatalogEntry>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_entries())
    }

    /// Load `[[products]]` tables from a TOML file, keeping file order.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        let file = toml::from_str::<CatalogFile>(&raw)
            .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })?;
        if file.products.is_empty() {
            return Err(CatalogError::Empty(path.to_path_buf()));
        }
        Ok(Self::new(file.products))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, query: &str) -> Option<i64> {
        let query = normalize_query(query);
        if query.is_empty() {
            return None;
        }

        self.exact_match(&query).or_else(|| self.best_partial_match(&query))
    }

    /// Every entry with a positive partial-match score, best first.
    ///
    /// Ordering is by score descending and catalog order within a score, so the
    /// head of the list is what phase two of [`Catalog::resolve`] would pick.
    pub fn candidates(&self, query: &str) -> Vec<MatchCandidate> {
        let query = normalize_query(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut candidates = self.scored(&query).collect::<Vec<_>>();
        // sort_by is stable, which keeps catalog order among equal scores
        candidates.sort_by(|left, right| right.score.cmp(&left.score));
        candidates
    }

    fn exact_match(&self, query: &str) -> Option<i64> {
        self.entries
            .iter()
            .filter(|entry| {
                entry.primary_fields().iter().any(|field| field.to_lowercase() == query)
            })
            .find_map(|entry| entry.id.parse())
    }

    fn best_partial_match(&self, query: &str) -> Option<i64> {
        let mut best: Option<MatchCandidate> = None;
        for candidate in self.scored(query) {
            if best.map_or(true, |current| candidate.score > current.score) {
                best = Some(candidate);
            }
        }
        best.map(|candidate| candidate.entry_id)
    }

    fn scored<'a>(&'a self, query: &'a str) -> impl Iterator<Item = MatchCandidate> + 'a {
        let query_tokens = tokenize(query);
        self.entries.iter().filter_map(move |entry| {
            let entry_id = entry.id.parse()?;
            let score = score_entry(query, &query_tokens, entry);
            (score > 0).then_some(MatchCandidate { score, entry_id })
        })
    }
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

fn haystack(entry: &CatalogEntry) -> String {
    entry.searchable_fields().join(" ").to_lowercase()
}

/// Number of query tokens that also occur in the entry's haystack.
pub fn token_score(query_tokens: &HashSet<String>, entry: &CatalogEntry) -> u32 {
    let haystack_tokens = tokenize(&haystack(entry));
    query_tokens.intersection(&haystack_tokens).count() as u32
}

fn score_entry(query: &str, query_tokens: &HashSet<String>, entry: &CatalogEntry) -> u32 {
    let mut score = token_score(query_tokens, entry);
    if entry.name.to_lowercase().contains(query) {
        score += PRIMARY_SUBSTRING_BONUS;
    }
    if entry.analytics_name.to_lowercase().contains(query) {
        score += PRIMARY_SUBSTRING_BONUS;
    }
    score
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{tokenize, token_score, Catalog, CatalogError, MatchCandidate};
    use crate::domain::product::CatalogEntry;

    fn three_entry_catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new("30", "Durable Roll Label")
                .with_analytics_name("Sticker")
                .with_category("Roll Labels")
                .with_material("BOPP")
                .with_finish("Matte")
                .with_format("Roll"),
            CatalogEntry::new("11", "White Vinyl Removable Glossy Kiss-Cut Sticker")
                .with_analytics_name("Removable Vinyl Sticker Hand-Outs")
                .with_category("Kiss-Cut Stickers")
                .with_material("Vinyl")
                .with_finish("Glossy")
                .with_format("Sheet"),
            CatalogEntry::new("55", "Laminated Clear Vinyl Removable Sticker")
                .with_analytics_name("Clear Die-Cut Stickers")
                .with_category("Die-Cut Stickers")
                .with_material("Clear Vinyl")
                .with_finish("Laminated")
                .with_format("Single"),
        ])
    }

    #[test]
    fn exact_primary_match_is_case_insensitive() {
        let catalog = three_entry_catalog();
        assert_eq!(catalog.resolve("white vinyl removable glossy kiss-cut sticker"), Some(11));
        assert_eq!(catalog.resolve("  CLEAR DIE-CUT STICKERS "), Some(55));
    }

    #[test]
    fn exact_match_wins_over_higher_partial_score() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("1", "Vinyl Sticker Glossy Sheet")
                .with_category("sticker sticker"),
            CatalogEntry::new("2", "Sticker"),
        ]);
        assert_eq!(catalog.resolve("Sticker"), Some(2));
    }

    #[test]
    fn every_case_and_whitespace_variant_hits_exact_match() {
        let catalog = three_entry_catalog();
        for entry in catalog.entries() {
            let expected = entry.id.parse();
            for field in entry.primary_fields() {
                let variants = [field.to_uppercase(), field.to_lowercase(), format!("\t{field}  ")];
                for variant in variants {
                    assert_eq!(catalog.resolve(&variant), expected, "variant `{variant}`");
                }
            }
        }
    }

    #[test]
    fn exact_match_skips_unparseable_ids_and_keeps_scanning() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("not-a-number", "Holographic Sticker"),
            CatalogEntry::new("77", "Holographic Sticker"),
        ]);
        assert_eq!(catalog.resolve("holographic sticker"), Some(77));
    }

    #[test]
    fn partial_match_picks_highest_overlap() {
        assert_eq!(three_entry_catalog().resolve("glossy vinyl stickers"), Some(11));
    }

    #[test]
    fn unrelated_query_resolves_to_nothing() {
        assert_eq!(three_entry_catalog().resolve("purple unicorn thingies"), None);
    }

    #[test]
    fn plural_forms_are_not_stemmed() {
        let catalog = Catalog::new(vec![CatalogEntry::new("5", "Paper").with_category("sticker")]);
        assert_eq!(catalog.resolve("stickers"), None);
    }

    #[test]
    fn ties_go_to_the_earliest_entry() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("8", "Matte Paper Label"),
            CatalogEntry::new("3", "Matte Paper Label Roll"),
            CatalogEntry::new("9", "Glossy Paper Sheet"),
        ]);
        assert_eq!(catalog.resolve("matte label"), Some(8));

        let reversed = Catalog::new(catalog.entries().iter().rev().cloned().collect());
        assert_eq!(reversed.resolve("matte label"), Some(3));
    }

    #[test]
    fn substring_bonus_applies_per_primary_field() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("1", "Bumper Sticker Pack")
                .with_analytics_name("Bumper Sticker Pack Promo"),
            CatalogEntry::new("2", "Bumper Sticker").with_category("bumper sticker vinyl extra"),
        ]);
        assert_eq!(
            catalog.candidates("bumper sticker pack"),
            vec![MatchCandidate { score: 7, entry_id: 1 }, MatchCandidate { score: 2, entry_id: 2 }]
        );
    }

    #[test]
    fn short_tokens_are_ignored() {
        let tokens = tokenize("a 3x3 of die cut labels");
        assert!(tokens.contains("3x3"));
        assert!(tokens.contains("die"));
        assert!(tokens.contains("cut"));
        assert!(!tokens.contains("of"));
        assert!(!tokens.contains("a"));
    }

    #[test]
    fn token_score_is_monotone_in_query_tokens() {
        let entry = three_entry_catalog().entries()[1].clone();
        let queries =
            ["glossy", "glossy vinyl", "glossy vinyl removable", "glossy vinyl removable sheet"];
        let scores =
            queries.iter().map(|query| token_score(&tokenize(query), &entry)).collect::<Vec<_>>();
        assert!(scores.windows(2).all(|pair| pair[0] <= pair[1]), "scores {scores:?}");
    }

    #[test]
    fn entries_with_unparseable_ids_are_not_candidates() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("x1", "Glitter Sticker Sheet"),
            CatalogEntry::new("4", "Plain Sheet"),
        ]);
        assert_eq!(catalog.resolve("glitter sheet"), Some(4));
        assert_eq!(
            catalog.candidates("glitter sheet"),
            vec![MatchCandidate { score: 1, entry_id: 4 }]
        );
    }

    #[test]
    fn empty_query_resolves_to_nothing() {
        assert_eq!(three_entry_catalog().resolve("   "), None);
        assert!(three_entry_catalog().candidates("").is_empty());
    }

    #[test]
    fn candidates_are_ranked_by_score_then_catalog_order() {
        let candidates = three_entry_catalog().candidates("glossy vinyl stickers");
        assert_eq!(
            candidates,
            vec![
                MatchCandidate { score: 3, entry_id: 11 },
                MatchCandidate { score: 2, entry_id: 55 }
            ]
        );
    }

    #[test]
    fn builtin_catalog_contains_known_products() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.resolve("white vinyl removable glossy kiss-cut sticker"), Some(11));
    }

    #[test]
    fn catalog_loads_from_toml_in_file_order() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            r#"
[[products]]
id = "101"
name = "Kraft Paper Label"
category = "Labels"

[[products]]
id = "102"
name = "Kraft Paper Sticker"
analytics_name = "Kraft Stickers"
"#,
        )
        .map_err(|err| err.to_string())?;

        let catalog = Catalog::load(&path).map_err(|err| err.to_string())?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve("kraft paper"), Some(101));
        assert_eq!(catalog.resolve("kraft stickers"), Some(102));
        Ok(())
    }

    #[test]
    fn empty_catalog_file_is_rejected() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let path = dir.path().join("catalog.toml");
        fs::write(&path, "").map_err(|err| err.to_string())?;

        match Catalog::load(&path) {
            Err(CatalogError::Empty(_)) => Ok(()),
            other => Err(format!("expected empty-catalog error, got {other:?}")),
        }
    }
}
