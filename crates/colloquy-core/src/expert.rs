//! Expert personas and roster validation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Identifier of an expert persona (e.g. `"ethicist"`)
pub type ExpertId = String;

/// Smallest roster a debate can run with
pub const MIN_EXPERTS: usize = 2;
/// Largest roster a debate can run with
pub const MAX_EXPERTS: usize = 4;

/// Errors raised when an expert selection violates roster constraints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRosterError {
    #[error("Roster must contain between {MIN_EXPERTS} and {MAX_EXPERTS} experts, got {0}")]
    Size(usize),
    #[error("Expert listed more than once: {0}")]
    Duplicate(ExpertId),
    #[error("Unknown expert: {0}")]
    Unknown(ExpertId),
}

/// An expert persona. Immutable reference data for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expert {
    /// Unique identifier
    pub id: ExpertId,
    /// Display name
    pub name: String,
    /// Professional title
    pub title: String,
    /// Short biography
    #[serde(default)]
    pub background: String,
    /// Characteristic viewpoints
    #[serde(default)]
    pub perspectives: Vec<String>,
    /// Areas of expertise
    pub areas: BTreeSet<String>,
}

impl Expert {
    /// Create an expert with the given id, name, title and areas
    pub fn new(id: &str, name: &str, title: &str, areas: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            title: title.to_string(),
            background: String::new(),
            perspectives: Vec::new(),
            areas: areas.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn with_profile(mut self, background: &str, perspectives: &[&str]) -> Self {
        self.background = background.to_string();
        self.perspectives = perspectives.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Lowercased keywords drawn from areas, title and perspectives
    fn keywords(&self) -> Vec<String> {
        self.areas
            .iter()
            .chain(std::iter::once(&self.title))
            .chain(self.perspectives.iter())
            .flat_map(|text| tokenize(text))
            .collect()
    }
}

/// A validated selection of 2–4 distinct experts, in debate order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    experts: Vec<Expert>,
}

impl Roster {
    /// Validate and build a roster
    pub fn new(experts: Vec<Expert>) -> Result<Self, InvalidRosterError> {
        validate_roster_ids(experts.iter().map(|e| e.id.as_str()))?;
        Ok(Self { experts })
    }

    /// Build a roster by looking ids up in the built-in catalogue
    pub fn from_catalog(ids: &[&str]) -> Result<Self, InvalidRosterError> {
        let catalog = catalog();
        let experts = ids
            .iter()
            .map(|id| {
                catalog
                    .iter()
                    .find(|e| e.id == *id)
                    .cloned()
                    .ok_or_else(|| InvalidRosterError::Unknown(id.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(experts)
    }

    pub fn experts(&self) -> &[Expert] {
        &self.experts
    }

    pub fn ids(&self) -> Vec<ExpertId> {
        self.experts.iter().map(|e| e.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.experts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experts.is_empty()
    }

    pub fn into_experts(self) -> Vec<Expert> {
        self.experts
    }
}

/// Check the 2–4 unique ids constraint shared by rosters and debates
pub fn validate_roster_ids<'a>(
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), InvalidRosterError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(InvalidRosterError::Duplicate(id.to_string()));
        }
    }
    if !(MIN_EXPERTS..=MAX_EXPERTS).contains(&seen.len()) {
        return Err(InvalidRosterError::Size(seen.len()));
    }
    Ok(())
}

/// The built-in expert catalogue
pub fn catalog() -> Vec<Expert> {
    vec![
        Expert::new("technologist", "Dr. Ada Chen", "Technology Ethicist", &["AI", "digital rights", "emerging technologies"])
            .with_profile(
                "Former Silicon Valley engineer with a PhD in Computer Science and Philosophy",
                &["Innovation-focused", "Techno-optimist", "Concerned with practical implementation"],
            ),
        Expert::new("ethicist", "Prof. James Wilson", "Moral Philosopher", &["ethics", "justice", "social impact"])
            .with_profile(
                "Oxford-educated philosopher specializing in applied ethics",
                &["Consequentialist", "Global-minded", "Concerned with equitable outcomes"],
            ),
        Expert::new("economist", "Dr. Maya Rodriguez", "Behavioral Economist", &["incentives", "market behavior", "public policy"])
            .with_profile(
                "Researcher at the intersection of psychology and economic decision-making",
                &["Evidence-based", "Skeptical of pure rationality models", "Policy-oriented"],
            ),
        Expert::new("legal", "Prof. Kwame Osei", "International Law Scholar", &["governance", "regulations", "international cooperation"])
            .with_profile(
                "Former UN legal advisor and constitutional law expert",
                &["Rights-focused", "Internationalist", "Proceduralist"],
            ),
        Expert::new("historian", "Dr. Sarah Goldstein", "Technology Historian", &["historical precedents", "societal adaptation", "cultural impacts"])
            .with_profile(
                "Researcher specializing in how societies adapt to technological revolution",
                &["Historical patterns", "Social context", "Long-term perspective"],
            ),
        Expert::new("scientist", "Prof. Lucas Kim", "Research Scientist", &["scientific evidence", "research methods", "complex systems"])
            .with_profile(
                "Multidisciplinary researcher in physics and systems science",
                &["Empirical", "Methodical", "First-principles thinker"],
            ),
        Expert::new("activist", "Mia Tanaka", "Digital Rights Advocate", &["civil liberties", "accessibility", "public advocacy"])
            .with_profile(
                "Grassroots organizer and policy campaigner",
                &["Justice-focused", "Community-oriented", "Challenging power dynamics"],
            ),
        Expert::new("entrepreneur", "Raj Patel", "Tech Entrepreneur", &["business models", "market adoption", "investment"])
            .with_profile(
                "Founded multiple tech startups and venture capital advisor",
                &["Innovation-driven", "Market-focused", "Risk-tolerant"],
            ),
    ]
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "be", "can", "do", "does", "for", "how", "in", "is", "it", "of",
    "on", "or", "should", "the", "to", "we", "what", "will", "with", "would",
];

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Words match when equal, or when both are long enough and share a 5-letter stem
fn words_match(a: &str, b: &str) -> bool {
    const STEM: usize = 5;
    if a == b {
        return true;
    }
    if a.len() < STEM || b.len() < STEM {
        return false;
    }
    a.as_bytes()[..STEM] == b.as_bytes()[..STEM]
}

/// Number of topic words that match one of the expert's keywords
pub fn relevance_score(expert: &Expert, topic: &str) -> usize {
    let keywords = expert.keywords();
    tokenize(topic)
        .iter()
        .filter(|word| keywords.iter().any(|k| words_match(word, k)))
        .count()
}

/// The catalogue ranked by relevance to a topic (ties keep catalogue order)
pub fn relevant_experts(topic: &str) -> Vec<Expert> {
    let mut scored: Vec<(usize, Expert)> = catalog()
        .into_iter()
        .map(|e| (relevance_score(&e, topic), e))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, e)| e).collect()
}

/// Up to three suggested rosters of `size` experts for a topic.
///
/// The first suggestion is the top-ranked experts; the others keep the
/// strongest `size - 1` and rotate in the next-ranked candidates.
pub fn suggested_combinations(topic: &str, size: usize) -> Vec<Vec<ExpertId>> {
    let size = size.clamp(MIN_EXPERTS, MAX_EXPERTS);
    let ranked: Vec<ExpertId> = relevant_experts(topic).into_iter().map(|e| e.id).collect();
    if ranked.len() < size {
        return Vec::new();
    }

    let core = &ranked[..size - 1];
    ranked[size - 1..]
        .iter()
        .take(3)
        .map(|extra| {
            let mut combo = core.to_vec();
            combo.push(extra.clone());
            combo
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        let experts = catalog();
        let ids: HashSet<_> = experts.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), experts.len());
        assert_eq!(experts.len(), 8);
    }

    #[test]
    fn test_roster_size_bounds() {
        let experts = catalog();
        assert_eq!(
            Roster::new(experts[..1].to_vec()),
            Err(InvalidRosterError::Size(1))
        );
        assert_eq!(
            Roster::new(experts[..5].to_vec()),
            Err(InvalidRosterError::Size(5))
        );
        assert!(Roster::new(experts[..4].to_vec()).is_ok());
    }

    #[test]
    fn test_roster_rejects_duplicates() {
        let experts = catalog();
        let dup = vec![experts[0].clone(), experts[1].clone(), experts[0].clone()];
        assert_eq!(
            Roster::new(dup),
            Err(InvalidRosterError::Duplicate("technologist".to_string()))
        );
    }

    #[test]
    fn test_roster_from_catalog_unknown() {
        let err = Roster::from_catalog(&["ethicist", "astrologer"]).unwrap_err();
        assert_eq!(err, InvalidRosterError::Unknown("astrologer".to_string()));
    }

    #[test]
    fn test_relevance_prefers_matching_areas() {
        let ranked = relevant_experts("Should AI be regulated?");
        let top: Vec<_> = ranked.iter().take(2).map(|e| e.id.as_str()).collect();
        assert!(top.contains(&"technologist"));
        assert!(top.contains(&"legal"));
    }

    #[test]
    fn test_relevance_ties_keep_catalog_order() {
        let ranked = relevant_experts("zzz qqq");
        let ids: Vec<_> = ranked.iter().map(|e| e.id.clone()).collect();
        let catalog_ids: Vec<_> = catalog().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, catalog_ids);
    }

    #[test]
    fn test_suggested_combinations() {
        let combos = suggested_combinations("market incentives and public policy", 3);
        assert_eq!(combos.len(), 3);
        for combo in &combos {
            assert_eq!(combo.len(), 3);
            assert_eq!(combo[0], "economist");
        }
    }
}
