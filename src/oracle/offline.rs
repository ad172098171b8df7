//! Offline oracle: rule-based classification and resonance scoring.
//!
//! Deterministic, so it doubles as the backend for demos and local runs
//! without credentials.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{Classification, ConnectionCandidate, Oracle, OracleError};
use crate::model::{Insight, Mood};
use crate::settings::schema::OfflineOracleSettings;

const LEXICON: &[(Mood, &[&str])] = &[
    (
        Mood::Joy,
        &["happy", "joy", "glad", "hope", "delight", "grateful", "excited", "smil", "love"],
    ),
    (
        Mood::Sadness,
        &["sad", "cry", "tear", "grief", "loss", "lost", "miss", "sorrow", "heartbro"],
    ),
    (
        Mood::Anger,
        &["angry", "anger", "furious", "hate", "rage", "mad", "annoy", "unfair", "frustrat"],
    ),
    (
        Mood::Peace,
        &["calm", "peace", "quiet", "still", "serene", "rest", "gentle", "breath"],
    ),
    (
        Mood::Lonely,
        &["alone", "lonely", "nobody", "empty", "isolat", "invisible", "distant"],
    ),
    (
        Mood::Inspired,
        &["inspir", "creat", "dream", "idea", "universe", "cosmos", "wonder", "build", "vision"],
    ),
];

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "because", "before", "being", "could", "every", "feel", "feels",
    "from", "have", "just", "like", "really", "should", "that", "their", "there", "these",
    "they", "this", "today", "what", "when", "where", "which", "with", "would", "your",
];

const MAX_TAGS: usize = 4;
const MOOD_WEIGHT: f64 = 0.5;
const TAG_WEIGHT: f64 = 0.35;
const WORD_WEIGHT: f64 = 0.15;

pub struct OfflineOracle {
    min_strength: f64,
    max_connections: usize,
}

impl OfflineOracle {
    pub fn new(min_strength: f64, max_connections: usize) -> Self {
        Self {
            min_strength,
            max_connections,
        }
    }

    pub fn from_settings(settings: &OfflineOracleSettings) -> Self {
        Self::new(settings.min_strength, settings.max_connections)
    }

    fn score(&self, insight: &Insight, other: &Insight) -> (f64, String) {
        let mood_match = insight.mood == other.mood;

        let mine = lowercase_set(&insight.tags);
        let theirs = lowercase_set(&other.tags);
        let mut shared: Vec<&String> = mine.intersection(&theirs).collect();
        shared.sort();

        let words: HashSet<String> = content_words(&insight.text).into_iter().collect();
        let their_words: HashSet<String> = content_words(&other.text).into_iter().collect();

        let mut strength = jaccard(&mine, &theirs) * TAG_WEIGHT
            + jaccard(&words, &their_words) * WORD_WEIGHT;
        if mood_match {
            strength += MOOD_WEIGHT;
        }

        let mut reason = if mood_match {
            format!("shared {}", insight.mood)
        } else {
            format!("{} meets {}", insight.mood, other.mood)
        };
        if !shared.is_empty() {
            let threads: Vec<&str> = shared.iter().map(|s| s.as_str()).collect();
            reason.push_str(&format!("; common threads: {}", threads.join(", ")));
        }

        (strength.min(1.0), reason)
    }
}

impl Default for OfflineOracle {
    fn default() -> Self {
        Self::from_settings(&OfflineOracleSettings::default())
    }
}

fn lowercase_set(tags: &[String]) -> HashSet<String> {
    tags.iter().map(|t| t.to_lowercase()).collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Words long enough to carry meaning, in order of appearance.
fn content_words(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn mood_of(word: &str) -> Option<Mood> {
    LEXICON
        .iter()
        .find(|(_, stems)| stems.iter().any(|stem| word.starts_with(stem)))
        .map(|(mood, _)| *mood)
}

#[async_trait]
impl Oracle for OfflineOracle {
    async fn classify(&self, text: &str) -> Result<Classification, OracleError> {
        let all_words = words(text);
        if all_words.is_empty() {
            return Err(OracleError::InvalidResponse(
                "nothing to classify".to_string(),
            ));
        }

        let mut counts = [0usize; 6];
        let mut mood_words = Vec::new();
        for word in &all_words {
            if let Some(mood) = mood_of(word) {
                if let Some(i) = Mood::ALL.iter().position(|m| *m == mood) {
                    counts[i] += 1;
                }
                mood_words.push(word.clone());
            }
        }

        // Ties go to the earlier mood in the vocabulary; silence reads as peace
        let mood = counts
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(i, _)| Mood::ALL[i])
            .unwrap_or(Mood::Peace);

        let mut seen = HashSet::new();
        let tags: Vec<String> = mood_words
            .into_iter()
            .chain(content_words(text))
            .filter(|w| seen.insert(w.clone()))
            .take(MAX_TAGS)
            .collect();

        Ok(Classification { mood, tags })
    }

    async fn discover_connections(
        &self,
        insight: &Insight,
        candidates: &[Insight],
    ) -> Result<Vec<ConnectionCandidate>, OracleError> {
        let mut found: Vec<ConnectionCandidate> = candidates
            .iter()
            .filter(|c| c.user_id != insight.user_id)
            .filter_map(|c| {
                let (strength, reason) = self.score(insight, c);
                (strength >= self.min_strength).then(|| ConnectionCandidate {
                    to_id: c.user_id.clone(),
                    strength,
                    reason,
                })
            })
            .collect();

        found.sort_by(|a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| a.to_id.cmp(&b.to_id))
        });
        found.truncate(self.max_connections);
        Ok(found)
    }

    fn description(&self) -> String {
        "Offline (keyword lexicon)".to_string()
    }
}
