//! Prompt templates for the remote oracle.

use serde_json::json;

use crate::model::{Insight, Mood};

/// System instruction shared by both oracle calls.
pub const SYSTEM_PROMPT: &str = r#"You are the Cosmic Oracle, reading anonymous emotional fragments sent from across the globe.
You answer only with JSON matching the provided schema. Never add commentary."#;

/// Build the classification prompt for a single submission.
pub fn classification_prompt(text: &str) -> String {
    let moods: Vec<&str> = Mood::ALL.iter().map(|m| m.as_str()).collect();
    format!(
        r#"Read the following thought and classify its emotional state.

Choose exactly one mood from: {moods}.
Give 1-4 short lowercase tags naming its themes.

Thought:
"""
{text}
""""#,
        moods = moods.join(", "),
        text = text
    )
}

/// Build the discovery prompt for a fresh insight and the candidate pool.
pub fn discovery_prompt(insight: &Insight, candidates: &[Insight]) -> String {
    let pool: Vec<serde_json::Value> = candidates
        .iter()
        .map(|c| {
            json!({
                "userId": c.user_id,
                "text": c.text,
                "mood": c.mood,
                "tags": c.tags,
            })
        })
        .collect();

    let pool_json = serde_json::to_string_pretty(&pool).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"A new thought arrived:
text: {text}
mood: {mood}
tags: {tags}

Other souls and their most recent thoughts:
{pool}

Return the souls whose thoughts resonate with the new one, as an array of
{{"toId": <userId>, "strength": <0.0-1.0>, "reason": <one short sentence>}}.
Only use userIds from the list. Return an empty array if nothing resonates."#,
        text = insight.text,
        mood = insight.mood,
        tags = insight.tags.join(", "),
        pool = pool_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoPoint;
    use chrono::Utc;

    fn insight(user_id: &str, text: &str, mood: Mood) -> Insight {
        Insight {
            id: format!("{}-i", user_id),
            user_id: user_id.to_string(),
            user_name: user_id.to_string(),
            text: text.to_string(),
            mood,
            tags: vec!["cosmos".to_string()],
            is_public: true,
            timestamp: Utc::now(),
            position: GeoPoint::ORIGIN,
        }
    }

    #[test]
    fn test_classification_prompt_lists_vocabulary() {
        let prompt = classification_prompt("I feel hopeful");
        assert!(prompt.contains("joy, sadness, anger, peace, lonely, inspired"));
        assert!(prompt.contains("I feel hopeful"));
    }

    #[test]
    fn test_discovery_prompt_includes_pool_ids() {
        let me = insight("me", "I feel hopeful", Mood::Joy);
        let pool = vec![insight("soul-3", "stars tonight", Mood::Inspired)];
        let prompt = discovery_prompt(&me, &pool);
        assert!(prompt.contains("\"userId\": \"soul-3\""));
        assert!(prompt.contains("mood: joy"));
    }
}
