//! Mock population seeded into the store at start-up.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Actor, GeoPoint, Insight, Mood};
use crate::settings::schema::PopulationSettings;

/// Rough landmass centres actors are scattered around.
const LAND_CENTERS: [GeoPoint; 7] = [
    GeoPoint { lat: 40.0, lng: -100.0 }, // North America
    GeoPoint { lat: -15.0, lng: -60.0 }, // South America
    GeoPoint { lat: 50.0, lng: 10.0 },   // Europe
    GeoPoint { lat: 10.0, lng: 20.0 },   // Africa
    GeoPoint { lat: 35.0, lng: 100.0 },  // Asia
    GeoPoint { lat: -25.0, lng: 135.0 }, // Australia
    GeoPoint { lat: 35.0, lng: 140.0 },  // Japan
];

const NAMES: [&str; 10] = [
    "Kael", "Lyra", "Zion", "Vex", "Nova", "Echo", "Atlas", "Sol", "Juna", "Miro",
];

const SEED_MOODS: [Mood; 5] = [Mood::Joy, Mood::Peace, Mood::Inspired, Mood::Lonely, Mood::Sadness];

const SEED_TEXT: &str = "The universe is a vast network of unspoken dreams.";

/// Degrees of scatter around a land centre (full width).
const SCATTER: f64 = 40.0;

/// Oldest seeded insight, in milliseconds before now.
const MAX_AGE_MS: i64 = 1_000_000;

/// Generate `settings.size` actors, reproducibly when a seed is set.
pub fn generate(settings: &PopulationSettings) -> Vec<Actor> {
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    generate_with(&mut rng, settings.size, settings.insight_probability)
}

/// Non-finite probabilities fall back to the default; the rest are clamped into `[0, 1]`.
pub fn generate_with<R: Rng>(rng: &mut R, count: usize, insight_probability: f64) -> Vec<Actor> {
    let probability = if insight_probability.is_finite() {
        insight_probability.clamp(0.0, 1.0)
    } else {
        let fallback = PopulationSettings::default().insight_probability;
        tracing::warn!(
            "[population] Invalid insight probability {}, using {}",
            insight_probability,
            fallback
        );
        fallback
    };
    let now = Utc::now();

    (0..count)
        .map(|i| {
            let id = format!("soul-{}", i);
            let center = LAND_CENTERS[i % LAND_CENTERS.len()];
            let base_name = NAMES[i % NAMES.len()];
            let name = format!("{}_{}", base_name, rng.random_range(0..999));
            let position = GeoPoint::clamped(
                center.lat + (rng.random::<f64>() - 0.5) * SCATTER,
                center.lng + (rng.random::<f64>() - 0.5) * SCATTER,
            );

            let insights = if rng.random_bool(probability) {
                vec![Insight {
                    id: format!("ins-{}", i),
                    user_id: id.clone(),
                    user_name: base_name.to_string(),
                    text: SEED_TEXT.to_string(),
                    mood: SEED_MOODS[rng.random_range(0..SEED_MOODS.len())],
                    tags: vec!["resonance".to_string(), "cosmos".to_string()],
                    is_public: true,
                    timestamp: now - Duration::milliseconds(rng.random_range(0..MAX_AGE_MS)),
                    position: GeoPoint::ORIGIN,
                }]
            } else {
                Vec::new()
            };

            Actor {
                id,
                name,
                position,
                insights,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn settings(size: usize, probability: f64, seed: u64) -> PopulationSettings {
        PopulationSettings {
            size,
            insight_probability: probability,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_ids_unique_and_positions_valid() {
        let actors = generate(&settings(400, 0.15, 7));
        assert_eq!(actors.len(), 400);

        let ids: HashSet<&str> = actors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), 400);
        assert!(actors.iter().all(|a| a.position.is_valid()));
        assert!(actors.iter().all(|a| a.insights.len() <= 1));
        assert!(!ids.contains(crate::model::LOCAL_USER_ID));
    }

    #[test]
    fn test_seeded_insights_owned_by_actor() {
        let actors = generate(&settings(50, 1.0, 3));
        for actor in &actors {
            let insight = &actor.insights[0];
            assert_eq!(insight.user_id, actor.id);
            // Seed insights carry the bare base name, the actor the suffixed one
            assert!(NAMES.contains(&insight.user_name.as_str()));
            assert!(actor.name.starts_with(&format!("{}_", insight.user_name)));
            assert_eq!(insight.tags, vec!["resonance", "cosmos"]);
            assert!(SEED_MOODS.contains(&insight.mood));
        }
    }

    #[test]
    fn test_probability_bounds() {
        let silent = generate(&settings(30, 0.0, 1));
        assert!(silent.iter().all(|a| a.insights.is_empty()));

        let clamped = generate(&settings(30, 3.0, 1));
        assert!(clamped.iter().all(|a| a.insights.len() == 1));
    }

    #[test]
    fn test_non_finite_probability_uses_default() {
        for probability in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let actors = generate(&settings(200, probability, 5));
            assert_eq!(actors.len(), 200);
            let with_insights = actors.iter().filter(|a| !a.insights.is_empty()).count();
            // Default probability: neither nobody nor everybody
            assert!(with_insights > 0 && with_insights < 200);
        }
    }

    #[test]
    fn test_same_seed_same_names() {
        let a = generate(&settings(20, 0.5, 42));
        let b = generate(&settings(20, 0.5, 42));
        let names_a: Vec<&str> = a.iter().map(|x| x.name.as_str()).collect();
        let names_b: Vec<&str> = b.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names_a, names_b);
    }
}
