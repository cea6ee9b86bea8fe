//! Exercise database search.
//!
//! Loads the free-exercise-db catalogue (hundreds of exercises, all with
//! images) from the GitHub raw CDN on first use, then scores queries
//! locally. No API key required.
//!
//! Search uses, in order of weight:
//! 1. curated query overrides for common PT phrasings
//! 2. name matching (exact, then substring, then word overlap)
//! 3. synonym-expanded muscle-group matching (primary over secondary)
//! 4. category boosting (prefer "stretching" when the query mentions it)
//! 5. a penalty for matches driven only by generic words

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

const EXERCISES_URL: &str =
    "https://raw.githubusercontent.com/yuhonas/free-exercise-db/main/dist/exercises.json";
const IMAGE_BASE: &str =
    "https://raw.githubusercontent.com/yuhonas/free-exercise-db/main/exercises";

/// Minimum score for a single best match to count.
const MIN_MATCH_SCORE: f64 = 15.0;

/// Minimum score for inclusion in a multi-result search.
const MIN_LIST_SCORE: f64 = 5.0;

/// Common PT terms mapped to the muscle names the database uses.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("trapezius", &["traps"]),
    ("trap", &["traps"]),
    ("traps", &["traps"]),
    ("upper trap", &["traps", "neck"]),
    ("upper trapezius", &["traps", "neck"]),
    ("lat", &["lats"]),
    ("latissimus", &["lats"]),
    ("pec", &["chest"]),
    ("pecs", &["chest"]),
    ("pectoral", &["chest"]),
    ("quad", &["quadriceps"]),
    ("quads", &["quadriceps"]),
    ("hammy", &["hamstrings"]),
    ("hammies", &["hamstrings"]),
    ("ham", &["hamstrings"]),
    ("glute", &["glutes"]),
    ("gluteal", &["glutes"]),
    ("ab", &["abdominals"]),
    ("abs", &["abdominals"]),
    ("core", &["abdominals", "lower back"]),
    ("calf", &["calves"]),
    ("forearm", &["forearms"]),
    ("bicep", &["biceps"]),
    ("tricep", &["triceps"]),
    ("delt", &["shoulders"]),
    ("delts", &["shoulders"]),
    ("deltoid", &["shoulders"]),
    ("rotator cuff", &["shoulders"]),
    ("rhomboid", &["middle back"]),
    ("mid back", &["middle back"]),
    ("upper back", &["middle back", "traps"]),
    ("lower back", &["lower back"]),
    ("lumbar", &["lower back"]),
    ("cervical", &["neck"]),
    ("hip flexor", &["quadriceps"]),
    ("groin", &["adductors"]),
    ("inner thigh", &["adductors"]),
    ("outer thigh", &["abductors"]),
    ("it band", &["abductors"]),
    ("wrist", &["forearms"]),
];

/// Words too generic to drive a match on their own.
const GENERIC_WORDS: &[&str] = &[
    "stretch", "stretching", "exercise", "upper", "lower", "side", "front", "back", "the", "a",
    "and", "on", "to", "with", "for", "of", "left", "right", "seated", "standing",
];

/// Curated phrasings with a known best answer in the database.
const QUERY_OVERRIDES: &[(&str, &str)] = &[
    ("upper trapezius stretch", "Side Neck Stretch"),
    ("upper trap stretch", "Side Neck Stretch"),
    ("trap stretch", "Side Neck Stretch"),
    ("trapezius stretch", "Side Neck Stretch"),
    ("neck lateral flexion", "Side Neck Stretch"),
    ("neck rotation stretch", "Neck-SMR"),
    ("upper back stretch", "Upper Back Stretch"),
    ("lower back stretch", "Chair Lower Back Stretch"),
    ("shoulder cross body stretch", "Shoulder Stretch"),
    ("chest opener stretch", "Behind Head Chest Stretch"),
    ("cat cow", "Cat Stretch"),
];

/// One catalogue entry as published by free-exercise-db.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "primaryMuscles")]
    pub primary_muscles: Vec<String>,
    #[serde(default, rename = "secondaryMuscles")]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub equipment: Option<String>,
}

/// Best single match, with resolved image URLs.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseMatch {
    pub name: String,
    pub image_url: String,
    pub image_url_end: String,
    pub instructions: Vec<String>,
    pub category: String,
    pub primary_muscles: Vec<String>,
    pub secondary_muscles: Vec<String>,
    pub equipment: String,
}

/// Compact entry for multi-result searches.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseSummary {
    pub name: String,
    pub image_url: String,
    pub category: String,
    pub primary_muscles: Vec<String>,
}

/// Database load failures.
#[derive(Debug)]
pub enum DbError {
    Fetch(String),
    Decode(String),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Fetch(e) => write!(f, "fetch failed: {e}"),
            DbError::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

impl std::error::Error for DbError {}

/// In-memory exercise catalogue with local scoring search.
pub struct ExerciseDb {
    exercises: Vec<Exercise>,
    name_index: HashMap<String, usize>,
}

impl ExerciseDb {
    /// Download the catalogue. Call once per process and keep the result.
    pub async fn fetch() -> Result<Self, DbError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| DbError::Fetch(e.to_string()))?;

        let exercises: Vec<Exercise> = client
            .get(EXERCISES_URL)
            .send()
            .await
            .map_err(|e| DbError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| DbError::Fetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))?;

        info!(count = exercises.len(), "loaded exercise database");
        Ok(Self::from_exercises(exercises))
    }

    /// Build a catalogue from already-loaded entries (tests, fixtures).
    pub fn from_exercises(exercises: Vec<Exercise>) -> Self {
        let name_index = exercises
            .iter()
            .enumerate()
            .filter(|(_, ex)| !ex.name.is_empty())
            .map(|(i, ex)| (ex.name.to_lowercase(), i))
            .collect();
        Self {
            exercises,
            name_index,
        }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    fn override_match(&self, query: &str) -> Option<&Exercise> {
        let q = query.to_lowercase();
        let q = q.trim();
        for (phrase, name) in QUERY_OVERRIDES {
            if q.contains(phrase) {
                if let Some(&i) = self.name_index.get(&name.to_lowercase()) {
                    return Some(&self.exercises[i]);
                }
            }
        }
        None
    }

    /// Best match for a query, or `None` when nothing scores high enough.
    pub fn search(&self, query: &str) -> Option<ExerciseMatch> {
        if self.exercises.is_empty() {
            return None;
        }

        let best = match self.override_match(query) {
            Some(exercise) => exercise,
            None => {
                let (best, best_score) = self
                    .exercises
                    .iter()
                    .map(|ex| (ex, score(query, ex)))
                    .max_by(|a, b| a.1.total_cmp(&b.1))?;
                if best_score < MIN_MATCH_SCORE {
                    return None;
                }
                best
            }
        };

        Some(ExerciseMatch {
            name: best.name.clone(),
            image_url: image_url(&best.images, 0),
            image_url_end: image_url(&best.images, 1),
            instructions: best.instructions.clone(),
            category: best.category.clone(),
            primary_muscles: best.primary_muscles.clone(),
            secondary_muscles: best.secondary_muscles.clone(),
            equipment: best.equipment.clone().unwrap_or_default(),
        })
    }

    /// Up to `limit` matches sorted by relevance.
    pub fn search_many(&self, query: &str, limit: usize) -> Vec<ExerciseSummary> {
        let mut scored: Vec<(f64, &Exercise)> = self
            .exercises
            .iter()
            .map(|ex| (score(query, ex), ex))
            .filter(|(s, _)| *s >= MIN_LIST_SCORE)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, ex)| ExerciseSummary {
                name: ex.name.clone(),
                image_url: image_url(&ex.images, 0),
                category: ex.category.clone(),
                primary_muscles: ex.primary_muscles.clone(),
            })
            .collect()
    }
}

fn image_url(images: &[String], index: usize) -> String {
    images
        .get(index)
        .map(|image| format!("{IMAGE_BASE}/{image}"))
        .unwrap_or_default()
}

/// Split into lowercase alphabetic tokens.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            current.push(c.to_ascii_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Muscle names the query might be referring to.
fn expand_synonyms(query: &str) -> HashSet<String> {
    let q = query.to_lowercase();
    let mut muscles = HashSet::new();
    for (phrase, targets) in SYNONYMS {
        if q.contains(phrase) {
            muscles.extend(targets.iter().map(|m| m.to_string()));
        }
    }
    muscles
}

fn is_generic(token: &str) -> bool {
    GENERIC_WORDS.contains(&token)
}

/// Score an exercise against a query. Higher is better; 0 is no match.
fn score(query: &str, exercise: &Exercise) -> f64 {
    let q_lower = query.to_lowercase();
    let q_lower = q_lower.trim();
    let name_lower = exercise.name.to_lowercase();
    let q_tokens = tokenize(q_lower);
    let name_tokens: HashSet<String> = tokenize(&name_lower).into_iter().collect();
    let primary: HashSet<String> = exercise
        .primary_muscles
        .iter()
        .map(|m| m.to_lowercase())
        .collect();
    let secondary: HashSet<String> = exercise
        .secondary_muscles
        .iter()
        .map(|m| m.to_lowercase())
        .collect();
    let all_muscles: HashSet<String> = primary.union(&secondary).cloned().collect();
    let category = exercise.category.to_lowercase();

    let mut score = 0.0;

    // Name matching.
    if q_lower == name_lower {
        score += 100.0;
    } else if name_lower.contains(q_lower) {
        score += 80.0;
    } else {
        let meaningful: Vec<&String> = q_tokens.iter().filter(|t| !is_generic(t)).collect();
        let generic: Vec<&String> = q_tokens.iter().filter(|t| is_generic(t)).collect();
        let meaningful_hits = meaningful.iter().filter(|t| name_tokens.contains(**t)).count();
        let generic_hits = generic.iter().filter(|t| name_tokens.contains(**t)).count();

        if !meaningful.is_empty() && meaningful_hits > 0 {
            score += (meaningful_hits as f64 / meaningful.len() as f64) * 60.0;
            score += generic_hits as f64 * 2.0;
        } else if generic_hits > 0 {
            score += generic_hits as f64 * 3.0;
        }
    }

    // Muscle matching via synonym expansion.
    let target_muscles = expand_synonyms(q_lower);
    if !target_muscles.is_empty() {
        let primary_hits = target_muscles.intersection(&primary).count();
        let secondary_hits = target_muscles.intersection(&secondary).count();
        score += 40.0 * primary_hits as f64;
        score += 15.0 * secondary_hits as f64;
    }

    // Category boosting.
    let wants_stretch = ["stretch", "stretching", "flexibility"]
        .iter()
        .any(|w| q_lower.contains(w));
    if wants_stretch && category == "stretching" {
        score += 25.0;
    } else if wants_stretch {
        score -= 10.0;
    }

    // Penalise matches driven only by generic words.
    if score > 0.0 {
        let meaningful: Vec<&String> = q_tokens.iter().filter(|t| !is_generic(t)).collect();
        if !meaningful.is_empty() {
            let meaningful_in_name = meaningful.iter().filter(|t| name_tokens.contains(**t)).count();
            let meaningful_in_muscles = target_muscles.intersection(&all_muscles).count();
            if meaningful_in_name == 0 && meaningful_in_muscles == 0 {
                score *= 0.1;
            }
        }
    }

    // The query implies muscles the exercise does not touch.
    if !target_muscles.is_empty() && score > 0.0 && target_muscles.is_disjoint(&all_muscles) {
        score *= 0.2;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(
        name: &str,
        primary: &[&str],
        secondary: &[&str],
        category: &str,
    ) -> Exercise {
        Exercise {
            name: name.to_string(),
            primary_muscles: primary.iter().map(|s| s.to_string()).collect(),
            secondary_muscles: secondary.iter().map(|s| s.to_string()).collect(),
            category: category.to_string(),
            images: vec![format!("{}/0.jpg", name.replace(' ', "_"))],
            instructions: vec!["Hold for 20 seconds.".to_string()],
            equipment: None,
        }
    }

    fn sample_db() -> ExerciseDb {
        ExerciseDb::from_exercises(vec![
            exercise("Side Neck Stretch", &["neck"], &["traps"], "stretching"),
            exercise("Shoulder Stretch", &["shoulders"], &[], "stretching"),
            exercise("Barbell Curl", &["biceps"], &["forearms"], "strength"),
            exercise("Upper Back Stretch", &["middle back"], &[], "stretching"),
            exercise("Standing Calf Raise", &["calves"], &[], "strength"),
        ])
    }

    #[test]
    fn test_tokenize_strips_non_alpha() {
        assert_eq!(tokenize("Neck-SMR (v2)"), vec!["neck", "smr", "v"]);
    }

    #[test]
    fn test_synonym_expansion() {
        let muscles = expand_synonyms("upper trap stretch");
        assert!(muscles.contains("traps"));
        assert!(muscles.contains("neck"));
        assert!(expand_synonyms("banana").is_empty());
    }

    #[test]
    fn test_exact_name_outranks_substring() {
        let db = sample_db();
        let exact = score("shoulder stretch", &db.exercises[1]);
        let partial = score("shoulder", &db.exercises[1]);
        assert!(exact > partial);
        assert!(exact >= 100.0);
    }

    #[test]
    fn test_query_override_wins() {
        let db = sample_db();
        let best = db.search("trap stretch").unwrap();
        assert_eq!(best.name, "Side Neck Stretch");
    }

    #[test]
    fn test_muscle_synonym_search() {
        let db = sample_db();
        let best = db.search("bicep curl").unwrap();
        assert_eq!(best.name, "Barbell Curl");
    }

    #[test]
    fn test_unrelated_query_returns_none() {
        let db = sample_db();
        assert!(db.search("zzzz qqqq").is_none());
    }

    #[test]
    fn test_generic_only_query_penalised() {
        let db = sample_db();
        // "arm" matches nothing; only the generic "stretch" hits, so the
        // score collapses below the cutoff.
        let s = score("arm stretch", &db.exercises[0]);
        assert!(s < MIN_MATCH_SCORE);
        assert!(db.search("arm stretch").is_none());
    }

    #[test]
    fn test_search_many_sorted_and_limited() {
        let db = sample_db();
        let results = db.search_many("neck stretch", 2);
        assert!(!results.is_empty());
        assert!(results.len() <= 2);
        assert_eq!(results[0].name, "Side Neck Stretch");
    }

    #[test]
    fn test_image_urls_resolved() {
        let db = sample_db();
        let best = db.search("bicep curl").unwrap();
        assert!(best.image_url.starts_with(IMAGE_BASE));
        assert_eq!(best.image_url_end, "");
    }
}
