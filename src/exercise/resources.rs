//! Static exercise resource map.
//!
//! Maps stretch IDs to YouTube embed URLs and thumbnails for the common
//! neck, shoulder and arm stretches the coach recommends most, so they
//! resolve instantly without touching the exercise database.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A curated video resource for one stretch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseResource {
    pub id: String,
    pub title: String,
    pub youtube_embed_url: String,
    pub thumbnail_url: String,
    pub body_part: String,
    pub description: String,
}

/// Derive a thumbnail URL from a YouTube embed URL.
fn youtube_thumbnail(embed_url: &str) -> String {
    let Some(rest) = embed_url.split("/embed/").nth(1) else {
        return String::new();
    };
    let video_id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if video_id.is_empty() {
        return String::new();
    }
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}

fn resource(
    id: &str,
    title: &str,
    youtube_embed_url: &str,
    body_part: &str,
    description: &str,
) -> ExerciseResource {
    ExerciseResource {
        id: id.to_string(),
        title: title.to_string(),
        youtube_embed_url: youtube_embed_url.to_string(),
        thumbnail_url: youtube_thumbnail(youtube_embed_url),
        body_part: body_part.to_string(),
        description: description.to_string(),
    }
}

/// All curated resources, built once.
pub fn all_resources() -> &'static [ExerciseResource] {
    static RESOURCES: OnceLock<Vec<ExerciseResource>> = OnceLock::new();
    RESOURCES.get_or_init(|| {
        vec![
            resource(
                "neck_lateral_flexion",
                "Neck Lateral Flexion Stretch",
                "https://www.youtube.com/embed/2NZMaI-HeNU",
                "Neck",
                "Gently tilt your head toward one shoulder, hold 15-30 seconds, then switch sides.",
            ),
            resource(
                "neck_rotation",
                "Neck Rotation Stretch",
                "https://www.youtube.com/embed/wQylqaCl8Zo",
                "Neck",
                "Slowly turn your head to one side until you feel a stretch, hold 15-30 seconds, then switch.",
            ),
            resource(
                "upper_trap_stretch",
                "Upper Trapezius Stretch",
                "https://www.youtube.com/embed/2NZMaI-HeNU",
                "Neck / Shoulder",
                "Tilt head away from tight side while gently pressing down with opposite hand. Hold 20-30 seconds.",
            ),
            resource(
                "shoulder_cross_body",
                "Shoulder Cross-Body Stretch",
                "https://www.youtube.com/embed/Rl4Zudadpc8",
                "Shoulder",
                "Bring one arm across your chest, use the opposite hand to press gently. Hold 20-30 seconds.",
            ),
            resource(
                "shoulder_overhead",
                "Overhead Shoulder Stretch",
                "https://www.youtube.com/embed/es0Nh_XlWOg",
                "Shoulder / Lat",
                "Reach one arm overhead and bend elbow behind your head. Use other hand to gently pull. Hold 20-30 seconds.",
            ),
            resource(
                "chest_opener",
                "Chest Opener Stretch",
                "https://www.youtube.com/embed/SxQkGMuYNEA",
                "Chest",
                "Clasp hands behind your back, straighten arms and lift gently while opening chest. Hold 20-30 seconds.",
            ),
            resource(
                "bicep_stretch",
                "Bicep Wall Stretch",
                "https://www.youtube.com/embed/iSx_0xJMGi4",
                "Arm",
                "Place palm flat against wall at shoulder height, slowly rotate body away. Hold 20-30 seconds per arm.",
            ),
            resource(
                "tricep_stretch",
                "Tricep Stretch",
                "https://www.youtube.com/embed/es0Nh_XlWOg",
                "Arm",
                "Reach one hand behind your head, use other hand to gently press elbow back. Hold 20-30 seconds.",
            ),
            resource(
                "wrist_flexor_stretch",
                "Wrist Flexor Stretch",
                "https://www.youtube.com/embed/u4w0Y5NQFLY",
                "Arm / Wrist",
                "Extend arm, palm up. Use other hand to gently press fingers back toward you. Hold 15-20 seconds.",
            ),
            resource(
                "cat_cow",
                "Cat-Cow Stretch",
                "https://www.youtube.com/embed/kqnua4rHVVA",
                "Spine",
                "On all fours, alternate between arching your back (cow) and rounding it (cat). 10-15 reps.",
            ),
        ]
    })
}

/// Look up a resource by its stretch ID.
pub fn get_resource(stretch_id: &str) -> Option<&'static ExerciseResource> {
    all_resources().iter().find(|r| r.id == stretch_id)
}

/// Fuzzy search by title or body part: whole-query substring first, then
/// any query word in a title.
pub fn search_resources(query: &str) -> Option<&'static ExerciseResource> {
    let query_lower = query.to_lowercase();
    let by_substring = all_resources().iter().find(|r| {
        r.title.to_lowercase().contains(&query_lower)
            || r.body_part.to_lowercase().contains(&query_lower)
    });
    if by_substring.is_some() {
        return by_substring;
    }
    all_resources().iter().find(|r| {
        let title = r.title.to_lowercase();
        query_lower.split_whitespace().any(|word| title.contains(word))
    })
}

/// All available stretch IDs.
pub fn list_resource_ids() -> Vec<&'static str> {
    all_resources().iter().map(|r| r.id.as_str()).collect()
}
