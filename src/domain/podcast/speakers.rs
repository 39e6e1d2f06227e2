use super::model::{PodcastParams, Speaker, SpeakerRole, Voice};
use rand::seq::SliceRandom;
use rand::Rng;

pub const NAME_POOL: [&str; 10] = [
    "Alex", "Taylor", "Jordan", "Casey", "Morgan", "Riley", "Dakota", "Harper", "Quinn", "Reese",
];

/// Premade voices used when the voice catalogue is unavailable
const FALLBACK_VOICES: [(&str, &str); 5] = [
    ("21m00Tcm4TlvDq8ikWAM", "Rachel"),
    ("AZnzlk1XvdvUeBnXmlld", "Domi"),
    ("EXAVITQu4vr4xnSDxMaL", "Bella"),
    ("ErXwobaYiN019PkySvjV", "Antoni"),
    ("MF3mGyEYCl7XYWbV9V6O", "Elli"),
];

pub fn fallback_voices() -> Vec<Voice> {
    FALLBACK_VOICES
        .iter()
        .map(|(voice_id, name)| Voice {
            voice_id: voice_id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Preferred names first, the remainder drawn from [`NAME_POOL`]
pub fn pick_names<R: Rng + ?Sized>(params: &PodcastParams, rng: &mut R) -> Vec<String> {
    let total = params.total_speakers();
    let mut names: Vec<String> = params.preferred_names.iter().take(total).cloned().collect();

    let available: Vec<&str> = NAME_POOL
        .iter()
        .copied()
        .filter(|candidate| !names.iter().any(|n| n.eq_ignore_ascii_case(candidate)))
        .collect();

    let missing = total.saturating_sub(names.len());
    names.extend(
        available
            .choose_multiple(rng, missing)
            .map(|name| name.to_string()),
    );
    names
}

/// Pair names with roles and voices.
///
/// The first `hosts` names are hosts. Voices are shuffled and dealt
/// round-robin, so speakers only share a voice when there are fewer voices
/// than speakers.
pub fn assign_speakers<R: Rng + ?Sized>(
    params: &PodcastParams,
    names: Vec<String>,
    mut voices: Vec<Voice>,
    rng: &mut R,
) -> Vec<Speaker> {
    if voices.is_empty() {
        voices = fallback_voices();
    }
    voices.shuffle(rng);

    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| Speaker {
            name,
            role: if index < params.hosts as usize {
                SpeakerRole::Host
            } else {
                SpeakerRole::Guest
            },
            voice: voices[index % voices.len()].clone(),
        })
        .collect()
}
