use super::model::{PodcastParams, Script, Speaker, SpeakerRole, Utterance, WORDS_PER_MINUTE};
use regex::Regex;
use std::sync::LazyLock;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*+").unwrap());
static SPEAKER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+:\s*").unwrap());

pub fn length_instruction(duration_minutes: u8) -> String {
    if duration_minutes <= 5 {
        "Keep the conversation concise and focused, suitable for a 3-5 minute podcast.".to_string()
    } else if duration_minutes <= 10 {
        format!(
            "Create a {}-minute conversation with good depth but not too lengthy.",
            duration_minutes
        )
    } else {
        format!(
            "Create a comprehensive {}-minute discussion with detailed exploration of topics.",
            duration_minutes
        )
    }
}

/// "Alex, Taylor with guests Casey, Riley"
fn introduce(speakers: &[Speaker]) -> String {
    let names = |role: SpeakerRole| {
        speakers
            .iter()
            .filter(|s| s.role == role)
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
    };
    let hosts = names(SpeakerRole::Host);
    let guests = names(SpeakerRole::Guest);

    let mut intro = hosts.join(", ");
    if !guests.is_empty() {
        let plural = if guests.len() > 1 { "s" } else { "" };
        intro.push_str(&format!(" with guest{} {}", plural, guests.join(", ")));
    }
    intro
}

pub fn script_prompt(summary: &str, speakers: &[Speaker], params: &PodcastParams) -> String {
    let example_labels = speakers
        .iter()
        .map(|s| format!("\"{}:\"", s.name))
        .collect::<Vec<_>>()
        .join(" / ");

    format!(
        "Generate a conversational podcast script titled 'StudySauce' with {intro}.\n\
         They will discuss the following research summary in a natural, engaging way.\n\
         \n\
         Research Summary:\n\
         {summary}\n\
         \n\
         Guidelines:\n\
         - Start with a casual intro by one of the hosts (e.g. \"Hey everyone, welcome to StudySauce...\")\n\
         - Alternate dialogue lines between speakers (e.g. {labels})\n\
         - Keep it free-flowing, with no visible headers like \"Introduction\" or \"Conclusion.\"\n\
         - Include insightful commentary, light humor, and deeper reflections.\n\
         - {length}\n\
         - Target approximately {words} words total (average {wpm} words per minute).\n",
        intro = introduce(speakers),
        summary = summary,
        labels = example_labels,
        length = length_instruction(params.duration_minutes),
        words = params.target_words(),
        wpm = WORDS_PER_MINUTE,
    )
}

/// Turn generated text into utterances.
///
/// Only lines opening with a known speaker label (case-insensitive) are
/// dialogue; everything else (stage directions, headings) is dropped.
pub fn parse_script(text: &str, speakers: &[Speaker]) -> Script {
    let labels: Vec<(String, &Speaker)> = speakers
        .iter()
        .map(|s| (format!("{}:", s.name.to_lowercase()), s))
        .collect();

    let utterances = text
        .lines()
        .filter_map(|raw| {
            let line = MARKUP.replace_all(raw, "");
            let line = line.trim();
            let lower = line.to_lowercase();
            let (_, speaker) = labels.iter().find(|(label, _)| lower.starts_with(label))?;
            let content = SPEAKER_LABEL.replace(line, "").trim().to_string();
            (!content.is_empty()).then(|| Utterance {
                speaker: speaker.name.clone(),
                role: speaker.role,
                text: content,
            })
        })
        .collect();

    Script { utterances }
}
