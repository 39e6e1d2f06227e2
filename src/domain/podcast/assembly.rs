use super::model::{AudioSegment, JobId};
use chrono::{DateTime, Utc};

const ID3_HEADER_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("no audio segments to assemble")]
    NoSegments,
    #[error("segment {index} is empty")]
    EmptySegment { index: usize },
    #[error("segment {index} is not MP3 data")]
    NotMp3 { index: usize },
}

/// Total length of a leading ID3v2 tag, header and footer included
fn id3v2_len(data: &[u8]) -> Option<usize> {
    if data.len() < ID3_HEADER_LEN || &data[..3] != b"ID3" {
        return None;
    }
    let body = data[6..10]
        .iter()
        .fold(0usize, |acc, byte| (acc << 7) | (*byte & 0x7F) as usize);
    let footer = if data[5] & 0x10 != 0 { ID3_HEADER_LEN } else { 0 };
    Some((ID3_HEADER_LEN + body + footer).min(data.len()))
}

fn has_frame_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0
}

fn is_mp3(data: &[u8]) -> bool {
    id3v2_len(data).is_some() || has_frame_sync(data)
}

/// Concatenate segments in script order into one MP3 stream.
///
/// Only the first segment keeps its ID3v2 tag; later tags would otherwise
/// show up mid-stream.
pub fn assemble(segments: &[AudioSegment]) -> Result<Vec<u8>, AssemblyError> {
    if segments.is_empty() {
        return Err(AssemblyError::NoSegments);
    }

    let mut ordered: Vec<&AudioSegment> = segments.iter().collect();
    ordered.sort_by_key(|segment| segment.utterance_index);

    let mut output = Vec::with_capacity(segments.iter().map(|s| s.data.len()).sum());
    for (position, segment) in ordered.into_iter().enumerate() {
        let index = segment.utterance_index;
        let data = segment.data.as_ref();
        if data.is_empty() {
            return Err(AssemblyError::EmptySegment { index });
        }
        if !is_mp3(data) {
            return Err(AssemblyError::NotMp3 { index });
        }

        let start = match id3v2_len(data) {
            Some(tag_len) if position > 0 => tag_len,
            _ => 0,
        };
        output.extend_from_slice(&data[start..]);
    }

    Ok(output)
}

/// `podcast_<YYYYmmdd_HHMMSS>_<short job id>.mp3`
pub fn artifact_filename(job_id: &JobId, now: DateTime<Utc>) -> String {
    format!(
        "podcast_{}_{}.mp3",
        now.format("%Y%m%d_%H%M%S"),
        job_id.short()
    )
}
