//! File naming convention.
//!
//! Names look like `Seg1_Seg2_..._SegN_<w>x<h>_<fps>fps_<codec>_crf<N>.mp4`.
//! The last four underscore-delimited tokens are the systematic tokens
//! (resolution, frame rate, codec, quality). The tokens before them are
//! camel-case name segments: the last one is the title, the others are
//! contributors in order.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::probe::Geometry;
use crate::transcode::TranscodeJob;

/// Token delimiter inside a file stem.
pub const DELIMITER: char = '_';

/// Number of trailing systematic tokens.
pub const SYSTEMATIC_TOKENS: usize = 4;

/// A name needs at least one name segment besides the systematic tokens.
pub const MIN_TOKENS: usize = SYSTEMATIC_TOKENS + 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("'{name}' has {tokens} underscore-delimited tokens, at least 5 are required")]
    MalformedName { name: String, tokens: usize },
}

/// A stem split into name segments and systematic tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
    /// Camel-case segments, contributors first and title last.
    pub segments: Vec<String>,
    pub resolution: String,
    pub frame_rate: String,
    pub codec: String,
    pub quality: String,
}

impl NameParts {
    /// Splits a stem. The systematic tokens are taken as they are, without validation.
    pub fn parse(stem: &str) -> Result<Self, NamingError> {
        let tokens: Vec<&str> = stem.split(DELIMITER).collect();
        if tokens.len() < MIN_TOKENS {
            return Err(NamingError::MalformedName {
                name: stem.to_string(),
                tokens: tokens.len(),
            });
        }
        let (segments, systematic) = tokens.split_at(tokens.len() - SYSTEMATIC_TOKENS);
        Ok(Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            resolution: systematic[0].to_string(),
            frame_rate: systematic[1].to_string(),
            codec: systematic[2].to_string(),
            quality: systematic[3].to_string(),
        })
    }

    /// Joins the parts back into a stem.
    pub fn join(&self) -> String {
        let mut tokens: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        tokens.extend([
            self.resolution.as_str(),
            self.frame_rate.as_str(),
            self.codec.as_str(),
            self.quality.as_str(),
        ]);
        tokens.join(&DELIMITER.to_string())
    }
}

/// Title and contributors carried by a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    pub title: String,
    pub contributors: Vec<String>,
}

fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Decodes title and contributors from a file name (extension optional).
///
/// Each `typos` entry is applied to the title as an exact substring replacement.
pub fn decode(file_name: &str, typos: &BTreeMap<String, String>) -> Result<DecodedName, NamingError> {
    let parts = NameParts::parse(stem_of(file_name))?;
    let Some((title_segment, contributor_segments)) = parts.segments.split_last() else {
        return Err(NamingError::MalformedName {
            name: file_name.to_string(),
            tokens: SYSTEMATIC_TOKENS,
        });
    };

    let mut title = camel_case_to_words(title_segment);
    for (typo, correct) in typos {
        title = title.replace(typo.as_str(), correct);
    }

    Ok(DecodedName {
        title,
        contributors: contributor_segments
            .iter()
            .map(|s| camel_case_to_words(s))
            .collect(),
    })
}

/// Inserts a space before every capital that starts a new word.
///
/// A run of capitals stays one acronym word; its last capital starts the next
/// word when a lowercase letter follows (`HTMLParser` -> `HTML Parser`).
pub fn camel_case_to_words(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Inverse of [`camel_case_to_words`] for capitalised words.
///
/// Lossy for neighbours without a lowercase letter: `"X Y"` encodes to `XY`,
/// which decodes back as the single acronym `"XY"`. Segments always survive
/// the opposite direction unchanged.
pub fn encode_segment(words: &str) -> String {
    words.split_whitespace().collect()
}

/// Builds a conforming stem from decoded names and systematic tokens.
pub fn encode_stem(name: &DecodedName, resolution: &str, frame_rate: &str, codec: &str, quality: &str) -> String {
    let mut segments: Vec<String> = name.contributors.iter().map(|c| encode_segment(c)).collect();
    segments.push(encode_segment(&name.title));
    NameParts {
        segments,
        resolution: resolution.to_string(),
        frame_rate: frame_rate.to_string(),
        codec: codec.to_string(),
        quality: quality.to_string(),
    }
    .join()
}

/// Quality token for a job: `crf<N>`, with the slice folded in as
/// `crf<N>-slice<start>-<duration>` so the token count stays fixed.
pub fn quality_token(job: &TranscodeJob) -> String {
    match job.slice {
        Some(slice) => format!("crf{}-slice{}-{}", job.crf, slice.start_secs, slice.duration_secs),
        None => format!("crf{}", job.crf),
    }
}

/// Target file name of a transcode.
///
/// The source's name segments are kept and its systematic tokens rewritten, so
/// the target decodes to the same title and contributors and always carries
/// the target codec marker. A source outside the convention keeps its whole
/// stem as a single segment and gets its systematic tokens from `geometry`.
pub fn target_file_name(source_file_name: &str, job: &TranscodeJob, geometry: &Geometry) -> String {
    let path = Path::new(source_file_name);
    let stem = stem_of(source_file_name);
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("mp4");

    let mut parts = NameParts::parse(stem).unwrap_or_else(|_| NameParts {
        segments: vec![stem.to_string()],
        resolution: format!("{}x{}", geometry.width, geometry.height),
        frame_rate: format!("{}fps", geometry.fps),
        codec: String::new(),
        quality: String::new(),
    });
    if let Some(resize) = job.resize {
        parts.resolution = format!("{}x{}", resize.width, resize.height);
    }
    parts.codec = job.codec.marker().to_string();
    parts.quality = quality_token(job);

    format!("{}.{}", parts.join(), extension)
}
