use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::fetcher::{FetchError, Fetcher};
use crate::parser::ParseError;
use crate::utils::normalize_minister_name;

pub const TRANSCRIPT_API_URL: &str = "https://www.aph.gov.au/api/hansard/transcript";

pub const DEFAULT_MAX_TRANSCRIPT_STEPS: usize = 100;

static RE_TRANSCRIPT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Id(?:%3A|:)(?:%22|\x22)(\w+)(?:%2F|/)(\w+)(?:%2F|/)(\d+)(?:%2F|/)(\d+)(?:%22|\x22)")
        .expect("invalid regex: transcript id")
});

#[derive(Debug, thiserror::Error)]
pub enum MinisterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("No second reading speech within {steps} transcript entries from {start}")]
    StepLimitExceeded { start: TranscriptId, steps: usize },
}

/// e.g. `chamber/hansardr/27453/0012`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptId {
    pub chamber: String,
    pub sub: String,
    pub parliament: u32,
    pub sequence: u32,
}

impl TranscriptId {
    pub fn from_parlinfo_url(url: &str) -> Result<Self, ParseError> {
        let caps = RE_TRANSCRIPT_ID
            .captures(url)
            .ok_or_else(|| ParseError::TranscriptLink(url.to_string()))?;

        let number = |i: usize| {
            caps[i]
                .parse::<u32>()
                .map_err(|_| ParseError::TranscriptLink(url.to_string()))
        };

        Ok(Self {
            chamber: caps[1].to_string(),
            sub: caps[2].to_string(),
            parliament: number(3)?,
            sequence: number(4)?,
        })
    }

    pub fn json_url(&self) -> String {
        format!("{}?id={}", TRANSCRIPT_API_URL, self)
    }

    pub fn next(&self) -> Self {
        Self {
            sequence: self.sequence + 1,
            ..self.clone()
        }
    }
}

impl Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{:04}",
            self.chamber, self.sub, self.parliament, self.sequence
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Speaker", default)]
    pub speaker: Option<String>,
}

impl TranscriptEntry {
    /// Headings, amendments and other procedural entries carry a title; the speech does not.
    pub fn is_speech(&self) -> bool {
        self.title.as_deref().is_none_or(|t| t.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct MinisterResolver {
    max_steps: usize,
}

impl Default for MinisterResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRANSCRIPT_STEPS)
    }
}

impl MinisterResolver {
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps: max_steps.max(1),
        }
    }

    pub async fn resolve<F: Fetcher>(
        &self,
        fetcher: &F,
        second_reading_url: &str,
    ) -> Result<String, MinisterError> {
        let start = TranscriptId::from_parlinfo_url(second_reading_url)?;
        let mut current = start.clone();

        for _ in 0..self.max_steps {
            let json = fetcher.fetch(&current.json_url()).await?;
            let entry: TranscriptEntry =
                serde_json::from_str(&json).map_err(ParseError::TranscriptJson)?;

            if !entry.is_speech() {
                log::debug!(
                    "Skipping transcript {} ({})",
                    current,
                    entry.title.as_deref().unwrap_or_default().trim()
                );
                current = current.next();
                continue;
            }

            let name = entry
                .speaker
                .as_deref()
                .and_then(normalize_minister_name)
                .ok_or_else(|| ParseError::MissingField(format!("Speaker of {}", current)))?;
            log::info!("Got minister's name {}", name);
            return Ok(name);
        }

        Err(MinisterError::StepLimitExceeded {
            start,
            steps: self.max_steps,
        })
    }
}
