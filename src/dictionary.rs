//! Pronunciation lookups against the Glosbe dictionary service.
//!
//! A lookup normalizes the word, asks the audio API for it, and turns the
//! first audio entry of the response into a playable MP3 URL.

use crate::error::Result;
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;

/// Base of the dictionary audio API.
pub const GLOSBE_API_BASE: &str = "https://glosbe.com/api/audios";
/// Prefix of the playable MP3 assets.
pub const GLOSBE_MEDIA_BASE: &str = "https://glosbe.com/fb_aud/mp3/";
/// Target-language code used in API URLs.
pub const TARGET_LANGUAGE: &str = "nl";

/// Upper bound on one lookup, from connect to the last byte of the body.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

const ARTICLES: [&str; 2] = ["de ", "het "];

/// Reduces a catalog word to the form the dictionary knows.
///
/// ```
/// use nlvocab_rs::dictionary::normalize_word;
///
/// assert_eq!(normalize_word("de kat"), "kat");
/// assert_eq!(normalize_word("(na)tuurlijk"), "natuurlijk");
/// assert_eq!(normalize_word("spekjes (het spekje)"), "spekjes");
/// ```
pub fn normalize_word(word: &str) -> String {
    let mut word = word.trim();

    if let Some(rest) = ARTICLES.iter().find_map(|article| word.strip_prefix(article)) {
        word = rest;
    }

    let mut word = word.to_string();

    // "(na)tuurlijk" -> "natuurlijk"
    if word.starts_with('(') {
        word = word.replacen('(', "", 1).replacen(')', "", 1);
    }

    // "spekjes (het spekje)" -> "spekjes"
    if let Some(pos) = word.find(" (") {
        if pos > 0 {
            word.truncate(pos);
        }
    }

    word
}

/// Where lookups go. Overridable so tests can point at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEndpoints {
    pub api_base: String,
    pub media_base: String,
    pub language: String,
}

impl Default for AudioEndpoints {
    fn default() -> Self {
        AudioEndpoints {
            api_base: GLOSBE_API_BASE.to_string(),
            media_base: GLOSBE_MEDIA_BASE.to_string(),
            language: TARGET_LANGUAGE.to_string(),
        }
    }
}

impl AudioEndpoints {
    /// API URL for an already normalized word.
    pub fn lookup_url(&self, normalized_word: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.language,
            urlencoding::encode(normalized_word)
        )
    }

    /// Playable asset URL for a media file name.
    pub fn media_url(&self, file_name: &str) -> String {
        format!("{}{}", self.media_base, file_name)
    }
}

// --- Response schema ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    pub phrase_audio_carrier: PhraseAudioCarrier,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseAudioCarrier {
    #[serde(default)]
    pub audio_entries: Vec<AudioEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioEntry {
    pub url: AudioFiles,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFiles {
    pub mp3: String,
}

impl AudioResponse {
    /// File name of the first audio entry, if there is a usable one.
    pub fn first_mp3(&self) -> Option<&str> {
        self.phrase_audio_carrier
            .audio_entries
            .first()
            .map(|entry| entry.url.mp3.trim())
            .filter(|mp3| !mp3.is_empty())
    }
}

/// Decodes a raw response body into a playable URL.
///
/// Any shape mismatch counts as "no audio".
pub fn decode_audio_response(body: &[u8], endpoints: &AudioEndpoints) -> Option<String> {
    match serde_json::from_slice::<AudioResponse>(body) {
        Ok(response) => response.first_mp3().map(|mp3| endpoints.media_url(mp3)),
        Err(e) => {
            debug!("Unexpected dictionary response shape: {}", e);
            None
        }
    }
}

// --- Client ---

/// Talks to the dictionary service directly. No caching.
#[derive(Debug, Clone)]
pub struct DictionaryClient {
    http: reqwest::Client,
    endpoints: AudioEndpoints,
}

// HTTP client whose requests give up after `timeout`.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

impl DictionaryClient {
    pub fn new(endpoints: AudioEndpoints) -> Result<Self> {
        Self::with_timeout(endpoints, LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(endpoints: AudioEndpoints, timeout: Duration) -> Result<Self> {
        Ok(DictionaryClient {
            http: http_client(timeout)?,
            endpoints,
        })
    }

    /// Resolves the audio URL for a raw catalog word.
    ///
    /// `Ok(None)` means the service answered but has no audio for the word.
    /// Transport failures and error statuses are returned as errors so the
    /// caller can decide whether to remember the outcome.
    pub async fn resolve(&self, raw_word: &str) -> Result<Option<String>> {
        let normalized = normalize_word(raw_word);
        if normalized.is_empty() {
            debug!("Word '{}' is empty after normalization.", raw_word);
            return Ok(None);
        }

        let url = self.endpoints.lookup_url(&normalized);
        info!("Looking up audio for '{}' ({})", normalized, url);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let body = response.bytes().await?;

        let mp3 = decode_audio_response(&body, &self.endpoints);
        if mp3.is_none() {
            info!("No audio available for '{}'.", normalized);
        }
        Ok(mp3)
    }
}
