//! Session-scoped audio lookups and playback requests.
//!
//! [`AudioClient`] resolves words either straight against the dictionary or
//! through the proxy endpoint, and remembers answers per raw word for as long
//! as the client lives. [`AudioPlayer`] sits on top and makes sure only the
//! most recent play request produces a playback.

use crate::dictionary::{self, DictionaryClient, LOOKUP_TIMEOUT};
use crate::error::{Result, VocabError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Body of the proxy endpoint. `mp3` is serialized as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioLookupResponse {
    pub mp3: Option<String>,
}

/// Where an [`AudioClient`] gets its answers from.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Normalize locally and query the dictionary service.
    Direct(DictionaryClient),
    /// Send the raw word to a proxy endpoint (e.g. `http://localhost:3000/api/glosbe`).
    Proxy { http: reqwest::Client, url: String },
}

impl AudioSource {
    pub fn proxy(url: impl Into<String>) -> Result<Self> {
        Ok(AudioSource::Proxy {
            http: dictionary::http_client(LOOKUP_TIMEOUT)?,
            url: url.into(),
        })
    }
}

type AudioCache = HashMap<String, Option<String>>;

/// Audio lookups with a per-word cache.
#[derive(Debug, Clone)] // Clones share the cache
pub struct AudioClient {
    source: AudioSource,
    cache: Arc<Mutex<AudioCache>>,
}

impl AudioClient {
    pub fn new(source: AudioSource) -> Self {
        AudioClient {
            source,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolves a playable URL, or `None` if there is no audio.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn lookup(&self, word: &str) -> Option<String> {
        match self.try_lookup(word).await {
            Ok(mp3) => mp3,
            Err(e) => {
                warn!("Audio lookup for '{}' failed: {}", word, e);
                None
            }
        }
    }

    /// Like [`lookup`](Self::lookup) but surfaces transport errors.
    ///
    /// Only answers are cached; errors are not, so a later call retries.
    pub async fn try_lookup(&self, word: &str) -> Result<Option<String>> {
        if let Some(hit) = self.cached(word)? {
            debug!("Audio cache hit for '{}'", word);
            return Ok(hit);
        }

        let mp3 = match &self.source {
            AudioSource::Direct(dictionary) => dictionary.resolve(word).await?,
            AudioSource::Proxy { http, url } => {
                let response = http
                    .get(url)
                    .query(&[("word", word)])
                    .send()
                    .await?
                    .error_for_status()?;
                let body = response.bytes().await?;
                match serde_json::from_slice::<AudioLookupResponse>(&body) {
                    Ok(decoded) => decoded.mp3.filter(|mp3| !mp3.is_empty()),
                    Err(e) => {
                        debug!("Unexpected proxy response shape: {}", e);
                        None
                    }
                }
            }
        };

        self.lock_cache()?.insert(word.to_string(), mp3.clone());
        Ok(mp3)
    }

    /// Cached answer for a raw word: `None` if never looked up.
    pub fn cached(&self, word: &str) -> Result<Option<Option<String>>> {
        Ok(self.lock_cache()?.get(word).cloned())
    }

    /// Forgets every cached answer.
    pub fn clear_cache(&self) -> Result<()> {
        self.lock_cache()?.clear();
        Ok(())
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, AudioCache>> {
        self.cache
            .lock()
            .map_err(|_| VocabError::Internal("Audio cache mutex poisoned".to_string()))
    }
}

/// A resolved play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    pub word: String,
    pub url: String,
    /// Unique per request so replaying the same word restarts playback.
    pub render_key: String,
}

/// Turns play actions into playbacks, dropping superseded ones.
#[derive(Debug)]
pub struct AudioPlayer {
    audio: AudioClient,
    latest: AtomicU64,
}

impl AudioPlayer {
    pub fn new(audio: AudioClient) -> Self {
        AudioPlayer {
            audio,
            latest: AtomicU64::new(0),
        }
    }

    pub fn audio(&self) -> &AudioClient {
        &self.audio
    }

    /// Resolves audio for `word`.
    ///
    /// Returns `None` when there is no audio, or when another request was made
    /// while this one was in flight.
    pub async fn request(&self, word: &str) -> Option<Playback> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let url = self.audio.lookup(word).await?;

        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!("Dropping superseded playback for '{}'", word);
            return None;
        }

        Some(Playback {
            word: word.to_string(),
            render_key: format!("{}?ts={}", url, now_millis()),
            url,
        })
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}
