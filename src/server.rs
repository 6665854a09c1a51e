//! Same-origin audio proxy.
//!
//! `GET /api/glosbe?word=<raw word>` answers `{"mp3": "<url>"}` or
//! `{"mp3": null}`, always with status 200. Normalization happens here so
//! clients can send catalog words as they are.

use crate::audio::AudioLookupResponse;
use crate::dictionary::DictionaryClient;
use crate::error::Result;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::net::SocketAddr;

/// Path the proxy is mounted at.
pub const AUDIO_ROUTE: &str = "/api/glosbe";

#[derive(Clone)]
pub struct ProxyState {
    dictionary: DictionaryClient,
}

impl ProxyState {
    pub fn new(dictionary: DictionaryClient) -> Self {
        ProxyState { dictionary }
    }
}

#[derive(Debug, Deserialize)]
struct WordQuery {
    word: Option<String>,
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(AUDIO_ROUTE, get(audio_lookup))
        .with_state(state)
}

async fn audio_lookup(
    State(state): State<ProxyState>,
    query: Option<Query<WordQuery>>,
) -> Response {
    let word = query
        .and_then(|Query(query)| query.word)
        .filter(|word| !word.is_empty());

    let Some(word) = word else {
        debug!("Audio lookup without a word.");
        return Json(AudioLookupResponse { mp3: None }).into_response();
    };

    let mp3 = match state.dictionary.resolve(&word).await {
        Ok(mp3) => mp3,
        Err(e) => {
            warn!("Dictionary lookup for '{}' failed: {}", word, e);
            None
        }
    };

    Json(AudioLookupResponse { mp3 }).into_response()
}

/// Runs the proxy until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, dictionary: DictionaryClient) -> Result<()> {
    let app = router(ProxyState::new(dictionary));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Audio proxy listening on http://{}{}", listener.local_addr()?, AUDIO_ROUTE);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Audio proxy stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
