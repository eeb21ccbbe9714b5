//! WASM bindings for the player core.
//!
//! Tracks, playlists and outcomes cross the boundary as JSON strings, the
//! same way `JsEventReceiver` hands events to the page.

use core_playback::{
    format::{format_duration, truncate_title, DEFAULT_TITLE_LENGTH},
    LibraryTrack, PlayOutcome, Playlist, QueueTrack,
};
use core_runtime::wasm::JsEventReceiver;
use js_sys::Promise;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::{bootstrap_wasm, CoreError, CoreService, WasmBridgeConfig};

fn to_js_error(err: CoreError) -> JsValue {
    JsValue::from_str(&err.user_message())
}

fn parse<T: DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("invalid payload: {e}")))
}

fn outcome_to_js(outcome: PlayOutcome) -> JsValue {
    match outcome {
        PlayOutcome::Started(_) => JsValue::from_str("started"),
        PlayOutcome::Toggled { playing: true } => JsValue::from_str("resumed"),
        PlayOutcome::Toggled { playing: false } => JsValue::from_str("paused"),
        PlayOutcome::Superseded => JsValue::from_str("superseded"),
    }
}

/// `m:ss` label for a duration in seconds; empty when unknown.
#[wasm_bindgen(js_name = formatDuration)]
pub fn format_duration_js(seconds: f64) -> String {
    format_duration(seconds)
}

#[wasm_bindgen(js_name = truncateTitle)]
pub fn truncate_title_js(title: &str, max: Option<usize>) -> String {
    truncate_title(title, max.unwrap_or(DEFAULT_TITLE_LENGTH))
}

/// Player handle exported to JavaScript.
#[wasm_bindgen]
pub struct JsPlayer {
    service: CoreService,
}

#[wasm_bindgen]
impl JsPlayer {
    /// Build and start the player. Resolves to a `JsPlayer`.
    ///
    /// `namespace` scopes the `localStorage` keys; pass `undefined` to use
    /// the page's existing keys.
    pub fn create(api_base_url: String, namespace: Option<String>) -> Promise {
        future_to_promise(async move {
            let config = match namespace {
                Some(namespace) => WasmBridgeConfig::new(namespace),
                None => WasmBridgeConfig::unscoped(),
            };
            let service = bootstrap_wasm(config, &api_base_url)
                .await
                .map_err(to_js_error)?;
            Ok(JsPlayer { service }.into())
        })
    }

    /// Play a search or recent-list track (`QueueTrack` JSON).
    #[wasm_bindgen(js_name = loadAndPlay)]
    pub fn load_and_play(&self, track_json: &str) -> Result<Promise, JsValue> {
        let track: QueueTrack = parse(track_json)?;
        let service = self.service.clone();
        Ok(future_to_promise(async move {
            let outcome = service.load_and_play(track).await.map_err(to_js_error)?;
            Ok(outcome_to_js(outcome))
        }))
    }

    #[wasm_bindgen(js_name = playFromPlaylist)]
    pub fn play_from_playlist(&self, playlist_id: String, index: usize) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move {
            let outcome = service
                .play_from_playlist(&playlist_id, index)
                .await
                .map_err(to_js_error)?;
            Ok(outcome_to_js(outcome))
        })
    }

    #[wasm_bindgen(js_name = playPlaylist)]
    pub fn play_playlist(&self, playlist_id: String) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move {
            let outcome = service
                .play_playlist(&playlist_id)
                .await
                .map_err(to_js_error)?;
            Ok(outcome_to_js(outcome))
        })
    }

    #[wasm_bindgen(js_name = playLibraryTrack)]
    pub fn play_library_track(&self, track_json: &str) -> Result<Promise, JsValue> {
        let track: LibraryTrack = parse(track_json)?;
        let service = self.service.clone();
        Ok(future_to_promise(async move {
            let outcome = service
                .play_library_track(track)
                .await
                .map_err(to_js_error)?;
            Ok(outcome_to_js(outcome))
        }))
    }

    /// Resolves to the new `isPlaying` value.
    #[wasm_bindgen(js_name = togglePlayPause)]
    pub fn toggle_play_pause(&self) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move { Ok(JsValue::from_bool(service.toggle_play_pause().await)) })
    }

    pub fn seek(&self, seconds: f64) {
        self.service.seek(seconds);
    }

    #[wasm_bindgen(js_name = skipNext)]
    pub fn skip_next(&self) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move {
            service.skip_next().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = skipPrevious)]
    pub fn skip_previous(&self) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move {
            service.skip_previous().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.service.set_volume(volume)
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> f32 {
        self.service.toggle_mute()
    }

    /// Replace the known playlists (`Playlist[]` JSON).
    #[wasm_bindgen(js_name = setPlaylists)]
    pub fn set_playlists(&self, playlists_json: &str) -> Result<(), JsValue> {
        let playlists: Vec<Playlist> = parse(playlists_json)?;
        self.service.set_playlists(playlists);
        Ok(())
    }

    #[wasm_bindgen(js_name = upsertPlaylist)]
    pub fn upsert_playlist(&self, playlist_json: &str) -> Result<(), JsValue> {
        let playlist: Playlist = parse(playlist_json)?;
        self.service.upsert_playlist(playlist);
        Ok(())
    }

    #[wasm_bindgen(js_name = removePlaylist)]
    pub fn remove_playlist(&self, playlist_id: String) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move {
            Ok(JsValue::from_bool(
                service.remove_playlist(&playlist_id).await,
            ))
        })
    }

    /// Current playback state as JSON.
    #[wasm_bindgen(js_name = playbackState)]
    pub fn playback_state(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.service.playback_state())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Recently played tracks as JSON, newest first.
    #[wasm_bindgen(js_name = recentTracks)]
    pub fn recent_tracks(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.service.recent_tracks())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = subscribeEvents)]
    pub fn subscribe_events(&self) -> JsEventReceiver {
        JsEventReceiver::new(self.service.subscribe_events())
    }

    pub fn shutdown(&self) -> Promise {
        let service = self.service.clone();
        future_to_promise(async move {
            service.shutdown().await;
            Ok(JsValue::UNDEFINED)
        })
    }
}
