//! `HTMLAudioElement` implementation of the audio output bridge.
//!
//! One element is created per output and kept for the lifetime of the page.
//! Media element events are forwarded into a broadcast channel; the DOM
//! listeners are registered once at construction and removed on drop.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    playback::{AudioOutput, AudioOutputEvent},
};
use core_async::sync::broadcast;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlAudioElement};

use crate::error::js_message;

const EVENT_CAPACITY: usize = 64;

type Listener = Closure<dyn FnMut(Event)>;

/// Audio output backed by a single `HTMLAudioElement`.
pub struct HtmlAudioOutput {
    element: HtmlAudioElement,
    events: broadcast::Sender<AudioOutputEvent>,
    listeners: Vec<(&'static str, Listener)>,
}

impl HtmlAudioOutput {
    /// Create a detached audio element with `preload = "auto"`.
    pub fn new() -> BridgeResult<Self> {
        let element = HtmlAudioElement::new().map_err(|err| {
            BridgeError::NotAvailable(format!("HTMLAudioElement: {}", js_message(&err)))
        })?;
        element.set_preload("auto");
        Self::with_element(element)
    }

    /// Wrap an existing element, e.g. one declared in the page markup.
    pub fn with_element(element: HtmlAudioElement) -> BridgeResult<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut output = Self {
            element,
            events,
            listeners: Vec::new(),
        };

        output.listen("timeupdate", |el| AudioOutputEvent::TimeUpdate {
            position: el.current_time(),
        })?;
        output.listen("loadedmetadata", |el| AudioOutputEvent::DurationChanged {
            duration: el.duration(),
        })?;
        output.listen("ended", |_| AudioOutputEvent::Ended)?;
        output.listen("waiting", |_| AudioOutputEvent::Waiting)?;
        output.listen("canplay", |_| AudioOutputEvent::CanPlay)?;
        output.listen("error", |el| AudioOutputEvent::Error {
            message: el
                .error()
                .map(|e| format!("media error code {}", e.code()))
                .unwrap_or_else(|| "unknown media error".to_string()),
        })?;

        Ok(output)
    }

    /// The underlying element.
    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }

    fn listen(
        &mut self,
        name: &'static str,
        map: impl Fn(&HtmlAudioElement) -> AudioOutputEvent + 'static,
    ) -> BridgeResult<()> {
        let element = self.element.clone();
        let sender = self.events.clone();
        let listener = Closure::wrap(Box::new(move |_event: Event| {
            // No subscribers is fine; the event is simply dropped.
            let _ = sender.send(map(&element));
        }) as Box<dyn FnMut(Event)>);

        self.element
            .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
            .map_err(|err| {
                BridgeError::OperationFailed(format!("listen {name}: {}", js_message(&err)))
            })?;
        self.listeners.push((name, listener));
        Ok(())
    }
}

impl Drop for HtmlAudioOutput {
    fn drop(&mut self) {
        let _ = self.element.pause();
        for (name, listener) in self.listeners.drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
    }
}

#[async_trait(?Send)]
impl AudioOutput for HtmlAudioOutput {
    fn source(&self) -> Option<String> {
        let src = self.element.src();
        (!src.is_empty()).then_some(src)
    }

    fn set_source(&self, url: &str) -> BridgeResult<()> {
        self.element.set_src(url);
        self.element.load();
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        let promise = self
            .element
            .play()
            .map_err(|err| BridgeError::PlaybackRejected(js_message(&err)))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| BridgeError::PlaybackRejected(js_message(&err)))
    }

    fn pause(&self) -> BridgeResult<()> {
        self.element
            .pause()
            .map_err(|err| BridgeError::OperationFailed(format!("pause: {}", js_message(&err))))
    }

    fn position(&self) -> f64 {
        self.element.current_time()
    }

    fn set_position(&self, seconds: f64) -> BridgeResult<()> {
        self.element.set_current_time(seconds);
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> BridgeResult<()> {
        self.element.set_volume(f64::from(volume.clamp(0.0, 1.0)));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AudioOutputEvent> {
        self.events.subscribe()
    }
}
