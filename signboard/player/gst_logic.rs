use crate::error::App;
use crate::player::audio::{AudioMix, AudioOutput};
use futures_util::stream::StreamExt;
use glib::object::ObjectExt;
use gstreamer::prelude::*;
use gstreamer::{ClockTime, Element, MessageView, SeekFlags, State};
use log::{error, info, warn};
use tokio::task::{self, JoinHandle};

/// Background track played through a `playbin`, looped on end-of-stream.
pub struct Background {
    playbin: Element,
    bus_listener: Option<JoinHandle<()>>,
    loaded: bool,
}

impl Background {
    pub fn new() -> Result<Self, App> {
        gstreamer::init().map_err(|e| App::Init(e.to_string()))?;
        let playbin = gstreamer::ElementFactory::make("playbin")
            .name("background")
            .build()
            .map_err(|_| App::Element("Failed to create playbin element".to_string()))?;
        let video_sink = gstreamer::ElementFactory::make("fakesink")
            .build()
            .map_err(|_| App::Element("Failed to create fakesink element".to_string()))?;
        playbin.set_property("video-sink", &video_sink);

        info!("GStreamer background pipeline created.");
        Ok(Self {
            playbin,
            bus_listener: None,
            loaded: false,
        })
    }

    fn listen_to_bus(&mut self) -> Result<(), App> {
        if self.bus_listener.is_some() {
            return Ok(());
        }
        let bus = self
            .playbin
            .bus()
            .ok_or_else(|| App::Element("Failed to get GStreamer bus".to_string()))?;
        let playbin_weak = self.playbin.downgrade();

        self.bus_listener = Some(task::spawn(bus.stream().for_each(move |msg| {
            let playbin_weak = playbin_weak.clone();
            async move {
                match msg.view() {
                    MessageView::Eos(_) => {
                        let Some(playbin) = playbin_weak.upgrade() else {
                            return;
                        };
                        if let Err(e) = playbin
                            .seek_simple(SeekFlags::FLUSH | SeekFlags::KEY_UNIT, ClockTime::ZERO)
                        {
                            warn!("Failed to loop background audio: {}", e);
                        }
                    }
                    MessageView::Error(err) => {
                        error!("Background audio error: {}", err.error());
                    }
                    _ => (),
                }
            }
        })));
        Ok(())
    }

    fn set_state(&self, state: State) -> Result<(), App> {
        self.playbin
            .set_state(state)
            .map(|_| ())
            .map_err(|_| App::State(format!("Failed to set background audio to {state:?}")))
    }
}

/// State the playbin should move to for `mix`. A playbin without a uri cannot leave `Null`.
fn target_state(loaded: bool, mix: &AudioMix) -> Option<State> {
    if !loaded {
        return None;
    }
    Some(match mix.background {
        Some(_) => State::Playing,
        None => State::Paused,
    })
}

impl AudioOutput for Background {
    fn load(&mut self, uri: &str) -> Result<(), App> {
        self.set_state(State::Null)?;
        self.playbin.set_property("uri", uri);
        self.listen_to_bus()?;
        self.loaded = true;
        info!("Background audio loaded: {}", uri);
        Ok(())
    }

    fn apply(&mut self, mix: &AudioMix) -> Result<(), App> {
        let Some(state) = target_state(self.loaded, mix) else {
            return Ok(());
        };
        if let Some(volume) = mix.background {
            self.playbin.set_property("volume", volume);
        }
        self.set_state(state)
    }

    fn stop(&mut self) -> Result<(), App> {
        if let Some(listener) = self.bus_listener.take() {
            listener.abort();
        }
        self.loaded = false;
        self.set_state(State::Null)
    }
}

impl Drop for Background {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("{}", e);
        }
    }
}
