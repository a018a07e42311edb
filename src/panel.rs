// Thin adapter between host callbacks and the pure engine.
// Render/seek/settings callbacks become reducer actions; render() builds the model for the surface.

use serde::{Deserialize, Serialize};

use crate::colormap::ColorMapEngine;
use crate::error::PanelError;
use crate::geometry::{percentages, WedgeGeometry};
use crate::path::{MessagePathParser, PathParser};
use crate::reducer::{Action, ReducerState};
use crate::types::*;

/// Diagnostic event emitted after each transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TraceEvent {
    PathBound { topic: String },
    PathRejected { reason: String },
    #[serde(rename_all = "camelCase")]
    FrameApplied { batch_len: usize, value_changed: bool },
    ExtractionFailed { message: String },
    Seek,
}

/// Optional observer for trace events.
pub type TraceHook = Box<dyn Fn(&TraceEvent)>;

/// One pie chart panel instance: config, reducer state, and the last good weights.
pub struct PiePanel {
    config: PanelConfig,
    parser: Box<dyn PathParser>,
    state: ReducerState,
    color_map: ColorMapEngine,
    geometry: WedgeGeometry,
    /// Weights drawn while an error stands.
    last_good: Option<Vec<f64>>,
    trace: Option<TraceHook>,
}

impl PiePanel {
    pub fn new(config: PanelConfig, settings: GeometrySettings) -> Result<Self, PanelError> {
        Self::with_parser(config, settings, Box::new(MessagePathParser))
    }

    /// Build a panel that parses paths with a host-supplied parser.
    pub fn with_parser(
        config: PanelConfig,
        settings: GeometrySettings,
        parser: Box<dyn PathParser>,
    ) -> Result<Self, PanelError> {
        settings.validate()?;
        let state = ReducerState::new(&config.path, parser.as_ref());

        Ok(PiePanel {
            config,
            parser,
            state,
            color_map: ColorMapEngine::new(settings.turbo_samples),
            geometry: WedgeGeometry::new(&settings),
            last_good: None,
            trace: None,
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn state(&self) -> &ReducerState {
        &self.state
    }

    /// Topic the host should subscribe to.
    pub fn subscribed_topic(&self) -> Option<&str> {
        self.state.topic()
    }

    pub fn set_trace_hook(&mut self, hook: TraceHook) {
        self.trace = Some(hook);
    }

    pub fn clear_trace_hook(&mut self) {
        self.trace = None;
    }

    /// Settings change. Only a new path text reaches the reducer.
    pub fn set_config(&mut self, config: PanelConfig) {
        let path_changed = config.path != self.config.path;
        self.config = config;
        if path_changed {
            self.dispatch(Action::SetPath(self.config.path.clone()));
        }
    }

    /// Render tick with this frame's messages.
    pub fn apply_frame(&mut self, messages: Vec<Message>) {
        self.dispatch(Action::ApplyFrame(messages));
    }

    pub fn seek(&mut self) {
        self.dispatch(Action::Seek);
    }

    /// Run one reducer transition and update the last good weights.
    pub fn dispatch(&mut self, action: Action) {
        let next = self.state.reduce(&action, self.parser.as_ref());
        self.trace_transition(&action, &next);
        self.state = next;

        match action {
            Action::Seek => self.last_good = None,
            // A rebind that errors keeps the old weights for the stale render.
            Action::SetPath(_) if !self.state.has_error() => {
                self.last_good = self.state.latest_value.clone();
            }
            _ => {}
        }
        if !self.state.has_error() {
            if let Some(value) = &self.state.latest_value {
                self.last_good = Some(value.clone());
            }
        }
    }

    /// Current render model. While an error stands the last good weights are
    /// drawn with the current colors and flagged stale.
    pub fn render(&self) -> RenderModel {
        let error_message = self.state.error_message();
        let (weights, stale) = if error_message.is_some() {
            (self.last_good.as_deref(), self.last_good.is_some())
        } else {
            (self.state.latest_value.as_deref(), false)
        };

        let segments = match weights {
            Some(weights) if !weights.is_empty() => {
                let colors = self.color_map.colors(&self.config, weights.len());
                self.geometry.segments(weights, &colors)
            }
            _ => Vec::new(),
        };
        let percentages = weights.and_then(percentages).unwrap_or_default();

        RenderModel {
            has_data: !segments.is_empty(),
            segments,
            error_message,
            stale,
            percentages,
            clip_path: self.geometry.clip_path(),
            bounds: self.geometry.bounds(),
        }
    }

    /// Color stops of the current config, for legends.
    pub fn color_stops(&self) -> Vec<ColorStop> {
        self.color_map.stops(&self.config)
    }

    fn trace_transition(&self, action: &Action, next: &ReducerState) {
        match action {
            Action::SetPath(path) => match (&next.path_grammar_error, next.topic()) {
                (Some(reason), _) => {
                    log::warn!("path {:?} rejected: {}", path, reason);
                    self.emit(TraceEvent::PathRejected {
                        reason: reason.clone(),
                    });
                }
                (None, Some(topic)) => {
                    log::debug!("path {:?} bound to topic {}", path, topic);
                    self.emit(TraceEvent::PathBound {
                        topic: topic.to_string(),
                    });
                }
                (None, None) => {}
            },
            Action::ApplyFrame(messages) => {
                let value_changed = next.latest_value != self.state.latest_value;
                log::trace!(
                    "frame of {} messages applied, value changed: {}",
                    messages.len(),
                    value_changed
                );
                self.emit(TraceEvent::FrameApplied {
                    batch_len: messages.len(),
                    value_changed,
                });
            }
            Action::Seek => {
                log::debug!("seek: clearing latest value");
                self.emit(TraceEvent::Seek);
            }
        }

        if let Some(err) = &next.error {
            if next.error != self.state.error {
                log::warn!("{}", err);
                self.emit(TraceEvent::ExtractionFailed {
                    message: err.to_string(),
                });
            }
        }
    }

    fn emit(&self, event: TraceEvent) {
        if let Some(hook) = &self.trace {
            hook(&event);
        }
    }
}
