// Stream reducer: binds the configured path and keeps the latest queried weight vector.
// Pure State x Action -> State. Errors become state fields; nothing is thrown to the caller.

use crate::error::PanelError;
use crate::extract::extract_weights;
use crate::path::{ParsedPath, PathParser};
use crate::types::Message;

/// Standing error for paths whose slices or filters reference `$variables`.
pub const DYNAMIC_PATH_ERROR: &str = "Message paths using variables are not supported";

/// Reducer input, one per host callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The configured path text changed.
    SetPath(String),
    /// One render tick's batch of messages, in delivery order.
    ApplyFrame(Vec<Message>),
    /// Playback jumped; drop everything transient.
    Seek,
}

/// Everything the panel knows about the bound path and its latest value.
///
/// `latest_value` is only ever set while `path_grammar_error` is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReducerState {
    pub path: String,
    pub parsed_path: Option<ParsedPath>,
    pub latest_message: Option<Message>,
    pub latest_value: Option<Vec<f64>>,
    pub error: Option<PanelError>,
    pub path_grammar_error: Option<String>,
}

impl ReducerState {
    /// Initial state bound to `path`.
    pub fn new(path: &str, parser: &dyn PathParser) -> Self {
        ReducerState::default().set_path(path, parser)
    }

    /// Apply one action, returning the next state. `self` is left untouched.
    pub fn reduce(&self, action: &Action, parser: &dyn PathParser) -> ReducerState {
        match action {
            Action::SetPath(path) => self.set_path(path, parser),
            Action::ApplyFrame(messages) => self.apply_frame(messages),
            Action::Seek => self.seek(),
        }
    }

    /// Topic the path is bound to, if the path parsed.
    pub fn topic(&self) -> Option<&str> {
        self.parsed_path.as_ref().map(|p| p.topic_name.as_str())
    }

    /// The standing message to show, grammar errors first.
    pub fn error_message(&self) -> Option<String> {
        self.path_grammar_error
            .clone()
            .or_else(|| self.error.as_ref().map(|e| e.to_string()))
    }

    pub fn has_error(&self) -> bool {
        self.path_grammar_error.is_some() || self.error.is_some()
    }

    fn is_bound(&self) -> bool {
        self.parsed_path.is_some() || self.path_grammar_error.is_some()
    }

    fn set_path(&self, path: &str, parser: &dyn PathParser) -> ReducerState {
        // Parse once per distinct path.
        if path == self.path && self.is_bound() {
            return self.clone();
        }

        let (parsed_path, path_grammar_error) = match parser.parse(path) {
            Ok(parsed) if parsed.is_dynamic() => {
                let error = PanelError::PathGrammar(DYNAMIC_PATH_ERROR.to_string());
                (Some(parsed), Some(error.to_string()))
            }
            Ok(parsed) => (Some(parsed), None),
            Err(err) => (None, Some(PanelError::from(err).to_string())),
        };

        let mut latest_value = None;
        let mut error = None;
        if path_grammar_error.is_none() {
            if let (Some(parsed), Some(message)) = (&parsed_path, &self.latest_message) {
                match extract_weights(message, parsed) {
                    Ok(value) => latest_value = value,
                    Err(err) => error = Some(err),
                }
            }
        }

        ReducerState {
            path: path.to_string(),
            parsed_path,
            latest_message: self.latest_message.clone(),
            latest_value,
            error,
            path_grammar_error,
        }
    }

    fn apply_frame(&self, messages: &[Message]) -> ReducerState {
        if self.path_grammar_error.is_some() {
            // Keep the newest sample so a fixed path can extract from it right away.
            return ReducerState {
                latest_message: messages.last().or(self.latest_message.as_ref()).cloned(),
                latest_value: None,
                error: None,
                ..self.without_transient()
            };
        }

        let Some(parsed) = &self.parsed_path else {
            return self.clone();
        };

        let mut latest_message = self.latest_message.as_ref();
        let mut latest_value = self.latest_value.clone();
        let mut error = self.error.clone();

        for message in messages.iter().filter(|m| m.topic == parsed.topic_name) {
            match extract_weights(message, parsed) {
                Ok(Some(value)) => {
                    latest_message = Some(message);
                    latest_value = Some(value);
                }
                Ok(None) => {}
                Err(err) => {
                    latest_value = None;
                    error = Some(err);
                }
            }
        }

        ReducerState {
            latest_message: latest_message.cloned(),
            latest_value,
            error,
            ..self.without_transient()
        }
    }

    fn seek(&self) -> ReducerState {
        self.without_transient()
    }

    /// Copy of the path binding with message, value, and error cleared.
    fn without_transient(&self) -> ReducerState {
        ReducerState {
            path: self.path.clone(),
            parsed_path: self.parsed_path.clone(),
            latest_message: None,
            latest_value: None,
            error: None,
            path_grammar_error: self.path_grammar_error.clone(),
        }
    }
}
