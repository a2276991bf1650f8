//! Voice dictation into an editing session.
//!
//! A speech recogniser (in the browser or elsewhere) delivers a stream of
//! result events until it is stopped. [`DictationSession`] turns those events
//! into updates of one field of an [`EditingSession`]:
//!
//! - the field's value when dictation starts is kept as a base;
//! - final segments are appended to the accumulated transcript;
//! - the latest interim segment is shown after it, and replaced by the next event.
//!
//! Stopping is best-effort on the recogniser side, so a result can still arrive
//! after [`DictationSession::stop`]. Such late events are discarded.

use crate::error::{AskaraError, AskaraResult};
use crate::session::EditingSession;
use askara_types::FieldName;
use serde::{Deserialize, Serialize};

/// One piece of recognised speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(default)]
    pub is_final: bool,
}

impl TranscriptSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// A batch of segments delivered by one recogniser callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEvent {
    pub segments: Vec<TranscriptSegment>,
}

/// Error reported by the recogniser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionError {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    Aborted,
    Other(String),
}

impl RecognitionError {
    /// Maps the Web Speech API error codes; unknown codes become `Other`.
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => RecognitionError::NoSpeech,
            "audio-capture" => RecognitionError::AudioCapture,
            "not-allowed" | "service-not-allowed" => RecognitionError::NotAllowed,
            "network" => RecognitionError::Network,
            "aborted" => RecognitionError::Aborted,
            other => RecognitionError::Other(other.to_owned()),
        }
    }

    fn user_message(&self) -> String {
        match self {
            RecognitionError::NoSpeech => "Aucune parole détectée. Réessayez.".into(),
            RecognitionError::AudioCapture => "Aucun microphone disponible.".into(),
            RecognitionError::NotAllowed => "L'accès au microphone a été refusé.".into(),
            RecognitionError::Network => "Erreur réseau pendant la reconnaissance vocale.".into(),
            RecognitionError::Aborted => "La dictée a été interrompue.".into(),
            RecognitionError::Other(code) => format!("Erreur de reconnaissance vocale : {code}"),
        }
    }
}

/// Transient message for the user after a recognition error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictationNotice {
    pub field: Option<FieldName>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DictationState {
    #[default]
    Idle,
    Listening { field: FieldName },
}

#[derive(Debug, Clone, Default)]
pub struct DictationSession {
    state: DictationState,
    base: String,
    transcript: String,
    interim: String,
}

impl DictationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DictationState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, DictationState::Listening { .. })
    }

    /// Starts dictating into `field`. A dictation already running on another
    /// field is stopped (and committed) first.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` if the session's template does not declare `field`.
    pub fn start(&mut self, session: &mut EditingSession, field: &str) -> AskaraResult<()> {
        let name = session
            .template()
            .field(field.trim())
            .map(|f| f.name.clone())
            .ok_or_else(|| {
                AskaraError::InvalidInput(format!("cannot dictate into unknown field '{field}'"))
            })?;

        if self.is_listening() {
            self.stop(session)?;
        }

        self.base = session.value(name.as_str()).unwrap_or_default().to_owned();
        self.transcript.clear();
        self.interim.clear();
        session.set_active(Some(name.as_str()))?;
        tracing::debug!("dictation started on field '{}'", name);
        self.state = DictationState::Listening { field: name };
        Ok(())
    }

    /// Applies a recogniser event to the active field.
    ///
    /// Returns `false` if the event was discarded because dictation is not running.
    pub fn on_result(
        &mut self,
        session: &mut EditingSession,
        event: &RecognitionEvent,
    ) -> AskaraResult<bool> {
        let DictationState::Listening { field } = &self.state else {
            tracing::debug!("discarding recognition result received while idle");
            return Ok(false);
        };
        let field = field.clone();

        let mut interim = String::new();
        for segment in &event.segments {
            if segment.is_final {
                self.transcript = join_words(&self.transcript, &segment.text);
            } else {
                interim = join_words(&interim, &segment.text);
            }
        }
        self.interim = interim;

        let shown = join_words(&join_words(&self.base, &self.transcript), &self.interim);
        session.set_value(field.as_str(), shown)?;
        Ok(true)
    }

    /// Stops dictation, keeping final text and dropping pending interim text.
    pub fn stop(&mut self, session: &mut EditingSession) -> AskaraResult<()> {
        if let DictationState::Listening { field } = std::mem::take(&mut self.state) {
            self.commit(session, &field)?;
            tracing::debug!("dictation stopped on field '{}'", field);
        }
        Ok(())
    }

    /// Handles a recogniser error: commits what was final, resets to idle and
    /// returns a message for the user.
    pub fn on_error(
        &mut self,
        session: &mut EditingSession,
        error: &RecognitionError,
    ) -> DictationNotice {
        let field = match std::mem::take(&mut self.state) {
            DictationState::Listening { field } => {
                if let Err(e) = self.commit(session, &field) {
                    tracing::warn!("failed to commit dictation for '{}': {}", field, e);
                }
                Some(field)
            }
            DictationState::Idle => None,
        };
        tracing::warn!("speech recognition error: {:?}", error);
        DictationNotice {
            field,
            message: error.user_message(),
        }
    }

    fn commit(&mut self, session: &mut EditingSession, field: &FieldName) -> AskaraResult<()> {
        self.interim.clear();
        session.set_value(field.as_str(), join_words(&self.base, &self.transcript))
    }
}

fn join_words(left: &str, right: &str) -> String {
    let right = right.trim();
    match (left.is_empty(), right.is_empty()) {
        (_, true) => left.to_owned(),
        (true, false) => right.to_owned(),
        (false, false) => format!("{} {}", left.trim_end(), right),
    }
}
