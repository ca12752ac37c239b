//! Session state and the generation lifecycle state machine.
//!
//! [`SessionState`] is the single source of truth a front end renders from.
//! It performs no I/O: a submission is split into [`SessionState::begin_generation`],
//! which applies the guards and hands out a [`PendingGeneration`] ticket, and
//! [`SessionState::complete_generation`], which applies the outcome.

use crate::classify::Failure;
use crate::image::{AspectRatio, GenerationRequest, GenerationResult, ImageSize, InlineImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prompt seeded when the current result is reused as a reference.
pub const EDIT_PLACEHOLDER: &str = "Refine this image by...";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: String,
}

impl User {
    /// Creates a user.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Where the generation subsystem is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight, no error shown.
    #[default]
    Idle,
    /// One request is outstanding.
    Requesting,
    /// The last request produced an image.
    Succeeded,
    /// The last request failed; the message is shown until dismissed.
    Failed {
        /// Error banner text.
        message: String,
    },
}

/// Ticket for the single outstanding generation.
#[derive(Debug, Clone)]
#[must_use = "a pending generation must be completed"]
pub struct PendingGeneration {
    epoch: u64,
    request: GenerationRequest,
}

impl PendingGeneration {
    /// The request to send.
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

/// Everything the studio screen shows.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Option<User>,
    prompt: String,
    aspect_ratio: AspectRatio,
    size: ImageSize,
    current: Option<Uuid>,
    history: Vec<GenerationResult>,
    reference_image: Option<InlineImage>,
    phase: Phase,
    // Bumped when the session ends so late completions are dropped.
    epoch: u64,
}

impl SessionState {
    /// Initial state: idle, nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Current prompt text, as typed.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Selected aspect ratio.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Selected resolution tier.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Reference image for the next request.
    pub fn reference_image(&self) -> Option<&InlineImage> {
        self.reference_image.as_ref()
    }

    /// Completed generations, newest first.
    pub fn history(&self) -> &[GenerationResult] {
        &self.history
    }

    /// The result on display.
    pub fn current_result(&self) -> Option<&GenerationResult> {
        let id = self.current?;
        self.history.iter().find(|r| r.id == id)
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether a request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Requesting
    }

    /// Error banner text, if one is shown.
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Whether submitting now would start a request.
    pub fn can_submit(&self) -> bool {
        self.user.is_some() && !self.prompt.trim().is_empty() && !self.is_loading()
    }

    /// Signs `user` in.
    pub fn sign_in(&mut self, user: User) {
        tracing::info!(user = %user.id, "session started");
        self.user = Some(user);
    }

    /// Ends the session and clears all session data.
    ///
    /// Any outstanding request's completion will be discarded.
    pub fn sign_out(&mut self) {
        let epoch = self.epoch.wrapping_add(1);
        if let Some(ref user) = self.user {
            tracing::info!(user = %user.id, "session ended");
        }
        *self = Self {
            epoch,
            ..Self::default()
        };
    }

    /// Replaces the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Selects an aspect ratio.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.aspect_ratio = ratio;
    }

    /// Selects a resolution tier.
    pub fn set_size(&mut self, size: ImageSize) {
        self.size = size;
    }

    /// Attaches a reference image for the next request.
    pub fn set_reference_image(&mut self, image: InlineImage) {
        self.reference_image = Some(image);
    }

    /// Removes the reference image.
    pub fn clear_reference_image(&mut self) {
        self.reference_image = None;
    }

    /// Shows a history entry and restores its prompt and options.
    ///
    /// Returns false if `id` is not in the history.
    pub fn select_from_history(&mut self, id: Uuid) -> bool {
        let Some(result) = self.history.iter().find(|r| r.id == id) else {
            return false;
        };
        self.prompt = result.prompt.clone();
        self.aspect_ratio = result.aspect_ratio;
        self.size = result.size;
        self.current = Some(id);
        true
    }

    /// Starts a generation if the guards allow it.
    ///
    /// Returns `None`, leaving the state untouched, when nobody is signed in,
    /// the prompt is blank, or a request is already outstanding.
    pub fn begin_generation(&mut self) -> Option<PendingGeneration> {
        if self.user.is_none() {
            tracing::debug!("submit ignored: no active session");
            return None;
        }
        if self.is_loading() {
            tracing::debug!("submit ignored: a generation is already in flight");
            return None;
        }

        let request = GenerationRequest::builder(self.prompt.as_str())
            .aspect_ratio(self.aspect_ratio)
            .size(Some(self.size))
            .reference_image(self.reference_image.clone())
            .build();
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("submit ignored: {e}");
                return None;
            }
        };

        self.phase = Phase::Requesting;
        Some(PendingGeneration {
            epoch: self.epoch,
            request,
        })
    }

    /// Applies the outcome of `pending`.
    ///
    /// On success the new result is prepended to the history and shown; on
    /// failure the error is shown and everything else is kept. Returns false
    /// if the ticket belongs to an ended session and was discarded.
    pub fn complete_generation(
        &mut self,
        pending: PendingGeneration,
        outcome: std::result::Result<InlineImage, Failure>,
    ) -> bool {
        if pending.epoch != self.epoch || !self.is_loading() {
            tracing::debug!("discarding completion of a stale generation");
            return false;
        }

        let request = pending.request;
        match outcome {
            Ok(image) => {
                let result = GenerationResult::new(
                    image,
                    request.prompt(),
                    request.aspect_ratio(),
                    request.size(),
                );
                tracing::info!(id = %result.id, history = self.history.len() + 1, "generation succeeded");
                self.current = Some(result.id);
                self.history.insert(0, result);
                self.phase = Phase::Succeeded;
            }
            Err(failure) => {
                tracing::warn!(kind = ?failure.kind, "generation failed: {}", failure.message);
                self.phase = Phase::Failed {
                    message: failure.message,
                };
            }
        }
        true
    }

    /// Clears the error banner. Only meaningful from [`Phase::Failed`].
    pub fn dismiss_error(&mut self) {
        if matches!(self.phase, Phase::Failed { .. }) {
            self.phase = Phase::Idle;
        }
    }

    /// Reuses the current result as the reference image for an edit.
    ///
    /// Only available in [`Phase::Succeeded`]; the phase does not change.
    /// Returns whether anything happened.
    pub fn use_result_as_reference(&mut self) -> bool {
        if self.phase != Phase::Succeeded {
            return false;
        }
        let Some(image) = self.current_result().map(|r| r.image.clone()) else {
            return false;
        };
        self.reference_image = Some(image);
        self.prompt = EDIT_PLACEHOLDER.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Failure, CREDENTIAL_MESSAGE};

    fn signed_in() -> SessionState {
        let mut state = SessionState::new();
        state.sign_in(User::new("vex-user", "Vex Explorer", "hello@vexai.com"));
        state
    }

    fn png() -> InlineImage {
        InlineImage::new("image/png", "AAAA")
    }

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert!(state.user().is_none());
        assert_eq!(state.phase(), &Phase::Idle);
        assert!(state.history().is_empty());
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_blank_prompt_is_a_no_op() {
        for prompt in ["", "   ", "\n"] {
            let mut state = signed_in();
            state.set_prompt(prompt);
            assert!(!state.can_submit());
            assert!(state.begin_generation().is_none());
            assert_eq!(state.phase(), &Phase::Idle);
        }
    }

    #[test]
    fn test_submit_without_user_is_a_no_op() {
        let mut state = SessionState::new();
        state.set_prompt("a red fox");
        assert!(state.begin_generation().is_none());
        assert_eq!(state.phase(), &Phase::Idle);
    }

    #[test]
    fn test_at_most_one_in_flight() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        let first = state.begin_generation().unwrap();
        assert!(state.is_loading());

        state.set_prompt("a blue fox");
        assert!(state.begin_generation().is_none());
        assert!(state.is_loading());

        assert!(state.complete_generation(first, Ok(png())));
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].prompt, "a red fox");
        assert!(state.begin_generation().is_some());
    }

    #[test]
    fn test_success_prepends_and_shows_result() {
        let mut state = signed_in();
        state.set_prompt("  a red fox ");
        state.set_aspect_ratio(AspectRatio::Landscape);
        state.set_size(ImageSize::TwoK);
        let pending = state.begin_generation().unwrap();
        assert_eq!(pending.request().prompt(), "a red fox");
        state.complete_generation(pending, Ok(png()));

        state.set_prompt("a grey wolf");
        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Ok(InlineImage::new("image/jpeg", "BBBB")));

        assert_eq!(state.phase(), &Phase::Succeeded);
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.history()[0].prompt, "a grey wolf");
        assert_eq!(state.history()[1].prompt, "a red fox");
        assert_eq!(state.history()[1].aspect_ratio, AspectRatio::Landscape);
        assert_eq!(state.history()[1].size, ImageSize::TwoK);
        let current = state.current_result().unwrap();
        assert_eq!(current.image.to_data_url(), "data:image/jpeg;base64,BBBB");
    }

    #[test]
    fn test_failure_keeps_result_prompt_and_history() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Ok(png()));
        let shown = state.current_result().unwrap().id;

        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Err(Failure::generic(Some("quota exceeded".into()))));

        assert_eq!(state.error(), Some("quota exceeded"));
        assert!(!state.is_loading());
        assert_eq!(state.prompt(), "a red fox");
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.current_result().unwrap().id, shown);
    }

    #[test]
    fn test_resubmit_from_failed_clears_error() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Err(Failure::credential()));
        assert_eq!(state.error(), Some(CREDENTIAL_MESSAGE));

        let pending = state.begin_generation().unwrap();
        assert_eq!(state.phase(), &Phase::Requesting);
        assert!(state.error().is_none());
        state.complete_generation(pending, Ok(png()));
        assert_eq!(state.phase(), &Phase::Succeeded);
    }

    #[test]
    fn test_dismiss_only_leaves_failed() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        let pending = state.begin_generation().unwrap();

        state.dismiss_error();
        assert_eq!(state.phase(), &Phase::Requesting);

        state.complete_generation(pending, Err(Failure::generic(None)));
        assert_eq!(state.error(), Some("Failed to generate image."));
        state.dismiss_error();
        assert_eq!(state.phase(), &Phase::Idle);
        assert_eq!(state.prompt(), "a red fox");
    }

    #[test]
    fn test_use_result_as_reference_only_from_succeeded() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        assert!(!state.use_result_as_reference());

        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Ok(png()));
        assert!(state.use_result_as_reference());

        assert_eq!(state.phase(), &Phase::Succeeded);
        assert_eq!(state.prompt(), EDIT_PLACEHOLDER);
        assert_eq!(state.reference_image(), Some(&png()));

        let pending = state.begin_generation().unwrap();
        assert!(pending.request().is_edit());
        state.complete_generation(pending, Err(Failure::generic(None)));
        assert!(!state.use_result_as_reference());
    }

    #[test]
    fn test_select_from_history_restores_options() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        state.set_aspect_ratio(AspectRatio::Portrait);
        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Ok(png()));
        let first = state.history()[0].id;

        state.set_prompt("a grey wolf");
        state.set_aspect_ratio(AspectRatio::Square);
        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Ok(png()));

        assert!(state.select_from_history(first));
        assert_eq!(state.prompt(), "a red fox");
        assert_eq!(state.aspect_ratio(), AspectRatio::Portrait);
        assert_eq!(state.current_result().unwrap().id, first);
        assert!(!state.select_from_history(Uuid::new_v4()));
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        let pending = state.begin_generation().unwrap();
        state.complete_generation(pending, Ok(png()));
        state.set_reference_image(png());

        state.sign_out();
        assert!(state.user().is_none());
        assert_eq!(state.prompt(), "");
        assert!(state.current_result().is_none());
        assert!(state.reference_image().is_none());
        assert!(state.history().is_empty());
        assert_eq!(state.phase(), &Phase::Idle);
    }

    #[test]
    fn test_completion_after_sign_out_is_discarded() {
        let mut state = signed_in();
        state.set_prompt("a red fox");
        let pending = state.begin_generation().unwrap();
        state.sign_out();

        assert!(!state.complete_generation(pending, Ok(png())));
        assert!(state.history().is_empty());
        assert_eq!(state.phase(), &Phase::Idle);
    }

    #[test]
    fn test_reference_image_can_be_cleared() {
        let mut state = signed_in();
        state.set_reference_image(png());
        state.clear_reference_image();
        state.set_prompt("a red fox");
        let pending = state.begin_generation().unwrap();
        assert!(!pending.request().is_edit());
    }
}
