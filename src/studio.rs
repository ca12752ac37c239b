//! Drives a [`SessionState`] against the remote image service.

use crate::classify::{ErrorClassifier, MarkerClassifier};
use crate::credential::CredentialSelector;
use crate::image::ImageProvider;
use crate::session::{SessionState, User};
use std::sync::Arc;

/// The image studio: session state wired to its collaborators.
///
/// All remote failures are turned into state here; nothing propagates out of
/// [`Studio::submit`].
pub struct Studio {
    state: SessionState,
    images: Arc<dyn ImageProvider>,
    credentials: Arc<dyn CredentialSelector>,
    classifier: Box<dyn ErrorClassifier>,
}

impl Studio {
    /// Creates a studio using the default [`MarkerClassifier`].
    pub fn new(images: Arc<dyn ImageProvider>, credentials: Arc<dyn CredentialSelector>) -> Self {
        Self {
            state: SessionState::new(),
            images,
            credentials,
            classifier: Box::new(MarkerClassifier),
        }
    }

    /// Replaces the error classifier.
    pub fn with_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Read access to the session.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Edit access to the session (prompt, options, reference image, ...).
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Starts a session for `user`.
    ///
    /// Opens the credential picker first when nothing is selected, then signs
    /// in without waiting for confirmation.
    pub async fn start(&mut self, user: User) {
        if !self.credentials.has_selected_credential().await {
            tracing::info!("no credential selected, opening picker");
            self.credentials.open_picker().await;
        }
        self.state.sign_in(user);
    }

    /// Ends the session and clears all of its data.
    pub fn end(&mut self) {
        self.state.sign_out();
    }

    /// Submits the current prompt.
    ///
    /// Returns false when the submission was ignored by the guards (no user,
    /// blank prompt, request already in flight). Otherwise waits for the
    /// service and applies the outcome; a credential failure also reopens the
    /// picker.
    pub async fn submit(&mut self) -> bool {
        let Some(pending) = self.state.begin_generation() else {
            return false;
        };

        let outcome = self
            .images
            .generate(pending.request())
            .await
            .map_err(|e| {
                tracing::debug!(provider = self.images.name(), "generation error: {e}");
                self.classifier.classify(&e)
            });

        let reselect = matches!(outcome, Err(ref f) if f.needs_credential());
        self.state.complete_generation(pending, outcome);

        if reselect {
            tracing::warn!("credential problem detected, reopening credential picker");
            self.credentials.open_picker().await;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Failure, CREDENTIAL_MESSAGE};
    use crate::error::{Result, VexError};
    use crate::image::{
        extract_image, AspectRatio, GenerateContentResponse, GenerationRequest, ImageSize,
        InlineImage,
    };
    use crate::session::{Phase, EDIT_PLACEHOLDER};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned outcomes and records the requests it saw.
    struct ScriptedProvider {
        outcomes: Mutex<Vec<Result<InlineImage>>>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<Result<InlineImage>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ImageProvider for ScriptedProvider {
        async fn generate(&self, request: &GenerationRequest) -> Result<InlineImage> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcomes.lock().unwrap().remove(0)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSelector {
        selected: AtomicBool,
        opened: AtomicUsize,
    }

    #[async_trait]
    impl CredentialSelector for RecordingSelector {
        async fn has_selected_credential(&self) -> bool {
            self.selected.load(Ordering::SeqCst)
        }

        async fn open_picker(&self) {
            self.opened.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn selector(selected: bool) -> Arc<RecordingSelector> {
        let s = RecordingSelector::default();
        s.selected.store(selected, Ordering::SeqCst);
        Arc::new(s)
    }

    fn user() -> User {
        User::new("vex-user", "Vex Explorer", "hello@vexai.com")
    }

    fn fox_response() -> InlineImage {
        let resp: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "A red fox in the snow."},
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
                ]}
            }]
        }))
        .unwrap();
        extract_image(&resp).unwrap()
    }

    #[tokio::test]
    async fn test_start_opens_picker_only_without_credential() {
        let credentials = selector(false);
        let mut studio = Studio::new(ScriptedProvider::new(vec![]), credentials.clone());
        studio.start(user()).await;
        assert_eq!(credentials.opened.load(Ordering::SeqCst), 1);
        assert!(studio.state().user().is_some());

        let credentials = selector(true);
        let mut studio = Studio::new(ScriptedProvider::new(vec![]), credentials.clone());
        studio.start(user()).await;
        assert_eq!(credentials.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_red_fox_succeeds() {
        let images = ScriptedProvider::new(vec![Ok(fox_response())]);
        let mut studio = Studio::new(images.clone(), selector(true));
        studio.start(user()).await;
        studio.state_mut().set_prompt("a red fox");
        studio.state_mut().set_aspect_ratio(AspectRatio::Square);
        studio.state_mut().set_size(ImageSize::OneK);

        assert!(studio.submit().await);

        let state = studio.state();
        assert_eq!(state.phase(), &Phase::Succeeded);
        assert_eq!(
            state.current_result().unwrap().image.to_data_url(),
            "data:image/png;base64,AAAA"
        );
        assert_eq!(state.history().len(), 1);

        let seen = images.seen.lock().unwrap();
        assert_eq!(seen[0].prompt(), "a red fox");
        assert!(!seen[0].is_edit());
    }

    #[tokio::test]
    async fn test_credential_failure_reopens_picker() {
        let images = ScriptedProvider::new(vec![Err(VexError::Api {
            status: 404,
            message: "Requested entity was not found: key".into(),
        })]);
        let credentials = selector(true);
        let mut studio = Studio::new(images, credentials.clone());
        studio.start(user()).await;
        studio.state_mut().set_prompt("a red fox");

        assert!(studio.submit().await);

        let state = studio.state();
        assert!(matches!(state.phase(), Phase::Failed { .. }));
        assert_eq!(state.error(), Some(CREDENTIAL_MESSAGE));
        assert_eq!(
            state.error(),
            Some("API Key issue detected. Please re-select a valid project key.")
        );
        assert_eq!(credentials.opened.load(Ordering::SeqCst), 1);
        assert!(state.history().is_empty());
    }

    #[tokio::test]
    async fn test_generic_failure_does_not_reopen_picker() {
        let images = ScriptedProvider::new(vec![Err(VexError::NoImagePart)]);
        let credentials = selector(true);
        let mut studio = Studio::new(images, credentials.clone());
        studio.start(user()).await;
        studio.state_mut().set_prompt("a red fox");
        studio.submit().await;

        assert_eq!(
            studio.state().error(),
            Some("Generation failed. The model did not return an image part.")
        );
        assert_eq!(credentials.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_use_as_reference_then_edit() {
        let images = ScriptedProvider::new(vec![Ok(fox_response()), Ok(fox_response())]);
        let mut studio = Studio::new(images.clone(), selector(true));
        studio.start(user()).await;
        studio.state_mut().set_prompt("a red fox");
        studio.submit().await;

        assert!(studio.state_mut().use_result_as_reference());
        assert_eq!(studio.state().phase(), &Phase::Succeeded);
        assert_eq!(studio.state().prompt(), EDIT_PLACEHOLDER);
        assert_eq!(
            studio.state().reference_image().unwrap().to_data_url(),
            "data:image/png;base64,AAAA"
        );

        studio.state_mut().set_prompt("make it winter");
        studio.submit().await;
        let seen = images.seen.lock().unwrap();
        assert!(seen[1].is_edit());
        assert_eq!(studio.state().history().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_guards() {
        let images = ScriptedProvider::new(vec![]);
        let mut studio = Studio::new(images.clone(), selector(true));
        studio.state_mut().set_prompt("a red fox");
        assert!(!studio.submit().await);

        studio.start(user()).await;
        studio.state_mut().set_prompt("   ");
        assert!(!studio.submit().await);
        assert!(images.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_clears_history() {
        let images = ScriptedProvider::new(vec![Ok(fox_response())]);
        let mut studio = Studio::new(images, selector(true));
        studio.start(user()).await;
        studio.state_mut().set_prompt("a red fox");
        studio.submit().await;
        assert_eq!(studio.state().history().len(), 1);

        studio.end();
        assert_eq!(studio.state().history().len(), 0);
        assert!(studio.state().user().is_none());
        assert_eq!(studio.state().prompt(), "");
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        struct AlwaysCredential;
        impl ErrorClassifier for AlwaysCredential {
            fn classify(&self, _: &VexError) -> Failure {
                Failure::credential()
            }
        }

        let images = ScriptedProvider::new(vec![Err(VexError::Unspecified)]);
        let credentials = selector(true);
        let mut studio =
            Studio::new(images, credentials.clone()).with_classifier(AlwaysCredential);
        studio.start(user()).await;
        studio.state_mut().set_prompt("a red fox");
        studio.submit().await;
        assert_eq!(credentials.opened.load(Ordering::SeqCst), 1);
    }
}
