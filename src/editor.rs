use crate::api::{ApiResponse, Backend, Endpoints};
use crate::error::{EditorError, ValidationError};
use crate::fetch::ImageSource;
use crate::gate::ConfirmationGate;
use crate::payload::AnimalPayload;
use crate::record::{AnimalRecord, EditMode};
use log::{debug, error, info, warn};
use reqwest::Method;
use std::sync::Mutex;

/// Where the editor sends the user once a record is saved or deleted.
pub const LISTING_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    ConfirmingDelete { target: String },
    Saving,
    Deleting,
    Failed { message: String },
    Done,
}

impl EditorState {
    /// True while a request is in flight and the editor must not be used.
    pub fn is_blocking(&self) -> bool {
        matches!(self, EditorState::Saving | EditorState::Deleting)
    }
}

pub trait Navigator {
    fn navigate(&self, path: &str);
}

type StateListener = Box<dyn Fn(&EditorState) + Send + Sync>;

/// Save and delete orchestration for a single animal draft.
pub struct AnimalEditor<S, B, N> {
    images: S,
    backend: B,
    navigator: N,
    endpoints: Endpoints,
    mode: EditMode,
    state: Mutex<EditorState>,
    listener: Option<StateListener>,
}

impl<S, B, N> AnimalEditor<S, B, N>
where
    S: ImageSource,
    B: Backend,
    N: Navigator,
{
    pub fn new(images: S, backend: B, navigator: N, endpoints: Endpoints, mode: EditMode) -> Self {
        Self {
            images,
            backend,
            navigator,
            endpoints,
            mode,
            state: Mutex::new(EditorState::Idle),
            listener: None,
        }
    }

    /// Observe every state change, e.g. to show the blocking overlay.
    pub fn with_listener(mut self, listener: impl Fn(&EditorState) + Send + Sync + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> EditorState {
        self.lock_state().clone()
    }

    pub fn can_delete(&self) -> bool {
        self.mode.delete_enabled()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EditorState> {
        // A poisoned lock still holds a valid state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, state: &EditorState) {
        debug!("Editor state: {:?}", state);
        if let Some(listener) = &self.listener {
            listener(state);
        }
    }

    fn set_state(&self, next: EditorState) {
        *self.lock_state() = next.clone();
        self.notify(&next);
    }

    /// Check-and-set into a blocking state; a second caller gets `Busy`,
    /// and nothing starts once the editor is `Done`.
    fn begin(&self, next: EditorState) -> Result<(), ValidationError> {
        {
            let mut state = self.lock_state();
            if state.is_blocking() {
                warn!("Rejecting request while editor is {:?}", *state);
                return Err(ValidationError::Busy);
            }
            if *state == EditorState::Done {
                warn!("Rejecting request after the editor finished");
                return Err(ValidationError::Finished);
            }
            *state = next.clone();
        }
        self.notify(&next);
        Ok(())
    }

    fn finish(&self, result: &Result<ApiResponse, EditorError>) {
        match result {
            Ok(_) => {
                self.set_state(EditorState::Done);
                self.navigator.navigate(LISTING_PATH);
            }
            Err(e) => {
                error!("{}", e);
                self.set_state(EditorState::Failed {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Fetch the image, build the payload, submit it and return to the listing.
    ///
    /// The editor navigates only when the server accepts the record; every
    /// failure leaves it in `Failed` so the user can retry.
    pub async fn save(&self, snapshot: &AnimalRecord) -> Result<ApiResponse, EditorError> {
        self.begin(EditorState::Saving)?;
        let result = self.run_save(snapshot).await;
        self.finish(&result);
        result
    }

    async fn run_save(&self, snapshot: &AnimalRecord) -> Result<ApiResponse, EditorError> {
        let (method, url) = self.target(snapshot)?;
        if snapshot.image.src.is_empty() {
            return Err(ValidationError::EmptyImageSource.into());
        }

        let image = self
            .images
            .fetch(&snapshot.image.src)
            .await?
            .into_file(&snapshot.name);
        let payload = AnimalPayload::build(snapshot, image);

        let response = self.backend.submit(method, &url, payload).await?;
        info!("Saved {} ({})", snapshot.name, self.mode);
        Ok(response)
    }

    fn target(&self, snapshot: &AnimalRecord) -> Result<(Method, String), ValidationError> {
        match self.mode {
            EditMode::Create => {
                if let Some(id) = &snapshot.id {
                    warn!("Creating a new record from draft that already has id {}", id);
                }
                Ok((Method::POST, self.endpoints.collection()))
            }
            EditMode::Update => {
                let id = snapshot.id.as_deref().ok_or(ValidationError::MissingId)?;
                Ok((Method::PATCH, self.endpoints.item(id)))
            }
        }
    }

    /// Open the delete confirmation for `id`.
    pub fn request_delete(&self, id: &str) -> Result<(), ValidationError> {
        if !self.can_delete() {
            return Err(ValidationError::DeleteUnavailable);
        }
        self.begin(EditorState::ConfirmingDelete {
            target: id.to_string(),
        })
    }

    /// Close the confirmation without deleting.
    pub fn cancel_delete(&self) {
        let cancelled = {
            let mut state = self.lock_state();
            if matches!(*state, EditorState::ConfirmingDelete { .. }) {
                *state = EditorState::Idle;
                true
            } else {
                false
            }
        };
        if cancelled {
            info!("Delete cancelled");
            self.notify(&EditorState::Idle);
        }
    }

    /// Delete the record awaiting confirmation and return to the listing.
    pub async fn confirm_delete(&self) -> Result<ApiResponse, EditorError> {
        let target = {
            let mut state = self.lock_state();
            match &*state {
                EditorState::ConfirmingDelete { target } => {
                    let target = target.clone();
                    *state = EditorState::Deleting;
                    target
                }
                _ => return Err(ValidationError::NothingToConfirm.into()),
            }
        };
        self.notify(&EditorState::Deleting);

        let result = self
            .backend
            .delete(&self.endpoints.item(&target))
            .await
            .map_err(EditorError::from);
        if result.is_ok() {
            info!("Deleted {}", target);
        }
        self.finish(&result);
        result
    }

    /// Ask `gate` to confirm, then delete. `Ok(None)` means the user cancelled.
    pub async fn delete(
        &self,
        id: &str,
        gate: &impl ConfirmationGate,
    ) -> Result<Option<ApiResponse>, EditorError> {
        self.request_delete(id)?;
        if !gate.confirm(id) {
            self.cancel_delete();
            return Ok(None);
        }
        self.confirm_delete().await.map(Some)
    }
}
