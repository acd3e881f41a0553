use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::ai::{GenerationRequest, ModelClient, ModelError, UploadedFile};
use crate::auth::{AuthError, AuthenticatedUser, IdentityVerifier};
use crate::wallet::{GenericObject, InsertOutcome, WalletIssuer, WalletIssuerError};

/// Accepts a fixed set of credentials; everything else is untrusted.
#[derive(Default)]
pub struct StaticIdentityVerifier {
    known: HashMap<String, AuthenticatedUser>,
    unconfigured: bool,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(mut self, credential: &str, user: AuthenticatedUser) -> Self {
        self.known.insert(credential.to_string(), user);
        self
    }

    /// Behave as if no client id were configured.
    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        if self.unconfigured {
            return Err(AuthError::NotConfigured);
        }
        self.known
            .get(credential)
            .cloned()
            .ok_or_else(|| AuthError::UntrustedIdentity("unknown test credential".to_string()))
    }
}

/// Model double that replays queued replies in order.
///
/// When the queue runs dry every call fails with `EmptyResponse`.
#[derive(Default)]
pub struct FakeModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    uploads: Mutex<Vec<(String, usize)>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, err: ModelError) -> Self {
        self.replies.lock().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// `(mime_type, size)` of every upload.
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn upload(
        &self,
        bytes: Bytes,
        mime_type: &str,
        _display_name: &str,
    ) -> Result<UploadedFile, ModelError> {
        let mut uploads = self.uploads.lock();
        uploads.push((mime_type.to_string(), bytes.len()));
        Ok(UploadedFile {
            uri: format!("files/fake-{}", uploads.len()),
            mime_type: mime_type.to_string(),
        })
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyResponse))
    }
}

/// Records inserted objects; answers `Created` the first time an id is
/// seen and `AlreadyExists` after that, unless told to reject.
#[derive(Default)]
pub struct FakeWalletIssuer {
    inserted: Mutex<Vec<GenericObject>>,
    rejection: Option<(u16, String)>,
}

impl FakeWalletIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            rejection: Some((status, body.to_string())),
            ..Self::default()
        }
    }

    pub fn inserted(&self) -> Vec<GenericObject> {
        self.inserted.lock().clone()
    }
}

#[async_trait]
impl WalletIssuer for FakeWalletIssuer {
    async fn insert_object(
        &self,
        object: &GenericObject,
    ) -> Result<InsertOutcome, WalletIssuerError> {
        if let Some((status, body)) = &self.rejection {
            return Err(WalletIssuerError::Rejected {
                status: *status,
                body: body.clone(),
            });
        }

        let mut inserted = self.inserted.lock();
        let exists = inserted.iter().any(|o| o.id == object.id);
        inserted.push(object.clone());
        Ok(if exists {
            InsertOutcome::AlreadyExists
        } else {
            InsertOutcome::Created
        })
    }
}
