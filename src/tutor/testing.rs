//! Test doubles for the model boundary

use crate::config::{ModelCatalog, TimeoutConfig};
use crate::error::AppError;
use crate::tutor::facade::Tutor;
use crate::tutor::request::{ModelBackend, ModelRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Backend replaying a fixed script of replies and recording every request
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, AppError>>>,
    seen: Mutex<Vec<ModelRequest>>,
}

impl ScriptedBackend {
    /// Backend answering with `replies` in order
    pub fn replying(replies: Vec<Result<String, AppError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AppError> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::ServiceUnavailable("script exhausted".into())))
    }
}

/// Facade over a scripted backend with default models and timeouts
pub fn scripted_tutor(backend: Arc<ScriptedBackend>) -> Tutor {
    Tutor::new(backend, ModelCatalog::default(), TimeoutConfig::default())
}
