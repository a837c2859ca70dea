//! Collaborator seams the engine depends on but does not implement.
//!
//! The sync engine needs to know who the current user is and, for journal
//! features, how to turn a prompt plus context into generated text. Both
//! live behind traits so hosts plug in their own providers and tests use
//! trivial fakes.

use anyhow::Result;
use async_trait::async_trait;

/// Output of a text-generation call. `actions` carries any structured
/// directives the generator emitted alongside the text; they are passed
/// through opaquely for the host to interpret.
#[derive(Debug, Clone, Default)]
pub struct GeneratedReply {
    pub text: String,
    pub actions: Vec<serde_json::Value>,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, context: &serde_json::Value) -> Result<GeneratedReply>;
}

/// Source of the current user's stable opaque identifier. `None` means
/// nobody is signed in and no store operations should run.
pub trait IdentityProvider: Send + Sync {
    fn user_id(&self) -> Option<String>;
}
