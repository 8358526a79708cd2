use std::path::Path;

use async_trait::async_trait;

use crate::service::CredentialSet;

use super::{instagram::InstagramError, Post};

/// An authenticated view of the platform, good for exactly one request.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_post(&self, shortcode: &str) -> Result<Post, InstagramError>;

    /// Writes every media item of `post` into `target`, named after the shortcode.
    async fn download_post(&self, post: &Post, target: &Path) -> Result<(), InstagramError>;
}

/// Builds a fresh [`MediaSource`] from a credential set.
pub trait SessionFactory: Send + Sync {
    fn open(&self, credentials: &CredentialSet) -> Result<Box<dyn MediaSource>, InstagramError>;
}
