mod download;
mod error;
pub mod model;
mod util;

use std::path::Path;

use async_trait::async_trait;
use url::Url;

pub use error::*;
pub use model::Shortcode;
pub use util::*;

use crate::{
    config::InstagramConfig,
    service::{http::HttpService, CredentialSet},
};

use super::{MediaSource, Post, SessionFactory};

pub const INSTAGRAM_BASE_URL: &str = "https://www.instagram.com/";
pub const GRAPHQL_QUERY_PATH: &str = "graphql/query/";
/// Domain the session cookies must be scoped to, in leading-dot form.
pub const COOKIE_DOMAIN: &str = ".instagram.com";

/// One authenticated Instagram session backed by its own cookie jar.
pub struct InstagramSession {
    http_service: HttpService,
    graphql_url: Url,
    doc_id: String,
}

impl InstagramSession {
    pub fn new(config: &InstagramConfig, credentials: &CredentialSet) -> Result<Self, InstagramError> {
        let graphql_url = Url::parse(&config.base_url)
            .and_then(|base| base.join(GRAPHQL_QUERY_PATH))
            .map_err(|e| InstagramError::Unexpected(format!("Invalid base URL {}: {}", config.base_url, e)))?;
        let http_service = HttpService::new(config, credentials)?;
        Ok(Self {
            http_service,
            graphql_url,
            doc_id: config.doc_id.clone(),
        })
    }
}

#[async_trait]
impl MediaSource for InstagramSession {
    async fn fetch_post(&self, shortcode: &str) -> Result<Post, InstagramError> {
        let variables = serde_json::json!({
            "shortcode": shortcode
        });

        let params = serde_json::json!({
            "doc_id": self.doc_id,
            "variables": variables.to_string(),
            "server_timestamps": "true",
        });

        debug!("Querying post metadata for {}", shortcode);
        let response = self.http_service.get_json(self.graphql_url.as_str(), Some(params)).await?;

        let post = model::parse_media_response(response)?;
        info!(
            "Resolved post {} by {} ({:?}, {} item(s))",
            post.shortcode,
            post.owner.as_deref().unwrap_or("unknown"),
            post.kind(),
            post.nodes().len()
        );
        Ok(post)
    }

    async fn download_post(&self, post: &Post, target: &Path) -> Result<(), InstagramError> {
        download::download_post(&self.http_service, post, target).await
    }
}

/// Opens real sessions against instagram.com.
pub struct InstagramSessionFactory {
    config: InstagramConfig,
}

impl InstagramSessionFactory {
    pub fn new(config: InstagramConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for InstagramSessionFactory {
    fn open(&self, credentials: &CredentialSet) -> Result<Box<dyn MediaSource>, InstagramError> {
        Ok(Box::new(InstagramSession::new(&self.config, credentials)?))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::{
        platform::{MediaKind, MediaNode, PostContent, PostKind},
        utils::test::{closed_base_url, spawn_instagram_stub, STUB_CSRF, STUB_DOC_ID},
    };

    use super::*;

    fn open_session(base_url: &str, doc_id: &str) -> Box<dyn MediaSource> {
        let config = InstagramConfig {
            base_url: base_url.to_string(),
            doc_id: doc_id.to_string(),
            user_agent: "relay-test".into(),
            proxy_url: None,
        };
        let credentials = CredentialSet {
            session_id: "stub-session".into(),
            csrf_token: STUB_CSRF.into(),
        };
        InstagramSessionFactory::new(config).open(&credentials).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_post_queries_graphql_by_shortcode() {
        let base = spawn_instagram_stub().await;
        let session = open_session(&base, STUB_DOC_ID);

        let post = session.fetch_post("SIDE").await.unwrap();

        assert_eq!(post.shortcode, "SIDE");
        assert_eq!(post.owner.as_deref(), Some("stub"));
        assert_eq!(post.kind(), PostKind::Gallery);
        let urls: Vec<&str> = post.nodes().iter().map(MediaNode::media_url).collect();
        assert_eq!(urls, vec![format!("{}media/g1.jpg", base), format!("{}media/g2.mp4", base)]);
        assert_eq!(post.nodes()[1].kind(), MediaKind::Video);
    }

    #[tokio::test]
    async fn test_fetch_post_with_wrong_doc_id_is_unexpected() {
        let base = spawn_instagram_stub().await;
        let session = open_session(&base, "some-other-doc");

        let err = session.fetch_post("SIDE").await.unwrap_err();

        assert!(matches!(err, InstagramError::Unexpected(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_login_redirect_is_login_required() {
        let base = spawn_instagram_stub().await;
        let session = open_session(&base, STUB_DOC_ID);

        let err = session.fetch_post("PRIVATE").await.unwrap_err();

        assert!(matches!(err, InstagramError::LoginRequired(ref msg) if msg.contains("/accounts/login")));
    }

    #[tokio::test]
    async fn test_status_classification_over_http() {
        let base = spawn_instagram_stub().await;
        let session = open_session(&base, STUB_DOC_ID);

        assert_eq!(
            session.fetch_post("BLOCKED").await.unwrap_err(),
            InstagramError::Blocked("HTTP 403 Forbidden".into())
        );
        assert!(matches!(
            session.fetch_post("LIMITED").await.unwrap_err(),
            InstagramError::Connection(_)
        ));
        assert_eq!(
            session.fetch_post("GONE").await.unwrap_err(),
            InstagramError::Blocked("Fetching Post metadata failed.".into())
        );
        assert!(matches!(
            session.fetch_post("UNKNOWN").await.unwrap_err(),
            InstagramError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let base = closed_base_url().await;
        let session = open_session(&base, STUB_DOC_ID);

        let err = session.fetch_post("SIDE").await.unwrap_err();

        assert!(matches!(err, InstagramError::Connection(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_download_post_writes_named_files() {
        let base = spawn_instagram_stub().await;
        let session = open_session(&base, STUB_DOC_ID);
        let target = TempDir::new().unwrap();

        let gallery = session.fetch_post("SIDE").await.unwrap();
        session.download_post(&gallery, target.path()).await.unwrap();
        let single = session.fetch_post("SOLO").await.unwrap();
        session.download_post(&single, target.path()).await.unwrap();

        let read = |name: &str| std::fs::read_to_string(target.path().join(name)).unwrap();
        assert_eq!(read("SIDE_1.jpg"), "bytes:g1.jpg");
        assert_eq!(read("SIDE_2.mp4"), "bytes:g2.mp4");
        assert_eq!(read("SOLO.jpg"), "bytes:solo.jpg");
        assert_eq!(std::fs::read_dir(target.path()).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_download_missing_media_is_not_found() {
        let base = spawn_instagram_stub().await;
        let session = open_session(&base, STUB_DOC_ID);
        let target = TempDir::new().unwrap();
        let post = Post {
            shortcode: "GONE".into(),
            owner: None,
            content: PostContent::Single(MediaNode::image(format!("{}media/missing.jpg", base))),
        };

        let err = session.download_post(&post, target.path()).await.unwrap_err();

        assert!(matches!(err, InstagramError::NotFound(_)));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = InstagramConfig {
            base_url: "not a url".into(),
            doc_id: STUB_DOC_ID.into(),
            user_agent: "relay-test".into(),
            proxy_url: None,
        };
        let credentials = CredentialSet {
            session_id: "s".into(),
            csrf_token: "c".into(),
        };

        assert!(matches!(
            InstagramSessionFactory::new(config).open(&credentials),
            Err(InstagramError::Unexpected(_))
        ));
    }
}
