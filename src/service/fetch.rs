use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::RelayConfig,
    platform::{
        instagram::{parse_shortcode, InstagramError, Shortcode},
        MediaItem, MediaKind, MediaLocation, MediaSource, SessionFactory,
    },
};

use super::{
    cookies::load_credentials,
    result::{FetchError, OperationResult, PayloadKind},
};

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "webm", "m4v"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    UrlsOnly,
    Download { target_dir: PathBuf },
}

impl FetchMode {
    pub fn payload_kind(&self) -> PayloadKind {
        match self {
            FetchMode::UrlsOnly => PayloadKind::MediaUrls,
            FetchMode::Download { .. } => PayloadKind::Files,
        }
    }
}

/// Turns a post URL into media URLs or files, one request at a time.
///
/// Holds no per-request state: credentials are read from disk and a new
/// session is opened on every call.
#[derive(Clone)]
pub struct PostFetcher {
    factory: Arc<dyn SessionFactory>,
    cookies_file: PathBuf,
    max_retries: u32,
}

impl PostFetcher {
    pub fn new(factory: Arc<dyn SessionFactory>, cookies_file: impl Into<PathBuf>, max_retries: u32) -> Self {
        Self {
            factory,
            cookies_file: cookies_file.into(),
            max_retries,
        }
    }

    pub fn from_config(config: &RelayConfig, factory: Arc<dyn SessionFactory>) -> Self {
        Self::new(factory, config.cookies_file.clone(), config.max_retries)
    }

    pub async fn fetch(&self, url: &str, mode: FetchMode) -> OperationResult {
        let kind = mode.payload_kind();
        match self.resolve(url, &mode).await {
            Ok(items) => {
                let message = match &mode {
                    FetchMode::UrlsOnly => "Media URLs extracted successfully.".to_string(),
                    FetchMode::Download { target_dir } => {
                        format!("Download complete! Files saved in {}.", target_dir.display())
                    }
                };
                OperationResult::success(kind, message, &items)
            }
            Err(e) => {
                warn!("Fetch failed for {}: {:?}", url, e);
                OperationResult::error(kind, e.to_string())
            }
        }
    }

    pub async fn resolve(&self, url: &str, mode: &FetchMode) -> Result<Vec<MediaItem>, FetchError> {
        let shortcode = parse_shortcode(url).ok_or(FetchError::InvalidUrl)?;
        info!("Fetching post {} ({:?})", shortcode, mode);

        let cookies_path = self.cookies_path();
        if !is_file(&cookies_path).await {
            return Err(FetchError::CredentialsFileMissing {
                path: cookies_path.display().to_string(),
                file: self.cookies_file_name(),
            });
        }

        let credentials = load_credentials(&cookies_path).ok_or(FetchError::CredentialsInvalid)?;

        let source = self
            .factory
            .open(&credentials)
            .map_err(|e| FetchError::Unclassified(e.to_string()))?;

        match mode {
            FetchMode::UrlsOnly => self.extract_urls(source.as_ref(), &shortcode).await,
            FetchMode::Download { target_dir } => self.download(source.as_ref(), &shortcode, target_dir).await,
        }
    }

    async fn extract_urls(&self, source: &dyn MediaSource, shortcode: &Shortcode) -> Result<Vec<MediaItem>, FetchError> {
        let post = source
            .fetch_post(shortcode.as_str())
            .await
            .map_err(|e| self.classify(e))?;

        Ok(post.remote_items())
    }

    async fn download(
        &self,
        source: &dyn MediaSource,
        shortcode: &Shortcode,
        target_dir: &Path,
    ) -> Result<Vec<MediaItem>, FetchError> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| FetchError::Unclassified(e.to_string()))?;

        let attempts = self.max_retries.saturating_add(1);
        for attempt in 1..=attempts {
            debug!("Download attempt {}/{} for {}", attempt, attempts, shortcode);

            let outcome = match source.fetch_post(shortcode.as_str()).await {
                Ok(post) => source.download_post(&post, target_dir).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    let items = collect_downloaded(target_dir, shortcode.as_str())
                        .await
                        .map_err(|e| FetchError::Unclassified(e.to_string()))?;
                    info!("Downloaded {} file(s) for {} into {}", items.len(), shortcode, target_dir.display());
                    return Ok(items);
                }
                Err(InstagramError::Connection(reason)) => {
                    if attempt < attempts {
                        warn!("Transient failure on attempt {} for {}: {}, retrying", attempt, shortcode, reason);
                        continue;
                    }
                    return Err(FetchError::TransientConnectivity {
                        retries: self.max_retries,
                        reason: InstagramError::Connection(reason).to_string(),
                    });
                }
                Err(e) => return Err(self.classify(e)),
            }
        }

        Err(FetchError::Unclassified("no download attempt was made".to_string()))
    }

    fn classify(&self, error: InstagramError) -> FetchError {
        match error {
            InstagramError::LoginRequired(_) => FetchError::AuthenticationRequired {
                file: self.cookies_file_name(),
            },
            InstagramError::Blocked(reason) => FetchError::RequestBlocked {
                reason,
                file: self.cookies_file_name(),
            },
            other => FetchError::Unclassified(other.to_string()),
        }
    }

    fn cookies_path(&self) -> PathBuf {
        std::path::absolute(&self.cookies_file).unwrap_or_else(|_| self.cookies_file.clone())
    }

    fn cookies_file_name(&self) -> String {
        self.cookies_file.display().to_string()
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Files in `dir` whose names start with `shortcode`, sorted by name.
async fn collect_downloaded(dir: &Path, shortcode: &str) -> std::io::Result<Vec<MediaItem>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(shortcode) {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| {
            let path = dir.join(&name);
            let kind = match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => MediaKind::Video,
                _ => MediaKind::Image,
            };
            MediaItem {
                kind,
                location: MediaLocation::Local(path),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::utils::test::{cookie_dir, gallery_post, image_post, video_post, MockFactory, TEST_COOKIES};

    use super::*;

    const POST_URL: &str = "https://www.instagram.com/p/ABC123/?igsh=xyz";

    fn fetcher(factory: &MockFactory, cookies: &TempDir) -> PostFetcher {
        PostFetcher::new(Arc::new(factory.clone()), cookies.path().join("cookies/cookies.txt"), 2)
    }

    fn urls(items: &[MediaItem]) -> Vec<String> {
        items.iter().map(|item| item.location.to_string()).collect()
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_calls() {
        let factory = MockFactory::returning(Ok(image_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);

        let err = fetcher(&factory, &cookies)
            .resolve("https://www.instagram.com/reel/ABC123/", &FetchMode::UrlsOnly)
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::InvalidUrl);
        assert_eq!(factory.opens(), 0);
    }

    #[tokio::test]
    async fn test_missing_cookie_file_names_location_and_skips_network() {
        let factory = MockFactory::returning(Ok(image_post("ABC123")));
        let empty = TempDir::new().unwrap();
        let fetcher = PostFetcher::new(Arc::new(factory.clone()), empty.path().join("cookies/cookies.txt"), 2);

        let result = fetcher.fetch(POST_URL, FetchMode::UrlsOnly).await;

        assert!(!result.is_success());
        assert!(result.message.starts_with("Cookies file not found at "));
        assert!(result.message.contains(&empty.path().join("cookies/cookies.txt").display().to_string()));
        assert!(result.payload.values().is_empty());
        assert_eq!(factory.opens(), 0);
        assert_eq!(factory.fetches(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_cookies_are_invalid() {
        let factory = MockFactory::returning(Ok(image_post("ABC123")));
        let cookies = cookie_dir("# Netscape HTTP Cookie File\n.instagram.com\tTRUE\t/\tTRUE\t0\tsessionid\tonly\n");

        let err = fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::CredentialsInvalid);
        assert_eq!(factory.opens(), 0);
    }

    #[tokio::test]
    async fn test_session_gets_loaded_credentials() {
        let factory = MockFactory::returning(Ok(image_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);

        fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap();

        let credentials = factory.state.last_credentials.lock().unwrap().clone().unwrap();
        assert_eq!(credentials.session_id, "123%3Asession");
        assert_eq!(credentials.csrf_token, "csrf123");
        assert_eq!(factory.opens(), 1);
    }

    #[tokio::test]
    async fn test_single_image_returns_display_url() {
        let factory = MockFactory::returning(Ok(image_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);

        let result = fetcher(&factory, &cookies).fetch(POST_URL, FetchMode::UrlsOnly).await;

        assert!(result.is_success());
        assert_eq!(result.message, "Media URLs extracted successfully.");
        assert_eq!(result.payload.values(), ["https://cdn.example/ABC123.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_single_video_returns_video_url() {
        let factory = MockFactory::returning(Ok(video_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);

        let items = fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap();

        assert_eq!(urls(&items), vec!["https://cdn.example/ABC123.mp4"]);
        assert_eq!(items[0].kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_gallery_returns_children_in_order() {
        let factory = MockFactory::returning(Ok(gallery_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);

        let items = fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap();

        assert_eq!(
            urls(&items),
            vec![
                "https://cdn.example/g1.jpg",
                "https://cdn.example/g2.mp4",
                "https://cdn.example/g3.jpg"
            ]
        );
    }

    #[tokio::test]
    async fn test_urls_only_is_deterministic() {
        let factory = MockFactory::returning(Ok(gallery_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);
        let fetcher = fetcher(&factory, &cookies);

        let first = serde_json::to_vec(&fetcher.fetch(POST_URL, FetchMode::UrlsOnly).await).unwrap();
        let second = serde_json::to_vec(&fetcher.fetch(POST_URL, FetchMode::UrlsOnly).await).unwrap();

        assert_eq!(first, second);
        assert_eq!(factory.opens(), 2);
    }

    #[tokio::test]
    async fn test_urls_only_never_retries() {
        let factory = MockFactory::returning(Err(InstagramError::Connection("reset by peer".into())));
        let cookies = cookie_dir(TEST_COOKIES);

        let err = fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Unclassified(ref msg) if msg.contains("reset by peer")));
        assert_eq!(factory.fetches(), 1);
    }

    #[tokio::test]
    async fn test_login_required_and_blocked_are_distinct() {
        let cookies = cookie_dir(TEST_COOKIES);

        let factory = MockFactory::returning(Err(InstagramError::LoginRequired("HTTP 401".into())));
        let login = fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap_err();

        let factory = MockFactory::returning(Err(InstagramError::Blocked("HTTP 403 Forbidden".into())));
        let blocked = fetcher(&factory, &cookies)
            .resolve(POST_URL, &FetchMode::UrlsOnly)
            .await
            .unwrap_err();

        assert!(matches!(login, FetchError::AuthenticationRequired { .. }));
        assert!(matches!(blocked, FetchError::RequestBlocked { ref reason, .. } if reason == "HTTP 403 Forbidden"));
        assert_ne!(login.to_string(), blocked.to_string());
    }

    #[tokio::test]
    async fn test_download_retries_transient_failure_once() {
        let factory = MockFactory::returning(Ok(gallery_post("ABC123")))
            .with_downloads(vec![Err(InstagramError::Connection("timed out".into()))]);
        let cookies = cookie_dir(TEST_COOKIES);
        let target = cookies.path().join("ig_downloads_test");

        let result = fetcher(&factory, &cookies)
            .fetch(
                POST_URL,
                FetchMode::Download {
                    target_dir: target.clone(),
                },
            )
            .await;

        assert!(result.is_success(), "{}", result.message);
        assert_eq!(factory.downloads(), 2);
        assert_eq!(
            result.payload.values(),
            [
                target.join("ABC123_1.jpg").display().to_string(),
                target.join("ABC123_2.mp4").display().to_string(),
                target.join("ABC123_3.jpg").display().to_string(),
            ]
        );
        assert!(result.message.contains("ig_downloads_test"));
    }

    #[tokio::test]
    async fn test_download_gives_up_after_retry_budget() {
        let factory = MockFactory::returning(Ok(image_post("ABC123"))).with_downloads(vec![
            Err(InstagramError::Connection("timed out".into())),
            Err(InstagramError::Connection("timed out".into())),
            Err(InstagramError::Connection("timed out".into())),
            Ok(()),
        ]);
        let cookies = cookie_dir(TEST_COOKIES);

        let err = fetcher(&factory, &cookies)
            .resolve(
                POST_URL,
                &FetchMode::Download {
                    target_dir: cookies.path().join("out"),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::TransientConnectivity { retries: 2, .. }));
        assert_eq!(factory.downloads(), 3);
    }

    #[tokio::test]
    async fn test_download_blocked_aborts_without_retry() {
        let factory = MockFactory::returning(Ok(image_post("ABC123")))
            .with_downloads(vec![Err(InstagramError::Blocked("HTTP 403 Forbidden".into()))]);
        let cookies = cookie_dir(TEST_COOKIES);

        let err = fetcher(&factory, &cookies)
            .resolve(
                POST_URL,
                &FetchMode::Download {
                    target_dir: cookies.path().join("out"),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::RequestBlocked { .. }));
        assert_eq!(factory.downloads(), 1);
    }

    #[tokio::test]
    async fn test_download_lists_only_this_post() {
        let factory = MockFactory::returning(Ok(video_post("ABC123")));
        let cookies = cookie_dir(TEST_COOKIES);
        let target = cookies.path().join("nested/out");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("OTHER_1.jpg"), b"x").unwrap();

        let items = fetcher(&factory, &cookies)
            .resolve(
                POST_URL,
                &FetchMode::Download {
                    target_dir: target.clone(),
                },
            )
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, MediaKind::Video);
        assert_eq!(items[0].location, MediaLocation::Local(target.join("ABC123_1.mp4")));
    }
}
