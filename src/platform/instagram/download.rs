use std::path::Path;

use tokio::{fs, io::AsyncWriteExt};
use url::Url;

use crate::{
    platform::{MediaKind, MediaNode, Post, PostContent},
    service::http::HttpService,
};

use super::InstagramError;

pub(super) async fn download_post(http: &HttpService, post: &Post, target: &Path) -> Result<(), InstagramError> {
    let numbered = matches!(post.content, PostContent::Gallery(_));

    for (index, node) in post.nodes().iter().enumerate() {
        let position = numbered.then_some(index + 1);
        let file_name = media_file_name(&post.shortcode, position, node);
        let path = target.join(&file_name);

        info!("Downloading {} {} to {}", node.kind(), node.media_url(), path.display());
        let mut response = http.get(node.media_url()).await?;

        let mut file = fs::File::create(&path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
    }

    Ok(())
}

/// `<shortcode>.<ext>` for single posts, `<shortcode>_<n>.<ext>` for gallery children.
pub fn media_file_name(shortcode: &str, position: Option<usize>, node: &MediaNode) -> String {
    let extension = url_extension(node.media_url()).unwrap_or_else(|| match node.kind() {
        MediaKind::Image => "jpg".to_string(),
        MediaKind::Video => "mp4".to_string(),
    });

    match position {
        Some(n) => format!("{}_{}.{}", shortcode, n, extension),
        None => format!("{}.{}", shortcode, extension),
    }
}

fn url_extension(media_url: &str) -> Option<String> {
    let url = Url::parse(media_url).ok()?;
    let last_segment = url.path_segments()?.last()?;
    let (_, extension) = last_segment.rsplit_once('.')?;

    if extension.is_empty() || extension.len() > 5 || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}
