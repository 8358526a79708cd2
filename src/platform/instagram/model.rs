use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::{MediaNode, Post, PostContent};

use super::InstagramError;

/// The short code that names a post, as in `instagram.com/p/<code>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcode(pub String);

impl Shortcode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Shortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads `data.xdt_shortcode_media` out of a GraphQL query response.
pub fn parse_media_response(response: Value) -> Result<Post, InstagramError> {
    if response.get("require_login").and_then(Value::as_bool) == Some(true) {
        return Err(InstagramError::LoginRequired(
            response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("login required")
                .to_string(),
        ));
    }

    // Instagram answers `"xdt_shortcode_media": null` both for removed posts and
    // for sessions it refuses to serve.
    let media_value = match response.get("data").and_then(|d| d.get("xdt_shortcode_media")) {
        Some(Value::Null) | None => {
            return Err(InstagramError::Blocked("Fetching Post metadata failed.".to_string()));
        }
        Some(value) => value.clone(),
    };

    let media = serde_json::from_value::<XDTGraphMedia>(media_value)
        .map_err(|e| InstagramError::Unexpected(format!("Failed to deserialize media: {}", e)))?;

    Ok(media.into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum XDTGraphMedia {
    #[serde(rename = "XDTGraphImage", alias = "GraphImage")]
    Image(XDTGraphImage),
    #[serde(rename = "XDTGraphVideo", alias = "GraphVideo")]
    Video(XDTGraphVideo),
    #[serde(rename = "XDTGraphSidecar", alias = "GraphSidecar")]
    Sidecar(XDTGraphSidecar),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XDTGraphImage {
    pub shortcode: String,
    pub display_url: String,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XDTGraphVideo {
    pub shortcode: String,
    pub display_url: String,
    pub video_url: String,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XDTGraphSidecar {
    pub shortcode: String,
    pub owner: Option<Owner>,
    pub edge_sidecar_to_children: EdgeSidecarToChildren,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSidecarToChildren {
    pub edges: Vec<SidecarEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarEdge {
    pub node: SidecarNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarNode {
    pub display_url: String,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl From<SidecarNode> for MediaNode {
    fn from(node: SidecarNode) -> Self {
        match (node.is_video, node.video_url) {
            (true, Some(video_url)) => MediaNode::video(node.display_url, video_url),
            _ => MediaNode::image(node.display_url),
        }
    }
}

impl From<XDTGraphMedia> for Post {
    fn from(media: XDTGraphMedia) -> Self {
        match media {
            XDTGraphMedia::Image(image) => Post {
                shortcode: image.shortcode,
                owner: image.owner.map(|o| o.username),
                content: PostContent::Single(MediaNode::image(image.display_url)),
            },
            XDTGraphMedia::Video(video) => Post {
                shortcode: video.shortcode,
                owner: video.owner.map(|o| o.username),
                content: PostContent::Single(MediaNode::video(video.display_url, video.video_url)),
            },
            XDTGraphMedia::Sidecar(sidecar) => Post {
                shortcode: sidecar.shortcode,
                owner: sidecar.owner.map(|o| o.username),
                content: PostContent::Gallery(
                    sidecar
                        .edge_sidecar_to_children
                        .edges
                        .into_iter()
                        .map(|edge| edge.node.into())
                        .collect(),
                ),
            },
        }
    }
}
