use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Image,
    Video,
    Gallery,
}

/// One piece of media as the platform describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaNode {
    pub display_url: String,
    pub video_url: Option<String>,
}

impl MediaNode {
    pub fn image(display_url: impl Into<String>) -> Self {
        Self {
            display_url: display_url.into(),
            video_url: None,
        }
    }

    pub fn video(display_url: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            display_url: display_url.into(),
            video_url: Some(video_url.into()),
        }
    }

    pub fn kind(&self) -> MediaKind {
        if self.video_url.is_some() {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// The URL worth fetching: the video for videos, the still otherwise.
    pub fn media_url(&self) -> &str {
        self.video_url.as_deref().unwrap_or(&self.display_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostContent {
    Single(MediaNode),
    /// Children in the order the post declares them.
    Gallery(Vec<MediaNode>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub shortcode: String,
    pub owner: Option<String>,
    pub content: PostContent,
}

impl Post {
    pub fn kind(&self) -> PostKind {
        match &self.content {
            PostContent::Single(node) => match node.kind() {
                MediaKind::Image => PostKind::Image,
                MediaKind::Video => PostKind::Video,
            },
            PostContent::Gallery(_) => PostKind::Gallery,
        }
    }

    pub fn nodes(&self) -> &[MediaNode] {
        match &self.content {
            PostContent::Single(node) => std::slice::from_ref(node),
            PostContent::Gallery(nodes) => nodes,
        }
    }

    pub fn remote_items(&self) -> Vec<MediaItem> {
        self.nodes()
            .iter()
            .map(|node| MediaItem {
                kind: node.kind(),
                location: MediaLocation::Remote(node.media_url().to_string()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocation {
    Remote(String),
    Local(PathBuf),
}

impl Display for MediaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaLocation::Remote(url) => write!(f, "{}", url),
            MediaLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub location: MediaLocation,
}
