/// Entities kept in the persisted collections
///
/// Each entity carries an opaque unique `id` and a `created_at` timestamp
/// assigned by its collection. The `New*` drafts are what callers hand to
/// `add`; the collection fills in identity and time.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::collection::{Entity, Identified};

// ========== Guestbook ==========

/// What a guest left in the guestbook
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    /// A plain text note
    Text { content: String },
    /// A finger drawing, stored as an image data URL or file path
    Drawing { image: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuestMessage {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl GuestMessage {
    /// Text content, or `None` for drawings
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { content } => Some(content),
            MessageBody::Drawing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuestMessage {
    pub author: String,
    pub body: MessageBody,
}

impl NewGuestMessage {
    pub fn text(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: MessageBody::Text {
                content: content.into(),
            },
        }
    }

    pub fn drawing(author: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: MessageBody::Drawing {
                image: image.into(),
            },
        }
    }
}

impl Identified for GuestMessage {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for GuestMessage {
    type Draft = NewGuestMessage;

    fn from_draft(id: String, created_at: DateTime<Utc>, draft: NewGuestMessage) -> Self {
        Self {
            id,
            created_at,
            author: draft.author,
            body: draft.body,
        }
    }
}

// ========== Photo booth ==========

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Captured image (data URL or file path)
    pub image: String,
    /// Name of the filter applied at capture time
    #[serde(default)]
    pub filter: Option<String>,
    /// Extra frames accumulated during a photo-strip capture session
    #[serde(default)]
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub image: String,
    pub filter: Option<String>,
}

impl Identified for Photo {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Photo {
    type Draft = NewPhoto;

    fn from_draft(id: String, created_at: DateTime<Utc>, draft: NewPhoto) -> Self {
        Self {
            id,
            created_at,
            image: draft.image,
            filter: draft.filter,
            frames: Vec::new(),
        }
    }
}

// ========== Resolutions ==========

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Health,
    Career,
    Personal,
    Learning,
    Adventure,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Health,
        Category::Career,
        Category::Personal,
        Category::Learning,
        Category::Adventure,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Career => "career",
            Category::Personal => "personal",
            Category::Learning => "learning",
            Category::Adventure => "adventure",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category {s:?}, expected one of: {}", names.join(", "))
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    #[serde(default)]
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResolution {
    pub text: String,
    pub category: Category,
}

impl Identified for Resolution {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Resolution {
    type Draft = NewResolution;

    fn from_draft(id: String, created_at: DateTime<Utc>, draft: NewResolution) -> Self {
        Self {
            id,
            created_at,
            text: draft.text,
            category: draft.category,
        }
    }
}

// ========== Favorites ==========

/// A favorited item. `id` is the id of the item itself (e.g. a meme).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Identified for FavoriteEntry {
    fn id(&self) -> &str {
        &self.id
    }
}
