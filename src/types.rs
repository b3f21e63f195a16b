use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClientError;

/// Kind of bookmarked link. The backend has used a few spellings for LinkedIn
/// over time, all of them are accepted on the way in. Anything else decodes
/// as `Other` and is shown as a plain card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Youtube,
    Twitter,
    #[serde(alias = "linkdIn", alias = "linkdin", alias = "linkedIn")]
    Linkedin,
    #[serde(other)]
    Other,
}

impl ContentType {
    pub fn label(self) -> &'static str {
        match self {
            ContentType::Youtube => "youtube",
            ContentType::Twitter => "twitter",
            ContentType::Linkedin => "linkedin",
            ContentType::Other => "other",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" | "yt" => Ok(ContentType::Youtube),
            "twitter" | "x" => Ok(ContentType::Twitter),
            "linkedin" | "linkdin" => Ok(ContentType::Linkedin),
            other => Err(format!("unknown content type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TagRepr")]
pub struct Tag {
    pub id: String,
    pub text: String,
}

/// Tags arrive either populated or as bare ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Full {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default, alias = "title")]
        text: String,
    },
    Id(String),
}

impl From<TagRepr> for Tag {
    fn from(repr: TagRepr) -> Self {
        match repr {
            TagRepr::Full { id, text } => Tag { id, text },
            TagRepr::Id(id) => Tag {
                id,
                text: String::new(),
            },
        }
    }
}

/// A saved bookmark as returned by the backend. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Response shape shared by `GET /content` and `POST /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub contents: Vec<ContentItem>,
}

/// One bad record must not cost the user the whole list.
fn skip_malformed<'de, D>(deserializer: D) -> Result<Vec<ContentItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value(value)
                .map_err(|e| tracing::warn!("Skipping malformed content item: {e}"))
                .ok()
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub search_term: &'a str,
}

/// Body of `POST /content`. Tags go over the wire as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewContent {
    pub title: String,
    pub link: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigninResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareRequest {
    pub share: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareResponse {
    #[serde(default)]
    pub hash: Option<String>,
}

/// Tags being composed for a new bookmark, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: Vec<Tag>,
    next_seq: u64,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Input is trimmed; empty input and case-insensitive
    /// duplicates are rejected.
    pub fn add(&mut self, text: &str) -> Result<&Tag, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidTag("tag is empty".to_string()));
        }
        let lowered = text.to_lowercase();
        if self.tags.iter().any(|t| t.text.to_lowercase() == lowered) {
            return Err(ClientError::InvalidTag(format!("duplicate tag '{text}'")));
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.next_seq += 1;
        self.tags.push(Tag {
            id: format!("{millis}-{}", self.next_seq),
            text: text.to_string(),
        });
        Ok(&self.tags[self.tags.len() - 1])
    }

    /// Remove a tag by id. Returns false if no tag had that id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.id != id);
        self.tags.len() != before
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn into_texts(self) -> Vec<String> {
        self.tags.into_iter().map(|t| t.text).collect()
    }
}
