//! Ephemeral stories and their visibility rule.

use serde::{Deserialize, Serialize};

use crate::clock::{Timestamp, iso8601};
use crate::error::{EngagementError, Result};
use crate::{StoryId, UserId};

/// A story is visible at `t` iff it never expires or expires strictly after `t`.
pub fn is_visible(expires_at: Option<Timestamp>, t: Timestamp) -> bool {
    match expires_at {
        None => true,
        Some(expires_at) => expires_at > t,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Accepts the bare kind (`image`, `video`) or a MIME type (`image/png`).
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        let top = raw.split('/').next().unwrap_or_default();
        match top {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(EngagementError::validation(format!(
                "unsupported media kind '{raw}', expected image or video"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Optional text drawn over the story media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    #[serde(default)]
    pub overlay_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub arabic: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
}

/// Story creation request as it arrives from the API layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    #[serde(default)]
    pub media_ref: Option<String>,
    #[serde(default)]
    pub media_kind: Option<String>,
    #[serde(flatten)]
    pub overlay: Overlay,
    /// Seconds until the story stops being visible. Absent means never.
    #[serde(default, alias = "ttl")]
    pub ttl_secs: Option<i64>,
}

impl NewStory {
    /// Validate and stamp the request with its owner and creation time.
    pub fn into_draft(self, owner_id: UserId, now: Timestamp) -> Result<StoryDraft> {
        let media_ref = self
            .media_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| EngagementError::validation("media reference is required"))?;

        let media_kind = match self.media_kind.as_deref() {
            Some(raw) => MediaKind::parse(raw)?,
            None => return Err(EngagementError::validation("media kind is required")),
        };

        let expires_at = match self.ttl_secs {
            Some(ttl) if ttl < 0 => {
                return Err(EngagementError::validation("ttl must not be negative"));
            }
            Some(ttl) => Some(now.checked_add(ttl).ok_or_else(|| {
                EngagementError::validation("ttl is out of range")
            })?),
            None => None,
        };

        Ok(StoryDraft {
            owner_id,
            media_ref,
            media_kind,
            overlay: self.overlay,
            created_at: now,
            expires_at,
        })
    }
}

/// A validated story not yet assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub owner_id: UserId,
    pub media_ref: String,
    pub media_kind: MediaKind,
    pub overlay: Overlay,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub owner_id: UserId,
    pub media_ref: String,
    pub media_kind: MediaKind,
    #[serde(flatten)]
    pub overlay: Overlay,
    #[serde(serialize_with = "iso8601::serialize")]
    pub created_at: Timestamp,
    #[serde(serialize_with = "iso8601::option::serialize")]
    pub expires_at: Option<Timestamp>,
}

/// A visible story annotated for the caller reading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryFeedItem {
    #[serde(flatten)]
    pub story: Story,
    pub owner_name: Option<String>,
    pub view_count: u64,
    pub viewed_by_caller: bool,
}

/// Which stories a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryScope {
    All,
    ByOwner(UserId),
}

impl StoryScope {
    pub fn owner(self) -> Option<UserId> {
        match self {
            Self::All => None,
            Self::ByOwner(owner) => Some(owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(media_ref: Option<&str>, kind: Option<&str>, ttl: Option<i64>) -> NewStory {
        NewStory {
            media_ref: media_ref.map(String::from),
            media_kind: kind.map(String::from),
            overlay: Overlay::default(),
            ttl_secs: ttl,
        }
    }

    #[test]
    fn test_never_expiring_story_is_always_visible() {
        assert!(is_visible(None, i64::MIN));
        assert!(is_visible(None, 0));
        assert!(is_visible(None, i64::MAX));
    }

    #[test]
    fn test_story_not_visible_at_its_expiry_instant() {
        assert!(is_visible(Some(100), 99));
        assert!(!is_visible(Some(100), 100));
        assert!(!is_visible(Some(100), 101));
    }

    #[test]
    fn test_media_kind_accepts_mime_types() {
        assert_eq!(MediaKind::parse("image/png").unwrap(), MediaKind::Image);
        assert_eq!(MediaKind::parse("VIDEO/mp4").unwrap(), MediaKind::Video);
        assert_eq!(MediaKind::parse("video").unwrap(), MediaKind::Video);
        assert!(matches!(
            MediaKind::parse("audio/mpeg"),
            Err(EngagementError::Validation(_))
        ));
    }

    #[test]
    fn test_draft_with_ttl_expires_relative_to_now() {
        let draft = request(Some("s/1.jpg"), Some("image/jpeg"), Some(3600))
            .into_draft(7, 1_000)
            .unwrap();
        assert_eq!(draft.owner_id, 7);
        assert_eq!(draft.created_at, 1_000);
        assert_eq!(draft.expires_at, Some(4_600));
    }

    #[test]
    fn test_draft_without_ttl_never_expires() {
        let draft = request(Some("s/1.jpg"), Some("image"), None)
            .into_draft(7, 1_000)
            .unwrap();
        assert_eq!(draft.expires_at, None);
    }

    #[test]
    fn test_draft_requires_media_reference() {
        for media_ref in [None, Some(""), Some("   ")] {
            let err = request(media_ref, Some("image"), None)
                .into_draft(1, 0)
                .unwrap_err();
            assert!(matches!(err, EngagementError::Validation(_)), "{err}");
        }
    }

    #[test]
    fn test_draft_rejects_negative_ttl() {
        let err = request(Some("a.mp4"), Some("video"), Some(-1))
            .into_draft(1, 0)
            .unwrap_err();
        assert!(matches!(err, EngagementError::Validation(_)));
    }

    #[test]
    fn test_story_serializes_camel_case_with_iso_dates() {
        let story = Story {
            id: 3,
            owner_id: 9,
            media_ref: "stories/a.jpg".into(),
            media_kind: MediaKind::Image,
            overlay: Overlay {
                overlay_type: Some("verse".into()),
                ..Overlay::default()
            },
            created_at: 0,
            expires_at: None,
        };
        let json = serde_json::to_value(&story).unwrap();
        assert_eq!(json["ownerId"], 9);
        assert_eq!(json["mediaKind"], "image");
        assert_eq!(json["overlayType"], "verse");
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(json["expiresAt"].is_null());
    }

    proptest! {
        #[test]
        fn prop_expiring_story_invisible_after_expiry(
            expires_at in -1_000_000_000i64..1_000_000_000,
            after in 1i64..1_000_000_000,
        ) {
            prop_assert!(!is_visible(Some(expires_at), expires_at + after));
        }

        #[test]
        fn prop_ttl_zero_hidden_one_second_later(now in 0i64..4_000_000_000) {
            let draft = request(Some("m.jpg"), Some("image"), Some(0))
                .into_draft(1, now)
                .unwrap();
            prop_assert!(!is_visible(draft.expires_at, now + 1));
        }
    }
}
