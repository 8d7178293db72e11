use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::Reference;

/// A stored favorite as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    #[serde(rename = "_id")]
    pub id: String,
    pub post_id: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Reference>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Favorite {
    pub fn post_id(&self) -> &str {
        self.post_id.id()
    }
}

/// The viewer's relation to one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecord {
    pub post_id: String,
    pub is_favorited: bool,
    pub count: u64,
}

impl FavoriteRecord {
    pub fn new(post_id: String) -> Self {
        Self {
            post_id,
            is_favorited: false,
            count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_favorite_with_populated_post() {
        let fav: Favorite = serde_json::from_value(json!({
            "_id": "f1",
            "post_id": {"_id": "p1", "title": "ignored"},
            "user_id": "u1"
        }))
        .unwrap();
        assert_eq!(fav.post_id(), "p1");
        assert_eq!(fav.user_id.as_ref().map(Reference::id), Some("u1"));
    }

    #[test]
    fn test_favorite_with_bare_post_id() {
        let fav: Favorite = serde_json::from_value(json!({"_id": "f2", "post_id": "p2"})).unwrap();
        assert_eq!(fav.post_id(), "p2");
        assert!(fav.created_at.is_none());
    }

    #[test]
    fn test_new_record_defaults() {
        let record = FavoriteRecord::new("p1".into());
        assert!(!record.is_favorited);
        assert_eq!(record.count, 0);
    }
}
