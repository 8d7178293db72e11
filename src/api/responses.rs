//! Response envelopes of the REST backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::{Favorite, Post};

fn one() -> u32 {
    1
}

/// Post lists drop records that fail to decode instead of failing the whole page.
fn lenient_posts<'de, D>(deserializer: D) -> Result<Vec<Post>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|value| {
            let id = value
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            serde_json::from_value::<Post>(value)
                .map_err(|e| warn!("Skipping malformed post {}: {}", id, e))
                .ok()
        })
        .collect())
}

/// `GET /posts`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostListing {
    #[serde(default, deserialize_with = "lenient_posts")]
    pub posts: Vec<Post>,
    #[serde(rename = "totalPages", default = "one")]
    pub total_pages: u32,
    #[serde(rename = "totalCount", default)]
    pub total_count: u64,
}

/// `GET /posts/slug/:slug`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostWithRelated {
    pub post: Post,
    #[serde(rename = "relevantPosts", default, deserialize_with = "lenient_posts")]
    pub relevant_posts: Vec<Post>,
}

/// `GET /posts/user/:userId`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserPosts {
    #[serde(default, deserialize_with = "lenient_posts")]
    pub posts: Vec<Post>,
    #[serde(rename = "totalPages", default = "one")]
    pub total_pages: u32,
}

/// `POST /favorites`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FavoriteEnvelope {
    pub data: Favorite,
}

/// `GET /favorites/user/:userId`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FavoriteList {
    #[serde(default)]
    pub data: Vec<Favorite>,
}

/// `GET /favorites/check/:postId`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FavoriteCheck {
    #[serde(rename = "isFavorited")]
    pub is_favorited: bool,
}

/// `GET /favorites/count/:postId`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FavoriteCount {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_defaults() {
        let listing: PostListing = serde_json::from_value(json!({"posts": []})).unwrap();
        assert_eq!(listing.total_pages, 1);
        assert_eq!(listing.total_count, 0);
    }

    #[test]
    fn test_listing_skips_malformed_posts() {
        let listing: PostListing = serde_json::from_value(json!({
            "posts": [
                {"_id": "n1", "post_type": "news", "title": "A", "slug": "a"},
                {"_id": "e1", "post_type": "events", "title": "No date", "slug": "no-date"},
                {"_id": "n2", "post_type": "news", "title": "B", "slug": "b"}
            ],
            "totalPages": 2,
            "totalCount": 12
        }))
        .unwrap();

        let ids: Vec<&str> = listing.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2"]);
        assert_eq!(listing.total_count, 12);
    }

    #[test]
    fn test_post_with_related() {
        let body: PostWithRelated = serde_json::from_value(json!({
            "post": {"_id": "n1", "post_type": "news", "title": "A", "slug": "a"},
            "relevantPosts": [{"_id": "n2", "post_type": "news", "title": "B", "slug": "b"}]
        }))
        .unwrap();
        assert_eq!(body.post.id, "n1");
        assert_eq!(body.relevant_posts.len(), 1);
    }
}
