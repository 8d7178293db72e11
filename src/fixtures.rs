//! Sample posts shared by the unit tests.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::domain::{
    ContentType, EventDetails, Post, PostDetails, PriceRange, Reference, RestaurantDetails,
};

pub fn t0() -> DateTime<Utc> {
    "2024-03-01T12:00:00Z".parse().unwrap()
}

pub fn post(id: &str, content_type: ContentType) -> Post {
    let details = match content_type {
        ContentType::News => PostDetails::News,
        ContentType::Events => PostDetails::Event(EventDetails {
            date: "2024-06-01T18:00:00Z".parse().unwrap(),
            location: "Riverside Park".into(),
            description: "Live music".into(),
        }),
        ContentType::Restaurants => PostDetails::Restaurant(RestaurantDetails {
            longitude: 106.70,
            latitude: 10.77,
            address: "1 Le Loi".into(),
            opening_hours: "10:00-22:00".into(),
            price_range: PriceRange::Moderate,
            categories: vec!["Vietnamese".into()],
        }),
    };

    Post {
        id: id.into(),
        title: format!("Post {}", id),
        slug: format!("post-{}", id),
        content: "<p>Body</p>".into(),
        image: None,
        tags: vec![],
        created_at: Some(t0()),
        author: Some(Reference::Id("u1".into())),
        details,
    }
}

pub fn post_json(id: &str, content_type: ContentType) -> Value {
    serde_json::to_value(post(id, content_type)).unwrap()
}

pub fn listing(ids: &[&str], content_type: ContentType, total_pages: u32, total_count: u64) -> Value {
    let posts: Vec<Value> = ids.iter().map(|id| post_json(id, content_type)).collect();
    json!({"posts": posts, "totalPages": total_pages, "totalCount": total_count})
}
