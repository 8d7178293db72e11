use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content_type::ContentType;
use super::validation::{is_valid_slug, ValidationErrors};

const MAX_SLUG_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Expensive,
    #[serde(rename = "$$$$")]
    Luxury,
}

impl PriceRange {
    pub fn symbol(self) -> &'static str {
        match self {
            PriceRange::Budget => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Expensive => "$$$",
            PriceRange::Luxury => "$$$$",
        }
    }
}

impl std::str::FromStr for PriceRange {
    type Err = crate::app::PlazaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "$" | "1" => Ok(PriceRange::Budget),
            "$$" | "2" => Ok(PriceRange::Moderate),
            "$$$" | "3" => Ok(PriceRange::Expensive),
            "$$$$" | "4" => Ok(PriceRange::Luxury),
            other => Err(crate::app::PlazaError::Other(format!(
                "Unknown price range: {} (expected $ to $$$$)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantDetails {
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
    pub opening_hours: String,
    pub price_range: PriceRange,
    pub categories: Vec<String>,
}

/// Type-specific fields. The variant decides the post's [`ContentType`].
#[derive(Debug, Clone, PartialEq)]
pub enum PostDetails {
    News,
    Event(EventDetails),
    Restaurant(RestaurantDetails),
}

impl PostDetails {
    pub fn content_type(&self) -> ContentType {
        match self {
            PostDetails::News => ContentType::News,
            PostDetails::Event(_) => ContentType::Events,
            PostDetails::Restaurant(_) => ContentType::Restaurants,
        }
    }
}

/// A user reference that the server sends either as a bare id or populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Reference {
    pub fn id(&self) -> &str {
        match self {
            Reference::Id(id) => id,
            Reference::Populated { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Populated { name, .. } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WirePost", into = "WirePost")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<Reference>,
    pub details: PostDetails,
}

impl Post {
    pub fn content_type(&self) -> ContentType {
        self.details.content_type()
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author.as_ref().map(Reference::id)
    }

    /// Route of the post's detail page.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.content_type(), self.slug)
    }
}

/// Form data for creating or updating a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WirePost", into = "WirePost")]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub details: PostDetails,
}

impl PostDraft {
    /// Starts a draft whose slug is derived from the title.
    pub fn new(title: &str, content: &str, details: PostDetails) -> Self {
        Self {
            title: title.to_string(),
            slug: slugify(title),
            content: content.to_string(),
            image: None,
            tags: Vec::new(),
            details,
        }
    }

    pub fn content_type(&self) -> ContentType {
        self.details.content_type()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.content.trim().is_empty() {
            errors.add("content", "Content is required");
        }
        if self.slug.is_empty() {
            errors.add("slug", "Slug is required");
        } else if !is_valid_slug(&self.slug) {
            errors.add(
                "slug",
                "Slug must be URL-friendly (lowercase letters, numbers, and hyphens only)",
            );
        }
        if let Some(image) = self.image.as_deref().filter(|s| !s.is_empty()) {
            if url::Url::parse(image).is_err() {
                errors.add("image", "Must be a valid URL");
            }
        }

        match &self.details {
            PostDetails::News => {}
            PostDetails::Event(event) => {
                if event.location.trim().is_empty() {
                    errors.add("event_details.location", "Location is required");
                }
                if event.description.trim().is_empty() {
                    errors.add("event_details.description", "Description is required");
                }
            }
            PostDetails::Restaurant(restaurant) => {
                if !restaurant.longitude.is_finite() || restaurant.longitude.abs() > 180.0 {
                    errors.add("restaurant_details.longitude", "Longitude is required");
                }
                if !restaurant.latitude.is_finite() || restaurant.latitude.abs() > 90.0 {
                    errors.add("restaurant_details.latitude", "Latitude is required");
                }
                if restaurant.address.trim().is_empty() {
                    errors.add("restaurant_details.address", "Address is required");
                }
                if restaurant.opening_hours.trim().is_empty() {
                    errors.add("restaurant_details.opening_hours", "Opening hours are required");
                }
            }
        }

        errors.into_result()
    }
}

impl From<&Post> for PostDraft {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            content: post.content.clone(),
            image: post.image.clone(),
            tags: post.tags.clone(),
            details: post.details.clone(),
        }
    }
}

/// Derives a URL-safe slug from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Splits comma-separated tag input, trimming whitespace and surrounding quotes.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|tag| tag.trim().trim_matches('"').trim())
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEventDetails {
    #[serde(default)]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireRestaurantDetails {
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    opening_hours: Option<String>,
    #[serde(default)]
    price_range: Option<PriceRange>,
    #[serde(default)]
    category: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WirePost {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    post_type: ContentType,
    title: String,
    slug: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    posted_by: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_details: Option<WireEventDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    restaurant_details: Option<WireRestaurantDetails>,
}

fn required<T>(value: Option<T>, what: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("missing {}", what))
}

impl WirePost {
    fn details(&self) -> Result<PostDetails, String> {
        match self.post_type {
            ContentType::News => Ok(PostDetails::News),
            ContentType::Events => {
                let wire = required(self.event_details.clone(), "event_details")?;
                Ok(PostDetails::Event(EventDetails {
                    date: required(wire.date, "event_details.date")?,
                    location: required(wire.location, "event_details.location")?,
                    description: required(wire.description, "event_details.description")?,
                }))
            }
            ContentType::Restaurants => {
                let wire = required(self.restaurant_details.clone(), "restaurant_details")?;
                Ok(PostDetails::Restaurant(RestaurantDetails {
                    longitude: required(wire.longitude, "restaurant_details.longitude")?,
                    latitude: required(wire.latitude, "restaurant_details.latitude")?,
                    address: required(wire.address, "restaurant_details.address")?,
                    opening_hours: required(wire.opening_hours, "restaurant_details.opening_hours")?,
                    price_range: required(wire.price_range, "restaurant_details.price_range")?,
                    categories: wire.category,
                }))
            }
        }
    }

    fn from_parts(
        id: Option<String>,
        title: String,
        slug: String,
        content: String,
        image: Option<String>,
        tags: Vec<String>,
        details: PostDetails,
    ) -> Self {
        let post_type = details.content_type();
        let (event_details, restaurant_details) = match details {
            PostDetails::News => (None, None),
            PostDetails::Event(e) => (
                Some(WireEventDetails {
                    date: Some(e.date),
                    location: Some(e.location),
                    description: Some(e.description),
                }),
                None,
            ),
            PostDetails::Restaurant(r) => (
                None,
                Some(WireRestaurantDetails {
                    longitude: Some(r.longitude),
                    latitude: Some(r.latitude),
                    address: Some(r.address),
                    opening_hours: Some(r.opening_hours),
                    price_range: Some(r.price_range),
                    category: r.categories,
                }),
            ),
        };

        Self {
            id,
            post_type,
            title,
            slug,
            content,
            image,
            tags,
            created_at: None,
            posted_by: None,
            event_details,
            restaurant_details,
        }
    }
}

impl TryFrom<WirePost> for Post {
    type Error = String;

    fn try_from(wire: WirePost) -> Result<Self, Self::Error> {
        let details = wire.details()?;
        let id = wire.id.ok_or_else(|| "post is missing _id".to_string())?;
        Ok(Self {
            id,
            title: wire.title,
            slug: wire.slug,
            content: wire.content,
            image: wire.image.filter(|s| !s.is_empty()),
            tags: wire.tags,
            created_at: wire.created_at,
            author: wire.posted_by,
            details,
        })
    }
}

impl From<Post> for WirePost {
    fn from(post: Post) -> Self {
        let mut wire = WirePost::from_parts(
            Some(post.id),
            post.title,
            post.slug,
            post.content,
            post.image,
            post.tags,
            post.details,
        );
        wire.created_at = post.created_at;
        wire.posted_by = post.author;
        wire
    }
}

impl TryFrom<WirePost> for PostDraft {
    type Error = String;

    fn try_from(wire: WirePost) -> Result<Self, Self::Error> {
        let details = wire.details()?;
        Ok(Self {
            title: wire.title,
            slug: wire.slug,
            content: wire.content,
            image: wire.image.filter(|s| !s.is_empty()),
            tags: wire.tags,
            details,
        })
    }
}

impl From<PostDraft> for WirePost {
    fn from(draft: PostDraft) -> Self {
        WirePost::from_parts(
            None,
            draft.title,
            draft.slug,
            draft.content,
            draft.image,
            draft.tags,
            draft.details,
        )
    }
}
