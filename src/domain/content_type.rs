use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::PlazaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    News,
    Events,
    Restaurants,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::News, ContentType::Events, ContentType::Restaurants];

    /// Value used for `post_type` on the wire and as the route segment.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::News => "news",
            ContentType::Events => "events",
            ContentType::Restaurants => "restaurants",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ContentType::News => "News",
            ContentType::Events => "Events",
            ContentType::Restaurants => "Restaurants",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ContentType::News => 0,
            ContentType::Events => 1,
            ContentType::Restaurants => 2,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = PlazaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "news" => Ok(ContentType::News),
            "events" | "event" => Ok(ContentType::Events),
            "restaurants" | "restaurant" => Ok(ContentType::Restaurants),
            other => Err(PlazaError::Other(format!("Unknown content type: {}", other))),
        }
    }
}
