pub mod content_type;
pub mod favorite;
pub mod post;
pub mod user;
pub mod validation;

pub use content_type::ContentType;
pub use favorite::{Favorite, FavoriteRecord};
pub use post::{
    parse_tags, slugify, EventDetails, Post, PostDetails, PostDraft, PriceRange, Reference,
    RestaurantDetails,
};
pub use user::{ProfileUpdate, Subscription, User};
pub use validation::{validate_email, ValidationErrors};
