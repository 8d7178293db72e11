pub mod commands;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::domain::{
    parse_tags, slugify, ContentType, EventDetails, PostDetails, PostDraft, PriceRange,
    RestaurantDetails, ValidationErrors,
};
use crate::store::partition::DEFAULT_FILTER;
use crate::store::SortOption;

#[derive(Parser)]
#[command(name = "plaza")]
#[command(about = "Browse and publish news, events and restaurant posts", long_about = None)]
pub struct Cli {
    /// API base URL, overriding the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List posts of one type, or the first page of every type
    List {
        /// news, events or restaurants
        content_type: Option<ContentType>,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Posts per page (default from config)
        #[arg(long)]
        per_page: Option<u32>,

        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short, long, default_value = DEFAULT_FILTER)]
        filter: String,

        /// newest, oldest, a-z or z-a
        #[arg(long, default_value_t = SortOption::Newest)]
        sort: SortOption,
    },
    /// Show a post with its related posts
    Show {
        /// Slug of the post
        slug: String,

        /// Treat the argument as a post id
        #[arg(long)]
        id: bool,
    },
    /// List every post by an author
    PostsBy {
        user_id: String,
    },
    /// Publish a new post
    Create(PostArgs),
    /// Edit an existing post; unset options keep their current value
    Update {
        id: String,

        #[command(flatten)]
        post: PostArgs,
    },
    /// Delete a post
    Delete {
        id: String,
    },
    /// Toggle your favorite on a post
    Favorite {
        post_id: String,
    },
    /// List a user's favorites, or remove one
    Favorites {
        user_id: String,

        /// Favorite id to remove
        #[arg(long)]
        remove: Option<String>,
    },
    /// Subscribe an email address to the newsletter
    Subscribe {
        email: String,
    },
    /// Show a profile (yours when no id is given)
    Profile {
        user_id: Option<String>,
    },
    /// Change your display name or avatar
    UpdateProfile {
        user_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Store an access token for authenticated requests
    Login {
        token: String,
    },
    /// Forget the stored access token
    Logout,
}

/// Post form fields. Event and restaurant options only apply to their type.
#[derive(Args, Debug, Default)]
pub struct PostArgs {
    /// news, events or restaurants
    #[arg(long = "type")]
    pub content_type: Option<ContentType>,

    #[arg(long)]
    pub title: Option<String>,

    /// Body, HTML allowed
    #[arg(long)]
    pub content: Option<String>,

    /// Derived from the title when omitted
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    /// Comma-separated
    #[arg(long)]
    pub tags: Option<String>,

    /// Event start, RFC 3339
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub opening_hours: Option<String>,

    /// $ to $$$$
    #[arg(long)]
    pub price_range: Option<PriceRange>,

    /// Comma-separated cuisine categories
    #[arg(long)]
    pub categories: Option<String>,
}

impl PostArgs {
    /// A fresh draft. Type, title and content are required.
    pub fn to_draft(&self) -> Result<PostDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(content_type) = self.content_type else {
            errors.add("post_type", "Post type is required");
            return Err(errors);
        };

        let details = self.details(content_type, None)?;
        let mut draft = PostDraft::new(
            self.title.as_deref().unwrap_or_default(),
            self.content.as_deref().unwrap_or_default(),
            details,
        );
        self.overlay(&mut draft);
        Ok(draft)
    }

    /// Applies the options that were given on top of an existing draft.
    pub fn apply_to(&self, draft: &mut PostDraft) -> Result<(), ValidationErrors> {
        let content_type = self.content_type.unwrap_or(draft.content_type());
        draft.details = self.details(content_type, Some(&draft.details))?;
        if let Some(title) = &self.title {
            draft.title = title.clone();
        }
        if let Some(content) = &self.content {
            draft.content = content.clone();
        }
        self.overlay(draft);
        Ok(())
    }

    fn overlay(&self, draft: &mut PostDraft) {
        if let Some(slug) = &self.slug {
            draft.slug = slugify(slug);
        }
        if let Some(image) = &self.image {
            draft.image = Some(image.clone()).filter(|s| !s.is_empty());
        }
        if let Some(tags) = &self.tags {
            draft.tags = parse_tags(tags);
        }
    }

    fn details(
        &self,
        content_type: ContentType,
        existing: Option<&PostDetails>,
    ) -> Result<PostDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let details = match content_type {
            ContentType::News => PostDetails::News,
            ContentType::Events => {
                let current = match existing {
                    Some(PostDetails::Event(event)) => Some(event),
                    _ => None,
                };
                match self.date.or(current.map(|e| e.date)) {
                    Some(date) => PostDetails::Event(EventDetails {
                        date,
                        location: pick(&self.location, current.map(|e| &e.location)),
                        description: pick(&self.description, current.map(|e| &e.description)),
                    }),
                    None => {
                        errors.add("event_details.date", "Date is required");
                        return Err(errors);
                    }
                }
            }
            ContentType::Restaurants => {
                let current = match existing {
                    Some(PostDetails::Restaurant(restaurant)) => Some(restaurant),
                    _ => None,
                };
                let Some(price_range) = self.price_range.or(current.map(|r| r.price_range)) else {
                    errors.add("restaurant_details.price_range", "Price range is required");
                    return Err(errors);
                };
                PostDetails::Restaurant(RestaurantDetails {
                    longitude: self
                        .longitude
                        .or(current.map(|r| r.longitude))
                        .unwrap_or(f64::NAN),
                    latitude: self
                        .latitude
                        .or(current.map(|r| r.latitude))
                        .unwrap_or(f64::NAN),
                    address: pick(&self.address, current.map(|r| &r.address)),
                    opening_hours: pick(&self.opening_hours, current.map(|r| &r.opening_hours)),
                    price_range,
                    categories: match &self.categories {
                        Some(raw) => parse_tags(raw),
                        None => current.map(|r| r.categories.clone()).unwrap_or_default(),
                    },
                })
            }
        };

        Ok(details)
    }
}

fn pick(given: &Option<String>, current: Option<&String>) -> String {
    given.clone().or_else(|| current.cloned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::post;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_list_defaults() {
        let cli = parse(&["plaza", "list", "events"]);
        match cli.command {
            Commands::List {
                content_type,
                page,
                per_page,
                search,
                filter,
                sort,
            } => {
                assert_eq!(content_type, Some(ContentType::Events));
                assert_eq!(page, 1);
                assert_eq!(per_page, None);
                assert!(search.is_empty());
                assert_eq!(filter, "all");
                assert_eq!(sort, SortOption::Newest);
            }
            _ => panic!("expected list"),
        }
        assert!(cli.base_url.is_none());
    }

    #[test]
    fn test_global_base_url_after_subcommand() {
        let cli = parse(&["plaza", "list", "--sort", "z-a", "--base-url", "http://api.test/api"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://api.test/api"));
    }

    #[test]
    fn test_create_restaurant_draft() {
        let cli = parse(&[
            "plaza",
            "create",
            "--type",
            "restaurant",
            "--title",
            "Pho Corner",
            "--content",
            "<p>Broth</p>",
            "--longitude",
            "-0.12",
            "--latitude",
            "51.5",
            "--address",
            "1 Strand",
            "--opening-hours",
            "11-22",
            "--price-range",
            "$$",
            "--categories",
            "Vietnamese, Noodles",
            "--tags",
            "pho,soup",
        ]);
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };

        let draft = args.to_draft().unwrap();

        assert_eq!(draft.slug, "pho-corner");
        assert_eq!(draft.tags, vec!["pho", "soup"]);
        match &draft.details {
            PostDetails::Restaurant(r) => {
                assert_eq!(r.longitude, -0.12);
                assert_eq!(r.price_range, PriceRange::Moderate);
                assert_eq!(r.categories, vec!["Vietnamese", "Noodles"]);
            }
            other => panic!("expected restaurant details, got {:?}", other),
        }
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_event_without_date_is_rejected() {
        let args = PostArgs {
            content_type: Some(ContentType::Events),
            title: Some("Jazz night".into()),
            ..Default::default()
        };
        let errors = args.to_draft().unwrap_err();
        assert_eq!(errors.get("event_details.date"), Some("Date is required"));
    }

    #[test]
    fn test_restaurant_without_coordinates_fails_validation() {
        let args = PostArgs {
            content_type: Some(ContentType::Restaurants),
            title: Some("Banh Mi".into()),
            content: Some("Crunchy".into()),
            price_range: Some(PriceRange::Budget),
            ..Default::default()
        };
        let errors = args.to_draft().unwrap().validate().unwrap_err();
        assert!(errors.get("restaurant_details.longitude").is_some());
        assert!(errors.get("restaurant_details.address").is_some());
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let existing = post("e1", ContentType::Events);
        let mut draft = PostDraft::from(&existing);
        let args = PostArgs {
            location: Some("Old Town Square".into()),
            ..Default::default()
        };

        args.apply_to(&mut draft).unwrap();

        assert_eq!(draft.title, existing.title);
        assert_eq!(draft.slug, existing.slug);
        match &draft.details {
            PostDetails::Event(event) => {
                assert_eq!(event.location, "Old Town Square");
                assert_eq!(event.description, "Live music");
            }
            other => panic!("expected event details, got {:?}", other),
        }
    }
}
