use crate::app::{AppContext, PlazaError, Result};
use crate::coordinator::{PageOutcome, PageRequest, PageSource};
use crate::domain::{ContentType, Post, PostDetails, PostDraft, ProfileUpdate, User};
use crate::favorites::ToggleOutcome;
use crate::format;
use crate::store::SortOption;

use super::PostArgs;

const EXCERPT_LEN: usize = 100;

pub struct ListOptions {
    pub page: u32,
    pub per_page: Option<u32>,
    pub search: String,
    pub filter: String,
    pub sort: SortOption,
}

fn print_post_line(post: &Post) {
    println!(
        "  {} | {} | {}",
        format::date(post.created_at),
        post.title,
        post.path()
    );
}

fn print_page(content_type: ContentType, outcome: &PageOutcome) {
    let pagination = outcome.pagination;
    println!(
        "{} (page {}/{}, {} posts{})",
        content_type.title(),
        pagination.current_page,
        pagination.total_pages,
        pagination.total_count,
        if outcome.source == PageSource::CacheHit {
            ", cached"
        } else {
            ""
        }
    );

    if outcome.posts.is_empty() {
        println!("  No posts");
    }
    for post in &outcome.posts {
        print_post_line(post);
    }
}

pub async fn list_posts(
    ctx: &AppContext,
    content_type: Option<ContentType>,
    options: ListOptions,
) -> Result<()> {
    let per_page = options.per_page.unwrap_or(ctx.per_page());

    let Some(content_type) = content_type else {
        for (content_type, result) in ctx.coordinator.refresh_all(&ContentType::ALL, per_page).await {
            match result {
                Ok(outcome) => print_page(content_type, &outcome),
                Err(e) => eprintln!("{}: {}", content_type.title(), e),
            }
        }
        return Ok(());
    };

    ctx.content.set_search_query(content_type, &options.search);
    ctx.content.set_filter_option(content_type, &options.filter);
    ctx.content.set_sort_option(content_type, options.sort);
    ctx.content.set_page(content_type, options.page);

    let request = PageRequest::new(content_type)
        .page(options.page)
        .per_page(per_page)
        .search(&options.search)
        .filter(&options.filter)
        .sort(options.sort)
        .force(true);
    let outcome = ctx.coordinator.request_page(&request).await?;
    print_page(content_type, &outcome);
    Ok(())
}

fn print_details(details: &PostDetails) {
    match details {
        PostDetails::News => {}
        PostDetails::Event(event) => {
            println!("When:     {}", format::date_time(Some(event.date)));
            println!("Where:    {}", event.location);
            println!("About:    {}", format::plain_text(&event.description));
        }
        PostDetails::Restaurant(restaurant) => {
            println!("Address:  {}", restaurant.address);
            println!("Hours:    {}", restaurant.opening_hours);
            println!("Price:    {}", restaurant.price_range.symbol());
            println!(
                "Location: {:.5}, {:.5}",
                restaurant.latitude, restaurant.longitude
            );
            if !restaurant.categories.is_empty() {
                println!("Cuisine:  {}", restaurant.categories.join(", "));
            }
        }
    }
}

pub async fn show_post(ctx: &AppContext, target: &str, by_id: bool) -> Result<()> {
    let (post, related) = if by_id {
        (ctx.content.get_post(target).await?, Vec::new())
    } else {
        let found = ctx.content.get_post_by_slug(target).await?;
        (found.post, found.relevant_posts)
    };

    println!("{}", post.title);
    println!("{}", "=".repeat(post.title.chars().count()));
    println!(
        "{} | posted {}",
        post.content_type().title(),
        format::to_now(post.created_at, ctx.clock.now())
    );
    if let Some(author) = post.author.as_ref().and_then(|a| a.name()) {
        println!("By {}", author);
    }
    if !post.tags.is_empty() {
        println!("Tags: {}", post.tags.join(", "));
    }
    print_details(&post.details);
    println!();
    println!("{}", format::plain_text(&post.content));

    match ctx.favorites.load(&post.id).await {
        Ok(record) => println!(
            "\n{} favorites{}",
            record.count,
            if record.is_favorited { " (including you)" } else { "" }
        ),
        Err(e) => tracing::debug!("Favorite info unavailable: {}", e),
    }

    if !related.is_empty() {
        println!("\nRelated:");
        for post in &related {
            print_post_line(post);
        }
    }
    Ok(())
}

pub async fn posts_by(ctx: &AppContext, user_id: &str) -> Result<()> {
    let posts = ctx.content.fetch_user_posts(user_id).await?;
    if posts.is_empty() {
        println!("No posts");
        return Ok(());
    }

    for post in &posts {
        println!(
            "  [{}] {} | {}",
            post.content_type(),
            post.title,
            format::excerpt(&format::plain_text(&post.content), EXCERPT_LEN)
        );
    }
    Ok(())
}

pub async fn create_post(ctx: &AppContext, args: &PostArgs) -> Result<()> {
    let draft = args.to_draft().map_err(PlazaError::Validation)?;
    let post = ctx.content.create_post(&draft).await?;
    println!("{} ({})", post.path(), post.id);
    Ok(())
}

pub async fn update_post(ctx: &AppContext, id: &str, args: &PostArgs) -> Result<()> {
    let existing = ctx.content.get_post(id).await?;
    let mut draft = PostDraft::from(&existing);
    args.apply_to(&mut draft).map_err(PlazaError::Validation)?;

    let post = ctx.content.update_post(id, &draft).await?;
    println!("{}", post.path());
    Ok(())
}

pub async fn delete_post(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.content.delete_post(id).await
}

pub async fn toggle_favorite(ctx: &AppContext, post_id: &str) -> Result<()> {
    let origin = ctx.content.get_post(post_id).await?.path();
    ctx.favorites.load(post_id).await?;

    match ctx.favorites.toggle(post_id, &origin).await? {
        ToggleOutcome::Favorited { count } => println!("Favorited ({} total)", count),
        ToggleOutcome::Unfavorited { count } => println!("Unfavorited ({} total)", count),
        ToggleOutcome::InFlight => println!("A change for this post is already pending"),
        ToggleOutcome::SignInRequired(redirect) => {
            return Err(PlazaError::AuthRequired {
                return_to: redirect.return_to,
            })
        }
    }
    Ok(())
}

pub async fn list_favorites(ctx: &AppContext, user_id: &str, remove: Option<&str>) -> Result<()> {
    if let Some(favorite_id) = remove {
        ctx.favorites.user_favorites(user_id).await?;
        return ctx.favorites.delete_favorite(favorite_id).await;
    }

    let favorites = ctx.favorites.user_favorites(user_id).await?;
    if favorites.is_empty() {
        println!("No favorites");
        return Ok(());
    }

    for favorite in favorites {
        println!(
            "  {} | {} | saved {}",
            favorite.id,
            favorite.post_id.name().unwrap_or(favorite.post_id()),
            format::date(favorite.created_at)
        );
    }
    Ok(())
}

pub async fn subscribe(ctx: &AppContext, email: &str) -> Result<()> {
    ctx.subscriptions.subscribe(email).await.map(|_| ())
}

fn print_user(user: &User) {
    println!("{}", user.display_name());
    if let Some(email) = &user.email {
        println!("Email:  {}", email);
    }
    if let Some(avatar) = &user.avatar_url {
        println!("Avatar: {}", avatar);
    }
    println!("Joined: {}", format::date(user.created_at));
}

pub async fn show_profile(ctx: &AppContext, user_id: Option<&str>) -> Result<()> {
    let user = match user_id {
        Some(id) => ctx.users.get_user(id).await?,
        None => ctx.users.current_profile().await?,
    };
    print_user(&user);
    Ok(())
}

pub async fn update_profile(
    ctx: &AppContext,
    user_id: &str,
    name: Option<String>,
    avatar_url: Option<String>,
) -> Result<()> {
    let user = ctx
        .users
        .update_profile(user_id, &ProfileUpdate { name, avatar_url })
        .await?;
    print_user(&user);
    Ok(())
}

pub fn login(ctx: &AppContext, token: &str) -> Result<()> {
    ctx.session.sign_in(token.trim())?;
    println!("Token saved");
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.session.sign_out()?;
    println!("Signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::json;

    use crate::api::mock::MockApiClient;
    use crate::auth::Session;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::fixtures::{listing, post_json, t0};
    use crate::notify::RecordingNotifier;

    fn context(session: Session) -> (Arc<MockApiClient>, AppContext) {
        let api = Arc::new(MockApiClient::new());
        let ctx = AppContext::with_parts(
            Config::default(),
            api.clone(),
            session,
            Arc::new(RecordingNotifier::new()),
            Arc::new(ManualClock::new(t0())),
        );
        (api, ctx)
    }

    #[tokio::test]
    async fn test_list_posts_stores_filters_and_requests_page() {
        let (api, ctx) = context(Session::anonymous());
        api.on(Method::GET, "/posts", listing(&["r1"], ContentType::Restaurants, 2, 11));

        let options = ListOptions {
            page: 2,
            per_page: None,
            search: "pho".into(),
            filter: "all".into(),
            sort: SortOption::TitleAsc,
        };
        list_posts(&ctx, Some(ContentType::Restaurants), options).await.unwrap();

        let query = api.calls()[0].query_pairs();
        assert!(query.contains(&("page".into(), "2".into())));
        assert!(query.contains(&("per_page".into(), "10".into())));
        assert!(query.contains(&("sort".into(), "a-z".into())));
        let state = ctx.content.snapshot();
        assert_eq!(state.filters(ContentType::Restaurants).search_query, "pho");
        assert_eq!(state.pagination(ContentType::Restaurants).current_page, 2);
    }

    #[tokio::test]
    async fn test_update_post_merges_into_existing() {
        let (api, ctx) = context(Session::with_token("token"));
        api.on(Method::GET, "/posts/n1", post_json("n1", ContentType::News));
        api.on(Method::PUT, "/posts/n1", post_json("n1", ContentType::News));

        let args = PostArgs {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        update_post(&ctx, "n1", &args).await.unwrap();

        let body = api.calls()[1].body.clone().unwrap();
        assert_eq!(body["title"], json!("Renamed"));
        assert_eq!(body["slug"], json!("post-n1"));
        assert_eq!(body["post_type"], json!("news"));
    }

    #[tokio::test]
    async fn test_anonymous_favorite_is_auth_error() {
        let (api, ctx) = context(Session::anonymous());
        api.on(Method::GET, "/posts/p1", post_json("p1", ContentType::News));
        api.on(Method::GET, "/favorites/count/p1", json!({"count": 1}));

        let err = toggle_favorite(&ctx, "p1").await.unwrap_err();

        assert!(matches!(err, PlazaError::AuthRequired { ref return_to } if return_to == "/news/post-p1"));
        assert_eq!(api.calls_to(Method::POST, "/favorites"), 0);
    }
}
