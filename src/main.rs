use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plaza::app::AppContext;
use plaza::cli::commands::{self, ListOptions};
use plaza::cli::{Cli, Commands};
use plaza::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::List {
            content_type,
            page,
            per_page,
            search,
            filter,
            sort,
        } => {
            let options = ListOptions {
                page,
                per_page,
                search,
                filter,
                sort,
            };
            commands::list_posts(&ctx, content_type, options).await?;
        }
        Commands::Show { slug, id } => {
            commands::show_post(&ctx, &slug, id).await?;
        }
        Commands::PostsBy { user_id } => {
            commands::posts_by(&ctx, &user_id).await?;
        }
        Commands::Create(args) => {
            commands::create_post(&ctx, &args).await?;
        }
        Commands::Update { id, post } => {
            commands::update_post(&ctx, &id, &post).await?;
        }
        Commands::Delete { id } => {
            commands::delete_post(&ctx, &id).await?;
        }
        Commands::Favorite { post_id } => {
            commands::toggle_favorite(&ctx, &post_id).await?;
        }
        Commands::Favorites { user_id, remove } => {
            commands::list_favorites(&ctx, &user_id, remove.as_deref()).await?;
        }
        Commands::Subscribe { email } => {
            commands::subscribe(&ctx, &email).await?;
        }
        Commands::Profile { user_id } => {
            commands::show_profile(&ctx, user_id.as_deref()).await?;
        }
        Commands::UpdateProfile {
            user_id,
            name,
            avatar_url,
        } => {
            commands::update_profile(&ctx, &user_id, name, avatar_url).await?;
        }
        Commands::Login { token } => {
            commands::login(&ctx, &token)?;
        }
        Commands::Logout => {
            commands::logout(&ctx)?;
        }
    }

    Ok(())
}
