mod api;
mod config;
mod media;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rafiq_core::{MediaStore, NoMedia, SystemClock, UserId};
use rafiq_store::{Engagement, StoreHandle};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::media::LocalMedia;

#[derive(Parser)]
#[command(name = "rafiq", version, about = "Stories, likes and tasbih goals backend")]
struct Cli {
    /// Directory holding the database and config.toml (default ~/.rafiq)
    #[arg(long, global = true, env = "RAFIQ_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on, overriding server.bind
        #[arg(long, env = "RAFIQ_BIND")]
        bind: Option<String>,
    },

    /// Manage the user directory
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Manage friend links between goal owners
    Friend {
        #[command(subcommand)]
        command: FriendCommand,
    },

    /// Show row counts
    Stats,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a user or rename an existing one
    Add {
        #[arg(long)]
        id: UserId,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum FriendCommand {
    /// Let OWNER follow FRIEND's goal progress
    Add {
        #[arg(long)]
        owner: UserId,
        #[arg(long)]
        friend: UserId,
        /// Share progress immediately
        #[arg(long)]
        public: bool,
    },

    /// Change whether a friend link shares progress
    Privacy {
        #[arg(long)]
        link: i64,
        #[arg(long, action = ArgAction::Set)]
        public: bool,
    },
}

/// Resolved data directory plus the settings found in it.
struct Env {
    data_dir: PathBuf,
    settings: Settings,
}

fn load_env(cli: &Cli) -> Result<Env> {
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(config::default_data_dir);
    let settings = Settings::load(&data_dir)?;
    Ok(Env { data_dir, settings })
}

fn open_engagement(env: &Env) -> Result<Engagement> {
    std::fs::create_dir_all(&env.data_dir)
        .with_context(|| format!("failed to create {}", env.data_dir.display()))?;
    let db_path = env.settings.database_path(&env.data_dir);
    let store = StoreHandle::open(&db_path, env.settings.request_timeout())
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;

    let media: Arc<dyn MediaStore> = match &env.settings.media.root {
        Some(root) => Arc::new(LocalMedia::new(root)),
        None => Arc::new(NoMedia),
    };
    Ok(Engagement::new(store, Arc::new(SystemClock), media))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let env = load_env(&cli)?;

    match &cli.command {
        Commands::Serve { bind } => cmd_serve(&env, bind.as_deref()).await,
        Commands::User { command } => cmd_user(&env, command).await,
        Commands::Friend { command } => cmd_friend(&env, command).await,
        Commands::Stats => cmd_stats(&env).await,
    }
}

async fn cmd_serve(env: &Env, bind: Option<&str>) -> Result<()> {
    let engagement = open_engagement(env)?;
    let addr = bind.unwrap_or(&env.settings.server.bind);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let served = api::serve(listener, engagement.clone(), shutdown).await;
    if let Err(e) = engagement.shutdown().await {
        tracing::warn!("shutdown checkpoint failed: {e}");
    }
    tracing::info!("server stopped");
    served
}

/// Cancel `token` on Ctrl-C or, on unix, SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
    token.cancel();
}

async fn cmd_user(env: &Env, command: &UserCommand) -> Result<()> {
    let engagement = open_engagement(env)?;
    match command {
        UserCommand::Add { id, name } => {
            engagement
                .users
                .upsert_user(*id, name)
                .await
                .context("failed to save user")?;
            println!("user {id}: {}", name.trim());
        }
    }
    engagement.shutdown().await?;
    Ok(())
}

async fn cmd_friend(env: &Env, command: &FriendCommand) -> Result<()> {
    let engagement = open_engagement(env)?;
    match command {
        FriendCommand::Add {
            owner,
            friend,
            public,
        } => {
            let link = engagement
                .goals
                .link_friend(*owner, *friend, *public)
                .await
                .context("failed to link friend")?;
            println!(
                "link {}: {} -> {} ({})",
                link.id,
                link.owner_id,
                link.friend_user_id,
                visibility(link.is_public)
            );
        }
        FriendCommand::Privacy { link, public } => {
            engagement
                .goals
                .set_goal_privacy(*link, *public)
                .await
                .context("failed to update friend link")?;
            println!("link {link}: {}", visibility(*public));
        }
    }
    engagement.shutdown().await?;
    Ok(())
}

fn visibility(is_public: bool) -> &'static str {
    if is_public { "public" } else { "private" }
}

async fn cmd_stats(env: &Env) -> Result<()> {
    let engagement = open_engagement(env)?;
    let stats = engagement.stats().await.context("failed to read stats")?;

    println!("users:         {}", stats.users);
    println!(
        "stories:       {} visible, {} expired",
        stats.stories_visible, stats.stories_expired
    );
    println!("story views:   {}", stats.story_views);
    println!("likes:         {}", stats.likes);
    println!(
        "goals:         {} active, {} expired",
        stats.goals_active, stats.goals_expired
    );
    println!("friend links:  {}", stats.friend_links);

    engagement.shutdown().await?;
    Ok(())
}
