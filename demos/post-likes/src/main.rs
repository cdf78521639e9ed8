//! Likes CLI - net-dispatch demo
//!
//! Drives the post-likes data layer against a real API host:
//!
//! ```sh
//! cargo run -p post-likes -- --base-url https://api.example.com like --site 1 --post 5
//! cargo run -p post-likes -- --base-url https://api.example.com show --site 1 --post 5
//! ```

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use net_dispatch::prelude::*;

use post_likes::{likes_handlers, reducer, AppState, LikesAction};

#[derive(Parser, Debug)]
#[command(name = "likes")]
#[command(about = "Like, unlike, and inspect post likes")]
struct Args {
    /// API host the requests go to
    #[arg(long)]
    base_url: String,

    /// Seconds to wait for the request to settle
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Like a post
    Like {
        #[arg(long)]
        site: u64,
        #[arg(long)]
        post: u64,
    },
    /// Remove a like
    Unlike {
        #[arg(long)]
        site: u64,
        #[arg(long)]
        post: u64,
    },
    /// Show who liked a post
    Show {
        #[arg(long)]
        site: u64,
        #[arg(long)]
        post: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let table = Arc::new(likes_handlers());
    let transport = Arc::new(HttpTransport::new(&args.base_url));
    let mut runtime = DataLayerRuntime::new(AppState::default(), reducer, table, transport);

    let intent = match args.command {
        Command::Like { site, post } => LikesAction::Like {
            site_id: site,
            post_id: post,
        },
        Command::Unlike { site, post } => LikesAction::Unlike {
            site_id: site,
            post_id: post,
        },
        Command::Show { site, post } => LikesAction::LikesRequest {
            site_id: site,
            post_id: post,
        },
    };
    let (site, post) = (intent.site_id(), intent.post_id());

    tracing::info!(site, post, action = %intent.name(), "dispatching");
    runtime.enqueue(intent);

    let outcome = tokio::time::timeout(
        Duration::from_secs(args.timeout),
        run_to_outcome(&mut runtime),
    )
    .await
    .map_err(|_| "timed out waiting for the request to settle")?
    .ok_or("action channel closed before the request settled")?;

    report(&outcome, runtime.state(), site, post);
    Ok(())
}

/// Process actions until a terminal one arrives: a server-confirmed count,
/// a bypassed compensation, or a likers-list result.
async fn run_to_outcome(
    runtime: &mut DataLayerRuntime<AppState, LikesAction>,
) -> Option<Processed<LikesAction>> {
    loop {
        let processed = runtime.process_next().await?;
        let terminal = processed.bypass
            || matches!(
                processed.action,
                LikesAction::UpdateLikeCount { .. } | LikesAction::LikesDidLoad { .. }
            );
        if terminal {
            return Some(processed);
        }
    }
}

fn report(outcome: &Processed<LikesAction>, state: &AppState, site: u64, post: u64) {
    match &outcome.action {
        LikesAction::UpdateLikeCount { like_count, .. } => {
            println!("post {post} on site {site}: {like_count} likes");
        }
        LikesAction::LikesDidLoad { likers, found, .. } => {
            println!("post {post} on site {site}: {found} likes");
            for liker in likers {
                println!("  {} (#{})", liker.login, liker.id);
            }
        }
        LikesAction::LikesDidError { message, .. } => {
            eprintln!("fetching likes failed: {message}");
        }
        // A bypassed inverse intent means the request failed and the
        // optimistic change was reverted.
        other => {
            let likes = state.likes_for(site, post);
            eprintln!(
                "request failed; reverted via {} (current count: {})",
                other.name(),
                likes.map(|l| l.like_count).unwrap_or(0)
            );
        }
    }
}
