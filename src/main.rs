use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use editorial::{listposts, listtags, modcomments, seed, server};

/// Main program: Set up env and run according to arguments.
fn main() -> Result<()> {
    match dotenv() {
        Ok(_) => (),
        Err(ref err) if err.not_found() => (),
        Err(e) => return Err(e).context("Failed to read .env"),
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").as_deref().unwrap_or("info"),
        )
        .init();

    Editorial::parse().run()
}

/// Manage and serve the editorial blog
#[derive(Parser)]
#[command(about, author, version)]
enum Editorial {
    /// Run the web server
    Serve(server::Args),
    /// Load the demo content (or other seed data) into the database
    Seed(seed::Args),
    /// List known posts
    List(listposts::Args),
    /// List tags with their number of published posts
    Tags(listtags::Args),
    /// Review comments, hiding or showing them
    Moderate(modcomments::Args),
}

impl Editorial {
    fn run(self) -> Result<()> {
        match self {
            Editorial::Serve(args) => run_async(args.run()),
            Editorial::Seed(args) => run_async(args.run()),
            Editorial::List(args) => run_async(args.run()),
            Editorial::Tags(args) => run_async(args.run()),
            Editorial::Moderate(args) => run_async(args.run()),
        }
    }
}

fn run_async<F>(work: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(10)
        .build()?
        .block_on(work)
}
