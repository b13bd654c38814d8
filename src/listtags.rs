use crate::dbopt::DbOpt;
use crate::models::TagCount;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Show only this many of the most used tags.
    #[clap(long, short)]
    top: Option<u32>,
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let mut db = self.db.get_db().await?;
        let tags = match self.top {
            Some(limit) => TagCount::top(limit, &mut db).await?,
            None => TagCount::all(&mut db).await?,
        };
        for count in tags {
            let latest = count
                .latest_publish
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".into());
            println!(
                "{:4}. {:24} {:3} posts, latest {}  ({})",
                count.tag.id,
                count.tag.slug,
                count.published_posts,
                latest,
                count.tag.name,
            );
        }
        Ok(())
    }
}
