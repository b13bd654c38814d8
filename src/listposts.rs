use crate::dbopt::DbOpt;
use crate::models::Post;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Only list published posts.
    #[clap(long, short)]
    published: bool,
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let mut db = self.db.get_db().await?;
        let posts = if self.published {
            Post::published(&mut db).await?
        } else {
            Post::all(&mut db).await?
        };
        for post in posts {
            println!(
                "{:4}. {:9} {:32} {}",
                post.id,
                post.status,
                post.url(),
                post.title
            );
        }
        Ok(())
    }
}
