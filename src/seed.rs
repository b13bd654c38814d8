//! Fill the database with demo content.
use crate::dbopt::DbOpt;
use crate::error::Error;
use crate::models::{
    Author, Comment, CommentChanges, DateTime, NewAuthor, NewComment,
    NewPost, NewTag, Post, PostChanges, PostStatus, Slug, Tag,
};
use crate::schema::comments::dsl as c;
use crate::schema::posts::dsl as p;
use crate::schema::tags::dsl as t;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

static DEMO: &str = include_str!("../demo/seed.json");

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Delete all comments, posts and tags before seeding.
    #[clap(long)]
    reset: bool,

    /// Read seed data from this json file instead of the bundled demo.
    #[clap(long)]
    data: Option<PathBuf>,
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let data = match &self.data {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {path:?}"))?;
                SeedData::parse(&json)?
            }
            None => SeedData::demo()?,
        };
        let mut db = self.db.get_db().await?;
        let summary = data.apply(self.reset, Utc::now(), &mut db).await?;
        println!(
            "Seeded {} authors, {} tags, {} posts ({} published) \
             and {} comments ({} new).",
            summary.authors,
            summary.tags,
            summary.posts,
            summary.published,
            summary.comments,
            summary.new_comments,
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedData {
    authors: Vec<SeedAuthor>,
    tags: Vec<SeedTag>,
    posts: Vec<SeedPost>,
    comments: Vec<SeedComment>,
}

#[derive(Debug, Deserialize)]
struct SeedAuthor {
    username: String,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct SeedTag {
    slug: Slug,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SeedPost {
    slug: Slug,
    title: String,
    body: String,
    /// Username of the author.
    author: String,
    status: PostStatus,
    /// Slugs of the tags.
    tags: Vec<Slug>,
    days_ago: i64,
}

#[derive(Debug, Deserialize)]
struct SeedComment {
    /// Slug of the post.
    post: Slug,
    name: String,
    email: String,
    body: String,
    active: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub authors: usize,
    pub tags: usize,
    pub posts: usize,
    pub published: usize,
    /// Total number of comments in the database after seeding.
    pub comments: i64,
    pub new_comments: usize,
}

impl SeedData {
    pub fn parse(json: &str) -> Result<SeedData> {
        Ok(serde_json::from_str(json).context("Bad seed data")?)
    }

    /// The bundled demo content.
    pub fn demo() -> Result<SeedData> {
        SeedData::parse(DEMO)
    }

    /// Write the seed data to the database in a single transaction.
    ///
    /// Existing rows are updated rather than duplicated, so seeding
    /// twice gives the same content.
    /// Post publish times are relative to `now`.
    pub async fn apply(
        &self,
        reset: bool,
        now: DateTime,
        db: &mut AsyncPgConnection,
    ) -> Result<Summary, Error> {
        db.transaction::<_, Error, _>(|db| {
            async move {
                if reset {
                    clear(db).await?;
                }
                self.write(now, db).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn write(
        &self,
        now: DateTime,
        db: &mut AsyncPgConnection,
    ) -> Result<Summary, Error> {
        let mut summary = Summary::default();

        let mut authors = HashMap::new();
        for author in &self.authors {
            let new = NewAuthor {
                username: &author.username,
                name: &author.name,
                email: &author.email,
            };
            let row = Author::upsert(&new, db).await?;
            authors.insert(author.username.as_str(), row.id);
        }
        summary.authors = authors.len();
        info!("Authors: {}", summary.authors);

        let mut tags = HashMap::new();
        for tag in &self.tags {
            let new = NewTag {
                name: tag.name.clone(),
                slug: Some(tag.slug.clone()),
            };
            let row = Tag::upsert(&new, db).await?;
            tags.insert(tag.slug.clone(), row.id);
        }
        summary.tags = tags.len();
        info!("Tags: {}", summary.tags);

        let mut posts = HashMap::new();
        for post in &self.posts {
            let author_id =
                *authors.get(post.author.as_str()).ok_or_else(|| {
                    Error::invalid("author", format!("{:?}", post.author))
                })?;
            let tag_ids = post
                .tags
                .iter()
                .map(|slug| {
                    tags.get(slug).copied().ok_or_else(|| {
                        Error::invalid("tags", format!("{slug:?}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let publish = now - Duration::days(post.days_ago);
            let id = match Post::latest_by_slug(&post.slug, db).await? {
                Some(existing) => {
                    let changes = PostChanges {
                        title: Some(post.title.clone()),
                        slug: None,
                        author_id: Some(author_id),
                        body: Some(post.body.clone()),
                        status: Some(post.status),
                        publish: Some(publish),
                    };
                    Post::update(existing.id, &changes, db).await?;
                    Post::set_tags(existing.id, &tag_ids, db).await?;
                    existing.id
                }
                None => {
                    let new = NewPost {
                        title: post.title.clone(),
                        slug: Some(post.slug.clone()),
                        author_id,
                        body: post.body.clone(),
                        status: post.status,
                        publish: Some(publish),
                        tags: tag_ids,
                    };
                    Post::create(&new, db).await?.id
                }
            };
            if post.status == PostStatus::Published {
                summary.published += 1;
            }
            posts.insert(post.slug.clone(), id);
        }
        summary.posts = posts.len();
        info!("Posts: {} ({} published)", summary.posts, summary.published);

        for comment in &self.comments {
            let Some(&post_id) = posts.get(&comment.post) else {
                continue;
            };
            match Comment::find(post_id, &comment.email, &comment.body, db)
                .await?
            {
                Some(existing) => {
                    let changes = CommentChanges {
                        name: Some(comment.name.clone()),
                        ..Default::default()
                    };
                    Comment::update(existing.id, &changes, db).await?;
                    Comment::set_active(existing.id, comment.active, db)
                        .await?;
                }
                None => {
                    let new = NewComment {
                        post_id,
                        name: comment.name.clone(),
                        email: comment.email.clone(),
                        body: comment.body.clone(),
                        active: comment.active,
                    };
                    Comment::create(&new, db).await?;
                    summary.new_comments += 1;
                }
            }
        }
        summary.comments = c::comments.count().get_result(db).await?;
        info!(
            "Comments: {} ({} new)",
            summary.comments, summary.new_comments,
        );
        Ok(summary)
    }
}

/// Remove all blog content.  Authors are kept.
async fn clear(db: &mut AsyncPgConnection) -> Result<(), Error> {
    let comments = diesel::delete(c::comments).execute(db).await?;
    let posts = diesel::delete(p::posts).execute(db).await?;
    let tags = diesel::delete(t::tags).execute(db).await?;
    info!("Cleared {comments} comments, {posts} posts and {tags} tags");
    Ok(())
}
