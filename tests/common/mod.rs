//! Helpers for tests that need a postgres database.
//!
//! Each test gets a connection inside a test transaction, with the
//! schema created from the migration in a private postgres schema.
//! Nothing is ever committed.
#![allow(dead_code)]
use chrono::{Duration, Utc};
use diesel_async::{AsyncConnection, AsyncPgConnection, SimpleAsyncConnection};
use editorial::models::{
    Author, Comment, DateTime, NewAuthor, NewComment, NewPost, NewTag, Post,
    PostStatus, Slug, Tag,
};
use std::sync::atomic::{AtomicUsize, Ordering};

static MIGRATION: &str =
    include_str!("../../migrations/2024-05-01-120000_create_blog/up.sql");
static NEXT_SCHEMA: AtomicUsize = AtomicUsize::new(0);

pub async fn db() -> AsyncPgConnection {
    let _ = dotenv::dotenv();
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for the db tests");
    let mut db = AsyncPgConnection::establish(&url)
        .await
        .expect("Connect to test database");
    db.begin_test_transaction().await.unwrap();
    let schema = format!(
        "editorial_test_{}_{}",
        std::process::id(),
        NEXT_SCHEMA.fetch_add(1, Ordering::SeqCst),
    );
    db.batch_execute(&format!(
        "CREATE SCHEMA {schema}; SET LOCAL search_path TO {schema};"
    ))
    .await
    .unwrap();
    db.batch_execute(MIGRATION).await.unwrap();
    db
}

pub async fn author(username: &str, db: &mut AsyncPgConnection) -> Author {
    let new = NewAuthor {
        username,
        name: username,
        email: "",
    };
    Author::create(&new, db).await.unwrap()
}

pub async fn tag(name: &str, db: &mut AsyncPgConnection) -> Tag {
    Tag::create(&NewTag::named(name), db).await.unwrap()
}

pub async fn tag_slug(slug: &str, db: &mut AsyncPgConnection) -> Tag {
    let new = NewTag {
        name: slug.to_uppercase(),
        slug: Some(slug.parse().unwrap()),
    };
    Tag::create(&new, db).await.unwrap()
}

pub fn days_ago(days: i64) -> DateTime {
    Utc::now() - Duration::days(days)
}

/// A published post by `author`, with a body that matches no searches.
pub async fn published(
    author: &Author,
    title: &str,
    publish: DateTime,
    tags: &[&Tag],
    db: &mut AsyncPgConnection,
) -> Post {
    let new = NewPost {
        status: PostStatus::Published,
        publish: Some(publish),
        tags: tags.iter().map(|t| t.id).collect(),
        ..NewPost::new(author.id, title, "Lorem ipsum.")
    };
    Post::create(&new, db).await.unwrap()
}

pub async fn draft(
    author: &Author,
    title: &str,
    tags: &[&Tag],
    db: &mut AsyncPgConnection,
) -> Post {
    let new = NewPost {
        tags: tags.iter().map(|t| t.id).collect(),
        ..NewPost::new(author.id, title, "Lorem ipsum.")
    };
    Post::create(&new, db).await.unwrap()
}

/// Add `n` active comments by different people to a post.
pub async fn comments(post: &Post, n: usize, db: &mut AsyncPgConnection) {
    for i in 0..n {
        comment(post, &format!("Reader {i}"), &format!("r{i}@example.com"), db)
            .await;
    }
}

pub async fn comment(
    post: &Post,
    name: &str,
    email: &str,
    db: &mut AsyncPgConnection,
) -> Comment {
    let new = NewComment::new(post.id, name, email, "Nice post!");
    Comment::create(&new, db).await.unwrap()
}

pub fn slug(s: &str) -> Slug {
    s.parse().unwrap()
}
