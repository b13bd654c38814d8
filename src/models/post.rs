use super::{publish_date, validate, DateTime, PostStatus, Result, Slug};
use crate::error::Error;
use crate::schema::post_tags::dsl as pt;
use crate::schema::posts::{self, dsl as p};
use chrono::{Datelike, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

const SLUG_MAX: usize = 250;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub slug: Slug,
    pub author_id: i32,
    pub body: String,
    pub status: PostStatus,
    pub publish: DateTime,
    pub created: DateTime,
    pub updated: DateTime,
}

impl Post {
    /// The reader url of this post, based on its publish date.
    pub fn url(&self) -> String {
        let date = self.publish.date_naive();
        format!(
            "/{}/{}/{}/{}",
            date.year(),
            date.month(),
            date.day(),
            self.slug,
        )
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    /// Derived from the title if not given.
    pub slug: Option<Slug>,
    pub author_id: i32,
    pub body: String,
    pub status: PostStatus,
    /// Defaults to the creation time.
    pub publish: Option<DateTime>,
    pub tags: Vec<i32>,
}

impl NewPost {
    pub fn new(author_id: i32, title: &str, body: &str) -> NewPost {
        NewPost {
            title: title.into(),
            slug: None,
            author_id,
            body: body.into(),
            status: PostStatus::Draft,
            publish: None,
            tags: Vec::new(),
        }
    }
    fn slug(&self) -> Slug {
        self.slug.clone().unwrap_or_else(|| Slug::from_name(&self.title, SLUG_MAX))
    }
}

/// Changes to a post.  Fields that are `None` are left as they are.
#[derive(Debug, Default, Clone, AsChangeset)]
#[diesel(table_name = posts)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<Slug>,
    pub author_id: Option<i32>,
    pub body: Option<String>,
    pub status: Option<PostStatus>,
    pub publish: Option<DateTime>,
}

impl PostChanges {
    pub fn status(status: PostStatus) -> PostChanges {
        PostChanges {
            status: Some(status),
            ..Default::default()
        }
    }
}

fn check(
    title: Option<&str>,
    slug: Option<&Slug>,
    body: Option<&str>,
) -> Result<()> {
    if let Some(title) = title {
        validate::text("title", title, 250)?;
    }
    if let Some(slug) = slug {
        validate::slug("slug", slug, SLUG_MAX)?;
    }
    if let Some(body) = body {
        validate::not_blank("body", body)?;
    }
    Ok(())
}

impl Post {
    /// Create a post with its tags.
    ///
    /// The slug must be unique for the (UTC) day of the publish time.
    #[tracing::instrument(skip(new, db), fields(title = %new.title), err)]
    pub async fn create(
        new: &NewPost,
        db: &mut AsyncPgConnection,
    ) -> Result<Post> {
        let slug = new.slug();
        check(
            Some(new.title.as_str()),
            Some(&slug),
            Some(new.body.as_str()),
        )?;
        let now = Utc::now();
        let publish = new.publish.unwrap_or(now);
        db.transaction::<_, Error, _>(|db| {
            async move {
                let post = diesel::insert_into(p::posts)
                    .values((
                        p::title.eq(&new.title),
                        p::slug.eq(&slug),
                        p::author_id.eq(new.author_id),
                        p::body.eq(&new.body),
                        p::status.eq(new.status),
                        p::publish.eq(publish),
                        p::created.eq(now),
                        p::updated.eq(now),
                    ))
                    .returning(Post::as_returning())
                    .get_result(db)
                    .await?;
                link_tags(post.id, &new.tags, db).await?;
                Ok(post)
            }
            .scope_boxed()
        })
        .await
    }

    /// Update some fields of a post.
    ///
    /// The `updated` time is always refreshed, even if `changes` is empty.
    #[tracing::instrument(skip(db), err)]
    pub async fn update(
        id: i32,
        changes: &PostChanges,
        db: &mut AsyncPgConnection,
    ) -> Result<Post> {
        check(
            changes.title.as_deref(),
            changes.slug.as_ref(),
            changes.body.as_deref(),
        )?;
        Ok(diesel::update(p::posts.find(id))
            .set((changes, p::updated.eq(Utc::now())))
            .returning(Post::as_returning())
            .get_result(db)
            .await?)
    }

    /// Replace the set of tags on a post.
    #[tracing::instrument(skip(db), err)]
    pub async fn set_tags(
        id: i32,
        tags: &[i32],
        db: &mut AsyncPgConnection,
    ) -> Result<()> {
        db.transaction::<_, Error, _>(|db| {
            async move {
                let touched = diesel::update(p::posts.find(id))
                    .set(p::updated.eq(Utc::now()))
                    .execute(db)
                    .await?;
                if touched == 0 {
                    return Err(Error::NotFound);
                }
                diesel::delete(pt::post_tags.filter(pt::post_id.eq(id)))
                    .execute(db)
                    .await?;
                link_tags(id, tags, db).await
            }
            .scope_boxed()
        })
        .await
    }

    /// Delete a post, and with it all comments on it.
    #[tracing::instrument(skip(db), err)]
    pub async fn delete(id: i32, db: &mut AsyncPgConnection) -> Result<()> {
        match diesel::delete(p::posts.find(id)).execute(db).await? {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    pub async fn get(id: i32, db: &mut AsyncPgConnection) -> Result<Post> {
        Ok(p::posts
            .find(id)
            .select(Post::as_select())
            .first(db)
            .await?)
    }

    /// All posts regardless of status, latest first.  For admin use.
    pub async fn all(db: &mut AsyncPgConnection) -> Result<Vec<Post>> {
        Ok(p::posts
            .select(Post::as_select())
            .order((p::publish.desc(), p::id.desc()))
            .load(db)
            .await?)
    }

    /// All published posts, latest first.
    pub async fn published(db: &mut AsyncPgConnection) -> Result<Vec<Post>> {
        Ok(p::posts
            .select(Post::as_select())
            .filter(p::status.eq(PostStatus::Published))
            .order((p::publish.desc(), p::id.desc()))
            .load(db)
            .await?)
    }

    /// A published post by the date and slug in its url.
    pub async fn published_on(
        date: NaiveDate,
        slug: &Slug,
        db: &mut AsyncPgConnection,
    ) -> Result<Option<Post>> {
        Ok(p::posts
            .select(Post::as_select())
            .filter(p::status.eq(PostStatus::Published))
            .filter(publish_date(p::publish).eq(date))
            .filter(p::slug.eq(slug))
            .first(db)
            .await
            .optional()?)
    }

    /// The most recent post with a given slug, any date and status.
    pub async fn latest_by_slug(
        slug: &Slug,
        db: &mut AsyncPgConnection,
    ) -> Result<Option<Post>> {
        Ok(p::posts
            .select(Post::as_select())
            .filter(p::slug.eq(slug))
            .order(p::publish.desc())
            .first(db)
            .await
            .optional()?)
    }
}

async fn link_tags(
    post_id: i32,
    tags: &[i32],
    db: &mut AsyncPgConnection,
) -> Result<()> {
    let mut tags = tags.to_vec();
    tags.sort_unstable();
    tags.dedup();
    if !tags.is_empty() {
        let rows = tags
            .into_iter()
            .map(|tag| (pt::post_id.eq(post_id), pt::tag_id.eq(tag)))
            .collect::<Vec<_>>();
        diesel::insert_into(pt::post_tags)
            .values(rows)
            .execute(db)
            .await?;
    }
    Ok(())
}
