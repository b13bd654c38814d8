use super::{validate, DateTime, Result};
use crate::error::Error;
use crate::schema::active_commenters::dsl as ac;
use crate::schema::comments::{self, dsl as c};
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub name: String,
    #[serde(skip)]
    pub email: String,
    pub body: String,
    pub active: bool,
    pub created: DateTime,
    pub updated: DateTime,
}

impl Comment {
    pub fn gravatar(&self) -> String {
        gravatar_url(&self.email)
    }
}

fn gravatar_url(email: &str) -> String {
    use gravatar::{Default, Gravatar, Rating};
    Gravatar::new(email)
        .set_size(Some(160))
        .set_default(Some(Default::Retro))
        .set_rating(Some(Rating::Pg))
        .image_url()
        .to_string()
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i32,
    pub name: String,
    pub email: String,
    pub body: String,
    pub active: bool,
}

impl NewComment {
    /// A new comment, visible unless deactivated later.
    pub fn new(post_id: i32, name: &str, email: &str, body: &str) -> Self {
        NewComment {
            post_id,
            name: name.into(),
            email: email.into(),
            body: body.into(),
            active: true,
        }
    }
}

/// Changes to the content of a comment.
///
/// Moderation is done by [`Comment::set_active`] only.
#[derive(Debug, Default, Clone, AsChangeset)]
#[diesel(table_name = comments)]
pub struct CommentChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub body: Option<String>,
}

fn check(
    name: Option<&str>,
    email: Option<&str>,
    body: Option<&str>,
) -> Result<()> {
    if let Some(name) = name {
        validate::text("name", name, 80)?;
    }
    if let Some(email) = email {
        validate::email("email", email)?;
    }
    if let Some(body) = body {
        validate::not_blank("body", body)?;
    }
    Ok(())
}

impl Comment {
    #[tracing::instrument(skip(new, db), fields(post = new.post_id), err)]
    pub async fn create(
        new: &NewComment,
        db: &mut AsyncPgConnection,
    ) -> Result<Comment> {
        check(
            Some(new.name.as_str()),
            Some(new.email.as_str()),
            Some(new.body.as_str()),
        )?;
        let now = Utc::now();
        Ok(diesel::insert_into(c::comments)
            .values((
                c::post_id.eq(new.post_id),
                c::name.eq(&new.name),
                c::email.eq(&new.email),
                c::body.eq(&new.body),
                c::active.eq(new.active),
                c::created.eq(now),
                c::updated.eq(now),
            ))
            .returning(Comment::as_returning())
            .get_result(db)
            .await?)
    }

    #[tracing::instrument(skip(db), err)]
    pub async fn update(
        id: i32,
        changes: &CommentChanges,
        db: &mut AsyncPgConnection,
    ) -> Result<Comment> {
        check(
            changes.name.as_deref(),
            changes.email.as_deref(),
            changes.body.as_deref(),
        )?;
        Ok(diesel::update(c::comments.find(id))
            .set((changes, c::updated.eq(Utc::now())))
            .returning(Comment::as_returning())
            .get_result(db)
            .await?)
    }

    /// Show or hide a comment.
    #[tracing::instrument(skip(db), err)]
    pub async fn set_active(
        id: i32,
        active: bool,
        db: &mut AsyncPgConnection,
    ) -> Result<Comment> {
        Ok(diesel::update(c::comments.find(id))
            .set((c::active.eq(active), c::updated.eq(Utc::now())))
            .returning(Comment::as_returning())
            .get_result(db)
            .await?)
    }

    #[tracing::instrument(skip(db), err)]
    pub async fn delete(id: i32, db: &mut AsyncPgConnection) -> Result<()> {
        match diesel::delete(c::comments.find(id)).execute(db).await? {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    pub async fn get(id: i32, db: &mut AsyncPgConnection) -> Result<Comment> {
        Ok(c::comments
            .find(id)
            .select(Comment::as_select())
            .first(db)
            .await?)
    }

    /// All comments on a post, hidden ones included, latest first.
    pub async fn for_post(
        post_id: i32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Comment>> {
        Ok(c::comments
            .filter(c::post_id.eq(post_id))
            .select(Comment::as_select())
            .order((c::created.desc(), c::id.desc()))
            .load(db)
            .await?)
    }

    /// The visible comments on a post, latest first.
    pub async fn active_for_post(
        post_id: i32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Comment>> {
        Ok(c::comments
            .filter(c::post_id.eq(post_id))
            .filter(c::active.eq(true))
            .select(Comment::as_select())
            .order((c::created.desc(), c::id.desc()))
            .load(db)
            .await?)
    }

    /// All comments that are (or are not) active, latest first.
    pub async fn with_active(
        active: bool,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Comment>> {
        Ok(c::comments
            .filter(c::active.eq(active))
            .select(Comment::as_select())
            .order((c::created.desc(), c::id.desc()))
            .load(db)
            .await?)
    }

    /// Number of active and hidden comments.
    pub async fn counts(db: &mut AsyncPgConnection) -> Result<(i64, i64)> {
        let counts = c::comments
            .group_by(c::active)
            .select((c::active, count_star()))
            .load::<(bool, i64)>(db)
            .await?;
        Ok(counts.into_iter().fold((0, 0), |(on, off), (active, n)| {
            if active {
                (on + n, off)
            } else {
                (on, off + n)
            }
        }))
    }

    /// A comment on a post by a given email with exactly this body.
    pub async fn find(
        post_id: i32,
        email: &str,
        body: &str,
        db: &mut AsyncPgConnection,
    ) -> Result<Option<Comment>> {
        Ok(c::comments
            .filter(c::post_id.eq(post_id))
            .filter(c::email.eq(email))
            .filter(c::body.eq(body))
            .select(Comment::as_select())
            .first(db)
            .await
            .optional()?)
    }
}

/// Someone who has written visible comments.
///
/// Commenters are not accounts, they are identified by name and email.
#[derive(Debug, Serialize)]
pub struct Commenter {
    pub name: String,
    #[serde(skip)]
    pub email: String,
    pub avatar: String,
    pub comments_total: i64,
    pub recent_comment: DateTime,
}

impl Commenter {
    /// The commenters with the most active comments.
    ///
    /// Ties are broken by the most recent comment.
    pub async fn top(
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Commenter>> {
        Ok(ac::active_commenters
            .select((
                ac::name,
                ac::email,
                ac::comments_total,
                ac::recent_comment,
            ))
            .order((ac::comments_total.desc(), ac::recent_comment.desc()))
            .limit(limit.into())
            .load::<(String, String, i64, DateTime)>(db)
            .await?
            .into_iter()
            .map(|(name, email, comments_total, recent_comment)| Commenter {
                avatar: gravatar_url(&email),
                name,
                email,
                comments_total,
                recent_comment,
            })
            .collect())
    }
}

#[test]
fn comment_fields() {
    assert!(check(Some("Anna"), Some("anna@example.com"), Some("Hi")).is_ok());
    assert!(matches!(
        check(Some("n".repeat(81).as_str()), None, None),
        Err(Error::Invalid { field: "name", .. })
    ));
    assert!(matches!(
        check(None, Some("anna at example.com"), None),
        Err(Error::Invalid { field: "email", .. })
    ));
}

#[test]
fn avatar_from_email() {
    let anna = gravatar_url("anna@example.com");
    assert_eq!(anna, gravatar_url("anna@example.com"));
    assert_ne!(anna, gravatar_url("sergey@example.com"));
}
