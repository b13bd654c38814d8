//! Published posts as shown in listings, with tags and comment count.
use super::{DateTime, Post, PostStatus, Result, Tag};
use crate::schema::post_comment_counts::dsl as pc;
use crate::schema::post_tags::dsl as pt;
use crate::schema::posts::dsl as p;
use crate::schema::tags::dsl as t;
use diesel::helper_types::{AsSelect, InnerJoin, IntoBoxed, Select};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Teaser {
    #[serde(flatten)]
    post: Post,
    url: String,
    tags: Vec<Tag>,
    /// Number of active comments.
    comment_count: i64,
}

type Listing<'a> = IntoBoxed<
    'a,
    Select<
        InnerJoin<p::posts, pc::post_comment_counts>,
        (AsSelect<Post, Pg>, pc::comment_count),
    >,
    Pg,
>;

/// Published posts with their active comment count.
fn published<'a>() -> Listing<'a> {
    p::posts
        .inner_join(pc::post_comment_counts)
        .select((Post::as_select(), pc::comment_count))
        .filter(p::status.eq(PostStatus::Published))
        .into_boxed()
}

/// A pattern for `ilike`, matching any text containing `term`.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Teaser {
    async fn load(
        query: Listing<'_>,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let rows = query.load::<(Post, i64)>(db).await?;
        let mut result = Vec::with_capacity(rows.len());
        for (post, comment_count) in rows {
            let tags = Tag::for_post(post.id, db).await?;
            result.push(Teaser {
                url: post.url(),
                post,
                tags,
                comment_count,
            });
        }
        Ok(result)
    }

    /// The most recently published posts.
    #[tracing::instrument(skip(db), err)]
    pub async fn latest(
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let query = published()
            .order((p::publish.desc(), p::id.desc()))
            .limit(limit.into());
        Teaser::load(query, db).await
    }

    /// Published posts with a given tag, latest first.
    #[tracing::instrument(skip(db), err)]
    pub async fn tagged(
        tag_id: i32,
        offset: u32,
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let query = published()
            .filter(
                p::id.eq_any(
                    pt::post_tags
                        .select(pt::post_id)
                        .filter(pt::tag_id.eq(tag_id)),
                ),
            )
            .order((p::publish.desc(), p::id.desc()))
            .offset(offset.into())
            .limit(limit.into());
        Teaser::load(query, db).await
    }

    /// Published posts, latest first, one page at a time.
    #[tracing::instrument(skip(db), err)]
    pub async fn page(
        offset: u32,
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let query = published()
            .order((p::publish.desc(), p::id.desc()))
            .offset(offset.into())
            .limit(limit.into());
        Teaser::load(query, db).await
    }

    /// Posts published since a given time that got some comments.
    ///
    /// The most commented posts come first, ties broken by the most
    /// recently published.
    #[tracing::instrument(skip(db), err)]
    pub async fn trending(
        since: DateTime,
        min_comments: i64,
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let query = published()
            .filter(p::publish.ge(since))
            .filter(pc::comment_count.ge(min_comments))
            .order((
                pc::comment_count.desc(),
                p::publish.desc(),
                p::id.desc(),
            ))
            .limit(limit.into());
        Teaser::load(query, db).await
    }

    /// Posts that got many comments, or are tagged as picked by the
    /// editors, latest first.
    #[tracing::instrument(skip(db), err)]
    pub async fn editors_choice(
        min_comments: i64,
        tag_slugs: &[String],
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let picked = pt::post_tags
            .inner_join(t::tags)
            .filter(t::slug.eq_any(tag_slugs.to_vec()))
            .select(pt::post_id);
        let query = published()
            .filter(
                pc::comment_count
                    .ge(min_comments)
                    .or(p::id.eq_any(picked)),
            )
            .order((p::publish.desc(), p::id.desc()))
            .limit(limit.into());
        Teaser::load(query, db).await
    }

    /// Published posts where the title, body or a tag name contains
    /// `term`, ignoring case.
    ///
    /// A blank term matches nothing.
    #[tracing::instrument(skip(db), err)]
    pub async fn search(
        term: &str,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = contains_pattern(term);
        let tagged = pt::post_tags
            .inner_join(t::tags)
            .filter(t::name.ilike(pattern.clone()))
            .select(pt::post_id);
        let query = published()
            .filter(
                p::title
                    .ilike(pattern.clone())
                    .or(p::body.ilike(pattern))
                    .or(p::id.eq_any(tagged)),
            )
            .order((p::publish.desc(), p::id.desc()));
        Teaser::load(query, db).await
    }

    /// Other published posts sharing at least one tag with a post.
    ///
    /// The most commented posts come first.
    #[tracing::instrument(skip(tags, db), err)]
    pub async fn related(
        post_id: i32,
        tags: &[Tag],
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Teaser>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let tag_ids = tags.iter().map(|t| t.id).collect::<Vec<_>>();
        let query = published()
            .filter(p::id.ne(post_id))
            .filter(
                p::id.eq_any(
                    pt::post_tags
                        .select(pt::post_id)
                        .filter(pt::tag_id.eq_any(tag_ids)),
                ),
            )
            .order((
                pc::comment_count.desc(),
                p::publish.desc(),
                p::id.desc(),
            ))
            .limit(limit.into());
        Teaser::load(query, db).await
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
    pub fn comment_count(&self) -> i64 {
        self.comment_count
    }
}

impl std::ops::Deref for Teaser {
    type Target = Post;
    fn deref(&self) -> &Post {
        &self.post
    }
}

#[test]
fn pattern_plain() {
    assert_eq!(contains_pattern("ai"), "%ai%");
}

#[test]
fn pattern_escapes_wildcards() {
    assert_eq!(contains_pattern("100%"), "%100\\%%");
    assert_eq!(contains_pattern("a_b"), "%a\\_b%");
    assert_eq!(contains_pattern("c:\\"), "%c:\\\\%");
}
