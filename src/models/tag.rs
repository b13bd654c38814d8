use super::{validate, DateTime, Result, Slug};
use crate::error::Error;
use crate::schema::post_tags::dsl as pt;
use crate::schema::tag_post_counts::dsl as tc;
use crate::schema::tags::{self, dsl as t};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

const SLUG_MAX: usize = 50;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = tags)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub slug: Slug,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    /// Derived from the name if not given.
    pub slug: Option<Slug>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = tags)]
pub struct TagChanges {
    pub name: Option<String>,
    pub slug: Option<Slug>,
}

impl NewTag {
    pub fn named(name: &str) -> NewTag {
        NewTag {
            name: name.into(),
            slug: None,
        }
    }
    fn slug(&self) -> Slug {
        self.slug.clone().unwrap_or_else(|| Slug::from_name(&self.name, SLUG_MAX))
    }
}

fn check(name: Option<&str>, slug: Option<&Slug>) -> Result<()> {
    if let Some(name) = name {
        validate::text("name", name, 50)?;
    }
    if let Some(slug) = slug {
        validate::slug("slug", slug, SLUG_MAX)?;
    }
    Ok(())
}

impl Tag {
    #[tracing::instrument(skip(db), err)]
    pub async fn create(
        new: &NewTag,
        db: &mut AsyncPgConnection,
    ) -> Result<Tag> {
        let slug = new.slug();
        check(Some(new.name.as_str()), Some(&slug))?;
        Ok(diesel::insert_into(t::tags)
            .values((t::name.eq(&new.name), t::slug.eq(&slug)))
            .returning(Tag::as_returning())
            .get_result(db)
            .await?)
    }

    /// Create the tag with this slug, or rename it if it exists.
    pub async fn upsert(
        new: &NewTag,
        db: &mut AsyncPgConnection,
    ) -> Result<Tag> {
        let slug = new.slug();
        check(Some(new.name.as_str()), Some(&slug))?;
        Ok(diesel::insert_into(t::tags)
            .values((t::name.eq(&new.name), t::slug.eq(&slug)))
            .on_conflict(t::slug)
            .do_update()
            .set(t::name.eq(&new.name))
            .returning(Tag::as_returning())
            .get_result(db)
            .await?)
    }

    #[tracing::instrument(skip(db), err)]
    pub async fn update(
        id: i32,
        changes: &TagChanges,
        db: &mut AsyncPgConnection,
    ) -> Result<Tag> {
        check(changes.name.as_deref(), changes.slug.as_ref())?;
        if changes.name.is_none() && changes.slug.is_none() {
            return Tag::get(id, db).await;
        }
        Ok(diesel::update(t::tags.find(id))
            .set(changes)
            .returning(Tag::as_returning())
            .get_result(db)
            .await?)
    }

    /// Delete a tag.  The posts are kept, but lose the tag.
    #[tracing::instrument(skip(db), err)]
    pub async fn delete(id: i32, db: &mut AsyncPgConnection) -> Result<()> {
        match diesel::delete(t::tags.find(id)).execute(db).await? {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    pub async fn get(id: i32, db: &mut AsyncPgConnection) -> Result<Tag> {
        Ok(t::tags
            .find(id)
            .select(Tag::as_select())
            .first(db)
            .await?)
    }

    pub async fn by_slug(
        slug: &Slug,
        db: &mut AsyncPgConnection,
    ) -> Result<Option<Tag>> {
        Ok(t::tags
            .filter(t::slug.eq(slug))
            .select(Tag::as_select())
            .first(db)
            .await
            .optional()?)
    }

    /// All tags, ordered by name.
    pub async fn all(db: &mut AsyncPgConnection) -> Result<Vec<Tag>> {
        Ok(t::tags
            .select(Tag::as_select())
            .order(t::name.asc())
            .load(db)
            .await?)
    }

    pub async fn for_post(
        post_id: i32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<Tag>> {
        Ok(t::tags
            .filter(
                t::id.eq_any(
                    pt::post_tags
                        .select(pt::tag_id)
                        .filter(pt::post_id.eq(post_id)),
                ),
            )
            .select(Tag::as_select())
            .order(t::name.asc())
            .load(db)
            .await?)
    }
}

/// A tag with the number of published posts having it.
#[derive(Debug, Serialize)]
pub struct TagCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub published_posts: i64,
    /// The latest publish time of the published posts.
    pub latest_publish: Option<DateTime>,
}

impl TagCount {
    /// All tags ordered by name, including those without posts.
    pub async fn all(db: &mut AsyncPgConnection) -> Result<Vec<TagCount>> {
        Ok(t::tags
            .inner_join(tc::tag_post_counts)
            .select((
                Tag::as_select(),
                tc::published_posts,
                tc::latest_publish,
            ))
            .order(t::name.asc())
            .load::<(Tag, i64, Option<DateTime>)>(db)
            .await?
            .into_iter()
            .map(TagCount::from)
            .collect())
    }

    /// The most used tags.
    ///
    /// Tags without published posts are not included.  Ties on the
    /// number of posts are broken by the most recently used tag, and
    /// then by name.
    pub async fn top(
        limit: u32,
        db: &mut AsyncPgConnection,
    ) -> Result<Vec<TagCount>> {
        Ok(t::tags
            .inner_join(tc::tag_post_counts)
            .select((
                Tag::as_select(),
                tc::published_posts,
                tc::latest_publish,
            ))
            .filter(tc::published_posts.gt(0_i64))
            .order((
                tc::published_posts.desc(),
                tc::latest_publish.desc(),
                t::name.asc(),
            ))
            .limit(limit.into())
            .load::<(Tag, i64, Option<DateTime>)>(db)
            .await?
            .into_iter()
            .map(TagCount::from)
            .collect())
    }
}

impl From<(Tag, i64, Option<DateTime>)> for TagCount {
    fn from(
        (tag, published_posts, latest_publish): (Tag, i64, Option<DateTime>),
    ) -> Self {
        TagCount {
            tag,
            published_posts,
            latest_publish,
        }
    }
}

#[test]
fn slug_from_name() {
    let tag = NewTag::named("Supply Chain");
    assert_eq!(tag.slug().as_ref(), "supply-chain");
    let tag = NewTag {
        name: "UX/UI".into(),
        slug: Some("ux".parse().unwrap()),
    };
    assert_eq!(tag.slug().as_ref(), "ux");
}

#[test]
fn name_limits() {
    assert!(check(Some("x".repeat(50).as_str()), None).is_ok());
    assert!(check(Some("x".repeat(51).as_str()), None).is_err());
    assert!(check(Some(""), None).is_err());
    let long: Slug = "s".repeat(51).parse().unwrap();
    assert!(matches!(
        check(None, Some(&long)),
        Err(Error::Invalid { field: "slug", .. })
    ));
}
