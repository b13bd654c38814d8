use super::{validate, Result};
use crate::error::Error;
use crate::schema::authors::{self, dsl as a};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

/// A post author, as known from the identity provider.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = authors)]
pub struct Author {
    pub id: i32,
    pub username: String,
    pub name: String,
    #[serde(skip)]
    pub email: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = authors)]
pub struct NewAuthor<'a> {
    pub username: &'a str,
    pub name: &'a str,
    pub email: &'a str,
}

impl NewAuthor<'_> {
    fn validate(&self) -> Result<()> {
        validate::text("username", self.username, 150)?;
        validate::max_len("name", self.name, 150)?;
        if !self.email.is_empty() {
            validate::email("email", self.email)?;
        }
        Ok(())
    }
}

impl Author {
    #[tracing::instrument(skip(db), err)]
    pub async fn create(
        new: &NewAuthor<'_>,
        db: &mut AsyncPgConnection,
    ) -> Result<Author> {
        new.validate()?;
        Ok(diesel::insert_into(a::authors)
            .values(new)
            .returning(Author::as_returning())
            .get_result(db)
            .await?)
    }

    /// Create or update the author with a given username.
    pub async fn upsert(
        new: &NewAuthor<'_>,
        db: &mut AsyncPgConnection,
    ) -> Result<Author> {
        new.validate()?;
        Ok(diesel::insert_into(a::authors)
            .values(new)
            .on_conflict(a::username)
            .do_update()
            .set((a::name.eq(new.name), a::email.eq(new.email)))
            .returning(Author::as_returning())
            .get_result(db)
            .await?)
    }

    pub async fn get(id: i32, db: &mut AsyncPgConnection) -> Result<Author> {
        Ok(a::authors
            .find(id)
            .select(Author::as_select())
            .first(db)
            .await?)
    }

    /// Delete an author, and with it all their posts and comments on them.
    #[tracing::instrument(skip(db), err)]
    pub async fn delete(id: i32, db: &mut AsyncPgConnection) -> Result<()> {
        match diesel::delete(a::authors.find(id)).execute(db).await? {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }
}
