use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The publication status of a post.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Eq,
    PartialEq,
    AsExpression,
    FromSqlRow,
    Serialize,
    Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    fn code(self) -> &'static str {
        match self {
            PostStatus::Draft => "DF",
            PostStatus::Published => "PB",
        }
    }
}

impl FromSql<Text, Pg> for PostStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "DF" => Ok(PostStatus::Draft),
            "PB" => Ok(PostStatus::Published),
            other => Err(format!("Bad post status {other:?}").into()),
        }
    }
}

impl ToSql<Text, Pg> for PostStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.code(), out)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        out.pad(match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        })
    }
}

#[test]
fn default_is_draft() {
    assert_eq!(PostStatus::default(), PostStatus::Draft);
    assert_eq!(PostStatus::default().code(), "DF");
    assert_eq!(PostStatus::Published.to_string(), "published");
}
