use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An url-safe identifier: ascii letters, digits and dashes.
#[derive(
    Debug,
    Clone,
    Eq,
    PartialEq,
    Hash,
    AsExpression,
    FromSqlRow,
    Serialize,
    Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a title or name.
    ///
    /// A slug longer than `max` is cut at the last dash that fits, or
    /// at `max` if there is none.  The result is empty if `name` has
    /// no letters or digits.
    pub fn from_name(name: &str, max: usize) -> Slug {
        let mut slug = slug::slugify(name);
        if slug.len() > max {
            let cut = match slug[..=max].rfind('-') {
                Some(dash) if dash > 0 => dash,
                _ => max,
            };
            slug.truncate(cut);
        }
        Slug(slug)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl FromSql<Text, Pg> for Slug {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Slug::from_str(&s).map_err(|_| format!("Bad slug {:?}", s).into())
    }
}
impl ToSql<Text, Pg> for Slug {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.0.as_str(), out)
    }
}
impl std::fmt::Display for Slug {
    fn fmt(&self, out: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(out)
    }
}
impl std::ops::Deref for Slug {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}
impl FromStr for Slug {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty()
            && s.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-')
        {
            Ok(Slug(s.to_string()))
        } else {
            Err(())
        }
    }
}
impl TryFrom<String> for Slug {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse().map_err(|()| format!("Bad slug {s:?}"))
    }
}
impl From<Slug> for String {
    fn from(slug: Slug) -> String {
        slug.0
    }
}

#[test]
fn derived_from_name() {
    assert_eq!(
        Slug::from_name("Cloud Security 101", 50).as_ref(),
        "cloud-security-101",
    );
    assert_eq!(Slug::from_name("UX/UI", 50).as_ref(), "ux-ui");
    assert_eq!(Slug::from_name("!!!", 50).as_ref(), "");
}

#[test]
fn derived_is_cut_at_dash() {
    assert_eq!(Slug::from_name("Cloud Security 101", 16).as_ref(), "cloud-security");
    assert_eq!(Slug::from_name("Cloud Security 101", 14).as_ref(), "cloud-security");
    assert_eq!(Slug::from_name("Cloud Security 101", 13).as_ref(), "cloud");
    assert_eq!(Slug::from_name("abcdefgh", 5).as_ref(), "abcde");
    // Transliteration makes the slug longer than the name.
    let name = "щ".repeat(20);
    assert_eq!(name.chars().count(), 20);
    assert_eq!(Slug::from_name(&name, 50).len(), 50);
}

#[test]
fn parse() {
    assert!("editor-choice".parse::<Slug>().is_ok());
    assert!("Editor-Choice-2".parse::<Slug>().is_ok());
    assert!("no spaces".parse::<Slug>().is_err());
    assert!("".parse::<Slug>().is_err());
    assert!("åäö".parse::<Slug>().is_err());
}
