use diesel::sql_types::Timestamptz;

mod author;
mod comment;
mod post;
mod slug;
mod status;
mod tag;
mod teaser;
mod validate;

pub use self::author::{Author, NewAuthor};
pub use self::comment::{Comment, CommentChanges, Commenter, NewComment};
pub use self::post::{NewPost, Post, PostChanges};
pub use self::slug::Slug;
pub use self::status::PostStatus;
pub use self::tag::{NewTag, Tag, TagChanges, TagCount};
pub use self::teaser::Teaser;

pub type DateTime = chrono::DateTime<chrono::Utc>;

type Result<T, E = crate::error::Error> = std::result::Result<T, E>;

diesel::define_sql_function! {
    /// The calendar day (in UTC) of a timestamp.
    fn publish_date(ts: Timestamptz) -> diesel::sql_types::Date;
}
