//! Errors from the stores.
use diesel::result::{DatabaseErrorKind, Error as DbError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested row does not exist.
    #[error("Not found")]
    NotFound,
    /// The write was rejected by a unique or foreign key constraint.
    #[error("Conflict on {field}: {reason}")]
    Conflict { field: &'static str, reason: String },
    /// The input was rejected before reaching the database.
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("Database error: {0}")]
    Database(DbError),
}

impl Error {
    pub(crate) fn invalid(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Error::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// The field that caused a conflict or validation failure, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::Conflict { field, .. } | Error::Invalid { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => Error::NotFound,
            DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let constraint = info.constraint_name().unwrap_or_default();
                let (field, reason) = unique_reason(constraint);
                Error::Conflict {
                    field,
                    reason: reason.into(),
                }
            }
            DbError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => {
                let field = fk_field(info.constraint_name().unwrap_or_default());
                Error::Conflict {
                    field,
                    reason: format!("no such {field}"),
                }
            }
            e => Error::Database(e),
        }
    }
}

fn unique_reason(constraint: &str) -> (&'static str, &'static str) {
    match constraint {
        "tags_name_key" => ("name", "a tag with this name already exists"),
        "tags_slug_key" => ("slug", "a tag with this slug already exists"),
        "posts_publish_date_slug_key" => {
            ("slug", "must be unique for the publish date")
        }
        "authors_username_key" => ("username", "already taken"),
        "post_tags_pkey" => ("tags", "tag given twice"),
        _ => ("unknown", "already exists"),
    }
}

fn fk_field(constraint: &str) -> &'static str {
    match constraint {
        "posts_author_id_fkey" => "author",
        "comments_post_id_fkey" | "post_tags_post_id_fkey" => "post",
        "post_tags_tag_id_fkey" => "tag",
        _ => "reference",
    }
}
