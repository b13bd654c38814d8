//! An editorial blog: posts, tags and comments in postgres, with
//! front page queries and a read-only json api.
#![forbid(unsafe_code)]

pub mod dbopt;
pub mod error;
pub mod listposts;
pub mod listtags;
pub mod modcomments;
pub mod models;
pub mod rules;
pub mod schema;
pub mod seed;
pub mod server;
