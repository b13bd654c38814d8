//! The editorial rules for what to show on the front page.
use crate::models::DateTime;
use chrono::Duration;

#[derive(clap::Parser, Debug, Clone)]
pub struct Rules {
    /// Posts published within this many days can be trending.
    #[clap(long, env = "TRENDING_DAYS", default_value_t = 30)]
    pub trending_days: u32,

    /// Minimum number of active comments for a trending post.
    #[clap(long, env = "TRENDING_MIN_COMMENTS", default_value_t = 1)]
    pub trending_min_comments: i64,

    /// A post with this many active comments is an editor's choice.
    #[clap(long, env = "CHOICE_MIN_COMMENTS", default_value_t = 3)]
    pub choice_min_comments: i64,

    /// A post with any of these tags (by slug) is an editor's choice.
    #[clap(
        long,
        env = "CHOICE_TAGS",
        value_delimiter = ',',
        default_value = "featured,editor-choice"
    )]
    pub choice_tags: Vec<String>,

    /// Number of posts in each front page list.
    #[clap(long, env = "LATEST_LIMIT", default_value_t = 5)]
    pub latest_limit: u32,

    /// Number of tags in the front page tag list.
    #[clap(long, env = "TOP_TAGS_LIMIT", default_value_t = 10)]
    pub top_tags_limit: u32,

    /// Number of commenters in the front page list.
    #[clap(long, env = "COMMENTERS_LIMIT", default_value_t = 5)]
    pub commenters_limit: u32,

    /// Number of related posts shown with a post.
    #[clap(long, env = "RELATED_LIMIT", default_value_t = 3)]
    pub related_limit: u32,

    /// Number of posts per page in post lists.
    #[clap(long, env = "PAGE_SIZE", default_value_t = 10)]
    pub page_size: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            trending_days: 30,
            trending_min_comments: 1,
            choice_min_comments: 3,
            choice_tags: vec!["featured".into(), "editor-choice".into()],
            latest_limit: 5,
            top_tags_limit: 10,
            commenters_limit: 5,
            related_limit: 3,
            page_size: 10,
        }
    }
}

impl Rules {
    /// The earliest publish time of a trending post.
    pub fn trending_since(&self, now: DateTime) -> DateTime {
        now - Duration::days(self.trending_days.into())
    }

    /// Offset and limit for a 1-based page number.
    pub fn page(&self, page: u32) -> (u32, u32) {
        let page = page.max(1);
        (
            (page - 1).saturating_mul(self.page_size),
            self.page_size,
        )
    }
}
