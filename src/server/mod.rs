//! A read-only json api for the reader facing views.
mod error;

use self::error::{ViewError, ViewResult};
use crate::dbopt::{Connection, DbOpt, Pool};
use crate::models::{Comment, Commenter, Post, Slug, Tag, TagCount, Teaser};
use crate::rules::Rules;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, instrument};
use warp::filters::BoxedFilter;
use warp::http::header::{CONTENT_TYPE, SERVER};
use warp::http::response::Builder;
use warp::reply::Response;
use warp::{self, Filter, Reply};

type Result<T, E = ViewError> = std::result::Result<T, E>;

/// Longest search query accepted.
const MAX_QUERY_LEN: usize = 100;

#[derive(Parser)]
pub struct Args {
    #[clap(flatten)]
    db: DbOpt,

    /// Adress to listen on
    #[clap(long, default_value = "127.0.0.1:8765")]
    bind: SocketAddr,

    #[clap(flatten)]
    rules: Rules,
}

impl Args {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let app = Arc::new(AppData {
            pool: self.db.build_pool()?,
            rules: self.rules,
        });
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to wait for ctrl-c: {e}");
            }
        };
        let (addr, server) = warp::serve(routes(app))
            .try_bind_with_graceful_shutdown(self.bind, shutdown)?;
        info!("Listening on http://{addr}/");
        server.await;
        info!("Server stopped");
        Ok(())
    }
}

pub struct AppData {
    pool: Pool,
    rules: Rules,
}
type App = Arc<AppData>;

impl std::fmt::Debug for AppData {
    fn fmt(&self, out: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = self.pool.status();
        write!(out, "App(pool {}/{}({}))", s.available, s.size, s.max_size)
    }
}

impl AppData {
    async fn db(&self) -> Result<Connection, PoolError> {
        self.pool.get().await
    }
}

/// All routes of the api, with errors turned into json responses.
pub fn routes(app: App) -> BoxedFilter<(Response,)> {
    use warp::path::{end, param, path};
    use warp::query;
    let s = warp::any().map(move || app.clone()).boxed();
    let s = move || s.clone();

    end()
        .and(goh())
        .and(s())
        .then(frontpage)
        .map(wrap)
        .or(path("posts")
            .and(end())
            .and(goh())
            .and(query())
            .and(s())
            .then(post_list)
            .map(wrap))
        .unify()
        .or(path("search")
            .and(end())
            .and(goh())
            .and(query())
            .and(s())
            .then(search)
            .map(wrap))
        .unify()
        .or(param()
            .and(param())
            .and(param())
            .and(param())
            .and(end())
            .and(goh())
            .and(s())
            .then(post_detail)
            .map(wrap))
        .unify()
        .recover(error::for_rejection)
        .unify()
        .boxed()
}

fn wrap(result: Result<impl Reply>) -> Response {
    match result {
        Ok(reply) => reply.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Get or head - a filter matching GET and HEAD requests only.
fn goh() -> BoxedFilter<()> {
    use warp::{get, head};
    get().or(head()).unify().boxed()
}

fn response() -> Builder {
    Builder::new().header(
        SERVER,
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
    )
}

fn json<T: Serialize>(value: &T) -> Result<Response> {
    let body = serde_json::to_vec(value).ise()?;
    response()
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .ise()
}

#[derive(Serialize)]
struct FrontPage {
    latest: Vec<Teaser>,
    trending: Vec<Teaser>,
    editors_choice: Vec<Teaser>,
    top_tags: Vec<TagCount>,
    active_commenters: Vec<Commenter>,
}

#[instrument]
async fn frontpage(app: App) -> Result<Response> {
    let mut db = app.db().await?;
    let rules = &app.rules;
    let limit = rules.latest_limit;
    let latest = Teaser::latest(limit, &mut db).await?;
    let trending = Teaser::trending(
        rules.trending_since(Utc::now()),
        rules.trending_min_comments,
        limit,
        &mut db,
    )
    .await?;
    let editors_choice = Teaser::editors_choice(
        rules.choice_min_comments,
        &rules.choice_tags,
        limit,
        &mut db,
    )
    .await?;
    let top_tags = TagCount::top(rules.top_tags_limit, &mut db).await?;
    let active_commenters =
        Commenter::top(rules.commenters_limit, &mut db).await?;

    json(&FrontPage {
        latest,
        trending,
        editors_choice,
        top_tags,
        active_commenters,
    })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    tag: Option<String>,
    page: Option<u32>,
}

#[derive(Serialize)]
struct PostList {
    tag: Option<Tag>,
    page: u32,
    posts: Vec<Teaser>,
}

#[instrument]
async fn post_list(query: ListQuery, app: App) -> Result<Response> {
    let page = query.page.unwrap_or(1).max(1);
    let (offset, limit) = app.rules.page(page);
    let mut db = app.db().await?;
    let tag = match query.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(slug) => {
            let slug = slug.parse::<Slug>().map_err(|()| ViewError::NotFound)?;
            let tag = Tag::by_slug(&slug, &mut db).await?;
            Some(tag.ok_or(ViewError::NotFound)?)
        }
        None => None,
    };
    let posts = match &tag {
        Some(tag) => Teaser::tagged(tag.id, offset, limit, &mut db).await?,
        None => Teaser::page(offset, limit, &mut db).await?,
    };
    json(&PostList { tag, page, posts })
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct SearchResult {
    query: String,
    results: Vec<Teaser>,
}

#[instrument]
async fn search(query: SearchQuery, app: App) -> Result<Response> {
    let query = query.q.as_deref().unwrap_or_default().trim().to_string();
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ViewError::BadRequest(format!(
            "The search query may be at most {MAX_QUERY_LEN} characters"
        )));
    }
    let results = if query.is_empty() {
        Vec::new()
    } else {
        let mut db = app.db().await?;
        Teaser::search(&query, &mut db).await?
    };
    json(&SearchResult { query, results })
}

#[derive(Serialize)]
struct CommentView<'a> {
    #[serde(flatten)]
    comment: &'a Comment,
    avatar: String,
}

#[derive(Serialize)]
struct PostPage<'a> {
    post: &'a Post,
    url: String,
    tags: Vec<Tag>,
    comments: Vec<CommentView<'a>>,
    related: Vec<Teaser>,
}

#[instrument]
async fn post_detail(
    year: i32,
    month: u32,
    day: u32,
    slug: Slug,
    app: App,
) -> Result<Response> {
    let date =
        NaiveDate::from_ymd_opt(year, month, day).ok_or(ViewError::NotFound)?;
    let mut db = app.db().await?;
    let post = Post::published_on(date, &slug, &mut db)
        .await?
        .ok_or(ViewError::NotFound)?;
    let tags = Tag::for_post(post.id, &mut db).await?;
    let comments = Comment::active_for_post(post.id, &mut db).await?;
    let related =
        Teaser::related(post.id, &tags, app.rules.related_limit, &mut db)
            .await?;

    json(&PostPage {
        post: &post,
        url: post.url(),
        tags,
        comments: comments
            .iter()
            .map(|comment| CommentView {
                comment,
                avatar: comment.gravatar(),
            })
            .collect(),
        related,
    })
}
