use crate::error::Error;
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use tracing::{error, warn};
use warp::http::status::StatusCode;
use warp::reply::Response;
use warp::{self, Rejection, Reply};

#[derive(Debug)]
pub enum ViewError {
    /// 404
    NotFound,
    /// 400
    BadRequest(String),
    /// 503
    ServiceUnavailable,
    /// 500
    Err(String),
}

pub trait ViewResult<T> {
    fn ise(self) -> Result<T, ViewError>;
}

impl<T, E> ViewResult<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn ise(self) -> Result<T, ViewError> {
        self.map_err(|e| ViewError::Err(e.to_string()))
    }
}

impl Reply for ViewError {
    fn into_response(self) -> Response {
        match self {
            ViewError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "Not found")
            }
            ViewError::BadRequest(msg) => {
                error_response(StatusCode::BAD_REQUEST, &msg)
            }
            ViewError::ServiceUnavailable => error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "The server is exhausted and can't handle your request \
                 right now. Sorry. \
                 Please try again later.",
            ),
            ViewError::Err(e) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
}

fn error_response(code: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        status: code.as_u16(),
        message,
    };
    warp::reply::with_status(warp::reply::json(&body), code).into_response()
}

impl From<Error> for ViewError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound => ViewError::NotFound,
            Error::Invalid { .. } => ViewError::BadRequest(e.to_string()),
            e => {
                error!("Store error: {e}");
                ViewError::Err("Database error".to_string())
            }
        }
    }
}

impl From<PoolError> for ViewError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Timeout(kind) => {
                warn!("Pool timeout: {:?}", kind);
                ViewError::ServiceUnavailable
            }
            e => {
                error!("Pool error: {e}");
                ViewError::Err("Database error".to_string())
            }
        }
    }
}

/// Create custom errors for warp rejections.
///
/// Currently only handles 404 and bad query strings, other rejections
/// are left to warp.
pub async fn for_rejection(err: Rejection) -> Result<Response, Rejection> {
    if err.is_not_found() {
        Ok(ViewError::NotFound.into_response())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        Ok(ViewError::BadRequest(e.to_string()).into_response())
    } else {
        Err(err)
    }
}
