use clap::Parser;
use diesel::ConnectionError;
use diesel_async::pooled_connection::deadpool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// An asynchronous postgres database connection pool.
pub type Pool = deadpool::Pool<AsyncPgConnection>;
pub type Connection = deadpool::Object<AsyncPgConnection>;

#[derive(Parser)]
pub struct DbOpt {
    /// How to connect to the postgres database.
    #[clap(long, env = "DATABASE_URL", hide_env_values = true)]
    db_url: String,
}

impl DbOpt {
    /// Get a single database connection from the configured url.
    ///
    /// This is for the one-off admin tasks, that don't need a pool.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_db(&self) -> Result<AsyncPgConnection, ConnectionError> {
        let time = Instant::now();
        let connection = AsyncPgConnection::establish(&self.db_url).await?;
        let time = time.elapsed();
        if time > Duration::from_millis(50) {
            warn!("Got a db connection in {time:.1?}.  Why so slow?");
        } else {
            debug!("Got a connection in {time:.1?}.");
        }
        Ok(connection)
    }

    /// Get a database connection pool from the configured url.
    pub fn build_pool(&self) -> Result<Pool, deadpool::BuildError> {
        let config = AsyncDieselConnectionManager::new(&self.db_url);
        Pool::builder(config).max_size(20).build()
    }
}
