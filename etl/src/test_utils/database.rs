use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use config::shared::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
use sqlx::{Connection, Executor, PgConnection, PgPool};

use crate::store::postgres::PostgresStore;

/// Databases created by this process so far, part of every generated name.
static DATABASE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Tables of the aggregate store, as [`PostgresStore`] expects them.
const SCHEMA: &str = r#"
create table signal (
    id bigserial primary key,
    name text not null unique
);

create table data (
    "timestamp" timestamp not null,
    signal_id bigint not null references signal (id),
    value double precision not null,
    primary key ("timestamp", signal_id)
);
"#;

/// A freshly created database holding empty aggregate store tables.
#[derive(Debug)]
pub struct TestDatabase {
    pub config: PgConnectionConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Store writing to this database through its pool.
    pub fn store(&self) -> PostgresStore {
        PostgresStore::from_pool(self.pool.clone())
    }

    /// Closes the pool and drops the database.
    ///
    /// Failures are only reported, leftovers of an aborted cleanup are harmless.
    pub async fn cleanup(self) {
        self.pool.close().await;
        drop_database(&self.config).await;
    }
}

/// Generates connection settings for a uniquely named test database.
///
/// Configuration is read from environment variables:
/// - `TESTS_DATABASE_HOST`: Postgres server hostname, tests needing a database are skipped when
///   unset
/// - `TESTS_DATABASE_PORT`: Postgres server port, defaults to `5432`
/// - `TESTS_DATABASE_USERNAME`: Database user, defaults to `postgres`
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
fn local_pg_connection_config() -> Option<PgConnectionConfig> {
    let host = std::env::var("TESTS_DATABASE_HOST").ok()?;
    let port = std::env::var("TESTS_DATABASE_PORT")
        .map(|port| {
            port.parse::<u16>()
                .expect("TESTS_DATABASE_PORT must be a valid port number")
        })
        .unwrap_or(5432);

    Some(PgConnectionConfig {
        host,
        port,
        name: unique_database_name(),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .unwrap_or_else(|_| "postgres".to_string()),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig::disabled(),
    })
}

fn unique_database_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after the unix epoch")
        .as_nanos();
    let counter = DATABASE_COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("aggregates_test_{}_{nanos}_{counter}", std::process::id())
}

/// Creates a new database with the aggregate store tables.
///
/// Returns `None` when `TESTS_DATABASE_HOST` is not set.
///
/// # Panics
///
/// Panics if the server cannot be reached or the database cannot be created.
pub async fn spawn_database() -> Option<TestDatabase> {
    let config = local_pg_connection_config()?;

    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"create database "{}";"#, config.name))
        .await
        .expect("Failed to create database");
    connection
        .close()
        .await
        .expect("Failed to close the setup connection");

    let pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to the test database");
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create the aggregate store tables");

    Some(TestDatabase { config, pool })
}

/// Terminates the remaining connections to the database and drops it.
///
/// Does not panic, failures are printed and ignored.
async fn drop_database(config: &PgConnectionConfig) {
    let mut connection = match PgConnection::connect_with(&config.without_db()).await {
        Ok(connection) => connection,
        Err(err) => {
            eprintln!("warning: failed to connect to Postgres for cleanup: {err}");
            return;
        }
    };

    if let Err(err) = connection
        .execute(&*format!(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = '{}'
            and pid <> pg_backend_pid();"#,
            config.name
        ))
        .await
    {
        eprintln!(
            "warning: failed to terminate connections to database {}: {err}",
            config.name
        );
    }

    if let Err(err) = connection
        .execute(&*format!(r#"drop database if exists "{}";"#, config.name))
        .await
    {
        eprintln!("warning: failed to drop database {}: {err}", config.name);
    }
}
