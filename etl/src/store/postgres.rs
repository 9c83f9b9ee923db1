use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDateTime;
use config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use crate::error::EtlResult;
use crate::store::AggregateStore;
use crate::types::{AggregateDataPoint, SignalId};

/// Maximum number of connections in the pool.
///
/// A run issues its statements one after the other, so a single session is enough.
const MAX_POOL_CONNECTIONS: u32 = 1;

/// Duration after which idle connections are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Rows per insert statement, keeping the three binds per row below the protocol's bind limit.
const INSERT_CHUNK_ROWS: usize = 1_000;

/// Creates a lazily connected pool, no connection is opened until the first query.
fn create_database_pool(config: &PgConnectionConfig) -> PgPool {
    let options = config.with_db();

    PgPoolOptions::new()
        .min_connections(0)
        .max_connections(MAX_POOL_CONNECTIONS)
        .idle_timeout(Some(IDLE_TIMEOUT))
        .connect_lazy_with(options)
}

/// Aggregate store backed by Postgres.
///
/// Expects the following tables to exist:
///
/// ```sql
/// create table signal (
///     id bigserial primary key,
///     name text not null unique
/// );
///
/// create table data (
///     "timestamp" timestamp not null,
///     signal_id bigint not null references signal (id),
///     value double precision not null,
///     primary key ("timestamp", signal_id)
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(config: &PgConnectionConfig) -> Self {
        Self {
            pool: create_database_pool(config),
        }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Closes the pool, waiting for the open connection to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl AggregateStore for PostgresStore {
    async fn load_signals(&self) -> EtlResult<BTreeMap<String, SignalId>> {
        let rows = sqlx::query("select id, name from signal")
            .fetch_all(&self.pool)
            .await?;

        let mut signals = BTreeMap::new();
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            signals.insert(name, SignalId(id));
        }

        debug!(count = signals.len(), "loaded signals");

        Ok(signals)
    }

    async fn create_signal(&self, name: &str) -> EtlResult<SignalId> {
        let created = sqlx::query(
            r#"
            insert into signal (name)
            values ($1)
            on conflict (name) do nothing
            returning id
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = created {
            let id: i64 = row.try_get(0)?;
            info!(signal = name, id, "created signal");

            return Ok(SignalId(id));
        }

        // Lost the race against another writer, its row is the one to use.
        let id: i64 = sqlx::query("select id from signal where name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        Ok(SignalId(id))
    }

    async fn aggregate_exists(
        &self,
        timestamp: NaiveDateTime,
        signal_id: SignalId,
    ) -> EtlResult<bool> {
        let exists: bool = sqlx::query(
            r#"select exists (select 1 from data where "timestamp" = $1 and signal_id = $2)"#,
        )
        .bind(timestamp)
        .bind(signal_id.0)
        .fetch_one(&self.pool)
        .await?
        .try_get(0)?;

        Ok(exists)
    }

    async fn insert_aggregates(&self, points: Vec<AggregateDataPoint>) -> EtlResult<u64> {
        if points.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let mut written = 0;
        for chunk in points.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(r#"insert into data ("timestamp", signal_id, value) "#);
            builder.push_values(chunk, |mut row, point| {
                row.push_bind(point.timestamp)
                    .push_bind(point.signal_id.0)
                    .push_bind(point.value);
            });
            builder.push(r#" on conflict ("timestamp", signal_id) do nothing"#);

            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        debug!(rows = written, "inserted aggregates");

        Ok(written)
    }
}
