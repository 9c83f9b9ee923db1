use std::collections::BTreeMap;
use std::time::Duration;

use config::shared::SourceApiConfig;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::source::RawDataSource;
use crate::types::{PartitionDate, RawObservation, RawTable, parse_timestamp};
use crate::{bail, etl_error};

/// Path of the raw data endpoint, relative to the configured base URL.
const DATA_PATH: &str = "data";

/// Format of the `start` and `end` query parameters.
const QUERY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One element of the JSON array returned by the data endpoint.
#[derive(Debug, Deserialize)]
struct SourceRecord {
    timestamp: String,
    #[serde(flatten)]
    values: BTreeMap<String, Option<f64>>,
}

/// Raw data source backed by the telemetry HTTP API.
///
/// Issues `GET <url>/data?start=..&end=..&variables=..` with the day's first and last second
/// as bounds, the API treating both as inclusive.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    data_url: Url,
}

impl HttpSource {
    pub fn new(config: &SourceApiConfig) -> EtlResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| {
                etl_error!(
                    ErrorKind::ConfigError,
                    "Failed to build the raw data source client",
                    err.to_string(),
                    source: err
                )
            })?;

        Self::with_client(client, &config.url)
    }

    /// Uses an already configured client, e.g. one shared with other components.
    pub fn with_client(client: Client, base_url: &str) -> EtlResult<Self> {
        let data_url = data_url(base_url)?;

        Ok(Self { client, data_url })
    }

    pub fn data_url(&self) -> &Url {
        &self.data_url
    }
}

impl RawDataSource for HttpSource {
    fn name() -> &'static str {
        "http"
    }

    async fn fetch(&self, date: PartitionDate, variables: &[String]) -> EtlResult<RawTable> {
        let (start, end) = date.fetch_range();
        let mut query = vec![
            ("start", start.format(QUERY_TIMESTAMP_FORMAT).to_string()),
            ("end", end.format(QUERY_TIMESTAMP_FORMAT).to_string()),
        ];
        query.extend(
            variables
                .iter()
                .map(|variable| ("variables", variable.clone())),
        );

        debug!(url = %self.data_url, %start, %end, ?variables, "requesting raw observations");

        let response = self
            .client
            .get(self.data_url.clone())
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                ErrorKind::SourceRequestFailed,
                "Raw data source returned an error status",
                format!("{} responded with {status}: {body}", self.data_url)
            );
        }

        let body = response.bytes().await?;
        let observations = parse_observations(&body, date, variables)?;

        if observations.is_empty() {
            bail!(
                ErrorKind::SourceNoData,
                "No data returned from source",
                format!("{} has no observations for {date}", self.data_url)
            );
        }

        info!(count = observations.len(), %date, "fetched raw observations");

        RawTable::new(observations)
    }
}

fn data_url(base_url: &str) -> EtlResult<Url> {
    let joined = format!("{}/{DATA_PATH}", base_url.trim_end_matches('/'));

    Url::parse(&joined).map_err(|err| {
        etl_error!(
            ErrorKind::ConfigError,
            "Invalid raw data source URL",
            format!("'{base_url}': {err}"),
            source: err
        )
    })
}

/// Decodes a data endpoint response body into observations of `date`.
///
/// Only `variables` are kept, null values are treated as missing, and records stamped outside
/// the day are discarded.
fn parse_observations(
    body: &[u8],
    date: PartitionDate,
    variables: &[String],
) -> EtlResult<Vec<RawObservation>> {
    let records: Vec<SourceRecord> = serde_json::from_slice(body).map_err(|err| {
        EtlError::from((
            ErrorKind::InvalidSourceResponse,
            "Raw data source response has an unexpected shape",
            err.to_string(),
        ))
        .with_source(err)
    })?;

    let mut observations = Vec::with_capacity(records.len());
    for record in records {
        let timestamp = parse_timestamp(&record.timestamp)?;
        if !date.contains(timestamp) {
            continue;
        }

        let mut observation = RawObservation::new(timestamp);
        for variable in variables {
            if let Some(Some(value)) = record.values.get(variable) {
                observation = observation.with_value(variable.as_str(), *value);
            }
        }
        observations.push(observation);
    }

    Ok(observations)
}
