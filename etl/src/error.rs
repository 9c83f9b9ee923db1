//! Error types and result definitions for aggregation runs.
//!
//! Every failure of a run is an [`EtlError`] classified by an [`ErrorKind`], so that the caller
//! that triggered the run can decide per kind whether to retry, skip or alert. Errors carry a
//! static description, optional dynamic detail, the originating error and the callsite.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type used by all fallible operations of this crate.
pub type EtlResult<T> = Result<T, EtlError>;

/// Main error type of the crate.
#[derive(Debug, Clone)]
pub struct EtlError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Categories of failures a run can end with.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Input errors
    InvalidPartitionDate,
    InvalidSourceResponse,
    InvalidData,

    // Raw data source errors
    SourceConnectionFailed,
    SourceRequestFailed,
    /// The source answered successfully but holds no observations for the requested day.
    SourceNoData,

    // Aggregate store errors
    DestinationConnectionFailed,
    DestinationQueryFailed,
    DestinationConstraintViolation,

    // Contract errors
    MissingSignalMapping,

    // Configuration, conversion and I/O errors
    ConfigError,
    ConversionError,
    DeserializationError,
    IoError,

    Unknown,

    /// Raised by a configured failpoint.
    WithFailpoint,
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn backtrace(&self) -> &Backtrace {
        self.backtrace.as_ref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches the error that caused this one, exposed through [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        EtlError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    #[track_caller]
    fn from_source<E>(kind: ErrorKind, description: &'static str, err: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        let detail = err.to_string();
        EtlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Two errors are equal when they have the same kind.
impl PartialEq for EtlError {
    fn eq(&self, other: &EtlError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = self.detail.as_deref() {
            write_detail(detail, f)?;
        }

        Ok(())
    }
}

impl error::Error for EtlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

fn write_detail(detail: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        if line.trim().is_empty() {
            write!(f, "\n    ")?;
        } else {
            write!(f, "\n    {line}")?;
        }
    }

    Ok(())
}

impl From<(ErrorKind, &'static str)> for EtlError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for EtlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> EtlError {
        EtlError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

impl From<std::io::Error> for EtlError {
    #[track_caller]
    fn from(err: std::io::Error) -> EtlError {
        EtlError::from_source(ErrorKind::IoError, "I/O operation failed", err)
    }
}

impl From<serde_json::Error> for EtlError {
    #[track_caller]
    fn from(err: serde_json::Error) -> EtlError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        EtlError::from_source(kind, description, err)
    }
}

impl From<chrono::ParseError> for EtlError {
    #[track_caller]
    fn from(err: chrono::ParseError) -> EtlError {
        EtlError::from_source(ErrorKind::ConversionError, "Datetime parsing failed", err)
    }
}

impl From<chrono::RoundingError> for EtlError {
    #[track_caller]
    fn from(err: chrono::RoundingError) -> EtlError {
        EtlError::from_source(
            ErrorKind::InvalidData,
            "Timestamp could not be truncated to its window",
            err,
        )
    }
}

/// Converts [`reqwest::Error`] raised while talking to the raw data source.
///
/// Connection and timeout failures map to [`ErrorKind::SourceConnectionFailed`], non-success
/// statuses to [`ErrorKind::SourceRequestFailed`] and undecodable bodies to
/// [`ErrorKind::InvalidSourceResponse`].
impl From<reqwest::Error> for EtlError {
    #[track_caller]
    fn from(err: reqwest::Error) -> EtlError {
        let (kind, description) = if err.is_connect() || err.is_timeout() {
            (ErrorKind::SourceConnectionFailed, "Raw data source is unreachable")
        } else if err.is_status() {
            (
                ErrorKind::SourceRequestFailed,
                "Raw data source returned an error status",
            )
        } else if err.is_decode() {
            (
                ErrorKind::InvalidSourceResponse,
                "Raw data source response could not be decoded",
            )
        } else {
            (ErrorKind::SourceRequestFailed, "Raw data source request failed")
        };

        EtlError::from_source(kind, description, err)
    }
}

/// Converts [`sqlx::Error`] raised by the aggregate store.
///
/// Unique and foreign key violations map to [`ErrorKind::DestinationConstraintViolation`], pool
/// and I/O failures to [`ErrorKind::DestinationConnectionFailed`].
impl From<sqlx::Error> for EtlError {
    #[track_caller]
    fn from(err: sqlx::Error) -> EtlError {
        let (kind, description) = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => (
                    ErrorKind::DestinationConstraintViolation,
                    "Aggregate store constraint violated",
                ),
                _ => (
                    ErrorKind::DestinationQueryFailed,
                    "Aggregate store query failed",
                ),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut => (
                ErrorKind::DestinationConnectionFailed,
                "Aggregate store connection failed",
            ),
            _ => (
                ErrorKind::DestinationQueryFailed,
                "Aggregate store query failed",
            ),
        };

        EtlError::from_source(kind, description, err)
    }
}
