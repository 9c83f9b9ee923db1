use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use etl::error::EtlError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;

/// Backtrace captured where a non-pipeline error was converted.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the aggregator binary.
#[derive(Debug)]
pub enum AggregatorError {
    /// The run itself failed, including a malformed partition date.
    Etl(EtlError),
    /// Configuration could not be loaded or is invalid, or tracing could not be installed.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// The async runtime could not be started.
    Io(std::io::Error, CapturedBacktrace),
}

impl AggregatorError {
    /// Short category label of this error.
    pub fn category(&self) -> &'static str {
        match self {
            AggregatorError::Etl(_) => "aggregation error",
            AggregatorError::Config(_, _) => "configuration error",
            AggregatorError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> &Backtrace {
        match self {
            AggregatorError::Etl(err) => err.backtrace(),
            AggregatorError::Config(_, cb) => &cb.0,
            AggregatorError::Io(_, cb) => &cb.0,
        }
    }

    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        AggregatorError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Multi-line report printed to stderr when the process fails.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("aggregator failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace() {
            out.push_str("backtrace:\n");
            out.push_str(&self.backtrace().to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for AggregatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatorError::Etl(err) => write!(f, "{err}"),
            AggregatorError::Config(source, _) => write!(f, "configuration error: {source}"),
            AggregatorError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for AggregatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AggregatorError::Etl(err) => err.source(),
            AggregatorError::Config(source, _) => Some(source.as_ref()),
            AggregatorError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for AggregatorError {
    fn from(err: std::io::Error) -> Self {
        AggregatorError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<EtlError> for AggregatorError {
    fn from(err: EtlError) -> Self {
        AggregatorError::Etl(err)
    }
}
