//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use timeclock_domain::{SubmissionError, TimeclockError};
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TimeclockError);

impl From<InfraError> for TimeclockError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TimeclockError> for InfraError {
    fn from(value: TimeclockError) -> Self {
        InfraError(value)
    }
}

trait IntoTimeclockError {
    fn into_timeclock(self) -> TimeclockError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → TimeclockError */
/* -------------------------------------------------------------------------- */

impl IntoTimeclockError for SqlError {
    fn into_timeclock(self) -> TimeclockError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => TimeclockError::Storage("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        TimeclockError::Storage("database is locked".into())
                    }
                    ErrorCode::DiskFull => TimeclockError::Storage("device storage is full".into()),
                    ErrorCode::ReadOnly => {
                        TimeclockError::Storage("database is read-only".into())
                    }
                    ErrorCode::NotADatabase => {
                        TimeclockError::Storage("file is not a database".into())
                    }
                    _ => TimeclockError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                TimeclockError::Storage(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                TimeclockError::Storage(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(..) => {
                TimeclockError::Storage("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidPath(path) => TimeclockError::Storage(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => TimeclockError::Storage(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_timeclock())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error / JoinError → TimeclockError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(TimeclockError::Storage(format!("I/O error: {value}")))
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        let message = if value.is_panic() {
            "storage task panicked".to_string()
        } else {
            format!("storage task cancelled: {value}")
        };
        InfraError(TimeclockError::Internal(message))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TimeclockError / SubmissionError */
/* -------------------------------------------------------------------------- */

impl IntoTimeclockError for HttpError {
    fn into_timeclock(self) -> TimeclockError {
        if self.is_builder() {
            return TimeclockError::Config(format!("invalid HTTP client setup: {self}"));
        }
        TimeclockError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_timeclock())
    }
}

/// Classify a transport-level reqwest failure.
///
/// Status errors are handled by the API client from the response itself;
/// this only sees failures where no usable response arrived.
pub fn submission_error_from_http(err: &HttpError) -> SubmissionError {
    if err.is_timeout() {
        return SubmissionError::timeout(format!("HTTP request timed out: {err}"));
    }

    if err.is_connect() || err.is_request() {
        return SubmissionError::network(format!("HTTP connection failure: {err}"));
    }

    if let Some(status) = err.status() {
        return SubmissionError::from_status(status.as_u16(), err.to_string());
    }

    // Body or decode errors after the server accepted the request
    SubmissionError::network(err.to_string())
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
