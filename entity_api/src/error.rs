//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use mongodb::bson;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors while executing operations related to documents.
/// The intent is to categorize errors into two major types:
///  * Errors related to data. Ex EntityApiErrorKind::RecordNotFound
///  * Errors related to interactions with the database itself. Ex a lost connection
#[derive(Debug)]
pub struct Error {
    // Underlying error emitted from the MongoDB driver
    pub source: Option<MongoError>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Invalid search term, e.g. a malformed ObjectId
    InvalidQueryTerm,
    // Record not found
    RecordNotFound,
    // A unique index rejected the write
    DuplicateKey,
    // Errors related to interactions with the database itself
    SystemError,
    // Other errors
    Other,
}

impl Error {
    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Entity API Error: {:?}: {source}", self.error_kind),
            None => write!(f, "Entity API Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<MongoError> for Error {
    fn from(err: MongoError) -> Self {
        let error_kind = if is_duplicate_key(&err) {
            EntityApiErrorKind::DuplicateKey
        } else {
            EntityApiErrorKind::SystemError
        };

        Error {
            source: Some(err),
            error_kind,
        }
    }
}

impl From<bson::ser::Error> for Error {
    fn from(err: bson::ser::Error) -> Self {
        log::error!("Failed to encode document: {err}");
        Error {
            source: None,
            error_kind: EntityApiErrorKind::Other,
        }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_has_no_source() {
        let error = Error::not_found();
        assert_eq!(error.error_kind, EntityApiErrorKind::RecordNotFound);
        assert!(error.source.is_none());
        assert_eq!(error.to_string(), "Entity API Error: RecordNotFound");
    }

    #[test]
    fn test_driver_errors_without_code_are_system_errors() {
        let driver_error = MongoError::custom("connection reset");
        let error: Error = driver_error.into();
        assert_eq!(error.error_kind, EntityApiErrorKind::SystemError);
        assert!(error.source.is_some());
    }
}
