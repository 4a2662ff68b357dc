use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Invalid object ID: {0}")]
    InvalidObjectId(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// MongoDB server code for a unique-index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Whether a driver error is a unique-index violation (E11000).
///
/// Plain inserts report the violation as a write error; `findAndModify`
/// (which backs the upsert-based find-or-create) reports it as a command
/// error, so both shapes must be recognized.
pub fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match *error.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(ref command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bson::doc;
    use mongodb::error::{CommandError, WriteError};

    use super::*;

    // The driver's error structs are non-exhaustive; they are built here
    // the way the driver builds them, from server reply documents.
    fn write_failure(code: i32, message: &str) -> mongodb::error::Error {
        let write_error: WriteError =
            bson::from_document(doc! { "code": code, "errmsg": message }).unwrap();
        ErrorKind::Write(WriteFailure::WriteError(write_error)).into()
    }

    fn command_failure(code: i32, message: &str) -> mongodb::error::Error {
        let command_error: CommandError =
            bson::from_document(doc! { "code": code, "errmsg": message }).unwrap();
        ErrorKind::Command(command_error).into()
    }

    #[test]
    fn test_insert_write_error_is_duplicate_key() {
        let error = write_failure(
            11000,
            "E11000 duplicate key error collection: parlor.messages index: message_id_1",
        );
        assert!(is_duplicate_key(&error));
    }

    #[test]
    fn test_find_and_modify_command_error_is_duplicate_key() {
        let error = command_failure(
            11000,
            "E11000 duplicate key error collection: parlor.conversations index: account_id_1_ig_user_id_1",
        );
        assert!(is_duplicate_key(&error));
    }

    #[test]
    fn test_other_server_codes_are_not_duplicate_keys() {
        assert!(!is_duplicate_key(&write_failure(
            121,
            "Document failed validation"
        )));
        assert!(!is_duplicate_key(&command_failure(26, "ns not found")));
    }

    #[test]
    fn test_non_server_errors_are_not_duplicate_keys() {
        let error: mongodb::error::Error = ErrorKind::Io(Arc::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
        .into();
        assert!(!is_duplicate_key(&error));
    }
}
