use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::auth::InputCounts;

/// Tag carried by every failed result that crosses the engine boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingCredentials,
    DecryptionFailed,
    LoginFormNotFound,
    LoginButtonNotFound,
    Rejected,
    AmbiguousFailure,
    NotAuthenticated,
    MenuNotFound,
    SubDocumentNotFound,
    GridNotFound,
    SessionClosed,
    CredentialStore,
    Surface,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingCredentials => "MissingCredentials",
            ErrorKind::DecryptionFailed => "DecryptionFailed",
            ErrorKind::LoginFormNotFound => "LoginFormNotFound",
            ErrorKind::LoginButtonNotFound => "LoginButtonNotFound",
            ErrorKind::Rejected => "Rejected",
            ErrorKind::AmbiguousFailure => "AmbiguousFailure",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::MenuNotFound => "MenuNotFound",
            ErrorKind::SubDocumentNotFound => "SubDocumentNotFound",
            ErrorKind::GridNotFound => "GridNotFound",
            ErrorKind::SessionClosed => "SessionClosed",
            ErrorKind::CredentialStore => "CredentialStore",
            ErrorKind::Surface => "Surface",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("MissingCredentials: user id and secret are both required")]
    MissingCredentials,

    #[error("DecryptionFailed: stored secret could not be decrypted")]
    DecryptionFailed,

    #[error("LoginFormNotFound: no username/password pair on the login page ({0})")]
    LoginFormNotFound(InputCounts),

    #[error("LoginButtonNotFound: no way to submit the login form ({0})")]
    LoginButtonNotFound(InputCounts),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("AmbiguousFailure: still on the login page at {0} with no error message shown")]
    AmbiguousFailure(String),

    #[error("NotAuthenticated: log in before fetching records")]
    NotAuthenticated,

    #[error("MenuNotFound: no visible menu entry labelled '{0}'")]
    MenuNotFound(String),

    #[error("SubDocumentNotFound: {0}")]
    SubDocumentNotFound(String),

    #[error("GridNotFound: {0}")]
    GridNotFound(String),

    #[error("SessionClosed: the session has been shut down")]
    SessionClosed,

    #[error("CredentialStore: {0}")]
    CredentialStore(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Script result could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCredentials => ErrorKind::MissingCredentials,
            Error::DecryptionFailed => ErrorKind::DecryptionFailed,
            Error::LoginFormNotFound(_) => ErrorKind::LoginFormNotFound,
            Error::LoginButtonNotFound(_) => ErrorKind::LoginButtonNotFound,
            Error::Rejected(_) => ErrorKind::Rejected,
            Error::AmbiguousFailure(_) => ErrorKind::AmbiguousFailure,
            Error::NotAuthenticated => ErrorKind::NotAuthenticated,
            Error::MenuNotFound(_) => ErrorKind::MenuNotFound,
            Error::SubDocumentNotFound(_) => ErrorKind::SubDocumentNotFound,
            Error::GridNotFound(_) => ErrorKind::GridNotFound,
            Error::SessionClosed => ErrorKind::SessionClosed,
            Error::CredentialStore(_) => ErrorKind::CredentialStore,
            Error::Surface(_) | Error::Decode(_) => ErrorKind::Surface,
        }
    }

    /// Structured triage data, when the failure carries any
    pub fn diagnostics(&self) -> Option<serde_json::Value> {
        match self {
            Error::LoginFormNotFound(counts) | Error::LoginButtonNotFound(counts) => {
                serde_json::to_value(counts).ok()
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
