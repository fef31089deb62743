//! Collaborator surfaces. Everything durable (accounts, video files,
//! schedule rows) lives in an external backend-as-a-service; the core only
//! talks to these three traits. No call is ever retried automatically:
//! retry is a user action.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use bytes::Bytes;

use crate::model::{ScheduleRow, TenantId, Weekday};

/// One failure shape for all collaborator calls: which operation failed and
/// the upstream message, verbatim.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub op: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(op: &'static str, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.op, self.message)
    }
}

impl std::error::Error for BackendError {}

/// An authenticated session. The tenant id doubles as the restaurant id,
/// the only thing the core ever needs from the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub tenant: TenantId,
    pub email: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    /// Providers that require email confirmation return `None` until the
    /// account is confirmed and signed in.
    async fn sign_up(&self, email: &str, password: &str)
        -> Result<Option<Session>, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn reset_password(&self, email: &str) -> Result<(), BackendError>;

    /// The current session, if any.
    async fn session(&self) -> Result<Option<Session>, BackendError>;
}

/// A stored object as the blob store lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UploadOpts {
    pub content_type: String,
    /// Cache lifetime in seconds, forwarded to the store.
    pub cache_control: Option<u32>,
    /// When false, uploading over an existing path is an error.
    pub upsert: bool,
}

/// Object storage under a single namespace (the `videos` bucket).
/// Paths are `prefix/name` strings relative to the bucket root.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>, BackendError>;

    async fn upload(&self, path: &str, bytes: Bytes, opts: &UploadOpts)
        -> Result<(), BackendError>;

    async fn download(&self, path: &str) -> Result<Bytes, BackendError>;

    /// Removing paths that don't exist is not an error.
    async fn remove(&self, paths: &[String]) -> Result<(), BackendError>;

    /// Resolve the publicly playable URL for a path. Local, no I/O.
    fn public_url(&self, path: &str) -> String;
}

/// Predicates the `schedules` relation is ever queried or deleted by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    Tenant(TenantId),
    TenantDay(TenantId, Weekday),
}

impl RowFilter {
    pub fn tenant(&self) -> &TenantId {
        match self {
            RowFilter::Tenant(t) => t,
            RowFilter::TenantDay(t, _) => t,
        }
    }

    pub fn matches(&self, row: &ScheduleRow) -> bool {
        match self {
            RowFilter::Tenant(t) => row.restaurant_id == t.as_str(),
            RowFilter::TenantDay(t, day) => {
                row.restaurant_id == t.as_str() && row.day_of_week == *day
            }
        }
    }
}

/// The relational store behind the weekly schedule. One table, keyed
/// conceptually by `(restaurant_id, day_of_week, start_time)`; ids are
/// assigned by the store on insert.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select(&self, filter: &RowFilter) -> Result<Vec<ScheduleRow>, BackendError>;

    async fn insert(&self, rows: Vec<ScheduleRow>) -> Result<(), BackendError>;

    /// Returns the number of rows removed.
    async fn delete(&self, filter: &RowFilter) -> Result<u64, BackendError>;
}
