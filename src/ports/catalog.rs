use async_trait::async_trait;

use crate::domain::{FieldSet, FieldValue, HashedFile, MylistUpdate};
use crate::error::Result;

/// The remote cataloging service, as the CLI needs it. Everything about the
/// wire protocol, authentication, and session reuse stays behind this trait.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Registers `file`, editing the existing entry when it is already
    /// listed.
    async fn mylist_add(&self, file: &HashedFile, update: &MylistUpdate) -> Result<AddOutcome>;

    async fn mylist_del(&self, file: &HashedFile) -> Result<DelOutcome>;

    /// Looks `file` up and returns the selected fields, file id first.
    async fn file_fields(&self, file: &HashedFile, fields: &FieldSet) -> Result<Vec<FieldValue>>;

    /// Ends the current session, if any.
    async fn logout(&self) -> Result<LogoutOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelOutcome {
    Deleted,
    NotListed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    LoggedOut,
    NoSession,
}
