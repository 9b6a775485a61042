//! # CareBook Store
//!
//! Collaborator contracts consumed by the CareBook core, plus in-process
//! implementations of each:
//! - [`DocumentStore`]: the opaque persistence service (create/update/get/
//!   list with Conflict/NotFound/Unknown failures)
//! - [`FileStore`]: content-addressed binary storage for identification
//!   documents
//! - [`MessageSender`]: the best-effort message-delivery sink
//!
//! The in-memory backends are the development and test doubles; a deployment
//! swaps them for real services behind the same traits. The core never learns
//! which it is talking to.

pub mod documents;
pub mod files;
pub mod messaging;

pub use documents::{
    Document, DocumentPage, DocumentStore, MemoryStore, Query, StoreError, StoreResult,
};
pub use files::{FileError, FileStore, MemoryFileStore, StoredFile};
pub use messaging::{LogSender, MemorySender, MessageReceipt, MessageSender, NotifyError, SentMessage};
