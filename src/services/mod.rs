//! Business logic services.

pub mod magic_link;
pub mod notifier;
pub mod storage;

pub use magic_link::{MagicClaims, MagicLinkService};
pub use notifier::{NotificationService, Notifier};
pub use storage::{BlobStore, Storage};
