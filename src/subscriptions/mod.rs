//! Long-lived subscriptions to external event sources
//!
//! Each subscription is a scoped handle: acquiring it attaches to the source
//! exactly once per owner, dropping it detaches.

pub mod file_drop;
pub mod shortcuts;

pub use file_drop::{handle_drop_event, DropChannel, DropEvent, DropListener, DropSubscription};
pub use shortcuts::{Accelerator, ShortcutAction, ShortcutRegistry, ShortcutScope, OPEN_DIRECTORY};
