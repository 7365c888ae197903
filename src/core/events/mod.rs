pub mod base;
pub mod bus;

pub use base::{LifecycleEventArgs, SoftDeleteEventKind};
pub use bus::{EventBus, EventHandler, NotificationBus};
