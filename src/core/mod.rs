pub mod config;
pub mod error;
pub mod events;

pub use config::{
    ConfigurationResolver, SoftDeleteConfig, SoftDeleteSettings, StaticConfigurationResolver,
};
pub use error::{Result, SoftDeleteError};
pub use events::{EventBus, LifecycleEventArgs, NotificationBus, SoftDeleteEventKind};
