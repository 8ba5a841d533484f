pub mod config;
pub mod error_handler;
pub mod logging;
pub mod notifications;

pub use config::CaisseConfig;
pub use error_handler::{
    CaisseError, ClassifiedCategory, ClassifiedError, ErrorCategory, ErrorSeverity, classify_error,
};
pub use notifications::{AppNotification, NotificationStore, NotificationType};
