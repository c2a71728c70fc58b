mod models;
mod status;

pub use models::*;
pub use status::{CapstoneKind, CapstoneStatus, NotificationKind, Role};
