//! Keeps activation flags, the single visible layer and the render surface
//! consistent while provider calls resolve out of order.

mod manager;
mod notice;

#[cfg(test)]
mod tests;

pub use manager::{LayerLifecycleManager, LifecycleError, LifecycleSnapshot, VisibleOutcome};
pub use notice::{Notification, NotificationLog, Severity};
