//! Background journaling of accepted events and the notification stream.

/// Notification payloads broadcast to subscribers.
pub mod events;
/// Journal handle, configuration and worker loop.
pub mod handle;
