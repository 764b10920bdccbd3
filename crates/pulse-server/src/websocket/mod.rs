//! WebSocket surface: live event fan-out plus the command channel.

pub mod broadcast;
pub mod connection;
pub mod event_bridge;
pub mod handler;

pub use broadcast::BroadcastManager;
pub use event_bridge::run_event_bridge;
pub use handler::ws_handler;
