//! Live screenshot feed over WebSocket.
//!
//! The audit tool subscribes here to learn about new uploads without
//! polling `/api/screenshots`.

mod event;
mod handler;
mod heartbeat;
pub mod manager;

pub use event::ScreenshotEvent;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
