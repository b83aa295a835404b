pub mod events;
pub mod registry;
pub mod session;

pub use events::{pair_room_key, ClientEvent, ServerEvent};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use session::ws_handler;
