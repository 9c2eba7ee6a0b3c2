//! Tag-presence controller and the dispatcher that owns it

pub mod dispatcher;
pub mod presence;
pub mod request;
pub mod unmapped;

pub use dispatcher::ControllerHandle;
pub use presence::{ControllerConfig, SensorEvent, SensorState, TagPresenceController};
pub use request::{MapLastTagRequest, MapTagRequest};
pub use unmapped::{Announcer, UnmappedPolicy};
