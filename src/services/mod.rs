//! Service module that exports interfaces to external applications, APIs, etc.

pub mod map;
pub mod messaging;
pub mod transit;

// rexport some traits and utilty functions
pub use map::{new_map_rendering_handler, MapRenderingService};
pub use messaging::TelegramClient;
pub use transit::{new_transit_data_handler, TransitDataSource};
