pub mod create;
pub mod list;
pub mod record;
pub mod share;

// Re-export handler functions for use in routing
pub use create::itinerary_create;
pub use list::itinerary_list;
pub use record::{itinerary_delete, itinerary_get, itinerary_update};
pub use share::itinerary_share;
