pub mod itinerary_service;
pub mod user_service;

pub use itinerary_service::{ItineraryFilter, ItineraryService, ShareMode};
pub use user_service::UserService;
