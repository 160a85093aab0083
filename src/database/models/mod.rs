pub mod itinerary;
pub mod user;

pub use itinerary::{Event, Itinerary};
pub use user::User;
