pub mod itinerary;
pub mod preference;
