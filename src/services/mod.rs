// Service exports
pub mod google_maps;
pub mod inference;
pub mod places;

pub use google_maps::GoogleMapsClient;
pub use inference::{CompletionError, CompletionProvider, CompletionRequest, InferenceClient};
pub use places::{PlaceDetails, PlaceHit, PlacesError, PlacesProvider};
