//! Typed wrappers over the backend's REST endpoints.

pub mod auth;
pub mod reservations;
pub mod resource_types;
pub mod resources;

pub use auth::AuthService;
pub use reservations::ReservationsService;
pub use resource_types::ResourceTypesService;
pub use resources::ResourcesService;
