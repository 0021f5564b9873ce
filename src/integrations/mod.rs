//! External service integrations.

pub mod geocoding {
    pub use crate::geocoding::*;
}

pub mod ip_geolocation {
    pub use crate::ip_geolocation::*;
}

pub mod verify_client {
    pub use crate::verify_client::*;
}
