// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod client_ip {
    pub use crate::client_ip::*;
}
