// Domain-layer modules and shared errors/models
pub mod verification {
    pub use crate::verification::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
