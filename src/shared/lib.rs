// Declare modules at the root level
pub mod battery;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod reading;
pub mod time;
pub mod ttn;
pub mod validators;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::battery;
    pub use super::domain;
    pub use super::error;
    pub use super::gateway;
    pub use super::reading;
    pub use super::time;
    pub use super::ttn;
    pub use super::validators;
}

// Also re-export at root for convenience. `gateway` stays namespaced.
pub use battery::*;
pub use domain::*;
pub use error::*;
pub use reading::*;
pub use time::*;
pub use ttn::*;
pub use validators::*;
