pub mod cancel;
pub mod clock;
pub mod core;
pub mod error;
