#![warn(clippy::pedantic)]

pub mod error;
pub mod frame;
pub mod scalar;
pub mod width;

pub use error::WireError;
pub use scalar::Scalar;
pub use width::EventWidth;
