pub mod catalog;
pub mod color;
pub mod constant;
pub mod error;
pub mod fdsn;
pub mod geo;
pub mod map;
pub mod prelude;
pub mod station;
pub mod summary;
pub mod synthetic;

pub use error::*;
