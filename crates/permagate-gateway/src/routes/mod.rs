//! Route handlers for the content-serving surface.

pub mod data;

pub use data::{DataHandler, RawDataHandler};
