//! Small helpers shared across modules

pub mod atomic;

pub use atomic::write_atomic;
