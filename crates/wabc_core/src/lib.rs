//!This is the core library for the wabc project. All other wabc libraries depend on this one. It holds the bus transport abstraction that every device is written against, and the common error type.

pub mod bus;
pub mod error;

pub use bus::{BusTransport, HalBus, Width};
