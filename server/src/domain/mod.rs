//! Domain services built on top of the data layer

pub mod counter;

pub use counter::{CounterError, CounterService, Reconciler, SweepStats};
