//! Tally server library
//!
//! A like-counter service that absorbs high-frequency increments in a
//! distributed cache and reconciles them back to durable storage on a
//! fixed interval.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
