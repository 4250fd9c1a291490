//! Quiz session engine, content cache and sync engine for perlan.
//!
//! This crate owns the data model, the timed gameplay state machine, and the
//! offline-first content layer. It never talks to the network directly;
//! remote stores and question generators are plugged in through the traits
//! in [`traits`] and implemented by `perlan-remote`.

pub mod background;
pub mod cache;
pub mod clock;
pub mod engine;
pub mod entity;
pub mod error;
pub mod model;
pub mod parser;
pub mod progress;
pub mod random;
pub mod results;
pub mod scoring;
pub mod seed;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod traits;
