//! Bandcast: adaptive video conversion for buffer-constrained wearable
//! displays.
//!
//! The library surface is the [`convert`] module: the session, observer
//! contract, and retry ledger. Argument synthesis, engine execution, and
//! container inspection live in the `bandcast-av` and `bandcast-probe`
//! crates.

pub mod convert;
