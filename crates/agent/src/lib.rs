//! Policy boundary and self-play driver for the 2048 environment.
//!
//! [`policy`] defines the contract a move-selection model fulfills (encoded
//! state in, per-direction value estimates out) together with the stand-in
//! implementations shipped here. [`actor`] drives a single environment to
//! completion against a policy; [`config`] is the TOML run configuration
//! and [`recorder`] persists finished runs into a session database.

pub mod actor;
pub mod config;
pub mod policy;
pub mod recorder;
