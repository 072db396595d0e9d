//! sitepick - choose one or more sites from a site directory
//!
//! Library crate exposing the picker state machine, the site sources it
//! loads from, and the terminal front end used by the binary.
//!
//! Tests live close to the modules they exercise as unit tests.

pub mod logging;
pub mod picker;
pub mod site;
pub mod source;

pub mod ui;
