//! Operations invoked by the command-line surface.
//!
//! Every handle (catalog, store, generator) is passed in explicitly.

pub mod ai;
pub mod schema;
pub mod unified;
