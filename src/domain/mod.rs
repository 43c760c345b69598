//! Tools, prompts and resources of the DataGraph adapter
//!
//! Static descriptor tables plus the dispatch from each entry to the remote API.

pub mod prompts;
pub mod resources;
pub mod tools;
pub mod utils;
