//! Board-level plumbing: resource assignment and shared buses.

pub mod resources;
