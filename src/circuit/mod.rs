//! Circuit identifiers and connection graph.
//!
//! This module provides the identifier and placement types shared by every
//! component, and the [`ConnectionGraph`] that records which components are
//! wired together. Connectivity lives only in the graph; components never keep
//! their own neighbour lists.

mod graph;
mod types;

pub use graph::ConnectionGraph;
pub use types::*;
