//! Tourney Graph - version DAG data model
//!
//! The append-only record of one exploration run:
//! - [`IdFactory`]: run-scoped monotonic identifiers
//! - [`VersionNode`] / [`TestResult`]: candidate artifacts and their checks
//! - [`VersionGraph`]: nodes plus parent→child edges, with in-place updates by id
//! - [`GraphSnapshot`]: the serialized `{nodes, edges}` form streamed to observers
//!
//! # Example
//!
//! ```rust
//! use tourney_graph::{IdFactory, VersionGraph, VersionNode};
//!
//! let ids = IdFactory::new();
//! let mut graph = VersionGraph::new();
//!
//! let plan = ids.new_id("plan");
//! let arch = ids.new_id("arch");
//! graph.add_node(VersionNode::new(plan.clone(), "Master Plan")).unwrap();
//! graph
//!     .add_node(VersionNode::new(arch.clone(), "Architecture").with_parent(Some(plan.as_str())))
//!     .unwrap();
//! graph.connect(&ids, &plan, &arch).unwrap();
//!
//! assert_eq!(graph.children(&plan).len(), 1);
//! assert!(graph.is_acyclic());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod graph;
mod id;
mod node;

pub use error::GraphError;
pub use graph::{GraphSnapshot, VersionEdge, VersionGraph, EDGE_PREFIX};
pub use id::{IdFactory, DEFAULT_PREFIX};
pub use node::{NodeStatus, TestResult, VersionNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
