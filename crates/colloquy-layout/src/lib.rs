//! # Colloquy Layout
//!
//! Presentation geometry derived from a debate snapshot. Nothing in this crate
//! mutates the debate; every engine reads the argument graph and returns
//! positions.
//!
//! - [`ArgumentGraph`]: the one-hop subgraph visible for a stage
//! - [`ForceSimulation`]: steppable force-directed layout of that subgraph
//! - [`ConsensusLayoutEngine`]: Venn-style placement of experts and agreement points
//! - [`PointIndex`]: grid-bucketed hit testing for rendered circles
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use colloquy_core::{Argument, ArgumentKind};
//! use colloquy_layout::{ArgumentGraph, ForceConfig, ForceSimulation};
//!
//! let mut args = BTreeMap::new();
//! for arg in [
//!     Argument::new("claim", ArgumentKind::Claim, "Main claim").supporting("a").supporting("b"),
//!     Argument::new("a", ArgumentKind::Supporting, "First"),
//!     Argument::new("b", ArgumentKind::Supporting, "Second"),
//! ] {
//!     args.insert(arg.id.clone(), arg);
//! }
//!
//! let graph = ArgumentGraph::for_stage(&["claim".to_string()], &args);
//! let mut sim = ForceSimulation::new(&graph, ForceConfig::default());
//! let frame = sim.run_to_convergence();
//! assert_eq!(frame.nodes.len(), 3);
//! assert_eq!(frame.links.len(), 2);
//! ```

pub mod consensus;
pub mod force;
pub mod geometry;
pub mod graph;
pub mod hit_index;

pub use consensus::{
    ConsensusConfig, ConsensusLayout, ConsensusLayoutEngine, ConsensusMap, ExpertRegion,
    IntersectionAnchor, MapPoint, Placement, PointClass, PointStyle,
};
pub use force::{
    CancelHandle, ForceConfig, ForceSimulation, LayoutFrame, PositionedLink, PositionedNode,
    SimulationStatus,
};
pub use geometry::Point;
pub use graph::{node_radius, ArgumentGraph, GraphLink, GraphNode};
pub use hit_index::{HitIndexConfig, PointIndex};
