//! Scenario graph definition, compilation, and caching.
//!
//! A scenario arrives from the visual builder as plain nodes and edges
//! ([`Scenario`]). Before execution it is compiled into a [`CompiledFlow`]
//! — per-node outgoing edges, default transitions, and the designated
//! start node — and compiled forms are shared through a bounded
//! [`CompileCache`] keyed by the scenario's content fingerprint.
//!
//! # Core Concepts
//!
//! - **Nodes and edges**: the builder's description, never mutated here
//! - **Start node**: the unique node with no incoming edge
//! - **Compilation**: precomputation into an executable, shareable form
//! - **Fingerprint**: order-independent content hash, the cache key
//!
//! # Quick Start
//!
//! ```
//! use chatweave::graphs::{CompileCache, Scenario, ScenarioNode};
//! use chatweave::types::NodeType;
//!
//! let scenario = Scenario::new(
//!     vec![ScenarioNode {
//!         id: "hi".into(),
//!         node_type: NodeType::Message,
//!         ..Default::default()
//!     }],
//!     vec![],
//! );
//! scenario.validate().expect("well-formed scenario");
//!
//! let cache = CompileCache::new();
//! let flow = cache.get_or_compile(&scenario);
//! assert_eq!(flow.start(), Some("hi"));
//! ```

mod cache;
mod compilation;
mod scenario;

pub use cache::CompileCache;
pub use compilation::{CompiledFlow, CompiledNode};
pub use scenario::{NodeData, QuickReply, Scenario, ScenarioEdge, ScenarioError, ScenarioNode};
