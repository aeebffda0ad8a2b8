//! Docker-compose dependency graphs on a deterministic grouped grid.
//!
//! Services are grouped by the prefix before their first `-`, every group is
//! laid out as a small square-ish grid, groups are placed on an outer grid, and
//! `depends_on` entries become directed edges. [`graph::recompute`] is the
//! single pure entry point; the surfaces in [`render`] and [`export`] turn its
//! output into SVG, PNG, PDF or JSON.

pub mod classify;
pub mod compose;
pub mod details;
mod error;
pub mod export;
pub mod fonts;
pub mod graph;
pub mod layout;
pub mod render;
pub mod selection;
pub mod theme;
mod xml;

pub use compose::{ConfigModel, ServiceDescriptor, load_compose, parse_compose};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, Node, recompute};
pub use layout::{GridSpacing, LayoutParams};
