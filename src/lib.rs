// pathopt: path-indexed traffic-engineering optimization
// Copyright (C) 2024 The pathopt developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # pathopt: path-indexed traffic-engineering optimization
//!
//! This crate formulates and solves network traffic-engineering problems
//! over an explicit set of candidate paths per traffic class, instead of
//! per-link flow variables. Enumerating candidate paths first keeps the
//! linear model small and makes path-level requirements (waypointing
//! through middleboxes, per-path rule budgets, path disabling) directly
//! expressible.
//!
//! ## Structure
//! The source code is structured as follows:
//! - The module [`topology`] holds the network graph with per-node and
//!   per-link resource annotations, and [`traffic`] the demands placed on
//!   it as [`TrafficClass`] values.
//! - The module [`paths`] enumerates, filters, and subsamples candidate
//!   paths per class into a [`Pptc`] mapping.
//! - The module [`engine`] is the heart of the crate: [`Engine`] builds a
//!   linear model from high-level constraint and objective specifications,
//!   solves it, and extracts per-path flow fractions. The iterative
//!   max-min-fair allocation lives in [`engine::maxmin`].
//! - The module [`solver`] defines the backend-agnostic [`solver::Model`]
//!   and the two solver adapters: `microlp` for mixed-integer models and
//!   `clarabel` for pure LPs with dual values.
//! - The module [`names`] pins down the deterministic naming scheme tying
//!   variables and constraint rows to topology and traffic entities.
//!
//! ## Example
//! ```
//! use pathopt::prelude::*;
//!
//! # fn main() -> Result<(), pathopt::Error> {
//! // a diamond: 0 -> {1, 2} -> 3
//! let mut topo = Topology::new();
//! let (a, b, c, d) = (
//!     topo.add_node("a"),
//!     topo.add_node("b"),
//!     topo.add_node("c"),
//!     topo.add_node("d"),
//! );
//! for (u, v) in [(a, b), (a, c), (b, d), (c, d)] {
//!     topo.add_link(u, v);
//! }
//!
//! let tc = TrafficClass::new(0, "web", a, d).with_volume(100.0, 100_000.0);
//! let mut matrix = TrafficMatrix::new();
//! matrix.push(tc);
//!
//! let pptc = generate_paths_per_class(&topo, &matrix, null_predicate, 4, Some(10), None)?;
//!
//! let mut engine = Engine::new("microlp")?;
//! engine.add_decision_variables(&pptc)?;
//! engine.add_route_all_constraint(&pptc)?;
//! engine.add_routing_cost(&pptc)?;
//! engine.set_predefined_objective(&Objective::MinRoutingCost)?;
//! assert_eq!(engine.solve(None)?, SolveStatus::Optimal);
//!
//! let routing = engine.get_path_fractions(&pptc, true)?;
//! # Ok(())
//! # }
//! ```

#![deny(
    missing_docs,
    clippy::missing_docs_in_private_items,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

pub mod engine;
pub mod error;
pub mod names;
pub mod paths;
pub mod solver;
pub mod topology;
pub mod traffic;

#[cfg(test)]
mod test;

pub use engine::{BinKind, CapEntry, Caps, Engine, Objective};
pub use error::Error;
pub use paths::{Path, Pptc, SolvedPath, SolvedRouting};
pub use solver::{BackendKind, Direction, SolveStatus};
pub use topology::{Link, NodeId, Topology};
pub use traffic::{TrafficClass, TrafficMatrix};

/// Re-exports of the types and functions needed for typical usage.
pub mod prelude {
    pub use crate::engine::maxmin::max_min_fairness;
    pub use crate::engine::{merge_caps, BinKind, CapEntry, Caps, Engine, Objective};
    pub use crate::error::Error;
    pub use crate::paths::{
        generate_paths, generate_paths_per_class, has_middlebox_predicate, mbox_modifier,
        null_predicate, select, Path, Pptc, SelectStrategy, SolvedPath, SolvedRouting,
    };
    pub use crate::solver::{BackendKind, Direction, SolveStatus};
    pub use crate::topology::{Link, NodeId, Topology};
    pub use crate::traffic::{all_ie_pairs, TrafficClass, TrafficMatrix};
}
