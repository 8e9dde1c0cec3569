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

//! Error types shared by the whole crate.
//!
//! The taxonomy distinguishes configuration errors (a malformed request,
//! detected and raised at the call that receives it) from formulation errors
//! (referencing variables or registries that were never declared). Solver
//! infeasibility is *not* an error: it is a normal result state reported by
//! [`crate::engine::Engine::solve`] and checked via
//! [`crate::engine::Engine::is_solved`].

use thiserror::Error;

use crate::topology::NodeId;

/// Any error raised while generating paths, building a formulation, or
/// talking to a solver backend.
#[derive(Debug, Error)]
pub enum Error {
    /// A traffic class has zero candidate paths between its source and sink,
    /// either at generation time or at constraint-build time.
    #[error("no valid paths from node {} to node {}", src.index(), dst.index())]
    NoPaths {
        /// Source node of the affected demand.
        src: NodeId,
        /// Destination node of the affected demand.
        dst: NodeId,
    },
    /// The solver backend selector string is not recognized.
    #[error("unknown solver backend {0:?} (expected \"microlp\" or \"clarabel\")")]
    UnknownBackend(String),
    /// The path selection strategy string is not recognized.
    #[error("unknown path selection strategy {0:?} (expected \"random\" or \"k-shortest\")")]
    UnknownStrategy(String),
    /// The optimization direction string is not recognized.
    #[error("unknown optimization direction {0:?} (expected \"min\" or \"max\")")]
    UnknownDirection(String),
    /// A capacity specification could not be resolved for an entity.
    #[error("invalid capacity specification: {0}")]
    InvalidCapacity(String),
    /// A constraint or objective referenced a variable name that was never
    /// declared. Fail fast instead of creating a zero-valued phantom.
    #[error("variable {0:?} was never declared")]
    UndeclaredVariable(String),
    /// A variable with this name was already declared in the same model.
    #[error("variable {0:?} is already declared")]
    DuplicateVariable(String),
    /// A constraint row with this name was already added to the same model.
    #[error("constraint {0:?} is already declared")]
    DuplicateConstraint(String),
    /// A load variable for this (resource, entity) pair already exists.
    /// Re-declaring it would silently double-count capacity consumption.
    #[error("load variable for resource {resource:?} at {entity} already exists")]
    DuplicateLoad {
        /// Resource whose load was being declared a second time.
        resource: String,
        /// Human-readable description of the node or link.
        entity: String,
    },
    /// A predefined objective needs load variables that were never
    /// registered for the requested resource.
    #[error("no load variables registered for resource {0:?}")]
    MissingLoadVariables(String),
    /// An allocation-based objective was requested, but no allocation
    /// variables were registered.
    #[error("no allocation variables registered (call add_allocate_flow_constraint first)")]
    NoAllocations,
    /// A result accessor was called before a successful solve.
    #[error("the model has not been solved (or the last solve was not successful)")]
    NotSolved,
    /// Two capacity specifications being composed disagree on a value.
    #[error("conflicting capacities for resource {resource:?} at {entity}: {a} != {b}")]
    ConflictingCapacity {
        /// Resource for which the two capacity maps disagree.
        resource: String,
        /// Human-readable description of the node or link.
        entity: String,
        /// Value from the first map.
        a: f64,
        /// Value from the second map.
        b: f64,
    },
    /// The solver backend failed internally (not infeasibility).
    #[error("solver backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Whether this error belongs to the configuration family (a malformed
    /// request by the caller, the moral equivalent of a 4xx). [`Error::NoPaths`]
    /// is a configuration error: the caller must supply more paths or remove
    /// the class.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::NoPaths { .. }
                | Error::UnknownBackend(_)
                | Error::UnknownStrategy(_)
                | Error::UnknownDirection(_)
                | Error::InvalidCapacity(_)
        )
    }
}
