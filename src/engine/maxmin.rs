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

//! Lexicographic max-min-fair allocation by iterated LP solves.
//!
//! Each round maximizes the smallest allocation `t` among the classes that
//! are not yet saturated, then pins down ("saturates") the classes whose
//! demand row is binding at `t` and repeats with the rest fixed. A class
//! with a nonzero dual on its demand row cannot be given more without
//! taking from a class at or below `t`, so its allocation is final. The
//! loop terminates after at most one round per class.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::Error;
use crate::names::{self, rows};
use crate::paths::Pptc;
use crate::solver::{BackendKind, SolveStatus};
use crate::traffic::TrafficClass;

use super::Engine;

/// Duals with absolute value above this count as binding.
const DUAL_EPS: f64 = 1e-6;

/// Slack below which an allocation counts as equal to the round optimum,
/// used by the degenerate fallback.
const ALLOC_EPS: f64 = 1e-6;

/// Compute the max-min-fair allocation over the given candidate paths.
///
/// `add_constraints` installs the feasibility structure of each round's
/// model (capacities, routing requirements) on a fresh engine; decision and
/// allocation variables are declared before it runs. The backend must
/// report dual values, so this only runs on the LP backend; a model with
/// binary requirements cannot be solved this way.
///
/// Returns the fair allocation per class. Any round ending in a status
/// other than optimal aborts with [`Error::NotSolved`].
pub fn max_min_fairness(
    pptc: &Pptc,
    backend: BackendKind,
    add_constraints: impl Fn(&mut Engine, &Pptc) -> Result<(), Error>,
) -> Result<BTreeMap<TrafficClass, f64>, Error> {
    if !backend.backend().supports_duals() {
        return Err(Error::Backend(format!(
            "max-min fairness needs dual values, which the {:?} backend does not report",
            backend
        )));
    }
    if pptc.is_empty() {
        return Err(Error::NoAllocations);
    }

    let mut saturated: BTreeMap<TrafficClass, f64> = BTreeMap::new();
    let mut round = 0usize;
    while saturated.len() < pptc.len() {
        round += 1;
        let unsaturated: Vec<&TrafficClass> = pptc
            .classes()
            .filter(|tc| !saturated.contains_key(*tc))
            .collect();
        info!(
            "max-min round {}: {} unsaturated, {} saturated classes",
            round,
            unsaturated.len(),
            saturated.len()
        );

        let mut engine = Engine::with_backend(backend);
        engine.add_decision_variables(pptc)?;
        engine.add_allocate_flow_constraint(pptc)?;
        add_constraints(&mut engine, pptc)?;
        for (tc, value) in &saturated {
            engine.fix_variable(&names::al(tc), *value)?;
        }
        engine.add_min_flow_for(&unsaturated)?;

        let status = engine.solve(None)?;
        if status != SolveStatus::Optimal {
            return Err(Error::NotSolved);
        }
        let t = engine.get_solved_objective()?;
        debug!("max-min round {round}: optimum t = {t}");

        let mut newly = Vec::new();
        for &tc in &unsaturated {
            let dual = engine
                .dual_value(&rows::demand(tc))?
                .ok_or(Error::NotSolved)?;
            if dual.abs() > DUAL_EPS {
                newly.push((tc.clone(), engine.value(&names::al(tc))?));
            }
        }
        if newly.is_empty() {
            // Degenerate duals: fall back to saturating every class stuck
            // at the round optimum. At least the arg-min class qualifies,
            // so the loop still shrinks.
            for &tc in &unsaturated {
                let value = engine.value(&names::al(tc))?;
                if value <= t + ALLOC_EPS {
                    newly.push((tc.clone(), value));
                }
            }
        }
        debug!("max-min round {}: saturating {} classes", round, newly.len());
        saturated.extend(newly);
    }

    Ok(saturated)
}
