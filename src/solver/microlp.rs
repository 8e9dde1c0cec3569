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

//! Adapter lowering a [`Model`] into the `microlp` solver.
//!
//! This is the MILP-capable backend: binary variables become integer
//! variables bounded to `{0, 1}`. It reports no dual values and has no
//! time-limit support (a requested limit is logged and ignored).

use std::time::Duration;

use log::{info, warn};
use microlp::{ComparisonOp, OptimizationDirection, Problem};

use super::{Direction, Model, RawSolution, RelOp, SolveStatus, SolverBackend, VarKind};
use crate::error::Error;

/// The `microlp` backend (open-source, pure-Rust simplex + branch and bound).
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpBackend;

impl SolverBackend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn supports_binaries(&self) -> bool {
        true
    }

    fn supports_duals(&self) -> bool {
        false
    }

    fn solve(&self, model: &Model, time_limit: Option<Duration>) -> Result<RawSolution, Error> {
        if time_limit.is_some() {
            warn!("the microlp backend does not support time limits; ignoring");
        }

        let direction = match model.direction() {
            Direction::Minimize => OptimizationDirection::Minimize,
            Direction::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);

        let vars: Vec<microlp::Variable> = model
            .vars()
            .iter()
            .enumerate()
            .map(|(id, def)| {
                let obj = model.objective_coeff(id);
                match def.kind {
                    VarKind::Continuous => problem.add_var(obj, (def.lb, def.ub)),
                    VarKind::Binary => problem.add_integer_var(obj, (0, 1)),
                }
            })
            .collect();

        for row in model.rows() {
            if row.terms.is_empty() {
                if row.trivially_violated() {
                    return Ok(RawSolution::without_values(SolveStatus::Infeasible));
                }
                continue;
            }
            let terms: Vec<(microlp::Variable, f64)> = row
                .terms
                .iter()
                .map(|(id, coeff)| (vars[*id], *coeff))
                .collect();
            let op = match row.op {
                RelOp::Eq => ComparisonOp::Eq,
                RelOp::Le => ComparisonOp::Le,
                RelOp::Ge => ComparisonOp::Ge,
            };
            problem.add_constraint(terms.as_slice(), op, row.rhs);
        }

        info!(
            "solving model with microlp ({} vars, {} rows)",
            model.num_vars(),
            model.num_rows()
        );
        match problem.solve() {
            Ok(solution) => Ok(RawSolution {
                status: SolveStatus::Optimal,
                objective: solution.objective(),
                values: vars.iter().map(|v| *solution.var_value(*v)).collect(),
                duals: None,
            }),
            Err(microlp::Error::Infeasible) => {
                Ok(RawSolution::without_values(SolveStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                Ok(RawSolution::without_values(SolveStatus::Unbounded))
            }
            Err(e) => Err(Error::Backend(e.to_string())),
        }
    }
}
