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

//! Adapter lowering a [`Model`] into the Clarabel interior-point solver.
//!
//! This is the dual-capable LP backend. The model is lowered to the conic
//! form `min q'x  s.t.  Ax + s = b, s in K` with a zero cone for the
//! equality rows and a nonnegative cone for the inequality and bound rows.
//! Maximization negates the objective vector and the reported value.
//! Binary variables are rejected; use the microlp backend for MILPs.

use std::time::Duration;

use clarabel::algebra::CscMatrix;
use clarabel::solver::SupportedConeT::{NonnegativeConeT, ZeroConeT};
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus};
use log::info;

use super::{Direction, Model, RawSolution, RelOp, SolveStatus, SolverBackend};
use crate::error::Error;

/// The Clarabel backend (pure-Rust interior-point LP with dual values).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelBackend;

/// One lowered inequality or equality row: terms, right-hand side, and the
/// model row it came from (`None` for variable-bound rows).
struct LoweredRow {
    /// Sparse terms over model variable ids.
    terms: Vec<(usize, f64)>,
    /// Right-hand side.
    rhs: f64,
    /// Index of the originating model row, for dual read-back.
    source: Option<usize>,
}

impl SolverBackend for ClarabelBackend {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn supports_binaries(&self) -> bool {
        false
    }

    fn supports_duals(&self) -> bool {
        true
    }

    fn solve(&self, model: &Model, time_limit: Option<Duration>) -> Result<RawSolution, Error> {
        if model.has_binaries() {
            return Err(Error::Backend(
                "the clarabel backend cannot solve models with binary variables".to_string(),
            ));
        }

        let n = model.num_vars();

        // Partition the model rows: equalities feed the zero cone,
        // inequalities (flipped to `<=`) and variable bounds feed the
        // nonnegative cone.
        let mut eq_rows: Vec<LoweredRow> = Vec::new();
        let mut ineq_rows: Vec<LoweredRow> = Vec::new();
        for (idx, row) in model.rows().iter().enumerate() {
            if row.terms.is_empty() {
                if row.trivially_violated() {
                    return Ok(RawSolution::without_values(SolveStatus::Infeasible));
                }
                continue;
            }
            match row.op {
                RelOp::Eq => eq_rows.push(LoweredRow {
                    terms: row.terms.clone(),
                    rhs: row.rhs,
                    source: Some(idx),
                }),
                RelOp::Le => ineq_rows.push(LoweredRow {
                    terms: row.terms.clone(),
                    rhs: row.rhs,
                    source: Some(idx),
                }),
                RelOp::Ge => ineq_rows.push(LoweredRow {
                    terms: row.terms.iter().map(|(id, c)| (*id, -c)).collect(),
                    rhs: -row.rhs,
                    source: Some(idx),
                }),
            }
        }
        for (id, def) in model.vars().iter().enumerate() {
            if def.ub.is_finite() {
                ineq_rows.push(LoweredRow {
                    terms: vec![(id, 1.0)],
                    rhs: def.ub,
                    source: None,
                });
            }
            if def.lb.is_finite() {
                ineq_rows.push(LoweredRow {
                    terms: vec![(id, -1.0)],
                    rhs: -def.lb,
                    source: None,
                });
            }
        }

        let num_eq = eq_rows.len();
        let num_ineq = ineq_rows.len();
        let m = num_eq + num_ineq;

        // Assemble A in compressed sparse column form, equality rows first.
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut b = Vec::with_capacity(m);
        for (r, row) in eq_rows.iter().chain(ineq_rows.iter()).enumerate() {
            for (id, coeff) in &row.terms {
                columns[*id].push((r, *coeff));
            }
            b.push(row.rhs);
        }
        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        colptr.push(0);
        for mut col in columns {
            col.sort_by_key(|(r, _)| *r);
            for (r, v) in col {
                rowval.push(r);
                nzval.push(v);
            }
            colptr.push(rowval.len());
        }
        let a = CscMatrix::new(m, n, colptr, rowval, nzval);
        let p = CscMatrix::zeros((n, n));

        let sign = match model.direction() {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        };
        let mut q = vec![0.0; n];
        for (id, coeff) in model.objective() {
            q[id] = sign * coeff;
        }

        let cones = [ZeroConeT(num_eq), NonnegativeConeT(num_ineq)];
        let settings = DefaultSettings {
            verbose: false,
            time_limit: time_limit
                .map(|limit| limit.as_secs_f64())
                .unwrap_or(f64::INFINITY),
            ..Default::default()
        };

        info!(
            "solving model with clarabel ({} vars, {} lowered rows)",
            n, m
        );
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => SolveStatus::Optimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Ok(RawSolution::without_values(SolveStatus::Infeasible))
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                return Ok(RawSolution::without_values(SolveStatus::Unbounded))
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => {
                return Ok(RawSolution::without_values(SolveStatus::Interrupted))
            }
            other => {
                return Err(Error::Backend(format!(
                    "clarabel terminated with status {other:?}"
                )))
            }
        };

        // Map the dual vector back onto model row indices. Bound rows and
        // skipped empty rows keep a zero dual.
        let mut duals = vec![0.0; model.num_rows()];
        for (r, row) in eq_rows.iter().chain(ineq_rows.iter()).enumerate() {
            if let Some(src) = row.source {
                duals[src] = solver.solution.z[r];
            }
        }

        Ok(RawSolution {
            status,
            objective: sign * solver.solution.obj_val,
            values: solver.solution.x.clone(),
            duals: Some(duals),
        })
    }
}
