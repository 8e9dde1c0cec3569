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

//! The backend-agnostic model and the solver backend abstraction.
//!
//! All constraint construction in the engine targets [`Model`]: named
//! variables with bounds, named sparse linear rows, and one linear
//! objective. A [`SolverBackend`] lowers the model into a concrete solver
//! and reads the result back. Two adapters exist: [`microlp`] (pure-Rust
//! MILP, no dual values) and [`clarabel`] (pure-Rust interior-point LP,
//! dual values, no integer variables). Everything above the trait is
//! written once and shared by both.

mod clarabel;
mod microlp;

pub use self::clarabel::ClarabelBackend;
pub use self::microlp::MicrolpBackend;

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use lazy_static::lazy_static;

use crate::error::Error;

lazy_static! {
    /// Serializes backend invocations across engine instances. Both
    /// bundled backends are in-process, but a shared solver session must
    /// not run concurrent models.
    static ref SOLVE_LOCK: Mutex<()> = Mutex::new(());
}

/// Index of a variable within a [`Model`].
pub type VarId = usize;

/// Kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Continuous variable.
    Continuous,
    /// Binary variable, `{0, 1}`.
    Binary,
}

/// Relational operator of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// Equality.
    Eq,
    /// Less than or equal.
    Le,
    /// Greater than or equal.
    Ge,
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RelOp::Eq => "=",
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
        })
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Minimize the objective.
    #[default]
    Minimize,
    /// Maximize the objective.
    Maximize,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimize" => Ok(Self::Minimize),
            "max" | "maximize" => Ok(Self::Maximize),
            _ => Err(Error::UnknownDirection(s.to_string())),
        }
    }
}

/// Definition of one variable of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    /// Unique name of the variable (see [`crate::names`]).
    pub name: String,
    /// Kind of the variable.
    pub kind: VarKind,
    /// Lower bound (may be `f64::NEG_INFINITY`).
    pub lb: f64,
    /// Upper bound (may be `f64::INFINITY`).
    pub ub: f64,
}

/// One named sparse linear constraint row `terms op rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Unique name of the row (see [`crate::names::rows`]).
    pub name: String,
    /// Sparse terms, ascending by variable id, duplicates merged.
    pub terms: Vec<(VarId, f64)>,
    /// Relational operator.
    pub op: RelOp,
    /// Right-hand side.
    pub rhs: f64,
}

impl Row {
    /// Whether an empty row is violated on its own (`0 op rhs` false).
    pub(crate) fn trivially_violated(&self) -> bool {
        self.terms.is_empty()
            && match self.op {
                RelOp::Eq => self.rhs != 0.0,
                RelOp::Le => self.rhs < 0.0,
                RelOp::Ge => self.rhs > 0.0,
            }
    }
}

/// A backend-agnostic linear/mixed-integer model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Variable definitions, by [`VarId`].
    vars: Vec<VarDef>,
    /// Name-to-id lookup for variables.
    var_index: HashMap<String, VarId>,
    /// Constraint rows, in insertion order.
    rows: Vec<Row>,
    /// Name-to-index lookup for rows.
    row_index: HashMap<String, usize>,
    /// Objective coefficients by variable id.
    objective: BTreeMap<VarId, f64>,
    /// Optimization direction.
    direction: Direction,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new variable. Names must be unique; re-declaring a name is
    /// an error, never a silent overwrite.
    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        lb: f64,
        ub: f64,
    ) -> Result<VarId, Error> {
        let name = name.into();
        if self.var_index.contains_key(&name) {
            return Err(Error::DuplicateVariable(name));
        }
        let id = self.vars.len();
        self.var_index.insert(name.clone(), id);
        self.vars.push(VarDef { name, kind, lb, ub });
        Ok(id)
    }

    /// Look up a variable id by name. Referencing a name that was never
    /// declared fails fast instead of creating a phantom variable.
    pub fn var(&self, name: &str) -> Result<VarId, Error> {
        self.var_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredVariable(name.to_string()))
    }

    /// Whether a variable with this name is declared.
    pub fn has_var(&self, name: &str) -> bool {
        self.var_index.contains_key(name)
    }

    /// The definition of a variable.
    pub fn var_def(&self, id: VarId) -> &VarDef {
        &self.vars[id]
    }

    /// All variable definitions, by id.
    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Whether any declared variable is binary.
    pub fn has_binaries(&self) -> bool {
        self.vars.iter().any(|v| v.kind == VarKind::Binary)
    }

    /// Add a named constraint row. Duplicate coefficients for the same
    /// variable are merged; zero coefficients are dropped. Row names must
    /// be unique.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (VarId, f64)>,
        op: RelOp,
        rhs: f64,
    ) -> Result<usize, Error> {
        let name = name.into();
        if self.row_index.contains_key(&name) {
            return Err(Error::DuplicateConstraint(name));
        }
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for (id, coeff) in terms {
            debug_assert!(id < self.vars.len());
            *merged.entry(id).or_insert(0.0) += coeff;
        }
        let terms: Vec<(VarId, f64)> = merged.into_iter().filter(|(_, c)| *c != 0.0).collect();
        let idx = self.rows.len();
        self.row_index.insert(name.clone(), idx);
        self.rows.push(Row {
            name,
            terms,
            op,
            rhs,
        });
        Ok(idx)
    }

    /// Look up a row index by name.
    pub fn row(&self, name: &str) -> Result<usize, Error> {
        self.row_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UndeclaredVariable(name.to_string()))
    }

    /// All constraint rows, in insertion order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Replace the objective with the given coefficients and direction.
    pub fn set_objective(
        &mut self,
        terms: impl IntoIterator<Item = (VarId, f64)>,
        direction: Direction,
    ) {
        self.objective.clear();
        for (id, coeff) in terms {
            *self.objective.entry(id).or_insert(0.0) += coeff;
        }
        self.direction = direction;
    }

    /// Objective coefficient of a variable (zero if absent).
    pub fn objective_coeff(&self, id: VarId) -> f64 {
        self.objective.get(&id).copied().unwrap_or(0.0)
    }

    /// The objective terms, ascending by variable id.
    pub fn objective(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.objective.iter().map(|(id, c)| (*id, *c))
    }

    /// The optimization direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Write the model in the plain-text CPLEX LP format, for debugging and
    /// reproducibility. The output is not parsed by this crate.
    pub fn write_lp(&self, w: &mut impl Write) -> std::io::Result<()> {
        writeln!(w, "\\ pathopt model")?;
        match self.direction {
            Direction::Minimize => writeln!(w, "Minimize")?,
            Direction::Maximize => writeln!(w, "Maximize")?,
        }
        write!(w, " obj:")?;
        for (id, coeff) in &self.objective {
            write!(w, " {} {}", fmt_coeff(*coeff), self.vars[*id].name)?;
        }
        writeln!(w)?;
        writeln!(w, "Subject To")?;
        for row in &self.rows {
            write!(w, " {}:", row.name)?;
            for (id, coeff) in &row.terms {
                write!(w, " {} {}", fmt_coeff(*coeff), self.vars[*id].name)?;
            }
            writeln!(w, " {} {}", row.op, row.rhs)?;
        }
        writeln!(w, "Bounds")?;
        for v in &self.vars {
            if v.kind == VarKind::Binary {
                continue;
            }
            match (v.lb.is_finite(), v.ub.is_finite()) {
                (true, true) => writeln!(w, " {} <= {} <= {}", v.lb, v.name, v.ub)?,
                (true, false) => writeln!(w, " {} >= {}", v.name, v.lb)?,
                (false, true) => writeln!(w, " {} <= {}", v.name, v.ub)?,
                (false, false) => writeln!(w, " {} free", v.name)?,
            }
        }
        if self.has_binaries() {
            writeln!(w, "Binaries")?;
            for v in self.vars.iter().filter(|v| v.kind == VarKind::Binary) {
                writeln!(w, " {}", v.name)?;
            }
        }
        writeln!(w, "End")
    }
}

/// Format an LP-file coefficient with an explicit sign.
fn fmt_coeff(coeff: f64) -> String {
    if coeff < 0.0 {
        format!("- {}", -coeff)
    } else {
        format!("+ {coeff}")
    }
}

/// Status of a finished solve. Infeasibility and unboundedness are normal
/// result states, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// An optimal (or optimal-within-tolerance) solution was found.
    Optimal,
    /// The constraints cannot be satisfied.
    Infeasible,
    /// The objective is unbounded.
    Unbounded,
    /// The solver stopped early (iteration or time limit) without proving
    /// optimality.
    Interrupted,
}

/// Raw result of one backend solve.
#[derive(Debug, Clone)]
pub struct RawSolution {
    /// Final status.
    pub status: SolveStatus,
    /// Objective value (meaningful only for [`SolveStatus::Optimal`]).
    pub objective: f64,
    /// Variable values by [`VarId`] (empty unless optimal).
    pub values: Vec<f64>,
    /// Dual values per constraint row, if the backend provides them.
    pub duals: Option<Vec<f64>>,
}

impl RawSolution {
    /// A result without any solution values.
    pub(crate) fn without_values(status: SolveStatus) -> Self {
        Self {
            status,
            objective: 0.0,
            values: Vec::new(),
            duals: None,
        }
    }
}

/// The capability set every solver engine must provide: lower a model,
/// solve it, and report values (and optionally duals) back.
pub trait SolverBackend: std::fmt::Debug {
    /// Short identifier of the backend.
    fn name(&self) -> &'static str;

    /// Whether the backend can handle binary variables.
    fn supports_binaries(&self) -> bool;

    /// Whether the backend reports dual values.
    fn supports_duals(&self) -> bool;

    /// Solve the model. Infeasibility and unboundedness are `Ok` results;
    /// `Err` is reserved for internal backend failures.
    fn solve(&self, model: &Model, time_limit: Option<Duration>) -> Result<RawSolution, Error>;
}

/// Selector for the two bundled solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Pure-Rust simplex with branch and bound ([`MicrolpBackend`]).
    Microlp,
    /// Pure-Rust interior-point LP solver ([`ClarabelBackend`]).
    Clarabel,
}

impl BackendKind {
    /// Instantiate the adapter for this backend.
    pub fn backend(self) -> Box<dyn SolverBackend> {
        match self {
            BackendKind::Microlp => Box::new(MicrolpBackend),
            BackendKind::Clarabel => Box::new(ClarabelBackend),
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "microlp" => Ok(Self::Microlp),
            "clarabel" => Ok(Self::Clarabel),
            _ => Err(Error::UnknownBackend(s.to_string())),
        }
    }
}

/// Solve a model on the given backend while holding the global solve lock.
pub(crate) fn run_solver(
    kind: BackendKind,
    model: &Model,
    time_limit: Option<Duration>,
) -> Result<RawSolution, Error> {
    let _guard = SOLVE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    kind.backend().solve(model, time_limit)
}
