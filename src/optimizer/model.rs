//! Solver-neutral binary program: named 0/1 variables, a linear objective to maximize
//! and labeled linear constraints. Backends translate it into their own model.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `Σ coefficient · variable + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, var: VarId, coefficient: f64) -> Self {
        self.push(var, coefficient);
        self
    }

    pub fn push(&mut self, var: VarId, coefficient: f64) {
        if coefficient != 0.0 {
            self.terms.push((var, coefficient));
        }
    }

    /// Sum of variables with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.push(var, 1.0);
        }
        expr
    }

    pub fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * assignment.value(var))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessOrEqual,
    GreaterOrEqual,
    Equal,
}

impl Relation {
    fn symbol(&self) -> &'static str {
        match self {
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub lhs: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
    /// Diagnostic label only; never affects the solve.
    pub label: Option<String>,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, assignment: &Assignment, tolerance: f64) -> bool {
        let lhs = self.lhs.evaluate(assignment);
        match self.relation {
            Relation::LessOrEqual => lhs <= self.rhs + tolerance,
            Relation::GreaterOrEqual => lhs + tolerance >= self.rhs,
            Relation::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BinaryProgram {
    name: String,
    variables: Vec<String>,
    objective: LinearExpr,
    constraints: Vec<LinearConstraint>,
}

impl BinaryProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.variables.push(name.into());
        VarId(self.variables.len() - 1)
    }

    pub fn maximize(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn add_constraint(
        &mut self,
        lhs: LinearExpr,
        relation: Relation,
        rhs: f64,
        label: impl Into<String>,
    ) {
        self.constraints.push(LinearConstraint {
            lhs,
            relation,
            rhs,
            label: Some(label.into()),
        });
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn variable_name(&self, var: VarId) -> &str {
        &self.variables[var.0]
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Labels of the constraints the assignment violates.
    pub fn violated_constraints(&self, assignment: &Assignment, tolerance: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|constraint| !constraint.is_satisfied(assignment, tolerance))
            .map(|constraint| constraint.label.as_deref().unwrap_or("<unlabeled>"))
            .collect()
    }

    fn write_expr(&self, f: &mut fmt::Formatter<'_>, expr: &LinearExpr) -> fmt::Result {
        if expr.terms.is_empty() {
            return write!(f, "{}", expr.constant);
        }
        for (position, &(var, coefficient)) in expr.terms.iter().enumerate() {
            let sign = if coefficient < 0.0 { "-" } else { "+" };
            if position == 0 && coefficient >= 0.0 {
                write!(f, "{} {}", coefficient, self.variable_name(var))?;
            } else {
                write!(f, " {sign} {} {}", coefficient.abs(), self.variable_name(var))?;
            }
        }
        if expr.constant != 0.0 {
            write!(f, " + {}", expr.constant)?;
        }
        Ok(())
    }
}

/// LP-style listing, for `--dump-model`.
impl fmt::Display for BinaryProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\\ {}", self.name)?;
        write!(f, "Maximize\n  obj: ")?;
        self.write_expr(f, &self.objective)?;
        writeln!(f, "\nSubject To")?;
        for (position, constraint) in self.constraints.iter().enumerate() {
            match &constraint.label {
                Some(label) => write!(f, "  {label}: ")?,
                None => write!(f, "  c{position}: ")?,
            }
            self.write_expr(f, &constraint.lhs)?;
            writeln!(f, " {} {}", constraint.relation.symbol(), constraint.rhs)?;
        }
        writeln!(f, "Binary")?;
        for name in &self.variables {
            writeln!(f, "  {name}")?;
        }
        write!(f, "End")
    }
}

/// 0/1 values returned by a backend, indexed by [VarId].
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    values: Vec<f64>,
}

impl Assignment {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Rounds the relaxed value; solvers report binaries within a small tolerance of 0 or 1.
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}
