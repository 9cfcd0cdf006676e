use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::data::catalog::{load_catalog, Catalog, CatalogEntry, CatalogError};
use crate::data::damage_type::{DamageType, NEWEST_GENERATION};
use crate::optimizer::problem::MAX_MULTIPLIER;

/// Multipliers a real type chart can produce for a single- or dual-typed creature.
const CHART_MULTIPLIERS: [f64; 6] = [0.0, 0.25, 0.5, 1.0, 2.0, 4.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Loads and checks a catalog file. Rows that fail to parse are a hard error; everything
/// the optimizer would reject or silently mishandle becomes a diagnostic.
pub fn validate_catalog(path: impl AsRef<Path>) -> Result<ValidationReport, CatalogError> {
    let catalog = load_catalog(path)?;
    Ok(check_catalog(&catalog))
}

pub fn check_catalog(catalog: &Catalog) -> ValidationReport {
    let mut report = ValidationReport::default();
    if catalog.is_empty() {
        report.push(ValidationSeverity::Error, "catalog", "catalog has no rows");
        return report;
    }

    let mut seen_names: HashMap<&str, usize> = HashMap::new();
    for entry in &catalog.entries {
        let context = format!("row[{}] '{}'", entry.id, entry.name);
        if let Some(first) = seen_names.insert(entry.name.as_str(), entry.id) {
            report.push(
                ValidationSeverity::Error,
                context.clone(),
                format!("duplicate name (first seen at row {first}); name lookups would be ambiguous"),
            );
        }
        check_entry(&mut report, &context, entry);
    }

    let legendaries = catalog.entries.iter().filter(|e| e.is_legendary).count();
    report.push(
        ValidationSeverity::Info,
        "catalog",
        format!(
            "{} rows, {} legendary, generations 1..={}",
            catalog.len(),
            legendaries,
            catalog.max_generation().unwrap_or(0)
        ),
    );
    report
}

fn check_entry(report: &mut ValidationReport, context: &str, entry: &CatalogEntry) {
    if !entry.base_total.is_finite() || entry.base_total < 0.0 {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.base_total"),
            format!("strength must be finite and non-negative, got {}", entry.base_total),
        );
    }

    if entry.generation == 0 || entry.generation > NEWEST_GENERATION {
        report.push(
            ValidationSeverity::Warning,
            format!("{context}.generation"),
            format!("generation {} is outside 1..={NEWEST_GENERATION}", entry.generation),
        );
    }

    for (column, raw) in [("type1", Some(entry.type1.as_str())), ("type2", entry.type2.as_deref())] {
        if let Some(raw) = raw {
            if raw.parse::<DamageType>().is_err() {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{context}.{column}"),
                    format!("unknown type '{raw}'"),
                );
            }
        }
    }

    for (damage_type, value) in entry.multipliers.iter() {
        let column = format!("{context}.against_{damage_type}");
        if !value.is_finite() || !(0.0..=MAX_MULTIPLIER).contains(&value) {
            report.push(
                ValidationSeverity::Error,
                column,
                format!("multiplier {value} is outside [0, 4]; the optimizer will reject this row"),
            );
        } else if !CHART_MULTIPLIERS.contains(&value) {
            report.push(
                ValidationSeverity::Warning,
                column,
                format!("multiplier {value} is not a type-chart value"),
            );
        }
    }
}
