use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Catalog, CatalogFilter, DamageType, FilterOptions, NEWEST_GENERATION};
use crate::data::filter::entry_for;
use crate::optimizer::{
    report, InvalidRequest, OptimizerOptions, ResistanceReport, Solution, Team, TeamOptimizer,
    TieBreak,
};

/// Everything a request handler needs. Immutable once the server is up.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub catalog: Catalog,
    pub filter: CatalogFilter,
    pub default_filter: FilterOptions,
    pub default_team_size: usize,
    pub optimizer_options: OptimizerOptions,
}

impl ApiState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            filter: CatalogFilter::default(),
            default_filter: FilterOptions::default(),
            default_team_size: crate::config::DEFAULT_TEAM_SIZE,
            optimizer_options: OptimizerOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid request body: {0}")]
    Parse(serde_json::Error),
    #[error("{0}")]
    Invalid(#[from] InvalidRequest),
    #[error("{0}")]
    BadQuery(String),
    #[error("failed to serialize response: {0}")]
    Serialize(serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptimizeRequest {
    pub team_size: Option<usize>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Replaces the server's default filter as a whole when present.
    pub filter: Option<FilterOptions>,
    pub tie_break: Option<TieBreak>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub id: usize,
    pub name: String,
    pub type1: Option<String>,
    pub type2: Option<String>,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResistanceView {
    pub category: DamageType,
    pub min_multiplier: f64,
    pub defender_id: usize,
    pub defender: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub status: &'static str,
    pub team_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_strength: Option<f64>,
    pub members: Vec<MemberView>,
    pub resistances: Vec<ResistanceView>,
    pub categories: Vec<DamageType>,
    pub duration_ms: u64,
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "porygon-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Value of `key` in the query string of `path`, if any.
fn query_param<'a>(path: &'a str, key: &str) -> Option<&'a str> {
    let query = path.split_once('?').map(|(_, query)| query)?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == key)
        .map(|(_, value)| value.trim())
}

fn parse_generation(path: &str) -> Result<Option<u8>, PayloadError> {
    let Some(raw) = query_param(path, "generation") else {
        return Ok(None);
    };
    match raw.parse::<u8>() {
        Ok(generation) if (1..=NEWEST_GENERATION).contains(&generation) => Ok(Some(generation)),
        _ => Err(PayloadError::BadQuery(format!(
            "generation must be between 1 and {NEWEST_GENERATION}, got '{raw}'"
        ))),
    }
}

pub fn categories_payload(state: &ApiState, path: &str) -> Result<String, PayloadError> {
    let generation = match parse_generation(path)? {
        Some(generation) => generation,
        None => state
            .default_filter
            .effective_generation(state.catalog.max_generation().unwrap_or(NEWEST_GENERATION)),
    };
    serde_json::to_string_pretty(&serde_json::json!({
        "generation": generation,
        "categories": DamageType::for_generation(generation),
    }))
    .map_err(PayloadError::Serialize)
}

/// Names selectable under the default filter, optionally capped at `?generation=N`.
pub fn candidates_payload(state: &ApiState, path: &str) -> Result<String, PayloadError> {
    let mut options = state.default_filter.clone();
    if let Some(generation) = parse_generation(path)? {
        options.generation_cap = Some(generation);
    }
    let filtered = state.filter.apply(&state.catalog, &options);
    let names: Vec<&str> = filtered
        .candidates
        .iter()
        .map(|candidate| candidate.name.as_str())
        .collect();
    serde_json::to_string_pretty(&serde_json::json!({
        "count": names.len(),
        "candidates": names,
    }))
    .map_err(PayloadError::Serialize)
}

pub fn optimize_payload(state: &ApiState, body: &str) -> Result<String, PayloadError> {
    let request: OptimizeRequest = if body.trim().is_empty() {
        OptimizeRequest::default()
    } else {
        serde_json::from_str(body).map_err(PayloadError::Parse)?
    };
    let response = run_optimize(state, &request)?;
    serde_json::to_string_pretty(&response).map_err(PayloadError::Serialize)
}

pub fn run_optimize(
    state: &ApiState,
    request: &OptimizeRequest,
) -> Result<OptimizeResponse, InvalidRequest> {
    let started = Instant::now();
    let options = request.filter.as_ref().unwrap_or(&state.default_filter);
    let team_size = request.team_size.unwrap_or(state.default_team_size);

    let filtered = state.filter.apply(&state.catalog, options);
    let problem = filtered.problem(team_size, &request.include, &request.exclude)?;

    let mut optimizer_options = state.optimizer_options;
    if let Some(tie_break) = request.tie_break {
        optimizer_options.tie_break = tie_break;
    }
    let solution = TeamOptimizer::new()
        .with_options(optimizer_options)
        .solve(&problem)?;

    let (status, total_strength, members, resistances) = match &solution {
        Solution::Team(team) => {
            let resistances = report(team, &problem.categories);
            (
                "optimal",
                Some(team.total_strength),
                member_views(&state.catalog, team),
                resistance_views(&resistances),
            )
        }
        Solution::Failure(failure) => (failure.as_str(), None, Vec::new(), Vec::new()),
    };

    Ok(OptimizeResponse {
        status,
        team_size,
        total_strength,
        members,
        resistances,
        categories: problem.categories,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

pub fn member_views(catalog: &Catalog, team: &Team) -> Vec<MemberView> {
    team.members
        .iter()
        .map(|member| {
            let entry = entry_for(catalog, member);
            MemberView {
                id: member.id,
                name: member.name.clone(),
                type1: entry.map(|entry| entry.type1.clone()),
                type2: entry.and_then(|entry| entry.type2.clone()),
                strength: member.strength,
            }
        })
        .collect()
}

pub fn resistance_views(report: &ResistanceReport) -> Vec<ResistanceView> {
    report
        .iter()
        .map(|(&category, resistance)| ResistanceView {
            category,
            min_multiplier: resistance.min_multiplier,
            defender_id: resistance.defender_id,
            defender: resistance.defender_name.clone(),
        })
        .collect()
}
