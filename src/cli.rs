use std::io::{self, Write as _};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::{AppConfig, ConfigError};
use crate::data::{
    load_catalog, validate_catalog, Catalog, CatalogFilter, DamageType, FilterOptions,
    FossilPolicy, NEWEST_GENERATION,
};
use crate::logging;
use crate::optimizer::formulation::formulate;
use crate::optimizer::sweep::{sweep, SweepRow};
use crate::optimizer::{report, InvalidRequest, Solution, TeamOptimizer, TieBreak};
use crate::parallel::WorkerPool;
use crate::server::api::{member_views, resistance_views, ApiState, MemberView, ResistanceView};
use crate::server;

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "porygon",
    version,
    about = "Strongest team whose members resist every damage type"
)]
pub struct Cli {
    /// TOML or YAML configuration file (also PORYGON_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Catalog CSV (also PORYGON_CATALOG).
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve one team
    Optimize {
        /// Number of team members
        #[arg(short = 'n', long = "size-team", alias = "team-size")]
        team_size: Option<usize>,
        /// Names that must be on the team
        #[arg(short, long, num_args = 1.., value_delimiter = ',')]
        include: Vec<String>,
        /// Names that must not be on the team
        #[arg(short = 'x', long, num_args = 1.., value_delimiter = ',')]
        exclude: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum)]
        tie_break: Option<TieBreakArg>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Print the generated program to stderr before solving
        #[arg(long)]
        dump_model: bool,
    },
    /// Solve every team size in a range
    Sweep {
        #[arg(long, default_value_t = 1)]
        from: usize,
        /// Defaults to the configured team size
        #[arg(long)]
        to: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Worker threads; 0 uses every core
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, value_enum, default_value_t = SweepFormat::Table)]
        format: SweepFormat,
    },
    /// Check a catalog file for rows the optimizer would reject
    Validate {
        /// Defaults to the configured catalog
        path: Option<PathBuf>,
    },
    /// List the damage types in play for a generation
    Categories {
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=NEWEST_GENERATION as i64))]
        generation: Option<u8>,
    },
    /// Run the HTTP API and web form
    Serve {
        /// Address to listen on (also PORYGON_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Drop everything introduced after this generation
    #[arg(short = 'g', long, value_parser = clap::value_parser!(u8).range(1..=NEWEST_GENERATION as i64))]
    pub generation_cap: Option<u8>,
    /// Keep only these generations
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(1..=NEWEST_GENERATION as i64)
    )]
    pub generations: Vec<u8>,
    #[arg(long)]
    pub include_legendaries: bool,
    #[arg(long)]
    pub include_pseudo_legendaries: bool,
    /// Allow more than one starter
    #[arg(long)]
    pub allow_starters: bool,
    /// all, one or none
    #[arg(long)]
    pub fossils: Option<FossilPolicy>,
}

impl FilterArgs {
    /// Flags only ever widen the configured filter; valued options replace it.
    fn apply_to(&self, options: &mut FilterOptions) {
        if self.generation_cap.is_some() {
            options.generation_cap = self.generation_cap;
        }
        if !self.generations.is_empty() {
            options.generations = self.generations.clone();
        }
        options.include_legendaries |= self.include_legendaries;
        options.include_pseudo_legendaries |= self.include_pseudo_legendaries;
        options.allow_multiple_starters |= self.allow_starters;
        if let Some(fossils) = self.fossils {
            options.fossils = fossils;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TieBreakArg {
    Solver,
    LowestIds,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::Solver => TieBreak::Solver,
            TieBreakArg::LowestIds => TieBreak::LowestIds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SweepFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Serialize)]
struct OptimizeOutput {
    status: &'static str,
    team_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_strength: Option<f64>,
    members: Vec<MemberView>,
    resistances: Vec<ResistanceView>,
}

#[derive(Debug, Serialize)]
struct SweepCsvRow {
    team_size: usize,
    status: &'static str,
    total_strength: Option<f64>,
    members: String,
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_OK,
                _ => EXIT_USAGE,
            };
            let _ = err.print();
            return code;
        }
    };

    let mut config = match AppConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return match err {
                ConfigError::Io(_) => EXIT_FAILURE,
                _ => EXIT_USAGE,
            };
        }
    };
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }
    logging::init(&config.log_level);

    match cli.command {
        Command::Optimize {
            team_size,
            include,
            exclude,
            filter,
            tie_break,
            format,
            dump_model,
        } => {
            filter.apply_to(&mut config.filter);
            if let Some(tie_break) = tie_break {
                config.optimizer.tie_break = tie_break.into();
            }
            let request = OptimizeArgs {
                team_size: team_size.unwrap_or(config.team_size),
                include,
                exclude,
                format,
                dump_model,
            };
            handle_optimize(&config, &request)
        }
        Command::Sweep {
            from,
            to,
            filter,
            workers,
            format,
        } => {
            filter.apply_to(&mut config.filter);
            if let Some(workers) = workers {
                config.parallel = WorkerPool::with_workers(workers);
            }
            let to = to.unwrap_or(config.team_size);
            handle_sweep(&config, from, to, format)
        }
        Command::Validate { path } => {
            handle_validate(path.unwrap_or_else(|| config.catalog_path.clone()))
        }
        Command::Categories { generation } => handle_categories(&config, generation),
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            handle_serve(config)
        }
    }
}

struct OptimizeArgs {
    team_size: usize,
    include: Vec<String>,
    exclude: Vec<String>,
    format: OutputFormat,
    dump_model: bool,
}

fn load(config: &AppConfig) -> Option<Catalog> {
    match load_catalog(&config.catalog_path) {
        Ok(catalog) => Some(catalog),
        Err(err) => {
            eprintln!("catalog error: {err}");
            None
        }
    }
}

fn handle_optimize(config: &AppConfig, args: &OptimizeArgs) -> i32 {
    let Some(catalog) = load(config) else {
        return EXIT_FAILURE;
    };
    let filtered = CatalogFilter::default().apply(&catalog, &config.filter);
    let problem = match filtered.problem(args.team_size, &args.include, &args.exclude) {
        Ok(problem) => problem,
        Err(err) => return invalid_request(&err),
    };

    if args.dump_model {
        let formulation = formulate(&problem);
        eprintln!("{}", formulation.program);
    }

    let solution = match TeamOptimizer::new()
        .with_options(config.optimizer)
        .solve(&problem)
    {
        Ok(solution) => solution,
        Err(err) => return invalid_request(&err),
    };

    let output = match &solution {
        Solution::Team(team) => OptimizeOutput {
            status: "optimal",
            team_size: args.team_size,
            total_strength: Some(team.total_strength),
            members: member_views(&catalog, team),
            resistances: resistance_views(&report(team, &problem.categories)),
        },
        Solution::Failure(failure) => OptimizeOutput {
            status: failure.as_str(),
            team_size: args.team_size,
            total_strength: None,
            members: Vec::new(),
            resistances: Vec::new(),
        },
    };

    let printed = match args.format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Table => print_optimize_table(&output),
    };
    if let Err(err) = printed {
        eprintln!("failed to write result: {err}");
        return EXIT_FAILURE;
    }

    match solution {
        Solution::Team(_) => EXIT_OK,
        Solution::Failure(_) => EXIT_FAILURE,
    }
}

fn invalid_request(err: &InvalidRequest) -> i32 {
    eprintln!("invalid request: {err}");
    EXIT_USAGE
}

fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let payload = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(io::stdout().lock(), "{payload}")
}

fn print_optimize_table(output: &OptimizeOutput) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "status: {}", output.status)?;
    let Some(total) = output.total_strength else {
        return Ok(());
    };
    writeln!(out, "total strength: {total}")?;
    writeln!(out)?;
    writeln!(out, "{:<16} {:<10} {:<10} {:>8}", "name", "type1", "type2", "strength")?;
    for member in &output.members {
        writeln!(
            out,
            "{:<16} {:<10} {:<10} {:>8}",
            member.name,
            member.type1.as_deref().unwrap_or("-"),
            member.type2.as_deref().unwrap_or("none"),
            member.strength
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{:<10} {:>8}  {}", "type", "factor", "defender")?;
    for resistance in &output.resistances {
        writeln!(
            out,
            "{:<10} {:>8}  {}",
            resistance.category, resistance.min_multiplier, resistance.defender
        )?;
    }
    Ok(())
}

fn handle_sweep(config: &AppConfig, from: usize, to: usize, format: SweepFormat) -> i32 {
    if from == 0 || from > to {
        eprintln!("invalid range {from}..={to}: sizes start at 1 and --from must not exceed --to");
        return EXIT_USAGE;
    }
    let Some(catalog) = load(config) else {
        return EXIT_FAILURE;
    };
    let filtered = CatalogFilter::default().apply(&catalog, &config.filter);
    let base = match filtered.problem::<String>(from, &[], &[]) {
        Ok(problem) => problem,
        Err(err) => return invalid_request(&err),
    };

    let optimizer = TeamOptimizer::new().with_options(config.optimizer);
    let points = match sweep(&optimizer, &base, from..=to, &config.parallel) {
        Ok(points) => points,
        Err(err) => {
            eprintln!("failed to start worker pool: {err}");
            return EXIT_FAILURE;
        }
    };
    let rows: Vec<SweepRow> = points.iter().map(SweepRow::from).collect();

    let printed = match format {
        SweepFormat::Json => print_json(&rows),
        SweepFormat::Csv => print_sweep_csv(&rows),
        SweepFormat::Table => print_sweep_table(&rows),
    };
    match printed {
        Ok(()) => EXIT_OK,
        Err(err) => {
            eprintln!("failed to write sweep: {err}");
            EXIT_FAILURE
        }
    }
}

fn print_sweep_csv(rows: &[SweepRow]) -> io::Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for row in rows {
        writer
            .serialize(SweepCsvRow {
                team_size: row.team_size,
                status: row.status,
                total_strength: row.total_strength,
                members: row.members.join(";"),
            })
            .map_err(io::Error::other)?;
    }
    writer.flush()
}

fn print_sweep_table(rows: &[SweepRow]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{:>4}  {:<16} {:>8}  members", "size", "status", "strength")?;
    for row in rows {
        let strength = row
            .total_strength
            .map(|total| total.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:>4}  {:<16} {:>8}  {}",
            row.team_size,
            row.status,
            strength,
            row.members.join(", ")
        )?;
    }
    Ok(())
}

fn handle_validate(path: PathBuf) -> i32 {
    let report = match validate_catalog(&path) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return EXIT_FAILURE;
        }
    };
    for diag in &report.diagnostics {
        println!("{}: {}: {}", diag.severity, diag.context, diag.message);
    }
    if report.has_errors() {
        eprintln!("validation failed: {}", path.display());
        EXIT_FAILURE
    } else {
        println!("validation passed: {}", path.display());
        EXIT_OK
    }
}

fn handle_categories(config: &AppConfig, generation: Option<u8>) -> i32 {
    let generation =
        generation.unwrap_or_else(|| config.filter.effective_generation(NEWEST_GENERATION));
    for category in DamageType::for_generation(generation) {
        println!("{category}");
    }
    EXIT_OK
}

fn handle_serve(config: AppConfig) -> i32 {
    let Some(catalog) = load(&config) else {
        return EXIT_FAILURE;
    };
    let state = ApiState {
        catalog,
        filter: CatalogFilter::default(),
        default_filter: config.filter,
        default_team_size: config.team_size,
        optimizer_options: config.optimizer,
    };
    match server::run_server(state, &config.bind) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            eprintln!("server error: {err}");
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn optimize_flags() {
        let cli = parse(&[
            "porygon",
            "optimize",
            "-n",
            "4",
            "-i",
            "charizard,blastoise",
            "--fossils",
            "none",
            "-g",
            "3",
            "--tie-break",
            "lowest-ids",
            "--format",
            "json",
        ]);
        let Command::Optimize {
            team_size,
            include,
            filter,
            tie_break,
            format,
            ..
        } = cli.command
        else {
            panic!("expected optimize");
        };
        assert_eq!(team_size, Some(4));
        assert_eq!(include, vec!["charizard", "blastoise"]);
        assert_eq!(filter.fossils, Some(FossilPolicy::None));
        assert_eq!(filter.generation_cap, Some(3));
        assert_eq!(tie_break, Some(TieBreakArg::LowestIds));
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn generation_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["porygon", "categories", "-g", "10"]).is_err());
        assert!(Cli::try_parse_from(["porygon", "optimize", "-g", "0"]).is_err());
        assert!(Cli::try_parse_from(["porygon", "optimize", "--generations", "0"]).is_err());
        assert!(Cli::try_parse_from(["porygon", "sweep", "--generations", "1,15"]).is_err());
        let cli = parse(&["porygon", "sweep", "--generations", "1,9"]);
        let Command::Sweep { filter, .. } = cli.command else {
            panic!("expected sweep");
        };
        assert_eq!(filter.generations, vec![1, 9]);
    }

    #[test]
    fn filter_args_layer_over_config() {
        let mut options = FilterOptions {
            generation_cap: Some(4),
            include_legendaries: true,
            ..FilterOptions::default()
        };
        FilterArgs {
            generations: vec![1, 2],
            allow_starters: true,
            ..FilterArgs::default()
        }
        .apply_to(&mut options);
        assert_eq!(options.generation_cap, Some(4));
        assert_eq!(options.generations, vec![1, 2]);
        assert!(options.include_legendaries);
        assert!(options.allow_multiple_starters);
        assert_eq!(options.fossils, FossilPolicy::One);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["porygon", "validate", "--catalog", "other.csv"]);
        assert_eq!(cli.catalog, Some(PathBuf::from("other.csv")));
    }
}
