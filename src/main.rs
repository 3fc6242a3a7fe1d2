//! Flotilla CLI entrypoint.
//!
//! This is the main entrypoint for the flotilla command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use flotilla::cli::{Cli, Commands, OutputFormatter};
use flotilla::error::Result;
use flotilla::helm::HelmCli;
use flotilla::plan::{Plan, PlanParser, PlanValidator, ValidationReport};
use flotilla::planner::PlanExecutor;
use flotilla::reconciler::{ReconcileSummary, Reconciler};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the parsed command line.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let helm = HelmCli::new().with_binary(cli.helm_bin);

    match cli.command {
        Commands::Validate { plan } => cmd_validate(&plan, &formatter),
        Commands::Plan { plan } => cmd_plan(&plan, &cli.namespaces, &helm, &formatter),
        Commands::Apply { plan, dry_run, yes } => cmd_apply(
            &plan,
            &cli.namespaces,
            &helm,
            dry_run,
            yes,
            cli.verbose,
            &formatter,
        ),
    }
}

/// Loads, conforms, and validates a plan document.
fn load_plan(path: &Path) -> Result<(Plan, ValidationReport)> {
    let plan = PlanParser::new().load_file(path)?;
    let report = PlanValidator::new().validate(&plan)?;
    Ok((plan, report))
}

/// Validate a plan document.
fn cmd_validate(path: &Path, formatter: &OutputFormatter) -> Result<()> {
    let (plan, report) = load_plan(path)?;

    eprintln!("{}", formatter.format_validation(&report));
    eprintln!(
        "Plan version '{}': {} namespace(s), {} release(s)",
        plan.version,
        plan.namespaces.len(),
        plan.release_count()
    );

    Ok(())
}

/// Display the operations a plan would apply, without executing.
fn cmd_plan(
    path: &Path,
    namespaces: &[String],
    helm: &HelmCli,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (plan, _) = load_plan(path)?;

    let reconciler = Reconciler::new(&plan, helm).with_namespaces(namespaces.to_vec());
    let reconcile_plan = reconciler.plan_operations()?;

    eprintln!("{}", formatter.format_plan(&reconcile_plan));
    Ok(())
}

/// Apply a plan to the environment.
fn cmd_apply(
    path: &Path,
    namespaces: &[String],
    helm: &HelmCli,
    dry_run: bool,
    auto_approve: bool,
    verbose: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (plan, _) = load_plan(path)?;

    let reconciler = Reconciler::new(&plan, helm)
        .with_namespaces(namespaces.to_vec())
        .with_dry_run(dry_run);
    let reconcile_plan = reconciler.plan_operations()?;

    eprintln!("{}", formatter.format_plan(&reconcile_plan));

    if reconcile_plan.operations.is_empty() {
        return Ok(());
    }

    // Confirm
    if !auto_approve && !dry_run && !confirm("Apply these operations? [y/N]: ")? {
        eprintln!("Apply cancelled.");
        return Ok(());
    }

    // Command output goes to stderr only when verbose.
    let mut sink: Box<dyn Write> = if verbose {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::sink())
    };

    let executor = PlanExecutor::new(helm).with_dry_run(dry_run);
    let report = executor.execute(&reconcile_plan.operations, &mut sink)?;

    let diff = &reconcile_plan.diff;
    let summary = ReconcileSummary {
        installed: diff.installs(),
        upgraded: diff.upgrades(),
        unchanged: diff.unchanged.len(),
        unmanaged: diff
            .unmanaged
            .iter()
            .map(flotilla::helm::DeployedRelease::qualified_name)
            .collect(),
        dry_run: report.dry_run,
    };
    eprintln!("{}", formatter.format_summary(&summary));

    Ok(())
}

/// Prompts for confirmation on stderr.
fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}
