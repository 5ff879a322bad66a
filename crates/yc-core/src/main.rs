//! Yieldcast - yield-strength decision analysis
//!
//! The CLI wires the pipeline end to end:
//! - Measurement CSV ingestion
//! - MLE fitting with bootstrap intervals and the MOTE characteristic value
//! - Hierarchical posterior sampling
//! - Expected-cost decisioning and value-of-information analysis
//!
//! Payloads go to stdout; logs and progress go to stderr.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use yc_config::Config;
use yc_core::cache::{CacheError, EnsembleCache};
use yc_core::collect::{read_measurements, CollectError, MeasurementSet};
use yc_core::decision::expected_cost::DecisionError;
use yc_core::decision::voi::VoiError;
use yc_core::decision::{
    expected_costs, perfect_information, sweep, DecisionOutcome, DecisionResult,
};
use yc_core::events::TracingEmitter;
use yc_core::inference::fit::FitError;
use yc_core::inference::hierarchical::{
    HierarchicalYieldModel, NoiseSpec, PosteriorEnsemble, PosteriorError,
};
use yc_core::inference::mote::MoteError;
use yc_core::inference::{
    bootstrap_confidence_interval, ensemble_diagnostics, fit_mle, mote, mote_rank, mote_scatter,
    normal_estimator, DistributionParams, EnsembleDiagnostics,
};
use yc_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use yc_core::output::{
    decision_inputs_table, histogram_figure, joint_scatter, mote_figure, predictive_comparison,
    vopi_jitter, DecisionInputsTable, HistogramFigure, JointScatterFigure, MoteScatterFigure,
    PredictiveComparisonFigure, RawDataTable, VoiSweepFigure, VopiJitterFigure,
};
use yc_core::rng::derive_seed;
use yc_math::{mean, percentile, std_sample};

/// Yieldcast - decision analysis for material yield strength
#[derive(Parser)]
#[command(name = "yieldcast")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to a TOML config file (built-in defaults when absent)
    #[arg(long, global = true, env = "YIELDCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Master seed; every stochastic stage derives its own stream from it
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Human,
}

#[derive(Subcommand)]
enum Commands {
    /// Normal MLE fit with bootstrap intervals and the MOTE value
    Fit(FitArgs),
    /// Sample the hierarchical posterior
    Posterior(PosteriorArgs),
    /// Expected-cost decision over the posterior predictive
    Decide(DecideArgs),
    /// EVPI and the imperfect-information sweep
    Voi(VoiArgs),
    /// Prior-predictive draws from the configured priors
    PriorPredictive(PriorPredictiveArgs),
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Measurement CSV (id,yield_MPa)
    #[arg(long, short)]
    input: PathBuf,

    /// Bootstrap resamples
    #[arg(long, default_value_t = 1000)]
    resamples: usize,

    /// Bootstrap confidence level
    #[arg(long, default_value_t = 0.95)]
    confidence: f64,

    /// MOTE resamples per series size for the scatter figure
    #[arg(long, default_value_t = 20)]
    mote_resamples: usize,
}

#[derive(Args, Debug)]
struct PosteriorArgs {
    /// Measurement CSV (id,yield_MPa)
    #[arg(long, short)]
    input: PathBuf,

    /// Reuse/store ensembles under this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Include every posterior draw in the payload
    #[arg(long)]
    include_draws: bool,

    /// Include figure payloads (predictive comparison, joint scatter)
    #[arg(long)]
    figures: bool,
}

#[derive(Args, Debug)]
struct DecideArgs {
    /// Measurement CSV (id,yield_MPa)
    #[arg(long, short)]
    input: PathBuf,

    /// Reuse/store ensembles under this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VoiArgs {
    /// Measurement CSV (id,yield_MPa)
    #[arg(long, short)]
    input: PathBuf,

    /// Reuse/store ensembles under this directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Include the per-hypothetical jitter figure
    #[arg(long)]
    figures: bool,
}

#[derive(Args, Debug)]
struct PriorPredictiveArgs {
    /// Number of prior-predictive draws
    #[arg(long, default_value_t = 4000)]
    draws: usize,

    /// Histogram bins
    #[arg(long, default_value_t = 40)]
    bins: usize,
}

/// Errors surfaced by any command.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] yc_config::ValidationError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Mote(#[from] MoteError),
    #[error(transparent)]
    Posterior(#[from] PosteriorError),
    #[error(transparent)]
    Decision(#[from] DecisionError),
    #[error(transparent)]
    Voi(#[from] VoiError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        Some(LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet)),
        Some(match cli.global.format {
            OutputFormat::Json => LogFormat::Jsonl,
            OutputFormat::Human => LogFormat::Human,
        }),
    );
    init_logging(&log_config);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let config = match &cli.global.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };

    match &cli.command {
        Commands::Fit(args) => run_fit(cli, args),
        Commands::Posterior(args) => run_posterior(cli, &config, args),
        Commands::Decide(args) => run_decide(cli, &config, args),
        Commands::Voi(args) => run_voi(cli, &config, args),
        Commands::PriorPredictive(args) => run_prior_predictive(cli, &config, args),
    }
}

/// Summary statistics reported for a sampled quantity.
#[derive(Debug, Clone, Copy, Serialize)]
struct SummaryStats {
    mean: f64,
    sd: f64,
    p2_5: f64,
    p50: f64,
    p97_5: f64,
}

fn summarize(values: &[f64]) -> SummaryStats {
    SummaryStats {
        mean: mean(values),
        sd: std_sample(values),
        p2_5: percentile(values, 2.5),
        p50: percentile(values, 50.0),
        p97_5: percentile(values, 97.5),
    }
}

#[derive(Serialize)]
struct FitPayload {
    n_measurements: usize,
    raw_data: RawDataTable,
    params: DistributionParams,
    confidence_level: f64,
    intervals: BTreeMap<&'static str, (f64, f64)>,
    mote: f64,
    mote_rank: usize,
    mote_scatter: MoteScatterFigure,
}

fn run_fit(cli: &Cli, args: &FitArgs) -> Result<(), RunError> {
    let measurements = load_input(&args.input)?;
    let values = measurements.values();

    let params = fit_mle(&values)?;
    let intervals = bootstrap_confidence_interval(
        &values,
        &normal_estimator,
        args.resamples,
        args.confidence,
        derive_seed(cli.global.seed, "bootstrap", 0),
    )?;
    let characteristic = mote(&values)?;
    let scatter = mote_scatter(
        &values,
        args.mote_resamples,
        derive_seed(cli.global.seed, "mote-scatter", 0),
    )?;

    let payload = FitPayload {
        n_measurements: values.len(),
        raw_data: RawDataTable { rows: measurements },
        params,
        confidence_level: args.confidence,
        intervals,
        mote: characteristic,
        mote_rank: mote_rank(values.len())?,
        mote_scatter: mote_figure(scatter),
    };

    match cli.global.format {
        OutputFormat::Json => print_json(&payload),
        OutputFormat::Human => {
            println!("n            {}", payload.n_measurements);
            println!("mean         {:.2} MPa", payload.params.mean);
            println!("std          {:.2} MPa", payload.params.std);
            for (name, (low, high)) in &payload.intervals {
                println!(
                    "{name:<12} {:.0}% CI [{low:.2}, {high:.2}]",
                    payload.confidence_level * 100.0
                );
            }
            println!(
                "MOTE         {:.2} MPa (rank {} of {})",
                payload.mote, payload.mote_rank, payload.n_measurements
            );
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct PosteriorPayload {
    n_draws: usize,
    n_chains: usize,
    mu: SummaryStats,
    sigma: SummaryStats,
    predicted_yield: SummaryStats,
    diagnostics: Option<EnsembleDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_entry: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    figures: Option<PosteriorFigures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draws: Option<PosteriorEnsemble>,
}

#[derive(Serialize)]
struct PosteriorFigures {
    predictive_comparison: PredictiveComparisonFigure,
    joint_scatter: JointScatterFigure,
}

fn run_posterior(cli: &Cli, config: &Config, args: &PosteriorArgs) -> Result<(), RunError> {
    let measurements = load_input(&args.input)?;
    let (ensemble, cache_entry) =
        sample_posterior(cli, config, &measurements, args.cache_dir.as_deref())?;

    let mu: Vec<f64> = ensemble.samples.iter().map(|s| s.mu).collect();
    let sigma: Vec<f64> = ensemble.samples.iter().map(|s| s.sigma).collect();
    let predicted = ensemble.predicted_yields();

    let figures = if args.figures {
        let model = HierarchicalYieldModel::new(config.priors.clone());
        let prior_draws = model.prior_predictive(
            predicted.len(),
            derive_seed(cli.global.seed, "prior-predictive", 0),
        )?;
        Some(PosteriorFigures {
            predictive_comparison: predictive_comparison(&prior_draws, &predicted, 40),
            joint_scatter: joint_scatter(&ensemble),
        })
    } else {
        None
    };

    let payload = PosteriorPayload {
        n_draws: ensemble.len(),
        n_chains: ensemble.n_chains(),
        mu: summarize(&mu),
        sigma: summarize(&sigma),
        predicted_yield: summarize(&predicted),
        diagnostics: ensemble_diagnostics(&ensemble),
        cache_entry,
        figures,
        draws: args.include_draws.then_some(ensemble),
    };

    match cli.global.format {
        OutputFormat::Json => print_json(&payload),
        OutputFormat::Human => {
            println!("draws        {} across {} chains", payload.n_draws, payload.n_chains);
            print_stats("mu", &payload.mu);
            print_stats("sigma", &payload.sigma);
            print_stats("predicted", &payload.predicted_yield);
            if let Some(d) = &payload.diagnostics {
                println!(
                    "mixing       mu ess {:.0} rhat {:.3}; sigma ess {:.0} rhat {:.3}",
                    d.mu.ess, d.mu.split_r_hat, d.sigma.ess, d.sigma.split_r_hat
                );
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct DecidePayload {
    inputs: DecisionInputsTable,
    result: DecisionResult,
    optimal: DecisionOutcome,
    diagnostics: Option<EnsembleDiagnostics>,
}

fn run_decide(cli: &Cli, config: &Config, args: &DecideArgs) -> Result<(), RunError> {
    let measurements = load_input(&args.input)?;
    let (ensemble, _) = sample_posterior(cli, config, &measurements, args.cache_dir.as_deref())?;

    let result = expected_costs(&ensemble.predicted_yields(), &config.policy)?;
    let payload = DecidePayload {
        inputs: decision_inputs_table(&config.policy),
        optimal: result.optimal(),
        diagnostics: ensemble_diagnostics(&ensemble),
        result,
    };

    match cli.global.format {
        OutputFormat::Json => print_json(&payload),
        OutputFormat::Human => {
            for outcome in &payload.result.outcomes {
                println!(
                    "{:<20} p_fail {:.3}  expected cost {:>12.0}",
                    outcome.action.name(),
                    outcome.p_fail,
                    outcome.expected_cost
                );
            }
            println!(
                "optimal      {} at {:.0}",
                payload.optimal.action.name(),
                payload.optimal.expected_cost
            );
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct VoiPayload {
    prior_expected_cost: f64,
    posterior_mean_cost: f64,
    evpi: f64,
    sweep: VoiSweepFigure,
    #[serde(skip_serializing_if = "Option::is_none")]
    jitter: Option<VopiJitterFigure>,
}

fn run_voi(cli: &Cli, config: &Config, args: &VoiArgs) -> Result<(), RunError> {
    let measurements = load_input(&args.input)?;
    let (ensemble, _) = sample_posterior(cli, config, &measurements, args.cache_dir.as_deref())?;

    let perfect = perfect_information(&ensemble, &config.policy)?;
    let model = HierarchicalYieldModel::new(config.priors.clone());
    let noise = NoiseSpec::Scalar(config.priors.measurement_noise_sd);
    let emitter = TracingEmitter;
    let points = sweep(
        &model,
        &measurements.values(),
        &noise,
        &ensemble,
        &config.policy,
        &config.sweep,
        cli.global.seed,
        Some(&emitter),
    )?;

    let payload = VoiPayload {
        prior_expected_cost: perfect.prior_expected_cost,
        posterior_mean_cost: perfect.posterior_mean_cost,
        evpi: perfect.evpi,
        jitter: args.figures.then(|| {
            vopi_jitter(
                perfect.samples.clone(),
                &config.policy,
                perfect.prior_expected_cost,
            )
        }),
        sweep: VoiSweepFigure { points },
    };

    match cli.global.format {
        OutputFormat::Json => print_json(&payload),
        OutputFormat::Human => {
            println!("prior cost   {:.0}", payload.prior_expected_cost);
            println!("EVPI         {:.0}", payload.evpi);
            for point in &payload.sweep.points {
                println!(
                    "sd {:>5.1}     EVI {:>10.0}  (mcse {:.0}, {} batches)",
                    point.measurement_sd,
                    point.value_of_information,
                    point.mc_standard_error,
                    point.n_batches
                );
            }
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct PriorPredictivePayload {
    n_draws: usize,
    summary: SummaryStats,
    histogram: HistogramFigure,
}

fn run_prior_predictive(
    cli: &Cli,
    config: &Config,
    args: &PriorPredictiveArgs,
) -> Result<(), RunError> {
    let model = HierarchicalYieldModel::new(config.priors.clone());
    let draws = model.prior_predictive(
        args.draws,
        derive_seed(cli.global.seed, "prior-predictive", 0),
    )?;
    let payload = PriorPredictivePayload {
        n_draws: draws.len(),
        summary: summarize(&draws),
        histogram: histogram_figure("prior_predictive", &draws, args.bins),
    };

    match cli.global.format {
        OutputFormat::Json => print_json(&payload),
        OutputFormat::Human => {
            print_stats("prior yield", &payload.summary);
            Ok(())
        }
    }
}

fn load_input(path: &PathBuf) -> Result<MeasurementSet, RunError> {
    let set = read_measurements(path)?;
    tracing::debug!(n = set.len(), path = %path.display(), "measurements loaded");
    Ok(set)
}

/// Run (or reuse) the posterior for the configured priors and noise.
fn sample_posterior(
    cli: &Cli,
    config: &Config,
    measurements: &MeasurementSet,
    cache_dir: Option<&std::path::Path>,
) -> Result<(PosteriorEnsemble, Option<PathBuf>), RunError> {
    let model = HierarchicalYieldModel::new(config.priors.clone());
    let noise = NoiseSpec::Scalar(config.priors.measurement_noise_sd);
    let values = measurements.values();
    let emitter = TracingEmitter;

    let Some(dir) = cache_dir else {
        let ensemble = model.posterior_sample(
            &values,
            &noise,
            &config.sampler,
            cli.global.seed,
            Some(&emitter),
        )?;
        return Ok((ensemble, None));
    };

    let cache = EnsembleCache::new(dir);
    let key = EnsembleCache::key(
        &values,
        &noise,
        &config.priors,
        &config.sampler,
        cli.global.seed,
    );
    if let Some(ensemble) = cache.load(&key)? {
        tracing::info!(key, "posterior cache hit");
        return Ok((ensemble, None));
    }
    let ensemble = model.posterior_sample(
        &values,
        &noise,
        &config.sampler,
        cli.global.seed,
        Some(&emitter),
    )?;
    let path = cache.store(&key, &ensemble)?;
    tracing::info!(key, path = %path.display(), "posterior cached");
    Ok((ensemble, Some(path)))
}

fn print_json<T: Serialize>(payload: &T) -> Result<(), RunError> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

fn print_stats(label: &str, stats: &SummaryStats) {
    println!(
        "{label:<12} mean {:.2}  sd {:.2}  95% [{:.2}, {:.2}]",
        stats.mean, stats.sd, stats.p2_5, stats.p97_5
    );
}
