//! `vnl` — evaluate virtual-normal losses on depth samples stored on disk.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use vnl::core::ImageSize;
use vnl::load::{LoadError, PlaneSampleSpec, WholeImageSampleSpec};
use vnl::loss::{write_json, ConfiguredLoss, LossConfig, VnlIoError, VnlLossError};

#[derive(Parser, Debug)]
#[command(name = "vnl", version, about = "Virtual-normal depth losses")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); without it `VNL_LOG` applies.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plane-aware loss on one annotated sample.
    Plane(EvalArgs),
    /// Whole-image loss on a batch of depth maps.
    Whole(EvalArgs),
    /// Write a default loss config.
    InitConfig {
        #[arg(long, value_enum)]
        variant: Variant,
        #[arg(long)]
        width: usize,
        #[arg(long)]
        height: usize,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct EvalArgs {
    /// Loss config JSON (see `init-config`).
    #[arg(long)]
    config: PathBuf,
    /// Sample description JSON.
    #[arg(long)]
    sample: PathBuf,
    /// Seed for triplet sampling; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Average over every surviving triplet instead of the hardest 75%.
    #[arg(long)]
    no_hard_mining: bool,
    /// Write the per-region report here as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Variant {
    Plane,
    Whole,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Io(#[from] VnlIoError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Loss(#[from] VnlLossError),
    #[error("config {config} holds the {found} variant, expected {expected}")]
    WrongVariant {
        config: PathBuf,
        found: &'static str,
        expected: &'static str,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    let _ = vnl::core::init_from_env(verbose);
}

#[cfg(feature = "tracing")]
fn init_logging(verbose: u8) {
    let env_value = std::env::var(vnl::core::LOG_ENV).ok();
    vnl::core::init_tracing(
        vnl::core::resolve_level(verbose, env_value.as_deref()),
        false,
    );
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Plane(args) => run_plane(&args),
        Command::Whole(args) => run_whole(&args),
        Command::InitConfig {
            variant,
            width,
            height,
            out,
        } => {
            let size = ImageSize::new(width, height);
            let cfg = match variant {
                Variant::Plane => LossConfig::plane(size),
                Variant::Whole => LossConfig::whole_image(size),
            };
            cfg.write_json(&out)?;
            info!("wrote {}", out.display());
            Ok(())
        }
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn variant_name(loss: &ConfiguredLoss) -> &'static str {
    match loss {
        ConfiguredLoss::Plane(_) => "plane",
        ConfiguredLoss::WholeImage(_) => "whole_image",
    }
}

fn load_config(path: &Path) -> Result<ConfiguredLoss, CliError> {
    Ok(LossConfig::load_json(path)?.build())
}

fn run_plane(args: &EvalArgs) -> Result<(), CliError> {
    let loss = match load_config(&args.config)? {
        ConfiguredLoss::Plane(loss) => loss,
        other => {
            return Err(CliError::WrongVariant {
                config: args.config.clone(),
                found: variant_name(&other),
                expected: "plane",
            })
        }
    };
    let sample = PlaneSampleSpec::load_json(&args.sample)?.load(&args.sample)?;
    let masks = sample.mask_views();
    info!(
        "plane sample: {}x{}, {} planes",
        sample.pred_depth.width,
        sample.pred_depth.height,
        masks.len()
    );

    let mut rng = rng_for(args.seed);
    let report = loss.compute_report(&sample.input(&masks), !args.no_hard_mining, &mut rng)?;
    println!("loss: {}", report.loss);
    if let Some(path) = &args.report {
        write_json(&report, path)?;
    }
    Ok(())
}

fn run_whole(args: &EvalArgs) -> Result<(), CliError> {
    let loss = match load_config(&args.config)? {
        ConfiguredLoss::WholeImage(loss) => loss,
        other => {
            return Err(CliError::WrongVariant {
                config: args.config.clone(),
                found: variant_name(&other),
                expected: "whole_image",
            })
        }
    };
    let sample = WholeImageSampleSpec::load_json(&args.sample)?.load(&args.sample)?;
    let gt: Vec<_> = sample.gt_depth.iter().map(|d| d.view()).collect();
    let pred: Vec<_> = sample.pred_depth.iter().map(|d| d.view()).collect();
    info!("whole-image batch: {}", gt.len());

    let mut rng = rng_for(args.seed);
    let report = loss.compute_report(
        &gt,
        &pred,
        sample.intrinsics,
        !args.no_hard_mining,
        &mut rng,
    )?;
    println!("loss: {}", report.loss);
    if let Some(path) = &args.report {
        write_json(&report, path)?;
    }
    Ok(())
}
