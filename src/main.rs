//! Command line front end: generate synthetic data, train and select a model,
//! predict one record.
use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use sleep_quality::config::{DEFAULT_DATA_PATH, DEFAULT_MODEL_PATH, DEFAULT_SYNTHETIC_ROWS};
use sleep_quality::train::select_best;
use sleep_quality::{report, synth, ModelBundle, Predictor, SleepInput, TrainingConfig};

#[derive(Parser)]
#[command(name = "sleep_quality", about = "Train and query a sleep quality classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a synthetic labelled data set
    Generate {
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        out: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SYNTHETIC_ROWS)]
        n: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Fit every candidate, keep the best by macro-F1 and save the bundle
    Train {
        #[arg(long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        out: PathBuf,
        /// JSON training configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        test_fraction: Option<f64>,
        /// Save a bar chart of candidate scores to this PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Predict sleep quality for one record and print it as JSON
    Predict {
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
        /// Read the record from a JSON file instead of flags
        #[arg(long, conflicts_with_all = ["bedtime", "wakeup_time", "sleep_duration", "caffeine_intake",
            "exercise_duration", "screen_time_before_bed", "stress_level", "mood", "sleep_interruptions"])]
        input: Option<PathBuf>,
        #[command(flatten)]
        fields: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// HH:MM
    #[arg(long)]
    bedtime: Option<String>,
    /// HH:MM
    #[arg(long)]
    wakeup_time: Option<String>,
    /// Hours
    #[arg(long)]
    sleep_duration: Option<f64>,
    /// None, Low, Moderate or High
    #[arg(long)]
    caffeine_intake: Option<String>,
    /// Minutes
    #[arg(long)]
    exercise_duration: Option<u32>,
    /// Minutes
    #[arg(long)]
    screen_time_before_bed: Option<u32>,
    /// 0-10
    #[arg(long)]
    stress_level: Option<u8>,
    #[arg(long)]
    mood: Option<String>,
    /// Yes or No
    #[arg(long)]
    sleep_interruptions: Option<String>,
}

impl From<InputArgs> for SleepInput {
    fn from(a: InputArgs) -> Self {
        SleepInput {
            bedtime: a.bedtime,
            wakeup_time: a.wakeup_time,
            sleep_duration: a.sleep_duration,
            caffeine_intake: a.caffeine_intake,
            exercise_duration: a.exercise_duration,
            screen_time_before_bed: a.screen_time_before_bed,
            stress_level: a.stress_level,
            mood: a.mood,
            sleep_interruptions: a.sleep_interruptions,
        }
    }
}

fn run_train(
    data: PathBuf,
    out: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
    plot: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    // 1) Config file, then flag overrides
    let mut config = match config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(frac) = test_fraction {
        config.test_fraction = frac;
    }

    // 2) Data, synthesized when absent
    if !data.exists() {
        log::warn!("{} not found, generating synthetic data", data.display());
        synth::generate_csv(&data, DEFAULT_SYNTHETIC_ROWS, config.seed, false)?;
    }
    println!("Loading data from {}...", data.display());

    // 3) Train and select
    let outcome = sleep_quality::train_from_csv(&data, &config)?;
    println!("\nCandidate scores:");
    for s in &outcome.scores {
        println!("{:<20} f1_macro {:>7.4}   accuracy {:>7.4}", s.kind.name(), s.f1_macro, s.accuracy);
    }
    println!("\nSelected: {}\n", outcome.selected().name());
    println!("{}", outcome.report);

    // 4) Chart
    if let Some(plot) = plot {
        report::plot_leaderboard(&outcome.scores, select_best(&outcome.scores), &plot)?;
        println!("Wrote {}", plot.display());
    }

    // 5) Bundle
    ModelBundle::from(outcome).save(&out)?;
    println!("Saved model to {}", out.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::parse().command {
        Command::Generate { out, n, seed, force } => {
            if synth::generate_csv(&out, n, seed, force)? {
                println!("Wrote {} rows to {}", n, out.display());
            }
        }
        Command::Train {
            data,
            out,
            config,
            seed,
            test_fraction,
            plot,
        } => run_train(data, out, config, seed, test_fraction, plot)?,
        Command::Predict { model, input, fields } => {
            let input = match input {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => SleepInput::from(fields),
            };
            let predictor = Predictor::load(&model)?;
            let info = &predictor.bundle().info;
            log::info!(
                "Using {} model (f1_macro {:.4}) trained at {}",
                info.model,
                info.f1_macro,
                info.trained_at
            );
            let prediction = predictor.predict(&input)?;
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_flags_become_an_input() {
        let cli = Cli::try_parse_from([
            "sleep_quality",
            "predict",
            "--bedtime",
            "23:30",
            "--sleep-duration",
            "7.5",
            "--stress-level",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Predict { model, input, fields } => {
                assert_eq!(model, PathBuf::from(DEFAULT_MODEL_PATH));
                assert!(input.is_none());
                let input = SleepInput::from(fields);
                assert_eq!(input.bedtime.as_deref(), Some("23:30"));
                assert_eq!(input.sleep_duration, Some(7.5));
                assert_eq!(input.stress_level, Some(3));
                assert_eq!(input.mood, None);
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn input_file_conflicts_with_field_flags() {
        let parsed = Cli::try_parse_from(["sleep_quality", "predict", "--input", "x.json", "--mood", "Sad"]);
        assert!(parsed.is_err());
    }
}
