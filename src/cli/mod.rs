//! AutoML Studio CLI Module
//!
//! Command-line interface for serving the demo, running it headless and
//! inspecting saved models.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::DemoConfig;
use crate::export::{inspect_model, load_model};
use crate::training::{LeaderboardEntry, ModelType};
use crate::ui;
use crate::workflow::{self, Session, SHOWN_PREDICTIONS};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "automl-studio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, save, load and predict with AutoML on the wine dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Directory trained models are saved to (defaults to MODEL_DIR or ./mymodelfolder)
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Run setup, train and predict once and print the results
    Demo {
        /// Directory trained models are saved to
        #[arg(long, default_value = "./mymodelfolder")]
        model_dir: PathBuf,

        /// Fix the train/test split and the search
        #[arg(long)]
        seed: Option<u64>,

        /// Model type (auto, naive_bayes, knn, decision_tree, random_forest)
        #[arg(short, long, default_value = "auto")]
        model: String,

        /// AutoML runtime budget in seconds
        #[arg(long)]
        max_runtime_secs: Option<f64>,

        /// Number of cross-validation folds
        #[arg(long)]
        nfolds: Option<usize>,
    },

    /// Print the metadata and leaderboard of a saved model
    Inspect {
        /// Saved model file
        #[arg(short, long)]
        model: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_demo(
    model_dir: &Path,
    seed: Option<u64>,
    model_type: &str,
    max_runtime_secs: Option<f64>,
    nfolds: Option<usize>,
) -> anyhow::Result<()> {
    let model_type: ModelType = model_type.parse().map_err(anyhow::Error::msg)?;
    let mut config = DemoConfig::default()
        .with_model_type(model_type)
        .with_model_dir(model_dir);
    if let Some(seed) = seed {
        config = config.with_split_seed(seed);
    }
    if let Some(secs) = max_runtime_secs {
        config = config.with_max_runtime_secs(secs);
    }
    if let Some(nfolds) = nfolds {
        config = config.with_nfolds(nfolds);
    }

    section("Setup");
    step_run("Loading wine dataset");
    let mut session = Session::new(&config)?;
    step_done(&format!(
        "{} train rows, {} test rows",
        session.train_df().height(),
        session.test_df().height()
    ));

    section("Train");
    step_run(&format!("Running AutoML ({}s budget, {} folds)", config.max_runtime_secs, config.nfolds));
    let start = Instant::now();
    let summary = workflow::train_step(&mut session, &config)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    println!("  {:<16} {}", muted("Model id"), summary.model_id.white().bold());
    println!("  {:<16} {}", muted("Accuracy"), format!("{}%", summary.accuracy).white().bold());
    println!("  {:<16} {}", muted("Saved to"), summary.model_path.display().to_string().white());

    let model = load_model(&summary.model_path)?;
    print_leaderboard(model.leaderboard());

    section("Predict");
    step_run("Loading model and scoring test rows");
    let start = Instant::now();
    let predictions = workflow::predict_step(&mut session)?;
    step_done(&format!("{} rows in {:.2?}", predictions.len(), start.elapsed()));

    println!();
    let form = ui::render(&session);
    for line in form.predictions().lines() {
        println!("  {}", line);
    }
    if predictions.len() > SHOWN_PREDICTIONS {
        println!("  {}", dim(&format!("... {} more", predictions.len() - SHOWN_PREDICTIONS)));
    }
    println!();

    Ok(())
}

pub fn cmd_inspect(model_path: &Path) -> anyhow::Result<()> {
    section("Inspect");

    let metadata = inspect_model(model_path)?;
    let model = load_model(model_path)?;

    println!("  {:<16} {}", muted("Model id"), metadata.model_id.white().bold());
    println!("  {:<16} {}", muted("Family"), metadata.model_type.white());
    println!("  {:<16} {}", muted("Trained at"), metadata.trained_at.white());
    println!("  {:<16} {}", muted("Target"), metadata.target_name.white());
    println!("  {:<16} {}", muted("Classes"), metadata.classes.join(", ").white());
    println!("  {:<16} {}", muted("Features"), metadata.feature_names.len().to_string().white());
    println!("  {:<16} {}", muted("Accuracy"), format!("{}%", model.accuracy_percent()).white().bold());
    println!("  {:<16} {}", muted("Written by"), format!("v{}", metadata.version).white());

    print_leaderboard(model.leaderboard());
    println!();
    Ok(())
}

fn print_leaderboard(entries: &[LeaderboardEntry]) {
    section("Leaderboard");
    println!(
        "  {:<40} {:>10} {:>10} {:>8}",
        muted("model_id"),
        muted("mpce"),
        muted("logloss"),
        muted("secs")
    );
    for (i, entry) in entries.iter().enumerate() {
        let id = if i == 0 { entry.model_id.green().bold() } else { entry.model_id.normal() };
        println!(
            "  {:<40} {:>10.4} {:>10.4} {:>8.2}",
            id, entry.mean_per_class_error, entry.logloss, entry.training_time_secs
        );
    }
}

pub async fn cmd_serve(host: &str, port: u16, model_dir: Option<PathBuf>) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig {
        host: host.to_string(),
        port,
        ..Default::default()
    };
    if let Some(dir) = model_dir {
        config.model_dir = dir;
    }

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "AutoML Studio".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Demo   ", &format!("http://{}:{}/demo", host, port)));
    line_box(&kv("API    ", &format!("http://{}:{}/api/demo", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Models ", &config.model_dir.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config, DemoConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_demo_args() {
        let cli = Cli::try_parse_from(["automl-studio", "demo", "--seed", "4", "--model", "knn"]).unwrap();
        match cli.command {
            Some(Commands::Demo { seed, model, .. }) => {
                assert_eq!(seed, Some(4));
                assert_eq!(model, "knn");
            }
            _ => panic!("expected demo command"),
        }
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1mbold\x1b[0m"), "bold");
    }
}
