use clap::Parser;
use colored::Colorize;
use env_logger::{Builder, Env};
use log::{error, info, Level};
use std::io::Write;

use sonodx::config::{AnalyzeCommand, AnalyzeConfig, GlobalArgs, ReportCommand, ReportConfig};
use sonodx::onnx_session::MODEL_PATH_ENV;
use sonodx::processing::{run_analysis, run_report};

#[derive(clap::Subcommand)]
enum Commands {
    /// Analyze ultrasound images: classification plus tumor mask
    Analyze(AnalyzeCommand),

    /// Analyze one image and render a PDF diagnostic report
    Report(ReportCommand),

    /// Show version information
    Version,
}

#[derive(Parser)]
#[command(name = "sonodx")]
#[command(about = "Breast ultrasound tumor segmentation and classification toolkit")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn get_log_level_from_verbosity(
    verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::ErrorLevel>,
) -> log::LevelFilter {
    let base_level = verbosity.log_level_filter();
    let adjusted_level = match base_level {
        log::LevelFilter::Off => log::LevelFilter::Off, // -qq -> OFF
        log::LevelFilter::Error => log::LevelFilter::Warn, // default -> WARN
        log::LevelFilter::Warn => log::LevelFilter::Info, // -v -> INFO
        log::LevelFilter::Info => log::LevelFilter::Debug, // -vv -> DEBUG
        log::LevelFilter::Debug => log::LevelFilter::Trace, // -vvv -> TRACE
        log::LevelFilter::Trace => log::LevelFilter::Trace, // -vvvv -> TRACE (max)
    };

    if verbosity.is_silent() {
        log::LevelFilter::Error // -q -> ERROR
    } else {
        adjusted_level
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.global.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    // If user didn't pass -v/-q and RUST_LOG is set, honor the env var.
    let use_env = !cli.global.verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();

    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let level_filter = get_log_level_from_verbosity(cli.global.verbosity.clone());

        let mut b = Builder::new();
        b.filter_level(level_filter);
        b
    };

    logger
        .format(|buf, record| {
            let level_str = match record.level() {
                Level::Error => "ERROR".red().bold().to_string(),
                Level::Warn => "WARN".yellow().to_string(),
                Level::Info => "INFO".green().to_string(),
                Level::Debug => "DEBUG".blue().to_string(),
                Level::Trace => "TRACE".magenta().to_string(),
            };
            writeln!(buf, "[{}] {}", level_str, record.args())
        })
        .init();

    match &cli.command {
        Some(Commands::Analyze(analyze_cmd)) => {
            let sources_desc = if analyze_cmd.sources.len() == 1 {
                analyze_cmd.sources[0].clone()
            } else {
                format!("{} inputs", analyze_cmd.sources.len())
            };

            info!(
                "🔬 Analysis: {} | device: {}",
                sources_desc, cli.global.device
            );

            let mut outputs = vec!["mask"];
            if analyze_cmd.save_probability_map {
                outputs.push("probability-map");
            }
            if cli.global.metadata {
                outputs.push("metadata");
            }
            info!("   Outputs: {}", outputs.join(", "));

            let config = AnalyzeConfig::from_args(cli.global.clone(), analyze_cmd.clone());
            match run_analysis(&config) {
                Ok(_) => {}
                Err(e) => {
                    error!("❌ Analysis failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Report(report_cmd)) => {
            info!(
                "🔬 Report: {} | device: {}",
                report_cmd.image, cli.global.device
            );

            let config = ReportConfig::from_args(cli.global.clone(), report_cmd.clone());
            match run_report(&config) {
                Ok(_) => {}
                Err(e) => {
                    error!("❌ Report generation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Version) => {
            println!("sonodx v{}", env!("CARGO_PKG_VERSION"));
            match std::env::var(MODEL_PATH_ENV) {
                Ok(path) => println!("Model: {path}"),
                Err(_) => println!("Model: not configured (set {MODEL_PATH_ENV} or pass --model-path)"),
            }
            println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
        }
        None => {
            // Show help if no command specified
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().unwrap();
        }
    }
}
