//! Configuration layer providing separation between CLI arguments and
//! internal settings.
//!
//! CLI concerns (argument parsing, help text) live in the `*Command` structs;
//! the `*Config` structs carry what the processing code actually consumes.

use crate::report::PatientDetails;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use serde::Serialize;

/// Global CLI arguments that apply to all sonodx commands
#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Global output directory (overrides default placement next to input)
    #[arg(long, global = true)]
    pub output_dir: Option<String>,

    /// Create metadata output file(s)
    #[arg(long, global = true)]
    pub metadata: bool,

    /// Verbosity level (-q/--quiet, -v/-vv/-vvv/-vvvv for info/debug/trace)
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Warn instead of erroring on unsupported or missing inputs
    #[arg(long, global = true)]
    pub permissive: bool,

    /// Device to use for inference (auto, cpu)
    #[arg(long, default_value = "auto", global = true)]
    pub device: String,

    /// Disable colored output (also respects the NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Allow overwriting outputs when name collisions are detected
    #[arg(long, global = true)]
    pub force: bool,
}

/// Base configuration shared by all commands
#[derive(Debug, Clone, Serialize)]
pub struct BaseConfig {
    /// Input sources (images, directories, or glob patterns)
    pub sources: Vec<String>,
    /// Device requested for inference
    pub device: String,
    /// Optional output directory override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Whether to skip metadata generation
    pub skip_metadata: bool,
    /// Fail on missing or unsupported inputs. Opposite of `--permissive`.
    pub strict: bool,
    /// Allow overwriting existing outputs
    pub force: bool,
}

impl From<GlobalArgs> for BaseConfig {
    fn from(global: GlobalArgs) -> Self {
        Self {
            sources: Vec::new(), // Sources come from the command, not global args
            device: global.device,
            output_dir: global.output_dir,
            skip_metadata: !global.metadata,
            strict: !global.permissive,
            force: global.force,
        }
    }
}

/// CLI command for batch image analysis
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeCommand {
    /// Path(s) to input images or directories. Supports glob patterns like *.png
    #[arg(value_name = "IMAGES_OR_DIRS", required = true)]
    pub sources: Vec<String>,

    /// Path to the model weights file (overrides SONODX_MODEL_PATH)
    #[arg(long)]
    pub model_path: Option<String>,

    /// MD5 checksum the weights file must match
    #[arg(long)]
    pub model_checksum: Option<String>,

    /// Also save the continuous tumor probability map
    #[arg(long)]
    pub save_probability_map: bool,
}

/// Internal configuration for batch analysis
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeConfig {
    #[serde(skip)]
    pub base: BaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_checksum: Option<String>,
    pub save_probability_map: bool,
}

impl AnalyzeConfig {
    /// Create configuration from global args and command-specific args
    pub fn from_args(global: GlobalArgs, cmd: AnalyzeCommand) -> Self {
        let mut base: BaseConfig = global.into();
        base.sources = cmd.sources;

        Self {
            base,
            model_path: cmd.model_path,
            model_checksum: cmd.model_checksum,
            save_probability_map: cmd.save_probability_map,
        }
    }
}

/// CLI command for single-image analysis with a PDF diagnostic report
#[derive(Parser, Debug, Clone)]
pub struct ReportCommand {
    /// Path to the input image
    #[arg(value_name = "IMAGE")]
    pub image: String,

    /// Patient name
    #[arg(long)]
    pub name: String,

    /// Patient age in years
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=120))]
    pub age: u8,

    /// Patient mobile number (exactly 10 digits)
    #[arg(long)]
    pub mobile: String,

    /// Patient address
    #[arg(long)]
    pub address: String,

    /// Report output path (defaults to <Patient_Name>_diagnostic_report.pdf)
    #[arg(long)]
    pub output: Option<String>,

    /// Path to the model weights file (overrides SONODX_MODEL_PATH)
    #[arg(long)]
    pub model_path: Option<String>,

    /// MD5 checksum the weights file must match
    #[arg(long)]
    pub model_checksum: Option<String>,
}

/// Internal configuration for report generation
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub base: BaseConfig,
    pub image: String,
    pub patient: PatientDetails,
    pub output: Option<String>,
    pub model_path: Option<String>,
    pub model_checksum: Option<String>,
}

impl ReportConfig {
    /// Create configuration from global args and command-specific args
    pub fn from_args(global: GlobalArgs, cmd: ReportCommand) -> Self {
        let mut base: BaseConfig = global.into();
        base.sources = vec![cmd.image.clone()];

        Self {
            base,
            image: cmd.image,
            patient: PatientDetails {
                name: cmd.name,
                age: cmd.age,
                mobile: cmd.mobile,
                address: cmd.address,
            },
            output: cmd.output,
            model_path: cmd.model_path,
            model_checksum: cmd.model_checksum,
        }
    }
}
