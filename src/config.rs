//! Configuration management for the effects service.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `FX_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `FX_HOST` - Server bind address (default: 0.0.0.0)
//! - `FX_PORT` - Server port (default: 3000)
//! - `FX_MAX_WEIGHT` - Weight budget per request (default: 50, values below 1 act as 1)
//! - `FX_OUTPUT_FORMAT` - Container for results (default: jpg, unknown values fall back to jpg)
//! - `FX_MAX_BODY_BYTES` - Largest accepted request body (default: 16 MiB)
//! - `FX_REQUEST_TIMEOUT` - Pipeline timeout in seconds, 0 disables (default: 30)
//! - `FX_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::effects::OutputFormat;
use crate::error::ConfigError;
use crate::pipeline::DEFAULT_MAX_WEIGHT;
use crate::server::{DEFAULT_MAX_BODY_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default output container extension.
pub const DEFAULT_OUTPUT_FORMAT: &str = "jpg";

// =============================================================================
// CLI Arguments
// =============================================================================

/// fx-weigher - apply chains of image effects under a weight budget.
#[derive(Parser, Debug, Clone)]
#[command(name = "fx-weigher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeConfig),

    /// Apply effects to a local image file.
    Apply(ApplyConfig),

    /// List the effect catalog and weights.
    Effects(EffectsConfig),
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "FX_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "FX_PORT")]
    pub port: u16,

    // =========================================================================
    // Pipeline Configuration
    // =========================================================================
    /// Maximum summed effect weight per request (values below 1 act as 1).
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_WEIGHT,
        env = "FX_MAX_WEIGHT",
        allow_negative_numbers = true
    )]
    pub max_weight: i64,

    /// Container for processed images (bmp, jpg, png, webp, pnm, tiff, exr, hdr).
    ///
    /// Unrecognized values fall back to jpg.
    #[arg(long, default_value = DEFAULT_OUTPUT_FORMAT, env = "FX_OUTPUT_FORMAT")]
    pub output_format: String,

    // =========================================================================
    // Limits
    // =========================================================================
    /// Largest accepted request body in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "FX_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Pipeline timeout in seconds (0 disables the limit).
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "FX_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "FX_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.port == 0 {
            return Err(ConfigError::OutOfRange {
                name: "port",
                expected: "between 1 and 65535",
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::OutOfRange {
                name: "max_body_bytes",
                expected: "greater than 0",
            });
        }
        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolved output container.
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_extension(&self.output_format)
    }

    /// Pipeline timeout, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }
}

// =============================================================================
// Apply
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ApplyConfig {
    /// Image file to process.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the processed image.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Effects to apply, in order (comma-separated).
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub effects: Vec<String>,

    /// Maximum summed effect weight (values below 1 act as 1).
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_WEIGHT,
        env = "FX_MAX_WEIGHT",
        allow_negative_numbers = true
    )]
    pub max_weight: i64,

    /// Container for the result. Defaults to the output file's extension.
    #[arg(long)]
    pub output_format: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ApplyConfig {
    /// Explicit `--output-format`, else the output extension, else jpg.
    pub fn output_format(&self) -> OutputFormat {
        let ext = self.output_format.clone().or_else(|| {
            self.output
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_string)
        });
        ext.map_or_else(OutputFormat::default, |e| OutputFormat::from_extension(&e))
    }
}

// =============================================================================
// Effects
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct EffectsConfig {
    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

// =============================================================================
// Tests
// =============================================================================
