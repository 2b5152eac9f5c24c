use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tracegraph")]
#[command(about = "Explore memory-access execution traces")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show metadata, event counts and the memory layout of a trace
    Info {
        /// Trace database file
        file: PathBuf,

        /// List every memory region
        #[arg(long, short = 'r')]
        regions: bool,
    },

    /// Find the event under a view coordinate
    At {
        /// Trace database file
        file: PathBuf,

        /// Horizontal view coordinate
        x: i32,

        /// Vertical view coordinate
        y: i32,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Report the values read and written inside a view rectangle
    Range {
        /// Trace database file
        file: PathBuf,

        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Convert a text trace into a trace database
    Import {
        /// Text trace, one `time kind address size value [description]` per line
        input: PathBuf,

        /// Output database path
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Interactive terminal viewer
    View {
        /// Trace database file
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Viewport used by the non-interactive queries.
///
/// Starts from the overview of the whole trace fitted to `width` x `height`.
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Viewport width in view units
    #[arg(long, default_value = "1000")]
    pub width: f64,

    /// Viewport height in view units
    #[arg(long, default_value = "1000")]
    pub height: f64,

    /// Real address at the left edge (decimal or 0x hex)
    #[arg(long = "view-address", value_parser = parse_u64)]
    pub address: Option<u64>,

    /// Time at the top edge
    #[arg(long = "view-time", value_parser = parse_u64)]
    pub time: Option<u64>,

    /// View units per display byte (default: fit the trace)
    #[arg(long)]
    pub address_zoom: Option<f64>,

    /// View units per time tick (default: fit the trace)
    #[arg(long)]
    pub time_zoom: Option<f64>,

    /// Minimum mark size in view units
    #[arg(long, default_value = "1")]
    pub size_px: u32,
}

/// Parse a decimal or `0x` prefixed hexadecimal number
pub fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("Invalid number '{}': {}", s, e))
}

impl ViewArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(format!(
                "Viewport must have a positive size, got {}x{}",
                self.width, self.height
            ));
        }
        for zoom in [self.address_zoom, self.time_zoom].into_iter().flatten() {
            if !(zoom > 0.0 && zoom.is_finite()) {
                return Err(format!("Zoom factors must be positive, got {}", zoom));
            }
        }
        if self.size_px == 0 {
            return Err("Mark size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::At { view, .. } | Command::Range { view, .. } => view.validate(),
            _ => Ok(()),
        }
    }
}
