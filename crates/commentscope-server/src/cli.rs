use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "commentscope")]
#[command(
    author,
    version,
    about = "Local emotion, sentiment and like-count prediction for comments"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the models and start the HTTP API
    Serve(ServeArgs),

    /// Create empty model folders with README files
    InitModels {
        /// Root directory for the model folders
        #[arg(long, default_value = "./models")]
        models_dir: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Configuration file path
    #[arg(short, long, env = "COMMENTSCOPE_CONFIG", default_value = "commentscope.yaml")]
    pub config: PathBuf,

    /// Listen address
    #[arg(short, long, env = "COMMENTSCOPE_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short, long, env = "COMMENTSCOPE_PORT")]
    pub port: Option<u16>,

    /// History file path
    #[arg(long, env = "COMMENTSCOPE_HISTORY_FILE")]
    pub history_file: Option<PathBuf>,

    /// Inference device (cpu, cuda[:N], metal[:N])
    #[arg(long, env = "COMMENTSCOPE_DEVICE")]
    pub device: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
