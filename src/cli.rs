use crate::pipeline::Stage;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cpgtaint")]
#[command(about = "Structural taint-flow analysis for Java web applications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold a new project directory with a `project.toml` template
    Init {
        /// Project name; also used to derive the store file name
        name: String,
    },

    /// Run the static-analysis pipeline up through the named stage
    RunStatic {
        #[arg(value_enum)]
        stage: Stage,

        /// Path to `project.toml`
        #[arg(long, default_value = "project.toml")]
        config: String,
    },

    /// Serve the taint-flow results for browsing
    Web {
        /// Path to `project.toml`
        #[arg(long, default_value = "project.toml")]
        config: String,
    },
}
