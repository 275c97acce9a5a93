pub mod init;
pub mod run_static;
pub mod web;

use crate::cli::Commands;
use crate::errors::CpgResult;

pub fn handle_command(command: Commands) -> CpgResult<()> {
    match command {
        Commands::Init { name } => init::handle(&name),
        Commands::RunStatic { stage, config } => run_static::handle(stage, &config),
        Commands::Web { config } => web::handle(&config),
    }
}
