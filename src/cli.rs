use clap::{Parser, Subcommand};

/// AccessDesk — data access request workflow for trusted research environments
#[derive(Parser)]
#[command(name = "accessdesk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind (overrides ACCESSDESK_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
