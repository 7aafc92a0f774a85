//! Courier CLI
//!
//! Command-line tools for the Courier core.
//!
//! # Commands
//!
//! - `send` - Execute one proxied HTTP request and print the result
//! - `token` - Issue the opaque sync credential for a project

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Courier command-line tools.
#[derive(Parser)]
#[command(name = "courier")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one proxied HTTP request and print the result
    Send {
        /// Absolute http(s) URL
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short = 'd', long)]
        data: Option<String>,

        /// Deadline in milliseconds; 0 waits indefinitely
        #[arg(short, long, default_value_t = 30_000)]
        timeout_ms: u64,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Issue the opaque sync credential for a project
    Token {
        /// Project id (UUID)
        project_id: String,

        /// Server signing secret
        #[arg(short, long)]
        secret: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let exit_code = match cli.command {
        Commands::Send {
            url,
            method,
            headers,
            data,
            timeout_ms,
            json,
        } => commands::send(url, method, headers, data, timeout_ms, json).await,
        Commands::Token { project_id, secret } => commands::token(project_id, secret),
    };

    std::process::exit(exit_code);
}
