pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "benefits")]
#[command(about = "Benefits CLI - operator tooling for the Benefits API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "BENEFITS_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the API server"
    )]
    pub url: String,

    #[arg(long, global = true, env = "BENEFITS_API_TOKEN", help = "Bearer token sent with requests")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a signed bearer token using JWT_SECRET")]
    Token(commands::token::TokenArgs),

    #[command(about = "Filter definition management")]
    Filter {
        #[command(subcommand)]
        cmd: commands::filter::FilterCommands,
    },

    #[command(about = "Catalogue search")]
    Benefit {
        #[command(subcommand)]
        cmd: commands::benefit::BenefitCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = client::ApiClient::new(&cli.url, cli.token.clone())?;

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format),
        Commands::Filter { cmd } => commands::filter::handle(cmd, &client, output_format).await,
        Commands::Benefit { cmd } => commands::benefit::handle(cmd, &client, output_format).await,
    }
}
