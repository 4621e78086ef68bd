//! CLI module for Campus
//!
//! Provides commands:
//! - `serve`: Start the HTTP server (default)
//! - `route`: Show how a message would be scored and routed
//! - `config`: Print the effective configuration

use crate::server::{self, config::AppConfig};
use anyhow::{Context, Result};
use campus_core::Mode;
use campus_llm::{ChatMessage, ConversationWindow, RouteDecision, RouteSelector};
use clap::{Parser, Subcommand};

/// Campus chat proxy CLI
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(about = "Routing and streaming chat proxy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Score a one-message conversation and print the route it would take
    Route {
        /// Message text
        text: String,
    },
    /// Print the effective configuration (API key masked)
    Config,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let config = server::load_config()?;
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => server::run(config).await,
        Commands::Route { text } => {
            print!("{}", describe_route(&config, &text));
            Ok(())
        }
        Commands::Config => {
            let rendered = serde_json::to_string_pretty(&config)
                .context("Failed to render configuration")?;
            println!("{rendered}");
            Ok(())
        }
    }
}

fn describe_route(config: &AppConfig, text: &str) -> String {
    let window = ConversationWindow::build(
        vec![ChatMessage::user(text)],
        config.chat.max_input_chars,
        &config.chat.system_prompt,
    );
    let breakdown = campus_llm::analyze(&window);
    let decision = match config.mode {
        Mode::Cloud => RouteDecision::forced_cloud(config.cloud.model.clone()),
        Mode::Local => RouteSelector::new(config.routing_config()).select(&window),
    };

    let flag = |hit: bool| if hit { "yes" } else { "no" };
    format!(
        "score:      {}\n\
         length:     +{}\n\
         history:    +{}\n\
         technical:  {}\n\
         code:       {}\n\
         technology: {}\n\
         evaluation: {}\n\
         route:      {}\n",
        breakdown.total(),
        breakdown.length,
        breakdown.history,
        flag(breakdown.technical_terms),
        flag(breakdown.code_block),
        flag(breakdown.technology_names),
        flag(breakdown.evaluation_intent),
        decision,
    )
}
