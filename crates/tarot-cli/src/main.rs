use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tarot")]
#[command(about = "Quantum Tarot - AI tarot readings shuffled with quantum randomness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive reading
    Read {
        /// The question to ask (prompted for when omitted)
        question: Option<String>,
        /// Spread id, or "auto" to let the model choose
        #[arg(long, default_value = "auto")]
        spread: String,
        /// Use the pro model tier
        #[arg(long)]
        pro: bool,
        /// Skip the quantum service and use the local CSPRNG
        #[arg(long)]
        local_random: bool,
    },
    /// List the available spreads
    Spreads,
    /// List the 78 cards of the reference deck
    Deck {
        /// Only show one suit (wands, cups, swords, pentacles) or "major"
        #[arg(long)]
        suit: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Read {
            question,
            spread,
            pro,
            local_random,
        } => commands::read::run(question, &spread, pro, local_random).await?,
        Commands::Spreads => commands::catalog::list_spreads(),
        Commands::Deck { suit } => commands::catalog::list_deck(suit.as_deref())?,
    }

    Ok(())
}
