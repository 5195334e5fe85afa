use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use phonestar::chat::ConversationHistory;
use phonestar::services::FileStore;
use phonestar::settings::{load_or_default, store_file_path};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse()?;
    let config = load_or_default()?;
    let store_path = store_file_path()?;
    let store = Arc::new(FileStore::new(store_path.clone()));
    let mut history = ConversationHistory::open(store, &config.chat);

    if args.clear {
        history.clear();
        history
            .save()
            .with_context(|| format!("Failed to write {}", store_path.display()))?;
        println!("Conversation history reset to the welcome message.");
        return Ok(());
    }

    let turns = match args.last {
        Some(count) => history.get_recent(count),
        None => history.turns(),
    };
    for turn in turns {
        println!(
            "[{}] {}: {}",
            turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
            turn.role.as_str(),
            turn.content
        );
    }
    println!(
        "{} of {} turns (cap {}) from {}",
        turns.len(),
        history.len(),
        history.cap(),
        store_path.display()
    );
    Ok(())
}

struct CliArgs {
    clear: bool,
    last: Option<usize>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut clear = false;
        let mut last = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--clear" => clear = true,
                "--last" | "-n" => {
                    let value = args.next().context("Expected a turn count after --last")?;
                    let count = value
                        .parse::<usize>()
                        .with_context(|| format!("Invalid turn count '{value}'"))?;
                    last = Some(count);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument '{other}'. Run with --help for usage instructions."
                    ));
                }
            }
        }
        Ok(Self { clear, last })
    }
}

fn print_usage() {
    println!("PhoneStar conversation history");
    println!("Prints the persisted chat turns or resets them.");
    println!("Usage: cargo run --bin show_history -- [options]");
    println!("Options:");
    println!("  --last <n>   Only print the n most recent turns");
    println!("  --clear      Reset the conversation to the welcome message");
}
