mod config;
mod inventory;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_core::{DeckResult, DeckSettings, DeckStatus, GenerationMode, MIN_AGENTS};
use futures::StreamExt;
use oracle::OllamaClient;
use orchestrator::DeckService;
use scryfall::ScryfallClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{DeckforgeConfig, CONFIG_FILE};
use crate::inventory::JsonInventory;

#[derive(Parser)]
#[command(name = "deckforge")]
#[command(about = "Build Commander decks with a panel of voting oracle agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to read
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    /// Generate one or more decks for a commander
    Generate {
        /// Commander name, or partners joined with `+`
        #[arg(long)]
        commander: String,

        #[arg(short, long, default_value_t = MIN_AGENTS)]
        agents: usize,

        /// JSON file with owned cards to put in front of the pool
        #[arg(long)]
        owned: Option<PathBuf>,

        #[arg(long, default_value = "fast", value_parser = parse_mode)]
        mode: GenerationMode,

        #[arg(short, long, default_value_t = 1)]
        decks: usize,

        /// Fixed seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Write the finished decks as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Suggest a commander for a free-text description
    Suggest { description: String },
}

fn parse_mode(s: &str) -> std::result::Result<GenerationMode, String> {
    GenerationMode::parse(s).ok_or_else(|| format!("unknown mode '{}', expected fast or thinking", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init_config(&cli.config).await,
        Commands::Generate {
            commander,
            agents,
            owned,
            mode,
            decks,
            seed,
            out,
        } => {
            let mut config = load_config(&cli.config).await;
            if seed.is_some() {
                config.pipeline.shuffle_seed = seed;
            }

            let mut service = build_service(&config);
            if let Some(path) = &owned {
                service = service.with_inventory(Arc::new(JsonInventory::new(path)));
            }

            let settings = DeckSettings::new(commander)
                .with_agents(agents)
                .with_owned_cards(owned.is_some())
                .with_mode(mode);
            generate(&service, settings, decks, out).await
        }
        Commands::Suggest { description } => {
            let config = load_config(&cli.config).await;
            suggest(&build_service(&config), &description).await
        }
    }
}

async fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    DeckforgeConfig::default()
        .write(path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

async fn load_config(path: &Path) -> DeckforgeConfig {
    DeckforgeConfig::read(path)
        .await
        .with_env_overrides(|key| std::env::var(key).ok())
}

fn build_service(config: &DeckforgeConfig) -> DeckService {
    let mut oracle = OllamaClient::new(&config.oracle.base_url, &config.oracle.model);
    if let Some(system) = &config.oracle.system {
        oracle = oracle.with_system(system);
    }
    let catalog = ScryfallClient::new(&config.scryfall.base_url);

    tracing::info!(
        oracle = %config.oracle.base_url,
        model = %config.oracle.model,
        scryfall = %config.scryfall.base_url,
        "Collaborators configured"
    );
    DeckService::new(Arc::new(oracle), Arc::new(catalog), config.pipeline.clone())
}

async fn generate(
    service: &DeckService,
    settings: DeckSettings,
    deck_count: usize,
    out: Option<PathBuf>,
) -> Result<()> {
    let handles = service
        .start(settings, deck_count)
        .await
        .context("Failed to start deck generation")?;

    let mut tasks = Vec::with_capacity(handles.len());
    let mut printers = Vec::with_capacity(handles.len());
    for handle in handles {
        let label = short_id(&handle.run_id);
        let mut progress = handle.progress;
        printers.push(tokio::spawn(async move {
            while let Some(envelope) = progress.next().await {
                println!("{} {}", label, envelope.event.summary());
                if envelope.event.is_terminal() {
                    break;
                }
            }
        }));
        tasks.push(handle.task);
    }

    let mut decks = Vec::with_capacity(tasks.len());
    for task in tasks {
        let deck = task.await.context("Deck generation task panicked")?;
        decks.push(deck);
    }
    for printer in printers {
        let _ = printer.await;
    }

    for deck in &decks {
        print_deck(deck);
    }

    if let Some(path) = out {
        let json = serde_json::to_string_pretty(&decks)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {} deck(s) to {}", decks.len(), path.display());
    }

    let failed = decks
        .iter()
        .filter(|d| d.status == DeckStatus::Failed)
        .count();
    if failed > 0 {
        anyhow::bail!("{} of {} deck(s) failed", failed, decks.len());
    }
    Ok(())
}

fn print_deck(deck: &DeckResult) {
    println!();
    println!(
        "Deck {} ({}) for {}",
        short_id(&deck.id),
        deck.status.as_str(),
        deck.commander
    );
    println!("════════════════════════════════════════");

    for commander in &deck.commanders {
        println!("1 {} *CMDR*", commander.name);
    }

    let mut entries: Vec<(&str, usize)> = Vec::new();
    for card in &deck.cards {
        match entries.iter_mut().find(|(name, _)| *name == card.name) {
            Some((_, count)) => *count += card.quantity as usize,
            None => entries.push((&card.name, card.quantity as usize)),
        }
    }
    for (name, count) in entries {
        println!("{} {}", count, name);
    }

    println!();
    println!(
        "Total: {} ({} non-land)",
        deck.total_entries(),
        deck.non_land_count()
    );

    if !deck.combos.is_empty() {
        println!("Combos:");
        for combo in &deck.combos {
            println!("  {}: {}", combo.card_names().join(" + "), combo.result);
            if !combo.instructions.is_empty() {
                println!("    {}", combo.instructions);
            }
        }
    }
}

async fn suggest(service: &DeckService, description: &str) -> Result<()> {
    let suggestion = service.suggest_commander(description).await;

    println!("Commander: {}", suggestion.name);
    if !suggestion.reasoning.is_empty() {
        println!("Why:       {}", suggestion.reasoning);
    }
    for commander in &suggestion.commanders {
        match &commander.image_uri {
            Some(uri) => println!("  {} ({})", commander.name, uri),
            None => println!("  {}", commander.name),
        }
    }
    Ok(())
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deckforge=info,orchestrator=warn".into()),
        )
        .init();
}
