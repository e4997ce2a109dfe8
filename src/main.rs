use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use galgame_search::{
    AggregatedSearch, Category, Config, ConfigOverrides, Game, RankedResources, Resource,
};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "galgame-search", version, about = "Search galgames across TouchGal and Nyaa")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides configuration and is itself overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: pretty or json
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Per-source search deadline in seconds
    #[arg(long, global = true)]
    source_timeout: Option<u64>,

    /// Skip the TouchGal source
    #[arg(long, global = true)]
    no_touchgal: bool,

    /// Skip the Nyaa source
    #[arg(long, global = true)]
    no_nyaa: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered sources
    Sources,
    /// Search every source for a keyword
    Search { keyword: String },
    /// Resolve and rank the resources of one game
    Resources {
        /// Source that produced the game
        #[arg(long)]
        source: String,
        /// Game id as printed by `search`
        #[arg(long)]
        id: String,
        /// base, patch or save
        #[arg(long, default_value = "base")]
        category: Category,
    },
    /// Search, pick one result and show its ranked resources
    Show {
        keyword: String,
        /// Index of the result to open
        #[arg(long, default_value_t = 0)]
        pick: usize,
        /// base, patch or save
        #[arg(long, default_value = "base")]
        category: Category,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config
        .apply_overrides(&ConfigOverrides {
            log_level: cli.log_level.clone(),
            log_format: cli.log_format.clone(),
            source_timeout_secs: cli.source_timeout,
            disable_touchgal: cli.no_touchgal,
            disable_nyaa: cli.no_nyaa,
        })
        .context("invalid command-line options")?;

    init_tracing(&config);
    debug!("Effective configuration: {:?}", config);

    let aggregator = AggregatedSearch::from_config(&config)?;
    let shutdown = aggregator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, cancelling in-flight searches");
            shutdown.cancel();
        }
    });

    match cli.command {
        Command::Sources => {
            for (name, description) in aggregator.provider_descriptions() {
                println!("{name:<10} {description}");
            }
        }
        Command::Search { keyword } => {
            let games = aggregator.search_all(&keyword).await;
            print_games(&games, cli.json)?;
        }
        Command::Resources { source, id, category } => {
            let game = Game {
                id,
                name: String::new(),
                introduction: String::new(),
                platform: Vec::new(),
                source,
            };
            let ranked = aggregator.resolve_ranked(&game, category).await?;
            print_resources(ranked, category, cli.json)?;
        }
        Command::Show { keyword, pick, category } => {
            let games = aggregator.search_all(&keyword).await;
            let Some(game) = games.get(pick) else {
                if !keyword.trim().is_empty() {
                    println!("No results (found {} games)", games.len());
                }
                return Ok(());
            };

            if !cli.json {
                println!("{}", game.summary());
            }
            let ranked = aggregator.resolve_ranked(game, category).await?;
            print_resources(ranked, category, cli.json)?;
        }
        Command::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_games(games: &[Game], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(games)?);
        return Ok(());
    }

    for (index, game) in games.iter().enumerate() {
        println!(
            "[{index}] {} ({}) [{}]\n    id: {}",
            game.name,
            game.source,
            game.platform.join(", "),
            game.id
        );
    }
    Ok(())
}

fn print_resources(ranked: RankedResources, category: Category, json: bool) -> Result<()> {
    let resources = match ranked {
        RankedResources::NoResources => {
            if json {
                println!("[]");
            } else {
                println!("No resources");
            }
            return Ok(());
        }
        RankedResources::NoneInCategory => {
            if json {
                println!("[]");
            } else {
                println!("No resources in {}", category.label());
            }
            return Ok(());
        }
        RankedResources::Ranked(resources) => resources,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&resources)?);
        return Ok(());
    }

    println!("{}:", category.label());
    for resource in &resources {
        print_resource(resource);
    }
    Ok(())
}

fn print_resource(resource: &Resource) {
    let name = if resource.name().is_empty() {
        "(unnamed)"
    } else {
        resource.name()
    };
    println!("- {name}");
    for link in resource.links() {
        println!("    {}", resource.browser_url(link));
    }
    if let Some(password) = resource.password() {
        println!("    password: {password}");
    }
}
