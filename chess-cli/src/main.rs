use std::path::PathBuf;

use anyhow::{Context, Result};
use chess_cli::{commands, CliConfig, StorageManager};
use chess_rules::INITIAL_FEN;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chess-cli", version, about = "Inspect, play and store chess positions as FEN")]
struct Cli {
    /// 输出 debug 日志
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 覆盖配置中的存档目录
    #[arg(long, global = true)]
    saves_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show side to move and check/checkmate/stalemate status
    Status {
        #[arg(long, default_value = INITIAL_FEN)]
        fen: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List legal moves, optionally only from one square
    Moves {
        #[arg(long, default_value = INITIAL_FEN)]
        fen: String,
        square: Option<String>,
    },
    /// Play one move and print the resulting FEN
    Play {
        #[arg(long, default_value = INITIAL_FEN)]
        fen: String,
        from: String,
        to: String,
        /// Promotion piece: queen, rook, bishop or knight
        #[arg(long)]
        promote: Option<String>,
    },
    /// Count leaf nodes of the legal-move tree
    Perft {
        #[arg(long, default_value = INITIAL_FEN)]
        fen: String,
        depth: u32,
        /// Print node counts per first move
        #[arg(long)]
        divide: bool,
    },
    /// Save a position
    Save {
        name: String,
        #[arg(long, default_value = INITIAL_FEN)]
        fen: String,
    },
    /// Print a saved position by save id or name
    Load { name: String },
    /// List saved positions, newest first
    List,
    /// Delete a saved position by save id
    Delete { game_id: String },
    /// Show the effective configuration, optionally writing it to the config file
    Config {
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load();

    // 初始化日志
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("chess_cli={}", level).parse()?)
                .add_directive(format!("chess_rules={}", level).parse()?),
        )
        .init();

    if cli.saves_dir.is_some() {
        config.saves_dir = cli.saves_dir.clone();
    }
    let saves_dir = config.saves_dir.clone();
    let storage = || match &saves_dir {
        Some(dir) => StorageManager::with_dir(dir),
        None => StorageManager::new(),
    };

    match cli.command {
        Command::Status { fen, json } => {
            let report = commands::status(&fen)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                );
            } else {
                println!("{}", report);
            }
        }
        Command::Moves { fen, square } => {
            for mv in commands::list_moves(&fen, square.as_deref())? {
                println!("{}", mv);
            }
        }
        Command::Play {
            fen,
            from,
            to,
            promote,
        } => {
            println!("{}", commands::play(&fen, &from, &to, promote.as_deref())?);
        }
        Command::Perft { fen, depth, divide } => {
            println!("{}", commands::run_perft(&fen, depth, divide)?);
        }
        Command::Save { name, fen } => {
            let storage = storage()?;
            let game_id = storage.save_game(&name, &fen)?;
            info!("Saves directory: {:?}", storage.saves_directory());
            println!("{}", game_id);
        }
        Command::Load { name } => {
            let storage = storage()?;
            let game_id = storage
                .find_game(&name)?
                .with_context(|| format!("No saved game named {}", name))?;
            println!("{}", storage.load_fen(&game_id)?);
        }
        Command::List => {
            for game in storage()?.list_saved_games()? {
                println!(
                    "{}  {}  {}",
                    game.saved_at.format("%Y-%m-%d %H:%M:%S"),
                    game.game_id,
                    game.fen
                );
            }
        }
        Command::Delete { game_id } => {
            storage()?.delete_game(&game_id)?;
        }
        Command::Config { save } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config).context("Failed to serialize config")?
            );
            if save {
                let path = config.save()?;
                println!("Saved to {:?}", path);
            }
        }
    }

    Ok(())
}
