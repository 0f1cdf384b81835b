/// Entry point: command-line shell and the interactive editor loop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainjump::codec::preset::{self, PresetFile};
use chainjump::codec::{bracketed, text, tiles};
use chainjump::config::AppConfig;
use chainjump::domain::grid::{Grid, LevelProfile};
use chainjump::domain::level::{GameDraft, Level, Wei};
use chainjump::domain::reach::{self, ReachConfig};
use chainjump::domain::symbol::{SymbolTable, ZeroMeaning};
use chainjump::generate::client::AnthropicClient;
use chainjump::generate::Generator;
use chainjump::ledger;
use chainjump::repair::{repair, Repaired};

/// ChainJump level toolkit
#[derive(Parser, Debug)]
#[command(name = "chainjump", version)]
#[command(about = "Generate, repair, preview and package ChainJump levels", long_about = None)]
struct Args {
    /// Config file (default: search for chainjump.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the text generation endpoint for a level
    Generate {
        prompt: String,
        /// Also write the level text here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Repair a level text file and print the result
    Repair { file: PathBuf },
    /// Draw a level and report whether its portal is reachable
    Preview { file: PathBuf },
    /// Edit a level interactively
    Edit {
        file: Option<PathBuf>,
        /// Save target (default: FILE, or level.txt)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the engine tile table and map as JSON
    Tiles { file: PathBuf },
    /// Build a game from level files and print its ledger submission
    Pack {
        name: String,
        /// Cost of play in wei
        #[arg(long)]
        cost: String,
        /// Print the bracketed legacy encoding instead of JSON
        #[arg(long)]
        legacy: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print every level of a bracketed legacy file
    Unpack { file: PathBuf },
    /// List the games of a preset file, or show one game's levels
    Preset {
        file: PathBuf,
        #[arg(long)]
        game: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = AppConfig::load(args.config.as_deref());

    let level = args.log_level.clone().unwrap_or_else(|| loaded.config.log_level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &loaded.path {
        Some(p) => tracing::debug!(path = %p.display(), "config loaded"),
        None => tracing::debug!("no config file found, using defaults"),
    }
    for w in &loaded.warnings {
        tracing::warn!("{w}");
    }

    let config = loaded.config;
    match args.command {
        Command::Generate { prompt, out } => cmd_generate(&config, &prompt, out.as_deref()).await,
        Command::Repair { file } => cmd_repair(&config, &file),
        Command::Preview { file } => cmd_preview(&config, &file),
        Command::Edit { file, out } => cmd_edit(&config, file.as_deref(), out),
        Command::Tiles { file } => cmd_tiles(&config, &file),
        Command::Pack { name, cost, legacy, files } => cmd_pack(&config, &name, &cost, legacy, &files),
        Command::Unpack { file } => cmd_unpack(&config, &file),
        Command::Preset { file, game } => cmd_preset(&config, &file, game.as_deref()),
    }
}

// ══════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════

async fn cmd_generate(config: &AppConfig, prompt: &str, out: Option<&Path>) -> Result<()> {
    let client = AnthropicClient::from_settings(&config.generator)?;
    let generator = Generator::new(client, config.profile, config.generator.clone());
    let grid = generator.generate(prompt).await?;

    let level_text = text::to_text(&grid);
    println!("{level_text}");
    if let Some(path) = out {
        write_level(path, &level_text)?;
    }
    Ok(())
}

fn cmd_repair(config: &AppConfig, file: &Path) -> Result<()> {
    let repaired = repair_file(&config.profile, file)?;
    if repaired.is_clean() {
        eprintln!("{}: valid, no changes", file.display());
    }
    for w in &repaired.warnings {
        eprintln!("{}: {w}", file.display());
    }
    println!("{}", text::to_text(&repaired.grid));
    Ok(())
}

fn cmd_preview(config: &AppConfig, file: &Path) -> Result<()> {
    let repaired = repair_file(&config.profile, file)?;
    for w in &repaired.warnings {
        eprintln!("{}: {w}", file.display());
    }
    print_grid(&repaired.grid, &config.profile.table);
    print_reach(&repaired.grid, &config.profile.table, &config.reach);
    Ok(())
}

fn cmd_tiles(config: &AppConfig, file: &Path) -> Result<()> {
    let repaired = repair_file(&config.profile, file)?;
    let level = tiles::engine_level(&repaired.grid, &config.profile.table);
    println!("{}", serde_json::to_string_pretty(&level)?);
    Ok(())
}

fn cmd_pack(config: &AppConfig, name: &str, cost: &str, legacy: bool, files: &[PathBuf]) -> Result<()> {
    let cost: Wei = cost.parse().map_err(|_| ledger::LedgerError::InvalidCost(cost.to_string()))?;
    let mut draft = GameDraft::new(name, cost);

    for file in files {
        let repaired = repair_file(&config.profile, file)?;
        for w in &repaired.warnings {
            tracing::warn!(file = %file.display(), "{w}");
        }
        let level_name = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        draft.push_level(Level::new(level_name, repaired.grid));
    }

    let submission = ledger::prepare_submission(&draft, &config.profile)?;
    tracing::info!(game = %submission.game_name, levels = submission.levels.len(), cost = %submission.cost_of_play, "game packed");
    if legacy {
        println!("{}", bracketed::to_bracketed(&submission.levels));
    } else {
        println!("{}", serde_json::to_string_pretty(&submission)?);
    }
    Ok(())
}

fn cmd_unpack(config: &AppConfig, file: &Path) -> Result<()> {
    let src = read_file(file)?;
    let grids = bracketed::parse_levels(&src, config.profile.dims)?;
    for (i, grid) in grids.iter().enumerate() {
        println!("── level {} ──", i + 1);
        print_grid(grid, &config.profile.table);
    }
    Ok(())
}

fn cmd_preset(config: &AppConfig, file: &Path, game: Option<&str>) -> Result<()> {
    let path = if file.exists() { file.to_path_buf() } else { config.presets_dir.join(file) };
    let json = read_file(&path)?;

    let Some(key) = game else {
        let presets: PresetFile = preset::parse_preset(&json)?;
        for key in presets.keys() {
            let count = presets.game(key).map(|g| g.levels.levels_count).unwrap_or(0);
            println!("{key}  ({count} levels)");
        }
        return Ok(());
    };

    // Presets always use the arcade meaning of `0`.
    let table = SymbolTable::new(ZeroMeaning::Block);
    for (i, grid) in preset::load_or_fallback(&json, key).iter().enumerate() {
        println!("── {key} level {} ──", i + 1);
        print_grid(grid, &table);
        print_reach(grid, &table, &config.reach);
    }
    Ok(())
}

// ── Helpers ──

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn write_level(path: &Path, level_text: &str) -> Result<()> {
    std::fs::write(path, format!("{level_text}\n")).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "level saved");
    Ok(())
}

fn repair_file(profile: &LevelProfile, path: &Path) -> Result<Repaired> {
    let src = read_file(path)?;
    let lines: Vec<&str> = src.lines().collect();
    repair(&lines, profile).with_context(|| format!("repairing {}", path.display()))
}

#[cfg(feature = "preview")]
fn print_grid(grid: &Grid, table: &SymbolTable) {
    let spawn = reach::spawn_point(grid, table);
    for line in chainjump::ui::renderer::preview_lines(grid, table, spawn) {
        println!("{line}");
    }
}

#[cfg(not(feature = "preview"))]
fn print_grid(grid: &Grid, _table: &SymbolTable) {
    println!("{}", text::to_text(grid));
}

fn print_reach(grid: &Grid, table: &SymbolTable, cfg: &ReachConfig) {
    let report = reach::analyze(grid, table, cfg);
    match report.spawn {
        None => println!("no spawn point: the player falls out of the level"),
        Some(at) if report.exit_reachable => {
            println!("portal reachable from spawn at row {}, column {}", at.row + 1, at.col + 1)
        }
        Some(at) => println!(
            "portal NOT reachable from spawn at row {}, column {} ({} footholds explored)",
            at.row + 1,
            at.col + 1,
            report.footholds
        ),
    }
}

// ══════════════════════════════════════════════════════════════
// Editor
// ══════════════════════════════════════════════════════════════

#[cfg(not(feature = "preview"))]
fn cmd_edit(_config: &AppConfig, _file: Option<&Path>, _out: Option<PathBuf>) -> Result<()> {
    anyhow::bail!("the editor needs the `preview` feature")
}

#[cfg(feature = "preview")]
fn cmd_edit(config: &AppConfig, file: Option<&Path>, out: Option<PathBuf>) -> Result<()> {
    use chainjump::editor::EditorBuffer;
    use chainjump::ui::renderer::Renderer;

    let (buffer, message) = match file {
        Some(path) if path.exists() => {
            let (buffer, warnings) = EditorBuffer::open_text(config.profile, &read_file(path)?)?;
            for w in &warnings {
                tracing::warn!(file = %path.display(), "{w}");
            }
            let message = match warnings.len() {
                0 => String::new(),
                n => format!("{n} repairs applied on load"),
            };
            (buffer, message)
        }
        _ => (EditorBuffer::new(config.profile), String::new()),
    };
    let target = out
        .or_else(|| file.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("level.txt"));

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let result = editor_loop(buffer, message, &target, config, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    let buffer = result?;

    if buffer.is_dirty() {
        eprintln!("{}: quit with unsaved changes", target.display());
    }
    Ok(())
}

#[cfg(feature = "preview")]
fn editor_loop(
    mut buffer: chainjump::editor::EditorBuffer,
    mut message: String,
    target: &Path,
    config: &AppConfig,
    renderer: &mut chainjump::ui::renderer::Renderer,
) -> Result<chainjump::editor::EditorBuffer> {
    use std::time::Duration;

    use chainjump::ui::input::{EditorAction, InputState};
    use chainjump::ui::renderer::EditorView;

    const POLL: Duration = Duration::from_millis(50);

    let title = target.display().to_string();
    let mut input = InputState::new();
    let mut report: Option<reach::Reachability> = None;

    loop {
        renderer.render_editor(&EditorView {
            buffer: &buffer,
            title: &title,
            message: &message,
            reach: report.as_ref(),
        })?;

        let actions = input.drain_events(POLL)?.to_vec();
        for action in actions {
            let before = buffer.grid().clone();
            match action {
                EditorAction::Move { d_row, d_col } => buffer.move_by(d_row, d_col),
                EditorAction::Place(symbol) => {
                    buffer.set_brush(symbol);
                    buffer.paint();
                }
                EditorAction::Paint => buffer.paint(),
                EditorAction::Erase => buffer.erase(),
                EditorAction::FillRow => buffer.fill_row(),
                EditorAction::NextBrush => buffer.cycle_brush(true),
                EditorAction::PrevBrush => buffer.cycle_brush(false),
                EditorAction::Clear => {
                    buffer.clear();
                    message = "grid cleared".into();
                }
                EditorAction::CheckReach => {
                    report = Some(reach::analyze(buffer.grid(), &config.profile.table, &config.reach));
                }
                EditorAction::Save => {
                    let name = target.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                    let (level, warnings) = buffer.finish(&name, "")?;
                    write_level(target, &text::to_text(&level.grid))?;
                    buffer.mark_saved();
                    message = match warnings.len() {
                        0 => format!("saved {}", target.display()),
                        n => format!("saved {} with {n} repairs (portal/ground)", target.display()),
                    };
                }
                EditorAction::Quit => return Ok(buffer),
            }
            if matches!(action, EditorAction::CheckReach) {
                continue;
            }
            // Any edit invalidates the last reachability report.
            if *buffer.grid() != before {
                report = None;
            }
        }
    }
}
