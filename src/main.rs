//! goban-kifu: inspect, convert and score Go game records.
//!
//! ## Usage
//!
//! - `goban-kifu convert game.sgf --to jgo` - Convert a record to another format
//! - `goban-kifu show game.sgf --move 40` - Print the board at a move
//! - `goban-kifu score game.sgf --dead 3,4 --method area` - Score the final position
//! - `goban-kifu score game.sgf --estimate --playouts 500` - Score with estimated dead stones
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use goban_kifu::color::Color;
use goban_kifu::constants::DEFAULT_PLAYOUTS;
use goban_kifu::format::{self, RecordFormat, RecordInput};
use goban_kifu::game::{Game, GotoTarget, Repetition};
use goban_kifu::playout;
use goban_kifu::position::{Point, Position};
use goban_kifu::score::{ScoreEstimator, ScoreState, Scorer, ScoringMethod};

/// goban-kifu: Go game record toolkit
#[derive(Parser)]
#[command(name = "goban-kifu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Which earlier positions a move may not repeat
    #[arg(long, value_enum, global = true, default_value_t = RepetitionArg::Ko)]
    repetition: RepetitionArg,

    /// Accept moves that capture their own group
    #[arg(long, global = true)]
    allow_suicide: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a record to SGF or JSON
    Convert {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Sgf)]
        to: OutputFormat,
    },
    /// Print the board and record details
    Show {
        file: PathBuf,
        /// Move number to show (default: end of the main line)
        #[arg(long = "move")]
        move_number: Option<usize>,
    },
    /// Score a position
    Score {
        file: PathBuf,
        #[arg(long = "move")]
        move_number: Option<usize>,
        /// Dead stone as `x,y`; marks its whole group
        #[arg(long, value_parser = parse_point)]
        dead: Vec<Point>,
        #[arg(long, value_enum, default_value_t = MethodArg::Territory)]
        method: MethodArg,
        /// Estimate dead stones from random playouts
        #[arg(long)]
        estimate: bool,
        #[arg(long, default_value_t = DEFAULT_PLAYOUTS)]
        playouts: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Ownership needed to count a point for a color
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Sgf,
    Jgo,
}

#[derive(Clone, Copy, ValueEnum)]
enum RepetitionArg {
    None,
    Ko,
    All,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Area,
    Territory,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { ref file, to } => {
            let game = load(file, &cli)?;
            let format = match to {
                OutputFormat::Sgf => RecordFormat::Sgf,
                OutputFormat::Jgo => RecordFormat::Jgo,
            };
            let text = format::save(&game, format)
                .with_context(|| format!("writing {format} record"))?;
            println!("{text}");
        }
        Commands::Show {
            ref file,
            move_number,
        } => {
            let mut game = load(file, &cli)?;
            seek(&mut game, move_number)?;
            print!("{}", Summary(&game));
            print!("{}", Diagram(game.position()));
        }
        Commands::Score {
            ref file,
            move_number,
            ref dead,
            method,
            estimate,
            playouts,
            seed,
            threshold,
        } => {
            let mut game = load(file, &cli)?;
            seek(&mut game, move_number)?;

            let mut state = if estimate {
                let estimator = threshold
                    .map(ScoreEstimator::with_threshold)
                    .unwrap_or_default();
                let ownership = playout::ownership(game.position(), playouts, seed);
                info!(playouts, threshold = estimator.threshold(), "Estimated ownership");
                estimator.states(game.position(), &ownership)
            } else {
                ScoreState::from_game(&game)
            };
            for &(x, y) in dead {
                if !state.mark_dead(x, y) {
                    warn!(x, y, "No stone to mark dead");
                }
            }

            let method = match method {
                MethodArg::Area => ScoringMethod::Area,
                MethodArg::Territory => ScoringMethod::Territory,
            };
            let score = Scorer::for_game(&game).score(&state);
            print!("{score}");
            println!("Result: {}", score.result(method));
        }
    }
    Ok(())
}

fn load(path: &Path, cli: &Cli) -> Result<Game> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut game = format::load(RecordInput::Text(&text))
        .with_context(|| format!("loading {}", path.display()))?;

    let config = game.config_mut();
    config.allow_suicide = cli.allow_suicide;
    config.repetition = match cli.repetition {
        RepetitionArg::None => Repetition::None,
        RepetitionArg::Ko => Repetition::Ko,
        RepetitionArg::All => Repetition::All,
    };
    Ok(game)
}

fn seek(game: &mut Game, move_number: Option<usize>) -> Result<()> {
    match move_number {
        Some(n) => game
            .goto(GotoTarget::Move(n))
            .with_context(|| format!("replaying to move {n}"))?,
        None => game.last().context("replaying main line")?,
    }
    if move_number.is_some_and(|n| game.move_number() < n) {
        bail!("record ends at move {}", game.move_number());
    }
    Ok(())
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x = x.trim().parse::<usize>().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse::<usize>().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok((x, y))
}

/// Players, komi and the state of the current node.
struct Summary<'a>(&'a Game);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let game = self.0;
        let info = game.info();
        for color in [Color::Black, Color::White] {
            let player = info.player(color);
            writeln!(
                f,
                "{color}: {} {}",
                player.name.as_deref().unwrap_or("?"),
                player.rank.as_deref().unwrap_or("")
            )?;
        }
        writeln!(f, "Komi: {}  Handicap: {}", game.komi(), game.handicap())?;
        if let Some(result) = &info.result {
            writeln!(f, "Result: {result}")?;
        }
        let captures = game.capture_count();
        writeln!(
            f,
            "Move {}  {} to play  Captures B {} W {}",
            game.move_number(),
            game.turn(),
            captures.black,
            captures.white
        )?;
        if let Some(comment) = &game.node().comment {
            writeln!(f, "{comment}")?;
        }
        Ok(())
    }
}

/// Text diagram: `X` black, `O` white, columns lettered as in SGF.
struct Diagram<'a>(&'a Position);

impl fmt::Display for Diagram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.0;
        f.write_str("   ")?;
        for x in 0..pos.width() {
            f.write_char(format::coord_letter(x).unwrap_or('?'))?;
        }
        f.write_char('\n')?;
        for y in 0..pos.height() {
            write!(f, "{:>2} ", y + 1)?;
            for x in 0..pos.width() {
                f.write_char(match pos.stone(x, y) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                })?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}
