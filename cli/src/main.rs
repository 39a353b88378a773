use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use minisweeper_core::*;

mod command;
mod render;
mod ticker;

use command::Command;
use ticker::Ticker;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// 10x10 with 10 mines
    Small,
    /// 15x15 with 20 mines
    Large,
}

impl Preset {
    fn config(self) -> GameConfig {
        match self {
            Self::Small => GameConfig::small(),
            Self::Large => GameConfig::large(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Terminal MiniSweeper", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Board size preset
    #[arg(short, long, value_enum, default_value_t = Preset::Small)]
    preset: Preset,

    /// Custom number of rows, overrides the preset
    #[arg(long, requires_all = ["cols", "mines"])]
    rows: Option<Coord>,

    /// Custom number of columns, overrides the preset
    #[arg(long, requires_all = ["rows", "mines"])]
    cols: Option<Coord>,

    /// Custom number of mines, overrides the preset
    #[arg(long, requires_all = ["rows", "cols"])]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where "save" and "load" keep the game
    #[arg(long, default_value = DEFAULT_SAVE_FILE)]
    save_file: PathBuf,

    /// Where best times are kept
    #[arg(long, default_value = DEFAULT_HIGH_SCORE_FILE)]
    scores_file: PathBuf,
}

impl Args {
    fn config(&self) -> anyhow::Result<GameConfig> {
        match (self.rows, self.cols, self.mines) {
            (Some(rows), Some(cols), Some(mines)) => GameConfig::new((rows, cols), mines)
                .with_context(|| format!("invalid board {rows}x{cols} with {mines} mines")),
            _ => Ok(self.preset.config()),
        }
    }
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    use log::LevelFilter as Log;
    use tracing_subscriber::filter::LevelFilter;

    let level = match verbose.log_level_filter() {
        Log::Off => LevelFilter::OFF,
        Log::Error => LevelFilter::ERROR,
        Log::Warn => LevelFilter::WARN,
        Log::Info => LevelFilter::INFO,
        Log::Debug => LevelFilter::DEBUG,
        Log::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

enum Flow {
    Continue,
    Quit,
}

struct App {
    session: GameSession,
    scores: HighScoreStore,
    ticker: Ticker,
    save_file: PathBuf,
    seed: Option<u64>,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let mut seed = args.seed;
        let config = args.config()?;
        let session = GameSession::start_new(config, seed.take().unwrap_or_else(clock_seed))?;
        Ok(Self {
            session,
            scores: HighScoreStore::load(&args.scores_file),
            ticker: Ticker::new(),
            save_file: args.save_file.clone(),
            seed,
        })
    }

    fn next_seed(&mut self) -> u64 {
        self.seed.take().unwrap_or_else(clock_seed)
    }

    /// Delivers the seconds that passed since the last command as ticks.
    fn catch_up(&mut self) {
        for _ in 0..self.ticker.drain() {
            if !self.session.tick() {
                break;
            }
        }
    }

    fn handle(&mut self, command: Command, out: &mut impl Write) -> anyhow::Result<Flow> {
        self.catch_up();

        match command {
            Command::Reveal(coords) => match self.session.reveal(coords) {
                Ok(outcome) => {
                    log::debug!("reveal cell: {:?} -> {:?}", coords, outcome);
                    writeln!(out, "{}", render::board(&self.session))?;
                    self.report_outcome(outcome, out)?;
                }
                Err(err) => writeln!(out, "{err}")?,
            },
            Command::Flag(coords) => match self.session.toggle_flag(coords) {
                Ok(_) => {
                    log::debug!("mark cell: {:?}", coords);
                    writeln!(out, "{}", render::board(&self.session))?;
                }
                Err(err) => writeln!(out, "{err}")?,
            },
            Command::Save => match self.session.save_to_path(&self.save_file) {
                Ok(()) => writeln!(out, "Game saved successfully!")?,
                Err(err) => writeln!(out, "Error saving game: {err}")?,
            },
            Command::Load => match GameSession::load_from_path(&self.save_file) {
                Ok(session) => {
                    self.session = session;
                    self.ticker = Ticker::new();
                    writeln!(out, "Game loaded successfully!")?;
                    writeln!(out, "{}", render::board(&self.session))?;
                }
                Err(err) => writeln!(out, "Error loading game: {err}")?,
            },
            Command::New(config) => {
                let config = config.unwrap_or_else(|| self.session.config());
                let seed = self.next_seed();
                let session = GameSession::start_new(config, seed)?;
                self.start(session, out)?;
            }
            Command::Restart => {
                let seed = self.next_seed();
                let session = self.session.restart(seed)?;
                self.start(session, out)?;
            }
            Command::Scores => write!(out, "{}", render::high_scores(self.scores.table()))?,
            Command::Help => writeln!(out, "{}", command::HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn start(&mut self, session: GameSession, out: &mut impl Write) -> anyhow::Result<()> {
        self.session = session;
        self.ticker = Ticker::new();
        writeln!(out, "{}", render::board(&self.session))?;
        Ok(())
    }

    fn report_outcome(
        &mut self,
        outcome: RevealOutcome,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        match outcome {
            RevealOutcome::Won => {
                writeln!(out, "You Win! Time: {}s", self.session.elapsed_seconds())?;
                match self.session.submit_score(&mut self.scores) {
                    Ok(true) => writeln!(out, "New best time!")?,
                    Ok(false) => {}
                    Err(err) => writeln!(out, "Error saving high scores: {err}")?,
                }
                writeln!(out, "Type \"n\" for a new game.")?;
            }
            RevealOutcome::HitMine => {
                writeln!(out, "Game Over! You hit a mine.")?;
                writeln!(out, "Type \"n\" for a new game.")?;
            }
            RevealOutcome::Revealed | RevealOutcome::NoChange => {}
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let mut app = App::new(&args)?;
    log::debug!("App started");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "MiniSweeper, type \"h\" for help.")?;
    writeln!(out, "{}", render::board(&app.session))?;

    for line in io::stdin().lock().lines() {
        let line = line.context("could not read input")?;
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(command) => {
                if let Flow::Quit = app.handle(command, &mut out)? {
                    break;
                }
            }
            Err(err) => writeln!(out, "{err}, type \"h\" for help")?,
        }
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("minisweeper-cli-{name}-{}", std::process::id()))
    }

    fn app(name: &str, save: Option<&str>, scores: Option<&str>, extra: &[&str]) -> App {
        let save = save.map_or_else(|| temp_path(&format!("{name}.json")), PathBuf::from);
        let scores = scores.map_or_else(|| temp_path(&format!("{name}.txt")), PathBuf::from);
        let mut argv = vec![
            "minisweeper".to_string(),
            "--save-file".to_string(),
            save.display().to_string(),
            "--scores-file".to_string(),
            scores.display().to_string(),
        ];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        App::new(&Args::try_parse_from(argv).unwrap()).unwrap()
    }

    fn run(app: &mut App, line: &str) -> String {
        let mut out = Vec::new();
        app.handle(Command::parse(line).unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn custom_board_needs_all_dimensions() {
        assert!(Args::try_parse_from(["minisweeper", "--rows", "5"]).is_err());

        let args =
            Args::try_parse_from(["minisweeper", "--rows", "4", "--cols", "6", "--mines", "3"])
                .unwrap();
        assert_eq!(args.config().unwrap(), GameConfig::new((4, 6), 3).unwrap());
    }

    #[test]
    fn invalid_custom_board_is_reported() {
        let args =
            Args::try_parse_from(["minisweeper", "--rows", "2", "--cols", "2", "--mines", "4"])
                .unwrap();
        assert!(args.config().is_err());
    }

    #[test]
    fn preset_selects_board() {
        let args = Args::try_parse_from(["minisweeper", "--preset", "large"]).unwrap();
        assert_eq!(args.config().unwrap(), GameConfig::large());
    }

    #[test]
    fn save_then_load_restores_board() {
        let mut app = app("save-load", None, None, &["--seed", "3"]);
        run(&mut app, "r 5 5");
        run(&mut app, "f 1 1");
        let before = app.session.board().clone();

        assert!(run(&mut app, "s").contains("Game saved successfully!"));
        run(&mut app, "n");
        assert!(run(&mut app, "l").contains("Game loaded successfully!"));

        assert_eq!(app.session.board(), &before);
        std::fs::remove_file(&app.save_file).unwrap();
    }

    #[test]
    fn failed_load_keeps_session() {
        let mut app = app(
            "failed-load",
            Some("/nonexistent-dir/minisweeper.json"),
            None,
            &[],
        );
        run(&mut app, "r 1 1");
        let before = app.session.clone();

        assert!(run(&mut app, "l").starts_with("Error loading game"));
        assert_eq!(app.session, before);
    }

    #[test]
    fn engine_errors_are_printed() {
        let mut app = app("errors", None, None, &[]);
        assert_eq!(run(&mut app, "r 11 1"), "Invalid coordinates\n");
    }

    #[test]
    fn scores_show_none_without_records() {
        let mut app = app("scores", None, Some("/nonexistent-dir/scores.txt"), &[]);
        assert_eq!(
            run(&mut app, "hs"),
            "High Scores:\n10x10: None\n15x15: None\n"
        );
    }
}
