//! Lane Storm - headless match runner
//!
//! Plays one match between two scripted sides and reports the outcome.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
use lane_storm::{
    ConfigError, Difficulty, MatchConfig, OpponentPolicy, Passive, PolicyAction, ScriptedOpponent, SimRng,
    consts::{MAX_SUBSTEPS, SIM_DT_MS},
    sim::{BattleView, GameEvent, MatchState, MatchView, Side, TickInput, tick},
};

/// Difficulty argument (accepts easy / normal / hard)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
struct DifficultyArg(Difficulty);

#[cfg(not(target_arch = "wasm32"))]
impl std::str::FromStr for DifficultyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::from_str(s)
            .map(DifficultyArg)
            .ok_or_else(|| format!("invalid difficulty '{s}' (expected: easy, normal, hard)"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser)]
#[command(name = "lane-storm")]
#[command(about = "Lane Storm - run a headless two-lane match", long_about = None)]
struct Cli {
    /// Match config JSON (defaults are used when absent)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Opponent difficulty (overrides the config file)
    #[arg(long)]
    difficulty: Option<DifficultyArg>,

    /// Difficulty of the scripted player side
    #[arg(long, default_value = "normal")]
    player: DifficultyArg,

    /// Leave the player side idle
    #[arg(long)]
    idle_player: bool,

    /// Random seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation step in milliseconds
    #[arg(long, default_value_t = SIM_DT_MS)]
    step_ms: f64,

    /// Pace the match against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

/// Drives the player side through the same policy interface as the opponent
#[cfg(not(target_arch = "wasm32"))]
struct PlayerDriver {
    policy: Box<dyn OpponentPolicy>,
    rng: SimRng,
}

#[cfg(not(target_arch = "wasm32"))]
impl PlayerDriver {
    fn new(policy: Box<dyn OpponentPolicy>, seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            policy,
            rng: SimRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    fn input(&mut self, state: &MatchState) -> TickInput {
        let view = BattleView::capture(state, Side::Player);
        match self.policy.decide(&view, &mut self.rng) {
            Some(PolicyAction::PlayCard(intent)) => TickInput {
                play: Some(intent),
                ..Default::default()
            },
            Some(PolicyAction::UseMomentum(kind)) => TickInput {
                activate: Some(kind),
                ..Default::default()
            },
            None => TickInput::default(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn log_event(event: &GameEvent) {
    match event {
        GameEvent::UnitSpawned { side, card, pos, .. } => {
            log::info!("{side:?} deploys {} at ({:.0}, {:.0})", card.as_str(), pos.x, pos.y)
        }
        GameEvent::TacticPlaced { side, card, pos, .. } => {
            log::info!("{side:?} casts {} at ({:.0}, {:.0})", card.as_str(), pos.x, pos.y)
        }
        GameEvent::PlayRejected { side, reason } => log::debug!("{side:?} play rejected: {reason}"),
        GameEvent::StructureDestroyed { side, role, .. } => log::info!("{side:?} lost {role:?}"),
        GameEvent::MomentumReady { side } => log::info!("{side:?} momentum ready"),
        GameEvent::BuffActivated { side, kind } => log::info!("{side:?} activates {kind:?}"),
        GameEvent::DoubleElixir => log::info!("Double elixir!"),
        other => log::trace!("{other:?}"),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run(cli: Cli) -> Result<(), ConfigError> {
    let mut config = match &cli.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };
    if let Some(DifficultyArg(d)) = cli.difficulty {
        config.difficulty = d;
    }
    if cli.step_ms.is_nan() || cli.step_ms <= 0.0 {
        return Err(ConfigError::Invalid(format!("step must be positive, got {}", cli.step_ms)));
    }

    let seed = cli.seed.unwrap_or_else(rand::random::<u64>);
    log::info!(
        "Seed {seed}, opponent {}, player {}",
        config.difficulty.as_str(),
        if cli.idle_player { "idle" } else { cli.player.0.as_str() }
    );

    let mut opponent = ScriptedOpponent::from_config(Side::Opponent, &config);
    let player_policy: Box<dyn OpponentPolicy> = if cli.idle_player {
        Box::new(Passive::new(Side::Player))
    } else {
        Box::new(ScriptedOpponent::new(Side::Player, cli.player.0, config.lane_switch_chance))
    };
    let mut player = PlayerDriver::new(player_policy, seed);

    let mut state = MatchState::new(config, seed)?;
    state.start();

    let step = cli.step_ms;
    let mut accumulator = 0.0;
    let mut last = std::time::Instant::now();
    while state.is_running() {
        let frame_ms = if cli.realtime {
            let now = std::time::Instant::now();
            let elapsed = now.duration_since(last).as_secs_f64() * 1000.0;
            last = now;
            elapsed.min(100.0)
        } else {
            step
        };
        accumulator += frame_ms;

        let mut substeps = 0;
        while accumulator >= step && substeps < MAX_SUBSTEPS {
            let input = player.input(&state);
            tick(&mut state, &input, &mut opponent, step);
            accumulator -= step;
            substeps += 1;
        }

        for event in state.drain_events() {
            log_event(&event);
        }

        if cli.realtime {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    let view = MatchView::capture(&state);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    match state.result {
        Some(result) => match result.winner {
            Some(side) => println!("{side:?} wins ({:?})", result.reason),
            None => println!("Draw ({:?})", result.reason),
        },
        None => println!("Match did not finish"),
    }
    for side in Side::BOTH {
        println!("  {side:?} structure hp: {:.0}", view.sides[side.index()].structure_hp);
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Lane Storm (headless) starting...");

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on wasm; the library is driven by the host page
}
