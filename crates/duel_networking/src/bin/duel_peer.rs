//! # DUEL Peer
//!
//! One side of a lockstep match, played by a bot.
//!
//! ## Usage
//!
//! ```bash
//! duel_peer 9930 127.0.0.1 9931 0
//! duel_peer 9931 127.0.0.1 9930 1 --epochs 3000
//! ```
//!
//! Both peers log a state checksum every `report_every` epochs; matching
//! lines mean the simulations agree.

use std::process::ExitCode;
use std::time::Instant;

use duel_core::{PongSimulator, PongState};
use duel_networking::{
    usage, Epoch, InputEvent, NetResult, PeerConfig, PeerSession, Presenter, SyncEngine,
    UdpTransport,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// Chance per poll that the bot changes its mind.
const BOT_TURN_PERCENT: u8 = 5;

/// Presenter without a screen: a random bot at the keys, checksums in the log.
struct HeadlessPresenter {
    rng: ChaCha8Rng,
    held: InputEvent,
    report_every: u16,
}

impl HeadlessPresenter {
    fn new(seed: u64, report_every: u16) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            held: InputEvent::default(),
            report_every,
        }
    }
}

impl Presenter<PongState> for HeadlessPresenter {
    fn poll_event(&mut self) -> InputEvent {
        if self.rng.gen_range(0..100u8) < BOT_TURN_PERCENT {
            self.held = match self.rng.gen_range(0..3u8) {
                0 => InputEvent::default(),
                1 => InputEvent {
                    up: true,
                    ..InputEvent::default()
                },
                _ => InputEvent {
                    down: true,
                    ..InputEvent::default()
                },
            };
        }
        self.held
    }

    fn render(&mut self, epoch: Epoch, state: &PongState) {
        if epoch.is_report_point(self.report_every) {
            tracing::info!(
                "epoch {epoch}: checksum {:016x}, score {}-{}",
                state.checksum(),
                state.score[0],
                state.score[1]
            );
        }
    }
}

fn run(config: &PeerConfig) -> NetResult<()> {
    let sync_config = config.sync_config()?;
    let transport = UdpTransport::connect(config.self_port, &config.peer_host, config.peer_port)?;

    let presenter = HeadlessPresenter::new(config.player.index() as u64, sync_config.report_every);
    let engine = SyncEngine::new(sync_config, config.player, transport)?;
    let sim = PongSimulator::default();
    let state = sim.initial_state();

    let mut session = PeerSession::new(engine, sim, state, presenter, Instant::now())
        .with_max_epochs(config.max_epochs);
    session.run();

    let transport = session.engine().transport().stats();
    tracing::info!(
        "udp: {} sent, {} received, {} send errors, {} malformed",
        transport.packets_sent,
        transport.packets_received,
        transport.send_errors,
        transport.malformed
    );
    Ok(())
}

fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "duel_peer".to_owned());

    let config = match PeerConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", usage(&program));
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "player {} on port {}, peer {}:{}",
        config.player.index(),
        config.self_port,
        config.peer_host,
        config.peer_port
    );

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
