//! # Configuration
//!
//! Protocol tuning (`SyncConfig`, optional TOML file) and process wiring
//! (`PeerConfig`, command line).

use std::path::{Path, PathBuf};
use std::time::Duration;

use duel_core::Player;
use serde::Deserialize;

use crate::error::{NetError, NetResult};

/// Protocol tuning. Both peers must use the same values.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Epochs between sampling a local input and executing it.
    pub input_delay: u16,
    /// Command ring capacity per player. Power of two.
    pub ring_size: usize,
    /// Length of one epoch in milliseconds.
    pub tick_interval_ms: u32,
    /// Epoch durations kept for the rolling average.
    pub stats_window: usize,
    /// Emit an average-time line every this many epochs.
    pub report_every: u16,
    /// Warn when no epoch advanced for this long. Zero disables.
    pub stall_warning_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            input_delay: crate::DEFAULT_INPUT_DELAY,
            ring_size: crate::DEFAULT_RING_SIZE,
            tick_interval_ms: crate::DEFAULT_TICK_INTERVAL_MS,
            stats_window: 100,
            report_every: 100,
            stall_warning_ms: 2_000,
        }
    }
}

impl SyncConfig {
    /// Parses and validates TOML.
    pub fn from_toml_str(text: &str) -> NetResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> NetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> NetResult<()> {
        if self.input_delay < 2 {
            return Err(NetError::InvalidConfig(format!(
                "input_delay must be at least 2, got {}",
                self.input_delay
            )));
        }
        if !self.ring_size.is_power_of_two() || self.ring_size > 1 << 16 {
            return Err(NetError::InvalidConfig(format!(
                "ring_size must be a power of two no larger than 65536, got {}",
                self.ring_size
            )));
        }
        // Peers drift apart by up to one delay each way; the ring must hold both.
        if self.ring_size <= 2 * usize::from(self.input_delay) {
            return Err(NetError::InvalidConfig(format!(
                "ring_size {} must exceed twice the input delay {}",
                self.ring_size, self.input_delay
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(NetError::InvalidConfig("tick_interval_ms must be non-zero".into()));
        }
        if self.stats_window == 0 || self.report_every == 0 {
            return Err(NetError::InvalidConfig(
                "stats_window and report_every must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Epoch length.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.tick_interval_ms))
    }

    /// Epoch length in seconds, as handed to the simulator.
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        self.tick_interval_ms as f32 / 1000.0
    }

    /// Stall warning threshold, if enabled.
    #[must_use]
    pub fn stall_warning(&self) -> Option<Duration> {
        (self.stall_warning_ms > 0).then(|| Duration::from_millis(self.stall_warning_ms))
    }
}

/// Process wiring from the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerConfig {
    /// Local UDP port.
    pub self_port: u16,
    /// Peer hostname or address.
    pub peer_host: String,
    /// Peer UDP port.
    pub peer_port: u16,
    /// Which seat this process plays.
    pub player: Player,
    /// Optional TOML file for [`SyncConfig`].
    pub config_path: Option<PathBuf>,
    /// Quit after this many epochs.
    pub max_epochs: Option<u64>,
}

impl PeerConfig {
    /// Parses `<self_port> <peer_hostname> <peer_port> <player>` followed by
    /// optional `--config <path>` and `--epochs <n>`.
    ///
    /// `args` excludes the program name.
    pub fn from_args<I, S>(args: I) -> NetResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positional = Vec::with_capacity(4);
        let mut config_path = None;
        let mut max_epochs = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--config" => {
                    let value = args
                        .next()
                        .ok_or_else(|| NetError::InvalidArguments("--config needs a path".into()))?;
                    config_path = Some(PathBuf::from(value.as_ref()));
                }
                "--epochs" => {
                    let value = args
                        .next()
                        .ok_or_else(|| NetError::InvalidArguments("--epochs needs a count".into()))?;
                    max_epochs = Some(parse_number(value.as_ref(), "epochs")?);
                }
                other => positional.push(other.to_owned()),
            }
        }

        if positional.len() != 4 {
            return Err(NetError::InvalidArguments(format!(
                "expected 4 arguments, got {}",
                positional.len()
            )));
        }

        let player_index: u8 = parse_number(&positional[3], "player")?;
        let player = Player::from_index(player_index).ok_or_else(|| {
            NetError::InvalidArguments(format!("player must be 0 or 1, got {player_index}"))
        })?;

        Ok(Self {
            self_port: parse_number(&positional[0], "self_port")?,
            peer_host: positional[1].clone(),
            peer_port: parse_number(&positional[2], "peer_port")?,
            player,
            config_path,
            max_epochs,
        })
    }

    /// Loads the protocol config, falling back to defaults without a file.
    pub fn sync_config(&self) -> NetResult<SyncConfig> {
        match &self.config_path {
            Some(path) => SyncConfig::load(path),
            None => Ok(SyncConfig::default()),
        }
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, name: &str) -> NetResult<T> {
    text.parse()
        .map_err(|_| NetError::InvalidArguments(format!("{name} is not a valid number: {text}")))
}

/// Usage text printed on an argument error.
#[must_use]
pub fn usage(program_name: &str) -> String {
    format!(
        "Usage: {program_name} <self_port> <peer_hostname> <peer_port> <player> [--config <path>] [--epochs <n>]

Arguments:
  self_port      Port to listen on (e.g. 9930)
  peer_hostname  Peer's hostname or IP address (e.g. 127.0.0.1)
  peer_port      Peer's port (e.g. 9931)
  player         Player number, 0 or 1

Options:
  --config <path>  TOML file with protocol settings (both peers must agree)
  --epochs <n>     Quit after n epochs

Examples:
  {program_name} 9930 127.0.0.1 9931 0
  {program_name} 9931 127.0.0.1 9930 1"
    )
}
