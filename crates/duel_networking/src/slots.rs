//! # Command Slot Store
//!
//! One fixed ring of per-epoch commands for each player.
//!
//! ## Staleness
//!
//! Ring positions are reused every `ring_size` epochs. Each stored slot is
//! tagged with the epoch it was written for, and every read or acknowledge
//! compares that tag against the epoch being asked about. A mismatch means
//! "nothing recorded for that epoch yet", never "here is older data".
//!
//! ```text
//! epoch:   0  1  2 ... 63 | 64 65 ...
//! slot:    0  1  2 ... 63 |  0  1 ...
//! ```

use duel_core::{PaddleInput, Player};

use crate::protocol::Epoch;

/// One player's command for one epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSlot {
    /// The command.
    pub input: PaddleInput,
    /// Set once the peer confirmed receipt of this command.
    pub acknowledged: bool,
    /// Epoch this slot was written for.
    pub epoch: Epoch,
}

/// Per-player command rings.
///
/// Allocated once; slots are overwritten in place as the rings wrap.
#[derive(Clone, Debug)]
pub struct CommandSlotStore {
    rings: [Box<[Option<CommandSlot>]>; 2],
    mask: usize,
}

impl CommandSlotStore {
    /// Creates empty rings.
    ///
    /// # Panics
    ///
    /// If `ring_size` is not a power of two.
    #[must_use]
    pub fn new(ring_size: usize) -> Self {
        assert!(ring_size.is_power_of_two(), "ring size must be a power of two");

        Self {
            rings: [
                vec![None; ring_size].into_boxed_slice(),
                vec![None; ring_size].into_boxed_slice(),
            ],
            mask: ring_size - 1,
        }
    }

    /// Creates rings with the first `delay` epochs pre-recorded as `None`
    /// commands for both players.
    ///
    /// Nobody can have sampled input for epochs before the delay horizon, so
    /// both peers agree those epochs are idle. The local copies still start
    /// unacknowledged and go out through normal retransmission.
    #[must_use]
    pub fn seeded(ring_size: usize, delay: u16) -> Self {
        let mut store = Self::new(ring_size);
        for player in Player::ALL {
            for e in 0..delay {
                store.put(player, Epoch(e), PaddleInput::None);
            }
        }
        store
    }

    /// Number of slots per player.
    #[inline]
    #[must_use]
    pub fn ring_size(&self) -> usize {
        self.mask + 1
    }

    /// The slot for `epoch`, if one was recorded for exactly that epoch.
    #[inline]
    #[must_use]
    pub fn get(&self, player: Player, epoch: Epoch) -> Option<CommandSlot> {
        self.rings[player.index()][epoch.slot(self.mask)].filter(|slot| slot.epoch == epoch)
    }

    /// Records `input` for `epoch`, discarding whatever the ring position
    /// held before. Clears the acknowledgment flag.
    #[inline]
    pub fn put(&mut self, player: Player, epoch: Epoch, input: PaddleInput) {
        self.rings[player.index()][epoch.slot(self.mask)] = Some(CommandSlot {
            input,
            acknowledged: false,
            epoch,
        });
    }

    /// Marks the slot for `epoch` acknowledged.
    ///
    /// No-op if the ring position has been recycled for another epoch or
    /// was never written. Returns whether a slot was marked.
    #[inline]
    pub fn mark_acknowledged(&mut self, player: Player, epoch: Epoch) -> bool {
        match &mut self.rings[player.index()][epoch.slot(self.mask)] {
            Some(slot) if slot.epoch == epoch => {
                slot.acknowledged = true;
                true
            }
            _ => false,
        }
    }
}
