//! Shared types for the Gatekeeper door/shutter control system

use std::collections::BTreeSet;

/// One sampled word from the door controller, decoded from a single byte.
///
/// Bit layout (spec §3, §6.1):
/// bit 5 = green_active, bit 4 = red_active, bit 3 = door_closed,
/// bit 2 = lock_open, bit 1 = force_close, bit 0 = force_open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoorStateWord {
    pub green_active: bool,
    pub red_active: bool,
    pub door_closed: bool,
    pub lock_open: bool,
    pub force_close: bool,
    pub force_open: bool,
}

/// Identifies a single boolean field of [`DoorStateWord`] for edge reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StateKey {
    GreenActive,
    RedActive,
    DoorClosed,
    LockOpen,
    ForceClose,
    ForceOpen,
}

impl StateKey {
    /// Dictionary-order iteration over all keys, per spec §5 ordering guarantee.
    pub const ALL: [StateKey; 6] = [
        StateKey::DoorClosed,
        StateKey::ForceClose,
        StateKey::ForceOpen,
        StateKey::GreenActive,
        StateKey::LockOpen,
        StateKey::RedActive,
    ];

    fn value(self, state: DoorStateWord) -> bool {
        match self {
            StateKey::GreenActive => state.green_active,
            StateKey::RedActive => state.red_active,
            StateKey::DoorClosed => state.door_closed,
            StateKey::LockOpen => state.lock_open,
            StateKey::ForceClose => state.force_close,
            StateKey::ForceOpen => state.force_open,
        }
    }
}

impl DoorStateWord {
    /// Decode a raw state byte per the bit layout in spec §6.1.
    pub fn decode(byte: u8) -> Self {
        let state = DoorStateWord {
            green_active: byte & 0x20 != 0,
            red_active: byte & 0x10 != 0,
            door_closed: byte & 0x08 != 0,
            lock_open: byte & 0x04 != 0,
            force_close: byte & 0x02 != 0,
            force_open: byte & 0x01 != 0,
        };

        if state.force_close && state.force_open {
            tracing::warn!(byte = format!("{byte:#04x}"), "door_state_force_ambiguous");
        }

        state
    }

    /// Keys whose value differs between `self` (new) and `previous`, in
    /// dictionary order.
    pub fn edges_since(self, previous: DoorStateWord) -> BTreeSet<StateKey> {
        StateKey::ALL
            .into_iter()
            .filter(|&key| key.value(self) != key.value(previous))
            .collect()
    }

    /// Same as [`edges_since`](Self::edges_since), but treats "no previous
    /// sample" as "every key is an edge" rather than "no edges" — matching
    /// `door-service.py`'s `old_state = dict()`, which makes every key
    /// look new on the very first poll so the initial door/lock state is
    /// always announced on the bus.
    pub fn edges_against(self, previous: Option<DoorStateWord>) -> BTreeSet<StateKey> {
        match previous {
            Some(previous) => self.edges_since(previous),
            None => StateKey::ALL.into_iter().collect(),
        }
    }

    pub fn get(self, key: StateKey) -> bool {
        key.value(self)
    }
}

/// A validated 16-bit inversion-coded frame read from an MCU (spec §3, §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub payload: u8,
}

impl Frame {
    /// Decode `(lo, hi)` as read off the wire. Valid iff `hi == lo ^ 0xFF`
    /// and `lo != 0`.
    pub fn decode(lo: u8, hi: u8) -> Option<Frame> {
        if hi == lo ^ 0xFF && lo != 0 {
            Some(Frame { payload: lo })
        } else {
            None
        }
    }
}

/// Supervision state of the Door Watchdog automaton (spec §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Boot,
    Open,
    Countdown,
    Locked,
}

impl WatchdogState {
    pub fn as_str(self) -> &'static str {
        match self {
            WatchdogState::Boot => "boot",
            WatchdogState::Open => "open",
            WatchdogState::Countdown => "countdown",
            WatchdogState::Locked => "locked",
        }
    }
}

/// Canonical bus message bodies, shared between the producer (door-bridge)
/// and consumer (door-watchdog) so the literal strings can't drift apart.
pub mod messages {
    pub const DOOR_OPEN: &str = "door open";
    pub const DOOR_CLOSED: &str = "door closed";
    pub const LOCK_OPEN: &str = "door unlocked";
    pub const LOCK_CLOSED: &str = "door locked";
    pub const BUTTON_GREEN: &str = "button green";
    pub const BUTTON_RED: &str = "button red";
    pub const CMD_OPEN: &str = "door open";
    pub const CMD_CLOSE: &str = "door close";
    pub const SPACE_OPEN_TRUE: &str = "true";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_bit_layout() {
        let w = DoorStateWord::decode(0b0010_1101);
        assert!(w.green_active);
        assert!(!w.red_active);
        assert!(w.door_closed);
        assert!(!w.lock_open);
        assert!(!w.force_close);
        assert!(w.force_open);
    }

    #[test]
    fn edges_empty_for_identical_words() {
        let w = DoorStateWord::decode(0x08);
        assert!(w.edges_since(w).is_empty());
    }

    #[test]
    fn edges_against_none_reports_every_key() {
        // door_closed=true, lock_open=false, everything else false.
        let w = DoorStateWord::decode(0x08);
        let edges = w.edges_against(None);
        assert_eq!(edges.len(), StateKey::ALL.len());
        for key in StateKey::ALL {
            assert!(edges.contains(&key), "missing {key:?} on first sample");
        }
    }

    #[test]
    fn edges_against_some_matches_edges_since() {
        let before = DoorStateWord::decode(0x08);
        let after = DoorStateWord::decode(0x00);
        assert_eq!(after.edges_against(Some(before)), after.edges_since(before));
    }

    #[test]
    fn edges_detect_single_change() {
        let before = DoorStateWord::decode(0x08); // door_closed
        let after = DoorStateWord::decode(0x00); // door open
        let edges = after.edges_since(before);
        assert_eq!(edges.len(), 1);
        assert!(edges.contains(&StateKey::DoorClosed));
    }

    #[test]
    fn edges_are_dictionary_ordered() {
        let before = DoorStateWord::default();
        let after = DoorStateWord::decode(0xFF & 0x3F);
        let edges: Vec<_> = after.edges_since(before).into_iter().collect();
        let mut sorted = edges.clone();
        sorted.sort();
        assert_eq!(edges, sorted);
    }

    #[test]
    fn force_ambiguity_is_accepted_not_rejected() {
        // force_close (bit1) and force_open (bit0) both set: 0b11 low bits.
        let w = DoorStateWord::decode(0x03);
        assert!(w.force_close);
        assert!(w.force_open);
    }

    #[test]
    fn frame_validity_matrix() {
        assert_eq!(Frame::decode(0x05, 0xFA), Some(Frame { payload: 0x05 }));
        assert_eq!(Frame::decode(0x00, 0xFF), None); // lo == 0 rejected
        assert_eq!(Frame::decode(0x05, 0xFB), None); // not an inversion
    }

    #[test]
    fn frame_validity_exhaustive_fuzz() {
        for lo in 0u8..=255 {
            for hi in 0u8..=255 {
                let expect = hi == (lo ^ 0xFF) && lo != 0;
                assert_eq!(Frame::decode(lo, hi).is_some(), expect, "lo={lo:#04x} hi={hi:#04x}");
            }
        }
    }
}
