//! Watchdog State Machine — correlates the announced "space open" intent
//! with the observed lock reality and drives re-locking with an audible
//! countdown (spec §4.7, §9).
//!
//! Fact updates (`set_space_open`, `handle_door_event`) come from the bus
//! thread and only ever touch the mutex-guarded facts. `step()` runs on the
//! main thread at ~2 Hz and is the only thing that touches the scheduler,
//! matching the single-threaded control-loop requirement in spec §5/§9.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

use crate::domain::types::{messages, WatchdogState};
use crate::services::scheduler::{EventHandle, Scheduler};

/// Deadline and outstanding beep handles, present only while in COUNTDOWN
/// (spec §3 `CountdownContext`).
struct CountdownContext {
    deadline: Instant,
    beep_handles: Vec<EventHandle>,
}

struct Facts {
    space_open: Option<bool>,
    locked: Option<bool>,
    state: WatchdogState,
    countdown: Option<CountdownContext>,
}

/// The side effects the automaton can trigger: issuing a lock command and
/// sounding a beep pattern. Kept as trait objects so the watchdog binary
/// can bind them to bus publishes while tests bind them to recorders
/// (spec §9 "beep action... leave the binding pluggable").
pub trait WatchdogActions: Send + Sync {
    fn issue_lock_command(&self);
    fn beep(&self, pattern: u8);
}

pub struct Watchdog {
    facts: Mutex<Facts>,
    actions: Arc<dyn WatchdogActions>,
    countdown_secs: u64,
    relock_interval_secs: u64,
    beep_interval_secs: u64,
    beep_pattern: u8,
}

impl Watchdog {
    pub fn new(
        actions: Arc<dyn WatchdogActions>,
        countdown_secs: u64,
        relock_interval_secs: u64,
        beep_interval_secs: u64,
        beep_pattern: u8,
    ) -> Self {
        Self {
            facts: Mutex::new(Facts {
                space_open: None,
                locked: None,
                state: WatchdogState::Boot,
                countdown: None,
            }),
            actions,
            countdown_secs,
            relock_interval_secs,
            beep_interval_secs,
            beep_pattern,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.facts.lock().state
    }

    /// Record the latest `{space}/isOpen` value (spec §3, §6.2).
    pub fn set_space_open(&self, payload: &str) {
        let open = payload == messages::SPACE_OPEN_TRUE;
        self.facts.lock().space_open = Some(open);
    }

    /// Fold a `{door}/Events` payload into the `locked` fact (spec §3):
    /// `"door open"`/`"door unlocked"` -> false, `"door locked"` -> true,
    /// `"door closed"` alone leaves `locked` unchanged.
    pub fn handle_door_event(&self, payload: &str) {
        let mut facts = self.facts.lock();
        match payload {
            messages::DOOR_OPEN | messages::LOCK_OPEN => facts.locked = Some(false),
            messages::LOCK_CLOSED => facts.locked = Some(true),
            _ => {}
        }
    }

    /// Advance the automaton one tick (spec §4.7). Call at ~2 Hz from the
    /// single-threaded main loop, passing the scheduler it also drives.
    pub fn step(&self, now: Instant, scheduler: &mut Scheduler) {
        let mut facts = self.facts.lock();
        let (space_open, locked) = (facts.space_open, facts.locked);

        match facts.state {
            WatchdogState::Boot => {
                if let (Some(open), Some(locked)) = (space_open, locked) {
                    let next = if open {
                        WatchdogState::Open
                    } else if locked {
                        WatchdogState::Locked
                    } else {
                        WatchdogState::Countdown
                    };
                    self.transition(&mut facts, next, now, scheduler);
                }
            }
            WatchdogState::Open => {
                if space_open == Some(false) {
                    let next =
                        if locked == Some(true) { WatchdogState::Locked } else { WatchdogState::Countdown };
                    self.transition(&mut facts, next, now, scheduler);
                }
            }
            WatchdogState::Countdown => {
                if space_open == Some(true) {
                    self.transition(&mut facts, WatchdogState::Open, now, scheduler);
                } else if locked == Some(true) {
                    self.transition(&mut facts, WatchdogState::Locked, now, scheduler);
                } else {
                    self.advance_countdown(&mut facts, now, scheduler);
                }
            }
            WatchdogState::Locked => {
                if space_open == Some(true) {
                    self.transition(&mut facts, WatchdogState::Open, now, scheduler);
                } else if locked == Some(false) {
                    self.transition(&mut facts, WatchdogState::Countdown, now, scheduler);
                }
            }
        }
    }

    fn transition(
        &self,
        facts: &mut Facts,
        next: WatchdogState,
        now: Instant,
        scheduler: &mut Scheduler,
    ) {
        if let Some(countdown) = facts.countdown.take() {
            for handle in countdown.beep_handles {
                scheduler.cancel(handle);
            }
        }
        info!(from = facts.state.as_str(), to = next.as_str(), "watchdog_state_transition");
        facts.state = next;

        if next == WatchdogState::Countdown {
            self.advance_countdown(facts, now, scheduler);
        }
    }

    /// Runs inside the COUNTDOWN state once abort conditions are ruled out:
    /// arm the deadline and beep train on first entry, and re-issue the
    /// lock command on every expiry after (spec §4.7).
    fn advance_countdown(&self, facts: &mut Facts, now: Instant, scheduler: &mut Scheduler) {
        if facts.countdown.is_none() {
            let deadline = now + Duration::from_secs(self.countdown_secs);
            let beep_handles =
                self.schedule_beep_train(scheduler, now, self.countdown_secs);
            facts.countdown = Some(CountdownContext { deadline, beep_handles });
            return;
        }

        let deadline = facts.countdown.as_ref().expect("checked above").deadline;
        if now >= deadline {
            info!("watchdog_issuing_lock_command");
            self.actions.issue_lock_command();
            let new_deadline = now + Duration::from_secs(self.relock_interval_secs);
            let beep_handles =
                self.schedule_beep_train(scheduler, now, self.relock_interval_secs);
            facts.countdown = Some(CountdownContext { deadline: new_deadline, beep_handles });
        }
    }

    /// Schedule one beep every `beep_interval_secs` from `t=0` up to but
    /// excluding `window_secs` (spec §4.7, §GLOSSARY "beep train").
    fn schedule_beep_train(
        &self,
        scheduler: &mut Scheduler,
        now: Instant,
        window_secs: u64,
    ) -> Vec<EventHandle> {
        let mut handles = Vec::new();
        let mut t = 0u64;
        while t < window_secs {
            let actions = self.actions.clone();
            let pattern = self.beep_pattern;
            let handle = scheduler.enter(now, Duration::from_secs(t), move || actions.beep(pattern));
            handles.push(handle);
            t += self.beep_interval_secs.max(1);
        }
        handles
    }
}
