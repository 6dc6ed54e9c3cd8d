//! # Playback Event Normalizer
//!
//! Turns raw engine and clip notifications into the canonical
//! `playbackStateDidChange` vocabulary.
//!
//! Each adapter owns one normalizer. The normalizer remembers the last state
//! it reported (initially `stopped`) and never reports the same state twice in
//! a row, so one raw transition yields at most one event.

use bridge_traits::{ClipEvent, EnginePlaybackState};
use core_runtime::events::{CoreEvent, EventBus, PlaybackState};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Last reported state, readable from outside the listener task.
///
/// Also gates delivery: once [`StateCell::detach`] returns, no normalizer
/// sharing the cell emits again, even one mid-report on another worker.
#[derive(Debug, Clone)]
pub struct StateCell {
    state: Arc<Mutex<PlaybackState>>,
    attached: Arc<RwLock<bool>>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PlaybackState::Stopped)),
            attached: Arc::new(RwLock::new(true)),
        }
    }

    pub fn get(&self) -> PlaybackState {
        *self.state.lock()
    }

    fn set(&self, state: PlaybackState) {
        *self.state.lock() = state;
    }

    /// Stop delivery. Waits for a report already in flight.
    pub fn detach(&self) {
        *self.attached.write() = false;
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Playback progress sampled when a raw pause arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub position: f64,
    pub duration: f64,
}

struct Reporter {
    bus: EventBus,
    state: StateCell,
}

impl Reporter {
    fn report(&self, next: PlaybackState) -> Option<PlaybackState> {
        let attached = self.state.attached.read();
        if !*attached || self.state.get() == next {
            return None;
        }
        self.state.set(next);
        self.bus
            .emit(CoreEvent::PlaybackStateDidChange { result: next });
        Some(next)
    }
}

/// Normalizer for the subscription engine.
pub struct EngineStateNormalizer {
    reporter: Reporter,
    previous_raw: Option<EnginePlaybackState>,
    completion_threshold: f64,
}

impl EngineStateNormalizer {
    pub fn new(bus: EventBus, state: StateCell, completion_threshold: Duration) -> Self {
        Self {
            reporter: Reporter { bus, state },
            previous_raw: None,
            completion_threshold: completion_threshold.as_secs_f64(),
        }
    }

    /// Whether `raw` needs a [`Progress`] sample to be classified.
    pub fn needs_progress(raw: EnginePlaybackState) -> bool {
        raw == EnginePlaybackState::Paused
    }

    /// Feed one raw notification and emit the canonical state, if any.
    pub fn observe(
        &mut self,
        raw: EnginePlaybackState,
        progress: Option<Progress>,
    ) -> Option<PlaybackState> {
        if self.previous_raw == Some(raw) {
            return None;
        }
        self.previous_raw = Some(raw);

        let next = match raw {
            EnginePlaybackState::Playing => PlaybackState::Playing,
            EnginePlaybackState::Paused => {
                if self.reporter.state.get() == PlaybackState::Playing
                    && self.near_end(progress)
                {
                    PlaybackState::Completed
                } else {
                    PlaybackState::Paused
                }
            }
            EnginePlaybackState::Interrupted => PlaybackState::Paused,
            EnginePlaybackState::Stopped => PlaybackState::Stopped,
            EnginePlaybackState::Ended | EnginePlaybackState::Completed => {
                PlaybackState::Completed
            }
            other => {
                trace!(raw = ?other, "Transient engine state ignored");
                return None;
            }
        };

        self.reporter.report(next)
    }

    fn near_end(&self, progress: Option<Progress>) -> bool {
        match progress {
            Some(Progress { position, duration }) if duration > 0.0 => {
                position + self.completion_threshold >= duration
            }
            _ => false,
        }
    }
}

/// Normalizer for clip players.
pub struct ClipEventNormalizer {
    reporter: Reporter,
    end_tolerance: f64,
}

impl ClipEventNormalizer {
    pub fn new(bus: EventBus, state: StateCell, end_tolerance: Duration) -> Self {
        Self {
            reporter: Reporter { bus, state },
            end_tolerance: end_tolerance.as_secs_f64(),
        }
    }

    pub fn observe(&mut self, event: ClipEvent) -> Option<PlaybackState> {
        let next = match event {
            ClipEvent::Play => PlaybackState::Playing,
            ClipEvent::Pause => PlaybackState::Paused,
            ClipEvent::End => PlaybackState::Completed,
            ClipEvent::Stop => PlaybackState::Stopped,
            ClipEvent::RateChanged {
                rate,
                position,
                duration,
            } => {
                if rate > 0.0 {
                    PlaybackState::Playing
                } else if duration > 0.0 && (duration - position).abs() <= self.end_tolerance {
                    PlaybackState::Completed
                } else {
                    PlaybackState::Paused
                }
            }
        };

        self.reporter.report(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::events::Receiver;

    fn engine_normalizer() -> (EngineStateNormalizer, Receiver<CoreEvent>, StateCell) {
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        let state = StateCell::new();
        (
            EngineStateNormalizer::new(bus, state.clone(), Duration::from_secs(3)),
            rx,
            state,
        )
    }

    fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<PlaybackState> {
        let mut states = Vec::new();
        while let Ok(CoreEvent::PlaybackStateDidChange { result }) = rx.try_recv() {
            states.push(result);
        }
        states
    }

    fn at(position: f64, duration: f64) -> Option<Progress> {
        Some(Progress { position, duration })
    }

    #[test]
    fn pause_near_end_reports_completed() {
        let (mut normalizer, mut rx, state) = engine_normalizer();

        normalizer.observe(EnginePlaybackState::Playing, None);
        let result = normalizer.observe(EnginePlaybackState::Paused, at(179.0, 180.0));

        assert_eq!(result, Some(PlaybackState::Completed));
        assert_eq!(state.get(), PlaybackState::Completed);
        assert_eq!(
            drain(&mut rx),
            vec![PlaybackState::Playing, PlaybackState::Completed]
        );
    }

    #[test]
    fn pause_mid_track_reports_paused() {
        let (mut normalizer, _rx, _) = engine_normalizer();

        normalizer.observe(EnginePlaybackState::Playing, None);
        assert_eq!(
            normalizer.observe(EnginePlaybackState::Paused, at(60.0, 180.0)),
            Some(PlaybackState::Paused)
        );
    }

    #[test]
    fn pause_near_end_without_playing_is_paused() {
        let (mut normalizer, _rx, _) = engine_normalizer();

        assert_eq!(
            normalizer.observe(EnginePlaybackState::Paused, at(179.0, 180.0)),
            Some(PlaybackState::Paused)
        );
    }

    #[test]
    fn interruption_is_a_pause() {
        let (mut normalizer, mut rx, _) = engine_normalizer();

        normalizer.observe(EnginePlaybackState::Playing, None);
        normalizer.observe(EnginePlaybackState::Interrupted, None);
        // Paused after interrupted: same canonical state, nothing new.
        normalizer.observe(EnginePlaybackState::Paused, at(10.0, 180.0));

        assert_eq!(
            drain(&mut rx),
            vec![PlaybackState::Playing, PlaybackState::Paused]
        );
    }

    #[test]
    fn repeated_and_transient_raw_states_emit_nothing() {
        let (mut normalizer, mut rx, _) = engine_normalizer();

        normalizer.observe(EnginePlaybackState::Loading, None);
        normalizer.observe(EnginePlaybackState::Playing, None);
        normalizer.observe(EnginePlaybackState::Playing, None);
        normalizer.observe(EnginePlaybackState::Waiting, None);
        normalizer.observe(EnginePlaybackState::Stalled, None);
        normalizer.observe(EnginePlaybackState::Playing, None);

        assert_eq!(drain(&mut rx), vec![PlaybackState::Playing]);
    }

    #[test]
    fn initial_stop_is_silent() {
        let (mut normalizer, mut rx, _) = engine_normalizer();
        assert_eq!(normalizer.observe(EnginePlaybackState::Stopped, None), None);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn sdk_end_states_complete() {
        let (mut normalizer, _rx, _) = engine_normalizer();
        normalizer.observe(EnginePlaybackState::Playing, None);
        assert_eq!(
            normalizer.observe(EnginePlaybackState::Ended, None),
            Some(PlaybackState::Completed)
        );
        assert_eq!(normalizer.observe(EnginePlaybackState::Completed, None), None);
    }

    #[test]
    fn threshold_is_configurable() {
        let bus = EventBus::new(4);
        let mut normalizer =
            EngineStateNormalizer::new(bus, StateCell::new(), Duration::from_secs(10));

        normalizer.observe(EnginePlaybackState::Playing, None);
        assert_eq!(
            normalizer.observe(EnginePlaybackState::Paused, at(172.0, 180.0)),
            Some(PlaybackState::Completed)
        );
    }

    #[test]
    fn detached_cell_silences_reports() {
        let (mut normalizer, mut rx, state) = engine_normalizer();

        normalizer.observe(EnginePlaybackState::Playing, None);
        state.detach();

        assert_eq!(normalizer.observe(EnginePlaybackState::Stopped, None), None);
        assert_eq!(state.get(), PlaybackState::Playing);
        assert_eq!(drain(&mut rx), vec![PlaybackState::Playing]);
    }

    #[test]
    fn clip_events_map_directly() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut normalizer = ClipEventNormalizer::new(bus, StateCell::new(), Duration::ZERO);

        normalizer.observe(ClipEvent::Play);
        normalizer.observe(ClipEvent::Play);
        normalizer.observe(ClipEvent::Pause);
        normalizer.observe(ClipEvent::Play);
        normalizer.observe(ClipEvent::End);
        normalizer.observe(ClipEvent::Stop);

        assert_eq!(
            drain(&mut rx),
            vec![
                PlaybackState::Playing,
                PlaybackState::Paused,
                PlaybackState::Playing,
                PlaybackState::Completed,
                PlaybackState::Stopped,
            ]
        );
    }

    #[test]
    fn clip_rate_observation() {
        let bus = EventBus::new(16);
        let mut normalizer = ClipEventNormalizer::new(bus, StateCell::new(), Duration::ZERO);

        let rate = |rate: f32, position: f64| ClipEvent::RateChanged {
            rate,
            position,
            duration: 30.0,
        };

        assert_eq!(normalizer.observe(rate(1.0, 0.0)), Some(PlaybackState::Playing));
        assert_eq!(normalizer.observe(rate(0.0, 12.0)), Some(PlaybackState::Paused));
        assert_eq!(normalizer.observe(rate(1.0, 12.0)), Some(PlaybackState::Playing));
        assert_eq!(
            normalizer.observe(rate(0.0, 30.0)),
            Some(PlaybackState::Completed)
        );
    }
}
