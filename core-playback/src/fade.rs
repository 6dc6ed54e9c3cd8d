//! # Fade Scheduler
//!
//! Volume ramps for preview clips. A clip starts silent, ramps up to the
//! target volume when playback starts, and ramps down over the last
//! `fade_duration` of the clip.
//!
//! At most one fade-out timer is live. Arming a new one aborts the previous
//! one, and every exit path (pause, stop, completion, seek, teardown) cancels
//! it. A fade-out that starts while the fade-in is still ramping takes over
//! from it, so the two never write the volume at the same time.
//!
//! A clip whose duration is not known yet (zero, NaN, infinite stream) gets no
//! fade-out; the next play or seek arms it once the duration is available.

use crate::error::Result;
use bridge_traits::ClipPlayer;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delay before the fade-out starts: `remaining - fade`, clamped at zero.
pub fn fade_out_delay(duration: f64, position: f64, fade: Duration) -> Duration {
    let remaining_ms = (duration - position) * 1000.0;
    let delay_ms = remaining_ms - fade.as_millis() as f64;
    if delay_ms.is_finite() && delay_ms > 0.0 {
        Duration::from_millis(delay_ms as u64)
    } else {
        Duration::ZERO
    }
}

type TaskSlot = Arc<Mutex<Option<JoinHandle<()>>>>;

pub struct FadeScheduler {
    player: Arc<dyn ClipPlayer>,
    fade: Duration,
    steps: u32,
    target: Arc<Mutex<f32>>,
    fade_in: TaskSlot,
    fade_out: TaskSlot,
}

impl FadeScheduler {
    pub fn new(player: Arc<dyn ClipPlayer>, fade: Duration, steps: u32, target: f32) -> Self {
        Self {
            player,
            fade,
            steps: steps.max(1),
            target: Arc::new(Mutex::new(target)),
            fade_in: Arc::new(Mutex::new(None)),
            fade_out: Arc::new(Mutex::new(None)),
        }
    }

    pub fn target(&self) -> f32 {
        *self.target.lock()
    }

    /// Change the volume ramps converge to. A running fade-in picks it up.
    pub fn set_target(&self, volume: f32) {
        *self.target.lock() = volume;
    }

    /// Playback started: fade in from silence, then arm the fade-out.
    pub async fn on_play(&self) -> Result<()> {
        self.cancel_fade_out();
        abort_slot(&self.fade_in);

        if self.player.volume().await? <= 0.0 {
            let handle = tokio::spawn(fade_in(
                self.player.clone(),
                self.target.clone(),
                self.fade,
                self.steps,
            ));
            replace_slot(&self.fade_in, handle);
        } else {
            self.player.set_volume(self.target()).await?;
        }

        self.arm_fade_out().await
    }

    /// Arm the fade-out relative to the current position.
    pub async fn arm_fade_out(&self) -> Result<()> {
        let position = self.player.position().await?;
        let duration = self.player.duration().await?;
        if !(duration.is_finite() && duration > 0.0) {
            self.cancel_fade_out();
            debug!(duration, "Clip duration unknown, fade-out not armed");
            return Ok(());
        }

        let delay = fade_out_delay(duration, position, self.fade);
        let remaining =
            Duration::try_from_secs_f64((duration - position).max(0.0)).unwrap_or(Duration::ZERO);
        let ramp = self.fade.min(remaining);

        debug!(?delay, ?ramp, "Arming fade-out");
        let handle = tokio::spawn(fade_out(
            self.player.clone(),
            self.fade_in.clone(),
            delay,
            ramp,
            self.steps,
        ));
        replace_slot(&self.fade_out, handle);
        Ok(())
    }

    /// Seek happened: drop the pending fade-out and re-arm it while playing.
    pub async fn on_seek(&self, playing: bool) -> Result<()> {
        if playing {
            self.on_play().await
        } else {
            self.cancel_fade_out();
            Ok(())
        }
    }

    pub fn cancel_fade_out(&self) {
        abort_slot(&self.fade_out);
    }

    /// Cancel every pending ramp and timer.
    pub fn cancel(&self) {
        abort_slot(&self.fade_in);
        abort_slot(&self.fade_out);
    }

    pub fn is_fade_out_armed(&self) -> bool {
        self.fade_out
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for FadeScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn replace_slot(slot: &TaskSlot, handle: JoinHandle<()>) {
    if let Some(previous) = slot.lock().replace(handle) {
        previous.abort();
    }
}

fn abort_slot(slot: &TaskSlot) {
    if let Some(handle) = slot.lock().take() {
        handle.abort();
    }
}

async fn fade_in(player: Arc<dyn ClipPlayer>, target: Arc<Mutex<f32>>, fade: Duration, steps: u32) {
    let step = fade / steps;
    for i in 1..=steps {
        tokio::time::sleep(step).await;
        let level = *target.lock() * i as f32 / steps as f32;
        if let Err(err) = player.set_volume(level).await {
            warn!(error = %err, "Fade-in aborted");
            return;
        }
    }
}

async fn fade_out(
    player: Arc<dyn ClipPlayer>,
    fade_in: TaskSlot,
    delay: Duration,
    ramp: Duration,
    steps: u32,
) {
    tokio::time::sleep(delay).await;
    abort_slot(&fade_in);

    let start = match player.volume().await {
        Ok(volume) => volume,
        Err(err) => {
            warn!(error = %err, "Fade-out aborted");
            return;
        }
    };

    let step = ramp / steps;
    for i in 1..=steps {
        tokio::time::sleep(step).await;
        let level = if i == steps {
            0.0
        } else {
            start * (steps - i) as f32 / steps as f32
        };
        if let Err(err) = player.set_volume(level).await {
            warn!(error = %err, "Fade-out aborted");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeClipPlayer;

    fn scheduler(player: Arc<FakeClipPlayer>) -> FadeScheduler {
        FadeScheduler::new(player, Duration::from_millis(2000), 20, 1.0)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn delay_formula() {
        let fade = Duration::from_millis(2000);
        assert_eq!(fade_out_delay(30.0, 0.0, fade), Duration::from_millis(28_000));
        assert_eq!(fade_out_delay(30.0, 27.5, fade), Duration::from_millis(500));
        assert_eq!(fade_out_delay(30.0, 29.0, fade), Duration::ZERO);
        assert_eq!(fade_out_delay(1.0, 0.0, fade), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn fades_in_from_silence() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        let fade = scheduler(player.clone());

        fade.on_play().await.unwrap();
        assert_eq!(player.current_volume(), 0.0);

        advance(1_050).await;
        let midway = player.current_volume();
        assert!(midway > 0.4 && midway < 0.6, "midway volume {}", midway);

        advance(1_000).await;
        assert_eq!(player.current_volume(), 1.0);
        assert!(fade.is_fade_out_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn audible_start_sets_volume_directly() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        player.set_current_volume(0.3);
        let fade = FadeScheduler::new(player.clone(), Duration::from_millis(2000), 20, 0.8);

        fade.on_play().await.unwrap();
        assert_eq!(player.current_volume(), 0.8);
    }

    #[tokio::test(start_paused = true)]
    async fn fade_out_fires_before_clip_end() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        player.set_current_volume(1.0);
        let fade = scheduler(player.clone());

        fade.on_play().await.unwrap();

        advance(27_900).await;
        assert_eq!(player.current_volume(), 1.0);

        advance(1_100).await;
        let fading = player.current_volume();
        assert!(fading < 1.0 && fading > 0.0, "fading volume {}", fading);

        advance(1_100).await;
        assert_eq!(player.current_volume(), 0.0);
        assert!(!fade.is_fade_out_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn seek_rearms_from_new_position() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        player.set_current_volume(1.0);
        let fade = scheduler(player.clone());

        fade.on_play().await.unwrap();
        advance(10_000).await;

        player.set_position(20.0);
        fade.on_seek(true).await.unwrap();
        assert!(fade.is_fade_out_armed());

        // New window starts 8s after the seek.
        advance(7_900).await;
        assert_eq!(player.current_volume(), 1.0);

        advance(2_200).await;
        assert_eq!(player.current_volume(), 0.0);

        // The timer armed before the seek never fires again.
        player.set_current_volume(1.0);
        advance(20_000).await;
        assert_eq!(player.current_volume(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fade_out() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        player.set_current_volume(1.0);
        let fade = scheduler(player.clone());

        fade.on_play().await.unwrap();
        fade.cancel_fade_out();
        assert!(!fade.is_fade_out_armed());

        advance(40_000).await;
        assert_eq!(player.current_volume(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_while_paused_only_cancels() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        player.set_current_volume(1.0);
        let fade = scheduler(player.clone());

        fade.arm_fade_out().await.unwrap();
        fade.on_seek(false).await.unwrap();

        assert!(!fade.is_fade_out_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn late_start_hands_fade_in_over_to_fade_out() {
        let player = Arc::new(FakeClipPlayer::new(30.0));
        player.set_position(27.0);
        let fade = scheduler(player.clone());

        fade.on_play().await.unwrap();

        // Fade-out window opens 1s in; from then on the volume only falls.
        advance(1_050).await;
        let mut previous = player.current_volume();
        assert!(previous > 0.0 && previous < 1.0, "volume at handover {}", previous);
        for _ in 0..30 {
            advance(75).await;
            let volume = player.current_volume();
            assert!(volume <= previous, "volume rose from {} to {}", previous, volume);
            previous = volume;
        }

        advance(1_000).await;
        assert_eq!(player.current_volume(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_duration_skips_fade_out() {
        for duration in [f64::INFINITY, f64::NAN, 0.0] {
            let player = Arc::new(FakeClipPlayer::new(duration));
            player.set_current_volume(1.0);
            let fade = scheduler(player.clone());

            fade.on_play().await.unwrap();
            assert!(!fade.is_fade_out_armed(), "duration {}", duration);

            advance(5_000).await;
            assert_eq!(player.current_volume(), 1.0, "duration {}", duration);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_duration_still_fades_in() {
        let player = Arc::new(FakeClipPlayer::new(f64::INFINITY));
        let fade = scheduler(player.clone());

        fade.on_play().await.unwrap();
        advance(2_100).await;

        assert_eq!(player.current_volume(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn short_clip_fades_out_immediately() {
        let player = Arc::new(FakeClipPlayer::new(1.0));
        player.set_current_volume(1.0);
        let fade = scheduler(player.clone());

        fade.arm_fade_out().await.unwrap();
        advance(1_100).await;

        assert_eq!(player.current_volume(), 0.0);
    }
}
