use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Result of one tick of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub remaining: u32,
    pub completed: bool,
}

/// Pure countdown state. `RoundClock` drives it from a timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    paused: bool,
    running: bool,
}

impl Countdown {
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.paused = false;
        self.running = true;
    }

    /// Advance one unit. Paused or stopped countdowns do not tick.
    pub fn tick(&mut self) -> Option<Tick> {
        if !self.running || self.paused {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        let completed = self.remaining == 0;
        if completed {
            self.stop();
        }
        Some(Tick { remaining: self.remaining, completed })
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Signals emitted by a running clock. `run` identifies the countdown that
/// produced them so listeners can drop leftovers from a cancelled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    Tick { run: u64, remaining: u32 },
    Completed { run: u64 },
}

pub type ClockListener = Arc<dyn Fn(ClockSignal) + Send + Sync>;

#[derive(Debug, Default)]
struct Shared {
    countdown: Countdown,
    run: u64,
}

/// Pausable countdown on a tokio interval. At most one countdown runs at a
/// time; `start` cancels the previous one.
pub struct RoundClock {
    shared: Arc<Mutex<Shared>>,
    period: Duration,
    listener: ClockListener,
    task: Option<JoinHandle<()>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RoundClock {
    /// A zero `period` is raised to one millisecond; tokio intervals reject it.
    pub fn new(period: Duration, listener: ClockListener) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            period: period.max(Duration::from_millis(1)),
            listener,
            task: None,
        }
    }

    /// Begin a countdown of `seconds` ticks. Must be called inside a tokio
    /// runtime. Returns the run number of the new countdown.
    pub fn start(&mut self, seconds: u32) -> u64 {
        self.stop();

        let run = {
            let mut shared = lock(&self.shared);
            shared.run += 1;
            shared.countdown.start(seconds);
            shared.run
        };

        let shared = self.shared.clone();
        let listener = self.listener.clone();
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = {
                    let mut guard = lock(&shared);
                    if guard.run != run || !guard.countdown.is_running() {
                        break;
                    }
                    guard.countdown.tick()
                };
                let Some(tick) = tick else {
                    continue;
                };
                listener(ClockSignal::Tick { run, remaining: tick.remaining });
                if tick.completed {
                    debug!("Countdown {} completed", run);
                    listener(ClockSignal::Completed { run });
                    break;
                }
            }
        }));

        debug!("Countdown {} started for {}s", run, seconds);
        run
    }

    pub fn pause(&self) {
        lock(&self.shared).countdown.pause();
    }

    pub fn resume(&self) {
        lock(&self.shared).countdown.resume();
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        lock(&self.shared).countdown.stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn remaining(&self) -> u32 {
        lock(&self.shared).countdown.remaining()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).countdown.is_running()
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.shared).countdown.is_paused()
    }

    pub fn current_run(&self) -> u64 {
        lock(&self.shared).run
    }
}

impl Drop for RoundClock {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_clock() -> (RoundClock, Arc<Mutex<Vec<ClockSignal>>>) {
        let seen = Arc::new(Mutex::new(Vec::<ClockSignal>::new()));
        let sink = seen.clone();
        let clock = RoundClock::new(
            Duration::from_secs(1),
            Arc::new(move |signal: ClockSignal| sink.lock().unwrap().push(signal)),
        );
        (clock, seen)
    }

    #[test]
    fn test_countdown_completes_once() {
        let mut countdown = Countdown::default();
        countdown.start(2);
        assert_eq!(countdown.tick(), Some(Tick { remaining: 1, completed: false }));
        assert_eq!(countdown.tick(), Some(Tick { remaining: 0, completed: true }));
        assert!(!countdown.is_running());
        assert_eq!(countdown.tick(), None);
    }

    #[test]
    fn test_countdown_pause_suppresses_ticks() {
        let mut countdown = Countdown::default();
        countdown.start(3);
        countdown.pause();
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.remaining(), 3);
        countdown.resume();
        assert_eq!(countdown.tick().map(|t| t.remaining), Some(2));
    }

    #[test]
    fn test_countdown_pause_when_stopped_is_noop() {
        let mut countdown = Countdown::default();
        countdown.pause();
        assert!(!countdown.is_paused());
        countdown.stop();
        countdown.stop();
        assert!(!countdown.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_runs_to_completion() {
        let (mut clock, seen) = recording_clock();
        let run = clock.start(5);

        tokio::time::sleep(Duration::from_secs(10)).await;

        let seen = seen.lock().unwrap().clone();
        let ticks: Vec<u32> = seen
            .iter()
            .filter_map(|s| match s {
                ClockSignal::Tick { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![4, 3, 2, 1, 0]);
        assert_eq!(seen.iter().filter(|s| matches!(s, ClockSignal::Completed { .. })).count(), 1);
        assert_eq!(seen.last(), Some(&ClockSignal::Completed { run }));
        assert!(!clock.is_running());
        assert_eq!(clock.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_clock_does_not_tick() {
        let (mut clock, seen) = recording_clock();
        clock.start(5);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        clock.pause();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(clock.remaining(), 4);
        assert_eq!(seen.lock().unwrap().len(), 1);

        clock.resume();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(clock.remaining(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_countdown() {
        let (mut clock, seen) = recording_clock();
        let first = clock.start(3);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let second = clock.start(10);
        tokio::time::sleep(Duration::from_millis(3200)).await;

        let seen = seen.lock().unwrap().clone();
        assert!(second > first);
        assert!(seen.iter().all(|s| match s {
            ClockSignal::Tick { run, .. } | ClockSignal::Completed { run } => *run == first || *run == second,
        }));
        assert!(!seen.iter().any(|s| *s == ClockSignal::Completed { run: first }));
        assert_eq!(clock.remaining(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_halts_ticks() {
        let (mut clock, seen) = recording_clock();
        clock.start(5);
        clock.stop();
        clock.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert!(!clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_clock_still_completes() {
        let seen = Arc::new(Mutex::new(Vec::<ClockSignal>::new()));
        let sink = seen.clone();
        let mut clock = RoundClock::new(
            Duration::ZERO,
            Arc::new(move |signal: ClockSignal| sink.lock().unwrap().push(signal)),
        );
        let run = clock.start(3);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(seen.lock().unwrap().last(), Some(&ClockSignal::Completed { run }));
        assert!(!clock.is_running());
    }
}
