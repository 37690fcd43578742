//! Real-time countdowns on the background tick drivers.
//!
//! These use the system clock with short durations and generous upper
//! bounds so they stay reliable on loaded machines.

use std::time::{Duration, Instant};

use sprint_timer::clock::MonotonicClock;
use sprint_timer::timer::{
    CountdownEngine, ThreadTickDriver, TickOutcome, TimerError, TokioTickDriver,
};
use sprint_timer::types::{TimerConfig, TimerPhase};

const CADENCE: Duration = Duration::from_millis(20);

fn one_second() -> TimerConfig {
    TimerConfig::new(1).unwrap()
}

mod thread_driver {
    use super::*;

    fn run_blocking(engine: &mut CountdownEngine) -> (u32, usize) {
        let mut completions = 0;
        let mut duration = 0;
        let mut ticks = 0;
        while completions == 0 {
            ticks += 1;
            if let TickOutcome::Completed(c) = engine.next_tick_blocking() {
                completions += 1;
                duration = c.duration_seconds;
            }
            assert!(engine.remaining_seconds() >= 0.0);
        }
        (duration, ticks)
    }

    #[test]
    fn test_completes_after_duration() {
        let mut engine = CountdownEngine::threaded(one_second(), CADENCE);
        let started = Instant::now();
        engine.start().unwrap();

        let (duration, ticks) = run_blocking(&mut engine);

        assert_eq!(duration, 1);
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(ticks > 1);
        assert_eq!(engine.phase(), TimerPhase::Completed);
    }

    #[test]
    fn test_pause_gap_is_not_counted() {
        let mut engine = CountdownEngine::new(
            one_second(),
            MonotonicClock,
            ThreadTickDriver::new(CADENCE),
        );
        let started = Instant::now();
        engine.start().unwrap();
        std::thread::sleep(Duration::from_millis(300));
        engine.pause();
        std::thread::sleep(Duration::from_millis(500));

        // Ticks queued before the pause are stale.
        assert!(engine
            .process_pending_ticks()
            .iter()
            .all(|o| *o == TickOutcome::Stale));

        engine.start().unwrap();
        run_blocking(&mut engine);

        assert!(started.elapsed() >= Duration::from_millis(1500));
        let running = engine.elapsed();
        assert!(running >= Duration::from_secs(1));
        assert!(running < Duration::from_millis(1400), "{:?}", running);
    }
}

mod tokio_driver {
    use super::*;

    #[tokio::test]
    async fn test_completes_after_duration() {
        let driver = TokioTickDriver::new(CADENCE).unwrap();
        let mut engine = CountdownEngine::new(one_second(), MonotonicClock, driver);
        let started = Instant::now();
        engine.start().unwrap();

        let completion = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(c) = engine.next_tick().await.completion() {
                    return c;
                }
            }
        })
        .await
        .expect("countdown should complete");

        assert_eq!(completion.duration_seconds, 1);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_ticks() {
        let driver = TokioTickDriver::new(CADENCE).unwrap();
        let mut engine = CountdownEngine::new(one_second(), MonotonicClock, driver);
        engine.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        engine.reset();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(engine
            .process_pending_ticks()
            .iter()
            .all(|o| *o == TickOutcome::Stale));
        assert_eq!(engine.remaining_seconds(), 1.0);
        assert_eq!(engine.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_requires_runtime() {
        let err = TokioTickDriver::new(CADENCE).unwrap_err();
        assert!(matches!(err, TimerError::DriverUnavailable(_)));
    }
}
