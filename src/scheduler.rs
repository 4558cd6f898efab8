// src/scheduler.rs
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::clock::Clock;
use crate::report::ExportSink;
use crate::rollover::RolloverOutcome;
use crate::store::KeyValueStore;
use crate::tracker::{DutyTracker, TickReport};

/// Drives the tracker on a fixed period until Ctrl-C or, when given,
/// `max_ticks` ticks. `on_tick` sees every successful tick. Returns the number
/// of ticks run.
pub async fn run_duty_ticker<S, E, C, F>(
    tracker: &mut DutyTracker<S, E, C>,
    period: Duration,
    max_ticks: Option<u64>,
    on_tick: F,
) -> u64
where
    S: KeyValueStore,
    E: ExportSink,
    C: Clock,
    F: FnMut(&TickReport),
{
    run_duty_ticker_until(tracker, period, max_ticks, tokio::signal::ctrl_c(), on_tick).await
}

/// Like [`run_duty_ticker`], stopping once `shutdown` completes. `shutdown` is
/// polled across ticks, so completion during a tick is not lost.
pub async fn run_duty_ticker_until<S, E, C, F, Q>(
    tracker: &mut DutyTracker<S, E, C>,
    period: Duration,
    max_ticks: Option<u64>,
    shutdown: Q,
    mut on_tick: F,
) -> u64
where
    S: KeyValueStore,
    E: ExportSink,
    C: Clock,
    F: FnMut(&TickReport),
    Q: Future,
{
    info!("Starting duty ticker (period {:?})", period);
    let mut ticker = interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: u64 = 0;
    tokio::pin!(shutdown);

    loop {
        if max_ticks.is_some_and(|limit| ticks >= limit) {
            info!("Duty ticker reached its limit of {} ticks", ticks);
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Shutdown requested, stopping duty ticker after {} ticks", ticks);
                break;
            }
        }
        ticks += 1;

        match tracker.tick() {
            Ok(report) => {
                if let RolloverOutcome::RolledOver { closed, opened, .. } = &report.rollover {
                    info!("Ticker observed rollover {} -> {}", closed, opened);
                }
                on_tick(&report);
            }
            Err(e) => error!("Tick {} failed: {}", ticks, e),
        }
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::models::{JobTitle, OnboardingInput};
    use crate::report::{MemoryExportSink, ReportLanguage};
    use crate::store::MemoryStore;
    use chrono::TimeDelta;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn ticker_stops_after_limit_and_rolls_over_once() {
        let clock = TestClock::new("2024-01-31 23:59:58").unwrap();
        let sink = MemoryExportSink::new();
        let mut tracker = DutyTracker::open(
            MemoryStore::new(),
            sink.clone(),
            clock.clone(),
            ReportLanguage::English,
        );
        tracker
            .onboard(OnboardingInput {
                name: "Rami".into(),
                job_title: JobTitle::Technician,
                start_date: "2024-01-01".into(),
            })
            .unwrap();

        let mut outcomes = Vec::new();
        let ticks = run_duty_ticker(&mut tracker, Duration::from_millis(1), Some(6), |report| {
            outcomes.push(report.rollover.clone());
            clock.advance(TimeDelta::seconds(1));
        })
        .await;

        assert_eq!(ticks, 6);
        assert!(matches!(outcomes[0], RolloverOutcome::Stamped { .. }));
        let rollovers = outcomes
            .iter()
            .filter(|o| matches!(o, RolloverOutcome::RolledOver { .. }))
            .count();
        assert_eq!(rollovers, 1);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test]
    async fn ticker_keeps_running_without_profile() {
        let mut tracker = DutyTracker::open(
            MemoryStore::new(),
            MemoryExportSink::new(),
            TestClock::new("2024-01-01 07:00:00").unwrap(),
            ReportLanguage::Arabic,
        );
        let mut seen = 0;
        let ticks = run_duty_ticker(&mut tracker, Duration::from_millis(1), Some(3), |report| {
            assert!(report.snapshot.is_none());
            assert_eq!(report.rollover, RolloverOutcome::NotOnboarded);
            seen += 1;
        })
        .await;
        assert_eq!(ticks, 3);
        assert_eq!(seen, 3);
    }

    #[tokio::test]
    async fn shutdown_during_a_tick_stops_the_ticker() {
        let mut tracker = DutyTracker::open(
            MemoryStore::new(),
            MemoryExportSink::new(),
            TestClock::new("2024-01-01 07:00:00").unwrap(),
            ReportLanguage::English,
        );
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut stop_tx = Some(stop_tx);
        let ticks = run_duty_ticker_until(
            &mut tracker,
            Duration::from_secs(3600),
            Some(50),
            stop_rx,
            |_| {
                // Fired while the first tick is still being handled.
                if let Some(tx) = stop_tx.take() {
                    tx.send(()).unwrap();
                }
            },
        )
        .await;
        assert_eq!(ticks, 1);
    }
}
