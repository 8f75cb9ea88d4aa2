//! Periodic measurement driver

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Monitor, MonitorError, TickReport};
use crate::protocol::ResistanceSource;

/// Monitor and source handed back by [`run_periodic`]
#[derive(Debug)]
pub struct PeriodicRun<S> {
    /// Monitor with every stored sample
    pub monitor: Monitor,
    /// Source the readings came from
    pub source: S,
    /// Ticks done
    pub ticks: u64,
}

/// Tick `monitor` every `period` until `cancel` fires
///
/// Reads block, so every tick runs on the blocking thread pool with the
/// monitor and source moved in and handed back afterwards. Probes not yet
/// read when `cancel` fires are reported as [`MonitorError::Interrupted`].
/// `on_tick` sees the monitor after each tick, e.g. to save when the report
/// says an auto-save is due.
pub async fn run_periodic<S, F>(
    mut monitor: Monitor,
    mut source: S,
    period: Duration,
    cancel: CancellationToken,
    mut on_tick: F,
) -> Result<PeriodicRun<S>, MonitorError>
where
    S: ResistanceSource + Send + 'static,
    F: FnMut(&mut Monitor, &TickReport),
{
    if period.is_zero() {
        return Err(MonitorError::InvalidSampleRate(f64::INFINITY));
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0u64;

    info!(period_ms = period.as_millis() as u64, "periodic measurement started");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let now = Utc::now();
                let stop = cancel.clone();
                let (m, s, report) = tokio::task::spawn_blocking(move || {
                    let report = monitor.tick_until(&mut source, now, || stop.is_cancelled());
                    (monitor, source, report)
                })
                .await
                .map_err(|e| MonitorError::TaskFailed(e.to_string()))?;
                monitor = m;
                source = s;
                ticks += 1;
                on_tick(&mut monitor, &report);
            }
        }
    }
    info!(ticks, "periodic measurement stopped");
    Ok(PeriodicRun {
        monitor,
        source,
        ticks,
    })
}

/// Span covered by a full buffer, as `HHhMMminSSs`
pub fn time_window(buffer_len: usize, sample_rate_hz: f64) -> String {
    let seconds = (buffer_len as f64 / sample_rate_hz).max(0.0);
    let total = if seconds.is_finite() { seconds as u64 } else { 0 };
    format!(
        "{:02}h{:02}min{:02}s",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_format() {
        assert_eq!(time_window(50, 1.0), "00h00min50s");
        assert_eq!(time_window(3725, 1.0), "01h02min05s");
        assert_eq!(time_window(100, 4.0), "00h00min25s");
        assert_eq!(time_window(100_000, 0.5), "55h33min20s");
    }
}
