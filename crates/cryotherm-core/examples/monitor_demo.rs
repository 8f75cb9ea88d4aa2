use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use cryotherm_core::config::{IpTable, MonitorConfig, IP_TABLE_FILE};
use cryotherm_core::datalog::{SaveKind, SaveWriter};
use cryotherm_core::monitor::{run_periodic, time_window, ProbeOutcome};
use cryotherm_core::protocol::{MacrtClient, ResistanceSource, SimulatedSource};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let use_bridges = args.iter().any(|a| a == "--bridges");
    let config = match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    let table = if Path::new(IP_TABLE_FILE).is_file() {
        IpTable::load(IP_TABLE_FILE)?
    } else {
        IpTable::parse("IP1 = '192.168.1.101'\nIP3 = '192.168.1.103'\n")?
    };

    let (monitor, _) = config.build_monitor(&table)?;
    let source: Box<dyn ResistanceSource + Send> = if use_bridges {
        Box::new(MacrtClient::bind(config.macrt)?)
    } else {
        Box::new(SimulatedSource::from_entropy().with_dropout_rate(0.05))
    };
    let writer = SaveWriter::new(&config.save_directory).with_format(config.save_format);

    let settings = *monitor.settings();
    println!(
        "Monitoring {} probes at {} Hz, window {}",
        monitor.probes().len(),
        settings.sample_rate_hz,
        time_window(settings.buffer_len, settings.sample_rate_hz)
    );

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        stopper.cancel();
    });

    let period = Duration::from_secs_f64(1.0 / settings.sample_rate_hz);
    let run = run_periodic(monitor, source, period, cancel, |monitor, report| {
        for (id, outcome) in &report.outcomes {
            let Ok(probe) = monitor.probe(*id) else { continue };
            match outcome {
                ProbeOutcome::Measured(s) | ProbeOutcome::Reused(s) => println!(
                    "{:<14} {:>12.3} Ω {:>10.4} K",
                    probe.config().name,
                    s.resistance,
                    s.temperature
                ),
                ProbeOutcome::Skipped(err) => println!("{:<14} {err}", probe.config().name),
            }
        }
        if config.autosave && report.autosave_due {
            if let Err(err) = writer.save_now(monitor, SaveKind::Auto) {
                tracing::warn!(%err, "auto-save failed");
            }
        }
    })
    .await?;

    let path = writer.save_now(&run.monitor, SaveKind::Manual)?;
    println!("Saved to {}", path.display());
    Ok(())
}
