use std::env;

use anyhow::{Context, Result};
use cryotherm_core::conversion::{ConversionSettings, ProbeRegistry, ProbeType};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: convert_table <probe type> <R1> [R2 ...] [--above]");
        println!("Probe types: {:?}", ProbeType::SELECTABLE.map(|t| t.name()));
        return Ok(());
    }

    let probe_type: ProbeType = args[1].parse()?;
    let above = args.iter().any(|a| a == "--above");
    let resistances = args[2..]
        .iter()
        .filter(|a| a.as_str() != "--above")
        .map(|a| a.parse::<f64>().with_context(|| format!("not a resistance: {a}")))
        .collect::<Result<Vec<_>>>()?;

    let registry = ProbeRegistry::standard(&ConversionSettings::default())?;
    let temperatures = registry.convert_many(&resistances, probe_type, above)?;

    println!("{probe_type} ({})", if above { "> 70 K" } else { "< 70 K" });
    for (r, t) in resistances.iter().zip(&temperatures) {
        println!("  {r:>12.3} Ω  ->  {t:>12.5} K");
    }
    Ok(())
}
