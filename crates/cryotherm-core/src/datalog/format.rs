//! Save file layout
//!
//! ```text
//! # filename=Temp_evo_save_2024_03_01
//! #time_start_date=2024-03-01_10:00:00, time_start_epoch=1709287200
//! #time\tBoite_Mel(R)\tBoite_Mel(T)\ttime\tBouilleur(R)\tBouilleur(T)\t
//! 2024-03-01_10:00:00:000\t1234.5\t0.05\t2024-03-01_10:00:00:012\t...
//! ```
//!
//! One row per buffer slot, three columns per probe. Unfilled slots are
//! written as `None`. Each block ends with an empty line. Numbers use the
//! shortest round-trip form older files were written with: `100.0`,
//! `1e-05`, `nan`.

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, TimeZone, Utc};

use crate::monitor::{epoch_seconds, ProbeState};

/// Epoch seconds as `YYYY-MM-DD_hh:mm:ss:mmm` in `tz`
pub fn format_epoch<Tz>(epoch: f64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if !epoch.is_finite() {
        return None;
    }
    let millis = (epoch * 1000.0).round() as i64;
    let time = DateTime::from_timestamp_millis(millis)?.with_timezone(tz);
    Some(time.format("%Y-%m-%d_%H:%M:%S:%3f").to_string())
}

/// `value` in the shortest form that reads back exactly, as `100.0`,
/// `0.05`, `1e-05`, `1e+16`, `nan` or `inf`
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    // Debug switches to exponent form below 1e-4 and from 1e16 on
    let shortest = format!("{value:?}");
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => shortest,
    }
}

/// Header written when a save file is created
pub fn write_header<W, Tz>(
    out: &mut W,
    file_name: &str,
    started_at: DateTime<Utc>,
    tz: &Tz,
    probes: &[ProbeState],
) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let start = started_at.with_timezone(tz).format("%Y-%m-%d_%H:%M:%S");
    writeln!(out, "# filename={file_name}")?;
    writeln!(
        out,
        "#time_start_date={start}, time_start_epoch={}",
        format_float(epoch_seconds(started_at))
    )?;
    write!(out, "#")?;
    for probe in probes {
        let name = probe.config().column_name();
        write!(out, "time\t{name}(R)\t{name}(T)\t")?;
    }
    writeln!(out)
}

/// Every buffer slot of every probe, followed by an empty line
pub fn write_rows<W, Tz>(out: &mut W, tz: &Tz, probes: &[ProbeState]) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let rows = probes.iter().map(|p| p.samples().len()).max().unwrap_or(0);
    let columns: Vec<Vec<_>> = probes.iter().map(|p| p.samples().rows().collect()).collect();

    for j in 0..rows {
        for column in &columns {
            let (time, resistance, temperature) = column.get(j).copied().unwrap_or((None, None, None));
            let date = time.and_then(|t| format_epoch(t, tz));
            write!(
                out,
                "{}\t{}\t{}\t",
                Slot(date),
                Slot(resistance.map(format_float)),
                Slot(temperature.map(format_float))
            )?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

/// Value or `None`
struct Slot<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("None"),
        }
    }
}
