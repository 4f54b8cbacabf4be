//! Terminal output helpers for the zsession CLI

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use zsession_codec::{frame_dictionary_id, inspect, skippable_records, FrameHeader};

/// Create a byte progress bar, or nothing in quiet mode
pub fn create_progress_bar(quiet: bool, total: u64) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Print the outcome of a compress or decompress run
pub fn print_transfer(action: &str, output: &Path, bytes_in: u64, bytes_out: u64, elapsed: Duration) {
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        action,
        style(output.display()).cyan()
    );
    println!("  Input: {}", style(format_bytes(bytes_in)).green());
    println!("  Output: {}", style(format_bytes(bytes_out)).green());
    if bytes_out > 0 {
        println!(
            "  Ratio: {}",
            style(format!("{:.2}x", bytes_in as f64 / bytes_out as f64)).blue()
        );
    }
    println!("  Duration: {}", style(format_duration(elapsed)).blue());
}

/// Print what the headers at the start of `bytes` say
pub fn print_inspection(path: &Path, bytes: &[u8]) {
    println!(
        "{} {}",
        style("🔍").blue().bold(),
        style(path.display()).bold().underlined()
    );

    let mut records = skippable_records(bytes);
    for (index, record) in records.by_ref().enumerate() {
        match record {
            Ok(record) => println!(
                "  Skippable record #{}: variant {}, {}",
                index,
                style(record.variant.get()).cyan(),
                style(format_bytes(record.payload.len() as u64)).green()
            ),
            Err(error) => println!("  {} {}", style("Truncated record:").red(), error),
        }
    }

    let rest = bytes.get(records.offset()..).unwrap_or_default();
    println!("  Header: {}", style(describe_header(inspect(rest))).cyan());

    if matches!(inspect(rest), FrameHeader::KnownSize(_) | FrameHeader::UnknownSize) {
        match frame_dictionary_id(rest) {
            0 => println!("  Dictionary: {}", style("none").dim()),
            id => println!("  Dictionary ID: {}", style(id).yellow()),
        }
    }
}

/// One-line description of a frame header
pub fn describe_header(header: FrameHeader) -> String {
    match header {
        FrameHeader::KnownSize(size) => format!("zstd frame, content size {}", format_bytes(size)),
        FrameHeader::UnknownSize => "zstd frame, content size not declared".to_string(),
        FrameHeader::Skippable(len) => format!("skippable record, {} payload", format_bytes(u64::from(len))),
        FrameHeader::NotAFrame => "not compressed by zstd".to_string(),
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
