//! ``src/util/humanize.rs``

/// Formats a byte count for the size column: 1024-based, two decimals,
/// capped at terabytes.
#[must_use]
pub fn human_readable_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value: f64 = size as f64;
    let mut unit_idx: usize = 0;

    while value >= 1024.0 && unit_idx < UNITS.len() - 1 {
        value /= 1024.0;
        unit_idx += 1;
    }

    format!("{value:.2} {}", UNITS[unit_idx])
}
