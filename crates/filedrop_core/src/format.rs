const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count with decimal (1000-based) units and two decimals.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size > 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
