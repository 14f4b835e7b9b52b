// Human readable formatting for byte counts and durations

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Formats a byte count using 1024-based units with one decimal place.
/// Gigabytes are the largest unit. Zero is shown as "N/A" since it means
/// the size could not be queried.
pub fn format_bytes(bytes: u64) -> String {
    let (unit, suffix) = match bytes {
        0 => return String::from("N/A"),
        b if b >= GB => (GB, "GB"),
        b if b >= MB => (MB, "MB"),
        b if b >= KB => (KB, "KB"),
        b => return format!("{} B", b),
    };
    format!("{:.1} {}", bytes as f64 / unit as f64, suffix)
}

/// Formats an uptime in seconds as "Nd Nh Nm", dropping leading zero units.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    match (days, hours) {
        (0, 0) => format!("{}m", minutes),
        (0, _) => format!("{}h {}m", hours, minutes),
        _ => format!("{}d {}h {}m", days, hours, minutes),
    }
}
