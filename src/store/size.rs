//! Human-readable byte counts

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// Format a byte count using whole units (e.g., "3 MB")
///
/// Sizes are truncated to the largest unit they fill, so 1.9 MB reads as
/// "1 MB". Reclaimed-space summaries only need an order of magnitude.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= TB {
        format!("{} TB", bytes / TB)
    } else if bytes >= GB {
        format!("{} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}
