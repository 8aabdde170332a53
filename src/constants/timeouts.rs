use std::time::Duration;

/// Prefix used for text commands unless COMMAND_PREFIX overrides it
pub const DEFAULT_COMMAND_PREFIX: &str = "-";

/// Longest timed mute accepted from a command (4 weeks)
pub const MAX_MUTE_MINUTES: u64 = 28 * 24 * 60;

/// Slowmode applied to the punishment channel created by /muterole
pub const MUTED_CHANNEL_SLOWMODE_SECONDS: u16 = 30;

/// Name of the punishment channel created by /muterole
pub const MUTED_CHANNEL_NAME: &str = "muted";

/// Convert a command's minute argument into a mute duration
pub fn mute_duration(minutes: Option<u64>) -> Option<Duration> {
    minutes
        .filter(|m| *m > 0)
        .map(|m| Duration::from_secs(m.min(MAX_MUTE_MINUTES) * 60))
}

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs < 60 {
        format!("{} second{}", total_secs, if total_secs == 1 { "" } else { "s" })
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        format!("{} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else if total_secs < 86400 {
        let hours = total_secs / 3600;
        format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = total_secs / 86400;
        format!("{} day{}", days, if days == 1 { "" } else { "s" })
    }
}

/// Format an optional mute duration, where `None` means indefinite
pub fn format_mute_length(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => format!("for {}", format_duration(d)),
        None => "indefinitely".to_string(),
    }
}
