// Time label formatting

use std::time::Duration;

/// Text shown before any progress is known
pub const PLACEHOLDER_TIME_TEXT: &str = "--:--";

/// Format a duration as `MM:SS`, or `H:MM:SS` once it reaches an hour
pub fn duration_text(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Remaining time label, rounded to whole seconds
pub fn remaining_text(duration: Duration, position: Duration) -> String {
    let remaining = duration.saturating_sub(position).as_secs_f64().round();
    duration_text(Duration::from_secs(remaining as u64))
}

/// Slider value for `position` within `duration`, clamped to [0, 1]
pub fn progress_fraction(position: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 0.0;
    }
    (position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_text() {
        assert_eq!(duration_text(Duration::ZERO), "00:00");
        assert_eq!(duration_text(Duration::from_secs(75)), "01:15");
        assert_eq!(duration_text(Duration::from_millis(59_999)), "00:59");
        assert_eq!(duration_text(Duration::from_secs(3600 + 62)), "1:01:02");
    }

    #[test]
    fn test_remaining_text_rounds() {
        let duration = Duration::from_secs(10);
        assert_eq!(remaining_text(duration, Duration::from_millis(250)), "00:10");
        assert_eq!(remaining_text(duration, Duration::from_millis(2600)), "00:07");
        assert_eq!(remaining_text(duration, Duration::from_secs(12)), "00:00");
    }

    #[test]
    fn test_progress_fraction() {
        let duration = Duration::from_secs(8);
        assert_eq!(progress_fraction(Duration::from_secs(2), duration), 0.25);
        assert_eq!(progress_fraction(Duration::from_secs(9), duration), 1.0);
        assert_eq!(progress_fraction(Duration::from_secs(1), Duration::ZERO), 0.0);
    }
}
