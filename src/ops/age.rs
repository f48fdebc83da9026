use chrono::{DateTime, Utc};

/// Short relative age of a timestamp, e.g. `5m ago`, `2d ago`, `Oct 11`.
///
/// Uses the absolute difference, so clock skew never produces "in 5m".
/// Anything 30 days or older shows month and day (UTC).
pub fn relative_age(created: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(*created).abs();
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 60 {
        if minutes <= 1 {
            "just now".to_string()
        } else {
            format!("{minutes}m ago")
        }
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if days < 30 {
        format!("{}w ago", days / 7)
    } else {
        created.format("%b %-d").to_string()
    }
}
