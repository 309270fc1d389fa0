use chrono::{DateTime, Utc};

pub const LABEL_PREFIX: &str = "fxa-latest";

/// `fxa-latest-YYYY-MM-DD-HH:MM-<first 7 chars of the git hash>`, in UTC.
pub fn run_label(now: DateTime<Utc>, git_hash: &str) -> String {
    let short: String = git_hash.chars().take(7).collect();
    format!("{}-{}-{}", LABEL_PREFIX, now.format("%Y-%m-%d-%H:%M"), short)
}
