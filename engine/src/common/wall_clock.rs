// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Wall-clock helpers. The engine timestamps every admitted request and prints
//! times in its console lines as unix seconds, which is also the ordering key
//! of the alarm table.

use chrono::{DateTime, Local};

/// Unix time in whole seconds. Negative values cannot occur on any supported
/// platform, so the engine stores time as `u64`.
pub type UnixSeconds = u64;

/// Current wall-clock time as unix seconds.
#[must_use]
pub fn now_unix() -> UnixSeconds {
    let now = Local::now().timestamp();
    // timestamp() is negative only before 1970.
    u64::try_from(now).unwrap_or(0)
}

/// Render a unix-seconds timestamp as local `HH:MM:SS` for tracing output.
/// The console protocol lines use the raw seconds value, not this.
#[must_use]
pub fn fmt_unix(seconds: UnixSeconds) -> String {
    match DateTime::from_timestamp(i64::try_from(seconds).unwrap_or(0), 0) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => seconds.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2024() {
        // 2024-01-01T00:00:00Z.
        assert!(now_unix() > 1_704_067_200);
    }

    #[test]
    fn fmt_unix_renders_something() {
        let rendered = fmt_unix(now_unix());
        assert_eq!(rendered.len(), 8);
        assert!(rendered.contains(':'));
    }
}
