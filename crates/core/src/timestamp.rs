// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ISO-8601 timestamp formatting for message subheaders
//! (`execute_request`/`apply_request` `started`/`completed` fields).

use chrono::Utc;

/// Render the current UTC time as `%Y-%m-%dT%H:%M:%S.%f`, the same format
/// the original kernel stamps `started`/`completed` subheader fields with.
pub fn now_iso8601() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_iso8601_has_expected_shape() {
        let ts = now_iso8601();
        // "YYYY-MM-DDTHH:MM:SS.ffffff"
        assert_eq!(ts.len(), 26);
        assert_eq!(ts.as_bytes()[4], b'-');
        assert_eq!(ts.as_bytes()[10], b'T');
        assert_eq!(ts.as_bytes()[19], b'.');
    }
}
