// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Owner identity for subscription keys.

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

/// Returns the owner to embed in subscription keys.
///
/// Resolution order:
/// 1. `--owner` flag
/// 2. `owner` from the config file
/// 3. Unix username from USER or LOGNAME env var
/// 4. Fallback to "feedwatch"
pub fn resolve_owner(flag: Option<&str>, configured: Option<&str>) -> String {
    [flag, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(get_unix_username)
        .unwrap_or_else(|| "feedwatch".to_string())
}

fn get_unix_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
