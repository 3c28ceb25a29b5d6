// src/constants.rs

use std::time::Duration;

/// Minimum username length for registration
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum password length for registration and password changes
pub const MIN_PASSWORD_LEN: usize = 6;

/// Number of historical days shown alongside today in the bar chart
pub const HISTORY_DAYS: usize = 6;

/// Usage tracker tick period (one second of foreground time per tick)
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);
