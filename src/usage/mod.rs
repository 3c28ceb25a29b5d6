//! Foreground usage tracking for "today", bucketed by time of day, with
//! two derived chart views (a 7-day bar series and a bucket-share pie
//! series) that are always mutually consistent.
//!
//! All counters live in memory for the lifetime of the process; nothing
//! here persists or fails.

use crate::constants::{HISTORY_DAYS, TICK_INTERVAL};
use chrono::{Datelike, Local, Timelike};
use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Fixed time-of-day buckets partitioning the 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub const ALL: [Self; 4] = [Self::Night, Self::Morning, Self::Afternoon, Self::Evening];

    /// Bucket for a wall-clock hour. Half-open partition: [0,6) Night,
    /// [6,12) Morning, [12,18) Afternoon, [18,24) Evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Night,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Night => "Night",
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Night => 0,
            Self::Morning => 1,
            Self::Afternoon => 2,
            Self::Evening => 3,
        }
    }
}

/// One bar of the daily-usage chart: day 0..=5 are the historical days
/// (oldest first), day 6 is today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarEntry {
    pub day: usize,
    pub minutes: f32,
}

/// One slice of the time-of-day pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieEntry {
    pub label: &'static str,
    pub minutes: f32,
}

/// Demo history: total minutes for the six days before today, oldest
/// first.
pub const DEFAULT_DAILY_HISTORY: [f32; HISTORY_DAYS] = [65.0, 45.0, 90.0, 30.0, 70.0, 120.0];

/// Demo history: average minutes per time-of-day bucket, in
/// `TimeOfDay::ALL` order.
pub const DEFAULT_BUCKET_HISTORY: [f32; 4] = [30.0, 120.0, 90.0, 180.0];

/// Counters plus the derived views. Both views are recomputed inside the
/// same lock acquisition that applies a tick, so a reader never observes
/// the total updated without its bucket (or either view stale relative to
/// the other).
#[derive(Debug, Clone)]
pub struct UsageStats {
    daily_history: [f32; HISTORY_DAYS],
    bucket_history: [f32; 4],
    today_total_secs: i64,
    today_bucket_secs: [i64; 4],
    bar: Vec<BarEntry>,
    pie: Vec<PieEntry>,
}

impl Default for UsageStats {
    fn default() -> Self {
        Self::with_history(DEFAULT_DAILY_HISTORY, DEFAULT_BUCKET_HISTORY)
    }
}

impl UsageStats {
    pub fn with_history(daily_history: [f32; HISTORY_DAYS], bucket_history: [f32; 4]) -> Self {
        let mut stats = Self {
            daily_history,
            bucket_history,
            today_total_secs: 0,
            today_bucket_secs: [0; 4],
            bar: Vec::new(),
            pie: Vec::new(),
        };
        stats.rebuild_views();
        stats
    }

    /// Record one second of foreground time against the bucket for `hour`,
    /// then recompute both views.
    pub fn record_second(&mut self, hour: u32) {
        self.today_total_secs += 1;
        self.today_bucket_secs[TimeOfDay::from_hour(hour).index()] += 1;
        self.rebuild_views();
    }

    pub fn today_total_secs(&self) -> i64 {
        self.today_total_secs
    }

    pub fn today_bucket_secs(&self, bucket: TimeOfDay) -> i64 {
        self.today_bucket_secs[bucket.index()]
    }

    pub fn bar_view(&self) -> &[BarEntry] {
        &self.bar
    }

    pub fn pie_view(&self) -> &[PieEntry] {
        &self.pie
    }

    fn rebuild_views(&mut self) {
        // Bar: six historical days, then today. Today's seconds convert to
        // whole minutes, floor toward zero — the first 59 seconds show 0.
        self.bar = self
            .daily_history
            .iter()
            .enumerate()
            .map(|(day, &minutes)| BarEntry { day, minutes })
            .collect();
        #[allow(clippy::cast_precision_loss, reason = "today's minutes stay far below 2^24")]
        let today_minutes = (self.today_total_secs / 60) as f32;
        self.bar.push(BarEntry {
            day: HISTORY_DAYS,
            minutes: today_minutes,
        });

        // Pie: one slice per bucket with any combined usage; zero-valued
        // buckets are omitted entirely, not drawn as empty slices.
        self.pie = TimeOfDay::ALL
            .iter()
            .filter_map(|&bucket| {
                #[allow(clippy::cast_precision_loss, reason = "same bound as above")]
                let today = self.today_bucket_secs[bucket.index()] as f32 / 60.0;
                let combined = self.bucket_history[bucket.index()] + today;
                (combined > 0.0).then(|| PieEntry {
                    label: bucket.label(),
                    minutes: combined,
                })
            })
            .collect();
    }
}

/// "M/D" labels for the six historical bar-chart days, followed by
/// "Today".
pub fn day_labels() -> Vec<String> {
    let today = Local::now().date_naive();
    let mut labels: Vec<String> = (1..=HISTORY_DAYS)
        .rev()
        .map(|back| {
            let date = today - chrono::Days::new(back as u64);
            format!("{}/{}", date.month(), date.day())
        })
        .collect();
    labels.push("Today".to_string());
    labels
}

pub struct UsageConfig {
    pub tick_interval: Duration,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
        }
    }
}

/// Accumulates elapsed foreground time on a background thread, one tick
/// per second. `start` and `stop` are both idempotent.
pub struct UsageTracker {
    config: UsageConfig,
    stats: Arc<Mutex<UsageStats>>,
    running: Arc<AtomicBool>,
    stop_tx: Mutex<Option<mpsc::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UsageTracker {
    pub fn new(config: UsageConfig) -> Self {
        Self::with_stats(config, UsageStats::default())
    }

    pub fn with_stats(config: UsageConfig, stats: UsageStats) -> Self {
        Self {
            config,
            stats: Arc::new(Mutex::new(stats)),
            running: Arc::new(AtomicBool::new(false)),
            stop_tx: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Begin ticking. A no-op if the tracker is already running; the check
    /// is the running flag, not thread identity.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("usage tracker already running, start ignored");
            return;
        }
        info!("usage tracker started");

        let (tx, rx) = mpsc::channel();
        let stats = Arc::clone(&self.stats);
        let running = Arc::clone(&self.running);
        let interval = self.config.tick_interval;

        let handle = thread::spawn(move || {
            loop {
                match rx.recv_timeout(interval) {
                    // The sender only ever disconnects; either way, stop
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let hour = Local::now().hour();
                match stats.lock() {
                    Ok(mut stats) => stats.record_second(hour),
                    Err(poisoned) => poisoned.into_inner().record_second(hour),
                }
            }
        });

        *lock_ignore_poison(&self.stop_tx) = Some(tx);
        *lock_ignore_poison(&self.handle) = Some(handle);
    }

    /// Cancel the periodic tick. Dropping the sender wakes a pending tick
    /// wait immediately; the thread exits without applying a partial tick.
    /// Safe to call when not running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("usage tracker stopped");
        lock_ignore_poison(&self.stop_tx).take();
        if let Some(handle) = lock_ignore_poison(&self.handle).take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clone of the 7-point bar series.
    pub fn bar_chart(&self) -> Vec<BarEntry> {
        self.lock_stats().bar_view().to_vec()
    }

    /// Clone of the pie series (zero-valued buckets omitted).
    pub fn pie_chart(&self) -> Vec<PieEntry> {
        self.lock_stats().pie_view().to_vec()
    }

    pub fn today_total_secs(&self) -> i64 {
        self.lock_stats().today_total_secs()
    }

    fn lock_stats(&self) -> MutexGuard<'_, UsageStats> {
        lock_ignore_poison(&self.stats)
    }
}

impl Drop for UsageTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
