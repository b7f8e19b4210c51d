// src/proctor.rs

//! Two-track violation counting for proctored exam sessions.
//!
//! Violations are split into a "general" track (tool use: devtools,
//! copy/paste, context menu, drag-drop, leaving the tab) and a "fullscreen"
//! track (leaving fullscreen). Each track walks
//! `Clean -> Warned(1) -> Warned(2) -> Terminated` independently; the general
//! track tolerates two warnings before terminating, the fullscreen track one.
//! Either track reaching its cap terminates the whole session, and the
//! terminal verdict is produced exactly once.
//!
//! Debouncing compares the incoming event timestamp against the track's last
//! accepted event rather than arming a timer, so a single user action that
//! fans out into several listener events within the window counts once.

use chrono::{DateTime, Duration, Utc};

pub const GENERAL_LIMIT: u8 = 3;
pub const FULLSCREEN_LIMIT: u8 = 2;

/// Violation categories a monitored event can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    DevTools,
    CopyPaste,
    ContextMenu,
    DragDrop,
    TabBlur,
    FullscreenExit,
}

impl Violation {
    pub fn track(self) -> Track {
        match self {
            Violation::FullscreenExit => Track::Fullscreen,
            _ => Track::General,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Violation::DevTools => "Developer tools opened",
            Violation::CopyPaste => "Copy/paste detected",
            Violation::ContextMenu => "Context menu opened",
            Violation::DragDrop => "Drag and drop detected",
            Violation::TabBlur => "Left the exam tab or window",
            Violation::FullscreenExit => "Exited fullscreen mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    General,
    Fullscreen,
}

impl Track {
    pub fn limit(self) -> u8 {
        match self {
            Track::General => GENERAL_LIMIT,
            Track::Fullscreen => FULLSCREEN_LIMIT,
        }
    }
}

/// Outcome of feeding one event into the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Counted, below the track cap: warn only.
    Warned {
        track: Track,
        count: u8,
        limit: u8,
        reason: String,
    },
    /// The track cap was reached. Produced exactly once per monitor.
    Terminated { reason: String },
    /// Suppressed: within the debounce window of the previous event on the
    /// same track.
    Debounced,
    /// Suppressed: the monitor already terminated.
    Ignored,
}

#[derive(Debug, Clone)]
struct TrackState {
    count: u8,
    last_event: Option<DateTime<Utc>>,
}

impl TrackState {
    fn new() -> Self {
        Self {
            count: 0,
            last_event: None,
        }
    }
}

/// Per-session violation counters.
///
/// Pure state machine: the caller supplies event timestamps and performs all
/// side effects (toasts, cheat reports) based on the returned verdict. Fresh
/// per session; nothing persists across sessions.
#[derive(Debug, Clone)]
pub struct CheatMonitor {
    general: TrackState,
    fullscreen: TrackState,
    reasons: Vec<String>,
    terminated: bool,
    debounce: Duration,
}

impl Default for CheatMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl CheatMonitor {
    pub fn new() -> Self {
        Self::with_debounce(Duration::seconds(1))
    }

    pub fn with_debounce(window: Duration) -> Self {
        Self {
            general: TrackState::new(),
            fullscreen: TrackState::new(),
            reasons: Vec::new(),
            terminated: false,
            debounce: window,
        }
    }

    /// Feeds one classified event into the monitor.
    pub fn observe(&mut self, violation: Violation, at: DateTime<Utc>) -> Verdict {
        if self.terminated {
            return Verdict::Ignored;
        }

        let track = violation.track();
        let debounce = self.debounce;
        let state = match track {
            Track::General => &mut self.general,
            Track::Fullscreen => &mut self.fullscreen,
        };

        // Monotonic comparison; a clock step backwards lands inside the
        // window and is treated as the same user action.
        if let Some(last) = state.last_event {
            if at.signed_duration_since(last) < debounce {
                return Verdict::Debounced;
            }
        }

        state.last_event = Some(at);
        state.count += 1;
        let reason = violation.describe().to_string();
        self.reasons.push(reason.clone());

        if state.count >= track.limit() {
            self.terminated = true;
            Verdict::Terminated { reason }
        } else {
            Verdict::Warned {
                track,
                count: state.count,
                limit: track.limit(),
                reason,
            }
        }
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Ordered human-readable reasons, one per accepted violation.
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn counts(&self) -> (u8, u8) {
        (self.general.count, self.fullscreen.count)
    }
}

/// Maps a reported activity string onto a violation category.
///
/// Returns `None` for benign activity (answer saved, heartbeat, ...), which
/// is logged but never counted.
pub fn classify_activity(activity: &str) -> Option<Violation> {
    let activity = activity.to_lowercase();
    if activity.contains("fullscreen") {
        Some(Violation::FullscreenExit)
    } else if activity.contains("devtools") || activity.contains("dev-tools") {
        Some(Violation::DevTools)
    } else if activity.contains("copy") || activity.contains("paste") || activity.contains("cut") {
        Some(Violation::CopyPaste)
    } else if activity.contains("contextmenu") || activity.contains("context-menu") {
        Some(Violation::ContextMenu)
    } else if activity.contains("drag") || activity.contains("drop") {
        Some(Violation::DragDrop)
    } else if activity.contains("blur")
        || activity.contains("tab-switch")
        || activity.contains("visibility")
    {
        Some(Violation::TabBlur)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
        base + Duration::seconds(secs)
    }

    #[test]
    fn general_track_warns_twice_then_terminates_once() {
        let base = Utc::now();
        let mut monitor = CheatMonitor::new();

        let first = monitor.observe(Violation::TabBlur, at(base, 0));
        assert!(matches!(first, Verdict::Warned { count: 1, .. }));

        let second = monitor.observe(Violation::CopyPaste, at(base, 2));
        assert!(matches!(second, Verdict::Warned { count: 2, .. }));

        let third = monitor.observe(Violation::DevTools, at(base, 4));
        assert!(matches!(third, Verdict::Terminated { .. }));
        assert!(monitor.terminated());

        // Nothing after termination produces another report.
        let fourth = monitor.observe(Violation::TabBlur, at(base, 6));
        assert_eq!(fourth, Verdict::Ignored);
    }

    #[test]
    fn fullscreen_track_warns_once_then_terminates() {
        let base = Utc::now();
        let mut monitor = CheatMonitor::new();

        let first = monitor.observe(Violation::FullscreenExit, at(base, 0));
        assert!(matches!(
            first,
            Verdict::Warned {
                track: Track::Fullscreen,
                count: 1,
                limit: FULLSCREEN_LIMIT,
                ..
            }
        ));

        let second = monitor.observe(Violation::FullscreenExit, at(base, 2));
        assert!(matches!(second, Verdict::Terminated { .. }));
    }

    #[test]
    fn events_inside_debounce_window_count_once() {
        let base = Utc::now();
        let mut monitor = CheatMonitor::new();

        assert!(matches!(
            monitor.observe(Violation::TabBlur, base),
            Verdict::Warned { count: 1, .. }
        ));
        // A single blur firing multiple listeners within the same second.
        assert_eq!(
            monitor.observe(Violation::TabBlur, base + Duration::milliseconds(300)),
            Verdict::Debounced
        );
        assert_eq!(
            monitor.observe(Violation::CopyPaste, base + Duration::milliseconds(900)),
            Verdict::Debounced
        );
        assert_eq!(monitor.counts().0, 1);
    }

    #[test]
    fn debounce_cannot_produce_duplicate_terminal_verdicts() {
        let base = Utc::now();
        let mut monitor = CheatMonitor::new();

        monitor.observe(Violation::FullscreenExit, at(base, 0));
        let terminal = monitor.observe(Violation::FullscreenExit, at(base, 2));
        assert!(matches!(terminal, Verdict::Terminated { .. }));

        // Burst of trailing events, inside and outside the window.
        assert_eq!(
            monitor.observe(Violation::FullscreenExit, base + Duration::milliseconds(2100)),
            Verdict::Ignored
        );
        assert_eq!(
            monitor.observe(Violation::FullscreenExit, at(base, 10)),
            Verdict::Ignored
        );
    }

    #[test]
    fn tracks_count_independently() {
        let base = Utc::now();
        let mut monitor = CheatMonitor::new();

        monitor.observe(Violation::TabBlur, at(base, 0));
        monitor.observe(Violation::FullscreenExit, at(base, 0));
        monitor.observe(Violation::CopyPaste, at(base, 2));

        assert_eq!(monitor.counts(), (2, 1));
        assert!(!monitor.terminated());
        assert_eq!(monitor.reasons().len(), 3);
    }

    #[test]
    fn clock_regression_is_treated_as_same_action() {
        let base = Utc::now();
        let mut monitor = CheatMonitor::new();

        monitor.observe(Violation::TabBlur, at(base, 10));
        assert_eq!(
            monitor.observe(Violation::TabBlur, at(base, 9)),
            Verdict::Debounced
        );
    }

    #[test]
    fn classification_maps_known_activities() {
        assert_eq!(
            classify_activity("fullscreen-exit"),
            Some(Violation::FullscreenExit)
        );
        assert_eq!(classify_activity("tab-blur"), Some(Violation::TabBlur));
        assert_eq!(
            classify_activity("visibilitychange"),
            Some(Violation::TabBlur)
        );
        assert_eq!(classify_activity("devtools-open"), Some(Violation::DevTools));
        assert_eq!(classify_activity("paste"), Some(Violation::CopyPaste));
        assert_eq!(
            classify_activity("contextmenu"),
            Some(Violation::ContextMenu)
        );
        assert_eq!(classify_activity("drag-drop"), Some(Violation::DragDrop));
        assert_eq!(classify_activity("answer-saved"), None);
        assert_eq!(classify_activity("heartbeat"), None);
    }
}
