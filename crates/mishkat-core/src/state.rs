//! Viewer lifecycle state and load session liveness

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::viewer::ViewerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Loading,
    Complete,
    Error,
}

/// Notification the host forwards to the page's callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Progress(f32),
    Loaded,
    Failed(String),
}

/// Why the model load failed, as shown in the error panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Short headline, e.g. "Unsupported format"
    pub title: String,
    pub message: String,
}

/// Whether the platform should enter or leave fullscreen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenRequest {
    Enter,
    Exit,
}

/// Mutable viewer state for one mount
///
/// Stage only moves forward out of `Loading`, so exactly one of `Loaded` or
/// `Failed` is ever emitted. Progress never decreases.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    stage: LoadStage,
    progress: f32,
    failure: Option<LoadFailure>,
    pub is_auto_rotating: bool,
    pub is_fullscreen: bool,
    pub hdri_enabled: bool,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            stage: LoadStage::Loading,
            progress: 0.0,
            failure: None,
            is_auto_rotating: config.auto_rotate,
            is_fullscreen: false,
            hdri_enabled: config.enable_hdri,
        }
    }

    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    pub fn is_loading(&self) -> bool {
        self.stage == LoadStage::Loading
    }

    /// Percent in `0..=100`
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        self.failure.as_ref()
    }

    /// Record download progress; stale, backwards or post-terminal reports
    /// are dropped
    pub fn report_progress(&mut self, percent: f32) -> Option<ViewerEvent> {
        if !self.is_loading() || !percent.is_finite() {
            return None;
        }
        let percent = percent.clamp(0.0, 100.0);
        if percent <= self.progress {
            return None;
        }
        self.progress = percent;
        Some(ViewerEvent::Progress(percent))
    }

    pub fn complete(&mut self) -> Option<ViewerEvent> {
        if !self.is_loading() {
            return None;
        }
        self.stage = LoadStage::Complete;
        self.progress = 100.0;
        Some(ViewerEvent::Loaded)
    }

    pub fn fail(&mut self, title: impl Into<String>, message: impl Into<String>) -> Option<ViewerEvent> {
        if !self.is_loading() {
            return None;
        }
        let message = message.into();
        self.stage = LoadStage::Error;
        self.failure = Some(LoadFailure {
            title: title.into(),
            message: message.clone(),
        });
        Some(ViewerEvent::Failed(message))
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.is_auto_rotating = !self.is_auto_rotating;
        self.is_auto_rotating
    }

    pub fn toggle_hdri(&mut self) -> bool {
        self.hdri_enabled = !self.hdri_enabled;
        self.hdri_enabled
    }

    /// What the fullscreen button should ask the platform for
    ///
    /// The flag itself only changes through [`ViewerState::sync_fullscreen`],
    /// since the user can also leave fullscreen outside the viewer.
    pub fn fullscreen_request(&self) -> FullscreenRequest {
        if self.is_fullscreen {
            FullscreenRequest::Exit
        } else {
            FullscreenRequest::Enter
        }
    }

    /// Mirror the platform's fullscreen status; returns whether it changed
    pub fn sync_fullscreen(&mut self, active: bool) -> bool {
        let changed = self.is_fullscreen != active;
        self.is_fullscreen = active;
        changed
    }
}

/// Liveness for asynchronous loads started by one viewer mount
///
/// Every load takes a ticket. Starting a newer load or unmounting the viewer
/// makes older tickets stale, and stale results must be discarded.
#[derive(Debug, Clone, Default)]
pub struct ViewerSession {
    generation: Arc<AtomicU64>,
    unmounted: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    current: Arc<AtomicU64>,
    unmounted: Arc<AtomicBool>,
}

impl ViewerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        LoadTicket {
            generation,
            current: self.generation.clone(),
            unmounted: self.unmounted.clone(),
        }
    }

    pub fn unmount(&self) {
        self.unmounted.store(true, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        !self.unmounted.load(Ordering::SeqCst)
    }
}

impl LoadTicket {
    pub fn is_live(&self) -> bool {
        !self.unmounted.load(Ordering::SeqCst)
            && self.current.load(Ordering::SeqCst) == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ViewerState {
        ViewerState::new(&ViewerConfig::new("/models/a.glb", "glb"))
    }

    #[test]
    fn test_initial_state() {
        let mut config = ViewerConfig::new("/models/a.glb", "glb");
        config.auto_rotate = true;
        config.enable_hdri = false;
        let s = ViewerState::new(&config);
        assert!(s.is_loading());
        assert_eq!(s.progress(), 0.0);
        assert!(s.is_auto_rotating);
        assert!(!s.hdri_enabled);
        assert!(!s.is_fullscreen);
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut s = state();
        assert_eq!(s.report_progress(30.0), Some(ViewerEvent::Progress(30.0)));
        assert_eq!(s.report_progress(10.0), None);
        assert_eq!(s.progress(), 30.0);
        assert_eq!(s.report_progress(250.0), Some(ViewerEvent::Progress(100.0)));
        assert_eq!(s.report_progress(f32::NAN), None);
    }

    #[test]
    fn test_exactly_one_terminal_event() {
        let mut s = state();
        assert_eq!(s.complete(), Some(ViewerEvent::Loaded));
        assert_eq!(s.fail("Failed to load model", "late"), None);
        assert_eq!(s.complete(), None);
        assert_eq!(s.report_progress(50.0), None);
        assert_eq!(s.stage(), LoadStage::Complete);
        assert_eq!(s.progress(), 100.0);
        assert!(s.error().is_none());

        let mut s = state();
        assert_eq!(
            s.fail("Empty model", "boom"),
            Some(ViewerEvent::Failed("boom".to_string()))
        );
        assert_eq!(s.complete(), None);
        assert_eq!(s.stage(), LoadStage::Error);
        assert_eq!(s.error(), Some("boom"));
        assert_eq!(s.failure().map(|f| f.title.as_str()), Some("Empty model"));
    }

    #[test]
    fn test_toggles() {
        let mut s = state();
        assert!(s.toggle_auto_rotate());
        assert!(!s.toggle_auto_rotate());
        assert!(!s.toggle_hdri());
        assert!(s.toggle_hdri());
    }

    #[test]
    fn test_fullscreen_follows_platform() {
        let mut s = state();
        assert_eq!(s.fullscreen_request(), FullscreenRequest::Enter);
        assert!(!s.is_fullscreen);
        assert!(s.sync_fullscreen(true));
        assert_eq!(s.fullscreen_request(), FullscreenRequest::Exit);
        // user pressed Escape
        assert!(s.sync_fullscreen(false));
        assert!(!s.sync_fullscreen(false));
        assert!(!s.is_fullscreen);
    }

    #[test]
    fn test_tickets() {
        let session = ViewerSession::new();
        let first = session.begin_load();
        assert!(first.is_live());
        let second = session.begin_load();
        assert!(!first.is_live());
        assert!(second.is_live());

        session.unmount();
        assert!(!session.is_mounted());
        assert!(!second.is_live());
    }
}
