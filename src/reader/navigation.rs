//! Page navigation state
//!
//! Holds current page, zoom, rotation and pan for one open comic. All
//! mutation goes through [`NavigationState::apply`], which returns the
//! effects the shell has to carry out (re-render, progress sync, ...).
//! Out-of-range input is clamped, never rejected.

/// Zoom applied when a comic is opened and restored by a double-tap
pub const DEFAULT_ZOOM: f32 = 1.2;
pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.25;
/// Zoom a double-tap jumps to when not already zoomed in
pub const DOUBLE_TAP_ZOOM: f32 = 2.0;
/// Above this zoom a one-finger drag pans instead of swiping
pub const PAN_ZOOM_THRESHOLD: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Clamp a zoom factor into bounds; NaN/Inf fall back to the default.
pub fn clamp_zoom(factor: f32) -> f32 {
    if !factor.is_finite() {
        DEFAULT_ZOOM
    } else {
        factor.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Document loaded (or reloaded) with this many pages
    SetTotalPages(usize),
    /// Jump to a 1-based page, clamped to the document
    GoToPage(usize),
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    ZoomIn,
    ZoomOut,
    SetZoom(f32),
    /// Double-tap behaviour: zoom in to 2x, or back to default and recentre
    ToggleZoom,
    Rotate,
    PanTo { x: f32, y: f32 },
    /// Default zoom, no rotation, no pan
    ResetView,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// A committed page change; drives progress sync and page-change listeners
    PageChanged { from: usize, to: usize },
    ZoomChanged(f32),
    RotationChanged(Rotation),
    PanChanged { x: f32, y: f32 },
    RenderCurrentPage,
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    current_page: usize,
    total_pages: usize,
    zoom: f32,
    rotation: Rotation,
    pan: (f32, f32),
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            zoom: DEFAULT_ZOOM,
            rotation: Rotation::default(),
            pan: (0.0, 0.0),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn pan(&self) -> (f32, f32) {
        self.pan
    }

    pub fn has_document(&self) -> bool {
        self.total_pages > 0
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn is_last_page(&self) -> bool {
        self.has_document() && self.current_page >= self.total_pages
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetTotalPages(count) => {
                self.total_pages = count;
                self.current_page = self.current_page.clamp(1, count.max(1));
                vec![Effect::RenderCurrentPage]
            }

            Command::GoToPage(page) => self.go_to(page),
            Command::NextPage => self.go_to(self.current_page.saturating_add(1)),
            Command::PreviousPage => self.go_to(self.current_page.saturating_sub(1)),
            Command::FirstPage => self.go_to(1),
            Command::LastPage => self.go_to(self.total_pages),

            Command::ZoomIn => self.set_zoom(self.zoom + ZOOM_STEP),
            Command::ZoomOut => self.set_zoom(self.zoom - ZOOM_STEP),
            Command::SetZoom(factor) => self.set_zoom(factor),

            Command::ToggleZoom => {
                if self.zoom > DEFAULT_ZOOM {
                    let mut effects = self.set_zoom(DEFAULT_ZOOM);
                    effects.extend(self.reset_pan());
                    effects
                } else {
                    self.set_zoom(DOUBLE_TAP_ZOOM)
                }
            }

            Command::Rotate => {
                self.rotation = self.rotation.next();
                vec![
                    Effect::RotationChanged(self.rotation),
                    Effect::RenderCurrentPage,
                ]
            }

            Command::PanTo { x, y } => {
                if self.zoom <= PAN_ZOOM_THRESHOLD || !x.is_finite() || !y.is_finite() {
                    return vec![];
                }
                if self.pan == (x, y) {
                    return vec![];
                }
                self.pan = (x, y);
                vec![Effect::PanChanged { x, y }]
            }

            Command::ResetView => {
                let mut effects = self.set_zoom(DEFAULT_ZOOM);
                if self.rotation != Rotation::Deg0 {
                    self.rotation = Rotation::Deg0;
                    effects.push(Effect::RotationChanged(self.rotation));
                    effects.push(Effect::RenderCurrentPage);
                }
                effects.extend(self.reset_pan());
                effects
            }
        }
    }

    fn go_to(&mut self, page: usize) -> Vec<Effect> {
        if !self.has_document() {
            return vec![];
        }
        let clamped = page.clamp(1, self.total_pages);
        if clamped == self.current_page {
            return vec![];
        }

        let from = self.current_page;
        self.current_page = clamped;
        let mut effects = vec![
            Effect::PageChanged { from, to: clamped },
            Effect::RenderCurrentPage,
        ];
        effects.extend(self.reset_pan());
        effects
    }

    fn set_zoom(&mut self, factor: f32) -> Vec<Effect> {
        let clamped = clamp_zoom(factor);
        if (self.zoom - clamped).abs() <= f32::EPSILON {
            return vec![];
        }
        self.zoom = clamped;
        vec![Effect::ZoomChanged(clamped), Effect::RenderCurrentPage]
    }

    fn reset_pan(&mut self) -> Option<Effect> {
        if self.pan == (0.0, 0.0) {
            return None;
        }
        self.pan = (0.0, 0.0);
        Some(Effect::PanChanged { x: 0.0, y: 0.0 })
    }
}
