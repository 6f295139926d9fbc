//! Page layout, scroll offset, and trigger progress.
//!
//! The page is a hero region followed by three tall sections. A [`Trigger`]
//! pairs an edge of a section with an edge of the viewport for its start and
//! end; its progress is the normalised scroll offset between the two.

use crate::config::LayoutConfig;

/// Names of the three scroll sections, top to bottom.
pub const SECTION_NAMES: [&str; 3] = ["first-move", "second-move", "third-move"];

/// A vertical anchor within an element or the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
}

impl Anchor {
    fn fraction(self) -> f32 {
        match self {
            Anchor::Top => 0.0,
            Anchor::Center => 0.5,
            Anchor::Bottom => 1.0,
        }
    }
}

/// "When `element` of the section meets `viewport` of the screen".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl Edge {
    pub const fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }
}

/// A scroll range tied to one section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trigger {
    pub section: usize,
    pub start: Edge,
    pub end: Edge,
}

impl Trigger {
    /// Section fully covers the viewport: top at top until bottom at bottom.
    pub const fn section(section: usize) -> Self {
        Self {
            section,
            start: Edge::new(Anchor::Top, Anchor::Top),
            end: Edge::new(Anchor::Bottom, Anchor::Bottom),
        }
    }

    /// Section scrolling into view: top at bottom until top at top.
    pub const fn entering(section: usize) -> Self {
        Self {
            section,
            start: Edge::new(Anchor::Top, Anchor::Bottom),
            end: Edge::new(Anchor::Top, Anchor::Top),
        }
    }

    /// Section scrolling out of view: bottom at bottom until bottom at top.
    pub const fn leaving(section: usize) -> Self {
        Self {
            section,
            start: Edge::new(Anchor::Bottom, Anchor::Bottom),
            end: Edge::new(Anchor::Bottom, Anchor::Top),
        }
    }

    /// Second half of a section: centre at centre until bottom at bottom.
    pub const fn second_half(section: usize) -> Self {
        Self {
            section,
            start: Edge::new(Anchor::Center, Anchor::Center),
            end: Edge::new(Anchor::Bottom, Anchor::Bottom),
        }
    }
}

/// Document-space extent of one section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionBounds {
    pub top: f32,
    pub bottom: f32,
}

impl SectionBounds {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    fn y(&self, anchor: Anchor) -> f32 {
        self.top + self.height() * anchor.fraction()
    }
}

/// Section geometry for the current viewport height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    pub viewport_height: f32,
    pub sections: [SectionBounds; 3],
    pub document_height: f32,
}

impl PageLayout {
    pub fn compute(viewport_height: f32, config: &LayoutConfig) -> Self {
        let vh = viewport_height.max(1.0);
        let mut y = config.hero_vh * vh;
        let sections = config.section_vh.map(|h| {
            let top = y;
            let bottom = top + h.max(0.0) * vh;
            y = bottom + config.gap_vh * vh;
            SectionBounds { top, bottom }
        });
        Self {
            viewport_height: vh,
            sections,
            document_height: y,
        }
    }

    /// Largest valid scroll offset.
    pub fn max_scroll(&self) -> f32 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    /// Scroll offset at which `edge` of `section` is met.
    pub fn offset(&self, section: usize, edge: Edge) -> Option<f32> {
        let bounds = self.sections.get(section)?;
        Some(bounds.y(edge.element) - self.viewport_height * edge.viewport.fraction())
    }

    /// Normalised progress of `trigger` at scroll offset `scroll`.
    pub fn progress(&self, trigger: &Trigger, scroll: f32) -> f32 {
        let (Some(start), Some(end)) = (
            self.offset(trigger.section, trigger.start),
            self.offset(trigger.section, trigger.end),
        ) else {
            return 0.0;
        };
        if end <= start {
            return if scroll >= start { 1.0 } else { 0.0 };
        }
        ((scroll - start) / (end - start)).clamp(0.0, 1.0)
    }

    /// Section covering the middle of the viewport at offset `scroll`.
    pub fn section_at(&self, scroll: f32) -> Option<usize> {
        let mid = scroll + self.viewport_height * 0.5;
        self.sections
            .iter()
            .position(|s| s.top <= mid && mid < s.bottom)
    }
}

/// Document scroll position, fed by wheel and touch once scrolling is enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollProvider {
    offset: f32,
    max: f32,
    active: bool,
    last_touch_y: Option<f32>,
}

impl ScrollProvider {
    /// At the top of the page and inert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting input.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Whether input moves the page yet.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current offset in document pixels.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Adopt a new layout, clamping the current offset into it.
    pub fn set_layout(&mut self, layout: &PageLayout) {
        self.max = layout.max_scroll();
        self.offset = self.offset.clamp(0.0, self.max);
    }

    /// Scroll by `delta` pixels, positive down. Ignored until activated.
    pub fn scroll_by(&mut self, delta: f32) {
        if self.active {
            self.offset = (self.offset + delta).clamp(0.0, self.max);
        }
    }

    /// Jump to `offset`. Ignored until activated.
    pub fn scroll_to(&mut self, offset: f32) {
        if self.active {
            self.offset = offset.clamp(0.0, self.max);
        }
    }

    /// Remember where a touch began.
    pub fn touch_start(&mut self, y: f32) {
        self.last_touch_y = Some(y);
    }

    /// Dragging the finger up scrolls the page down.
    pub fn touch_move(&mut self, y: f32) {
        if let Some(last) = self.last_touch_y.replace(y) {
            self.scroll_by(last - y);
        }
    }

    /// Forget the current touch.
    pub fn touch_end(&mut self) {
        self.last_touch_y = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn layout() -> PageLayout {
        PageLayout::compute(800.0, &LayoutConfig::default())
    }

    #[test]
    fn sections_stack_below_the_hero() {
        let layout = layout();
        assert_eq!(layout.sections[0].top, 800.0);
        assert_eq!(layout.sections[0].bottom, 3200.0);
        assert_eq!(layout.sections[1].top, 4000.0);
        assert_eq!(layout.document_height, 800.0 * 13.0);
        assert_eq!(layout.max_scroll(), 800.0 * 12.0);
    }

    #[test]
    fn section_trigger_spans_top_top_to_bottom_bottom() {
        let layout = layout();
        let t = Trigger::section(0);
        assert_eq!(layout.progress(&t, 0.0), 0.0);
        assert_eq!(layout.progress(&t, 800.0), 0.0);
        assert_abs_diff_eq!(layout.progress(&t, 1600.0), 0.5);
        assert_eq!(layout.progress(&t, 2400.0), 1.0);
        assert_eq!(layout.progress(&t, 9000.0), 1.0);
    }

    #[test]
    fn edge_triggers_use_viewport_anchors() {
        let layout = layout();
        // Section two enters between 3200 and 4000.
        assert_abs_diff_eq!(layout.progress(&Trigger::entering(1), 3600.0), 0.5);
        // Section two leaves between 5600 and 6400.
        assert_abs_diff_eq!(layout.progress(&Trigger::leaving(1), 6000.0), 0.5);
        // Second half of section three: from 8000 (centre meets centre) until 8800.
        assert_eq!(layout.progress(&Trigger::second_half(2), 8000.0), 0.0);
        assert_abs_diff_eq!(layout.progress(&Trigger::second_half(2), 8400.0), 0.5);
    }

    #[test]
    fn section_at_follows_the_viewport_middle() {
        let layout = layout();
        assert_eq!(layout.section_at(0.0), None);
        assert_eq!(layout.section_at(500.0), Some(0));
        assert_eq!(layout.section_at(3000.0), None);
        assert_eq!(layout.section_at(3700.0), Some(1));
        assert_eq!(layout.section_at(7000.0), Some(2));
        assert_eq!(layout.section_at(layout.max_scroll()), None);
    }

    #[test]
    fn unknown_section_has_no_progress() {
        assert_eq!(layout().progress(&Trigger::section(5), 1000.0), 0.0);
    }

    #[test]
    fn provider_is_inert_until_activated_and_clamps() {
        let layout = layout();
        let mut scroll = ScrollProvider::new();
        scroll.set_layout(&layout);
        scroll.scroll_by(500.0);
        assert_eq!(scroll.offset(), 0.0);

        scroll.activate();
        scroll.scroll_by(-50.0);
        assert_eq!(scroll.offset(), 0.0);
        scroll.scroll_by(1e6);
        assert_eq!(scroll.offset(), layout.max_scroll());

        let smaller = PageLayout::compute(400.0, &LayoutConfig::default());
        scroll.set_layout(&smaller);
        assert_eq!(scroll.offset(), smaller.max_scroll());
    }

    #[test]
    fn touch_drag_scrolls_opposite_to_finger() {
        let mut scroll = ScrollProvider::new();
        scroll.set_layout(&layout());
        scroll.activate();
        scroll.touch_start(500.0);
        scroll.touch_move(300.0);
        assert_eq!(scroll.offset(), 200.0);
        scroll.touch_end();
        scroll.touch_move(0.0);
        assert_eq!(scroll.offset(), 200.0);
    }
}
