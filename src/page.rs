//! Presentation state around the 3D canvas.
//!
//! The page is modelled rather than drawn: preloader and arrow opacity, which
//! of the two pages is visible, per-glyph reveal offsets for each text block,
//! and the decoration of the three scroll sections. The overlay pass renders
//! the parts that have a visual counterpart.

use std::collections::HashMap;

use crate::config::{SectionSide, TextConfig};
use crate::property::{Corner, TextBlock};

/// One character of a split text block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub ch: char,
    /// Whitespace is kept for layout but never animated.
    pub animated: bool,
    /// Vertical offset in percent of the line height.
    pub offset: f32,
}

/// A text block split into per-character glyphs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphBlock {
    glyphs: Vec<Glyph>,
}

impl GlyphBlock {
    pub fn split(text: &str) -> Self {
        let glyphs = text
            .chars()
            .map(|ch| Glyph {
                ch,
                animated: !ch.is_whitespace(),
                offset: 0.0,
            })
            .collect();
        Self { glyphs }
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Number of animated (non-whitespace) glyphs.
    pub fn animated_len(&self) -> usize {
        self.glyphs.iter().filter(|g| g.animated).count()
    }

    fn animated(&self, index: usize) -> Option<&Glyph> {
        self.glyphs.iter().filter(|g| g.animated).nth(index)
    }

    fn animated_mut(&mut self, index: usize) -> Option<&mut Glyph> {
        self.glyphs.iter_mut().filter(|g| g.animated).nth(index)
    }

    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }
}

/// Decoration state of one scroll section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionPanel {
    pub side: SectionSide,
    pub top_radius: f32,
    pub bottom_radius: f32,
    /// Vertical scale of the pinned progress bar.
    pub progress: f32,
}

impl SectionPanel {
    pub fn new(side: SectionSide) -> Self {
        Self {
            side,
            top_radius: 0.0,
            bottom_radius: 0.0,
            progress: 1.0,
        }
    }

    pub fn radius(&self, corner: Corner) -> f32 {
        match corner {
            Corner::Top => self.top_radius,
            Corner::Bottom => self.bottom_radius,
        }
    }

    pub fn radius_mut(&mut self, corner: Corner) -> &mut f32 {
        match corner {
            Corner::Top => &mut self.top_radius,
            Corner::Bottom => &mut self.bottom_radius,
        }
    }
}

/// Everything outside the 3D scene that the choreography touches.
#[derive(Clone, Debug)]
pub struct Page {
    pub preloader_opacity: f32,
    pub preloader_hidden: bool,
    pub arrow_opacity: f32,
    pub page_one_visible: bool,
    pub page_two_visible: bool,
    pub sections: [SectionPanel; 3],
    blocks: HashMap<TextBlock, GlyphBlock>,
    advisory: Option<String>,
}

impl Page {
    /// Build the page and split every configured text block into glyphs.
    pub fn new(text: &TextConfig, sides: [SectionSide; 3]) -> Self {
        let mut blocks = HashMap::new();
        for (block, content) in [
            (TextBlock::Intro, &text.intro),
            (TextBlock::HeroTitle, &text.hero_title),
            (TextBlock::HeroDescription, &text.hero_description),
            (TextBlock::SecondDescription, &text.second_description),
            (TextBlock::SecondSubheading, &text.second_subheading),
            (TextBlock::SecondSub, &text.second_sub),
        ] {
            if !content.is_empty() {
                blocks.insert(block, GlyphBlock::split(content));
            }
        }
        Self {
            preloader_opacity: 1.0,
            preloader_hidden: false,
            arrow_opacity: 0.0,
            page_one_visible: true,
            page_two_visible: false,
            sections: sides.map(SectionPanel::new),
            blocks,
            advisory: None,
        }
    }

    pub fn block(&self, block: TextBlock) -> Option<&GlyphBlock> {
        self.blocks.get(&block)
    }

    /// Number of animated glyphs in `block`; zero when the block is absent.
    pub fn glyph_count(&self, block: TextBlock) -> usize {
        self.blocks.get(&block).map_or(0, GlyphBlock::animated_len)
    }

    pub fn glyph_offset(&self, block: TextBlock, index: usize) -> Option<f32> {
        self.blocks
            .get(&block)
            .and_then(|b| b.animated(index))
            .map(|g| g.offset)
    }

    pub fn set_glyph_offset(&mut self, block: TextBlock, index: usize, offset: f32) -> bool {
        match self
            .blocks
            .get_mut(&block)
            .and_then(|b| b.animated_mut(index))
        {
            Some(glyph) => {
                glyph.offset = offset;
                true
            }
            None => false,
        }
    }

    /// Drop a block entirely, as if its element were missing from the page.
    pub fn remove_block(&mut self, block: TextBlock) {
        self.blocks.remove(&block);
    }

    pub fn hide_preloader(&mut self) {
        self.preloader_hidden = true;
    }

    /// Swap the intro page for the main page.
    pub fn show_page_two(&mut self) {
        self.page_one_visible = false;
        self.page_two_visible = true;
    }

    pub fn set_advisory(&mut self, message: impl Into<String>) {
        self.advisory = Some(message.into());
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }
}
