//! Typed addresses for every animatable scalar on the stage and page.
//!
//! Tweens and scroll timelines never hold references into the stage; they
//! carry a [`Property`] and read/write through [`Stage`](crate::Stage). A
//! property whose target does not exist (an empty text block, an unknown
//! glyph index) simply reads as `None`.

use glam::Vec3;

/// A vector component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Y => v.y = value,
            Axis::Z => v.z = value,
        }
    }
}

/// Which part of a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Position,
    Rotation,
    Scale,
}

/// Named environment sub-nodes that start off-stage and rise in the final section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubNode {
    MiniPlatform,
    Mailbox,
    Tile1,
    Tile2,
    Tile3,
}

impl SubNode {
    /// In the order they rise.
    pub const ALL: [SubNode; 5] = [
        SubNode::MiniPlatform,
        SubNode::Mailbox,
        SubNode::Tile1,
        SubNode::Tile2,
        SubNode::Tile3,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SubNode::MiniPlatform => "mini_platform",
            SubNode::Mailbox => "mailbox",
            SubNode::Tile1 => "tile1",
            SubNode::Tile2 => "tile2",
            SubNode::Tile3 => "tile3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Something on the stage with a transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Primary,
    Environment,
    /// A named direct child of the environment.
    EnvironmentNode(SubNode),
    PovCamera,
    SpotLight,
    /// The point the spotlight aims at.
    SpotTarget,
    PointLight,
    /// One of the three background discs.
    Disc(usize),
}

/// Text blocks whose glyphs are revealed one by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextBlock {
    Intro,
    HeroTitle,
    HeroDescription,
    SecondDescription,
    SecondSubheading,
    SecondSub,
}

impl TextBlock {
    pub const ALL: [TextBlock; 6] = [
        TextBlock::Intro,
        TextBlock::HeroTitle,
        TextBlock::HeroDescription,
        TextBlock::SecondDescription,
        TextBlock::SecondSubheading,
        TextBlock::SecondSub,
    ];

    /// Blocks revealed once page two appears.
    pub const PAGE_TWO: [TextBlock; 5] = [
        TextBlock::HeroTitle,
        TextBlock::HeroDescription,
        TextBlock::SecondDescription,
        TextBlock::SecondSubheading,
        TextBlock::SecondSub,
    ];
}

/// Rounded corner of a section panel, on its inner side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    Top,
    Bottom,
}

/// One animatable scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Transform {
        target: Target,
        channel: Channel,
        axis: Axis,
    },
    PreloaderOpacity,
    ArrowOpacity,
    /// Vertical offset of one animated glyph, in percent of its line height.
    GlyphOffset { block: TextBlock, index: usize },
    /// Corner radius of a section panel in pixels.
    CornerRadius { section: usize, corner: Corner },
    /// Vertical scale of a section's pinned progress bar.
    ProgressBar(usize),
}

impl Property {
    pub fn position(target: Target, axis: Axis) -> Self {
        Property::Transform {
            target,
            channel: Channel::Position,
            axis,
        }
    }

    pub fn rotation(target: Target, axis: Axis) -> Self {
        Property::Transform {
            target,
            channel: Channel::Rotation,
            axis,
        }
    }

    pub fn scale(target: Target, axis: Axis) -> Self {
        Property::Transform {
            target,
            channel: Channel::Scale,
            axis,
        }
    }

    /// The three components of one channel, paired with the components of `value`.
    pub fn vec3(target: Target, channel: Channel, value: Vec3) -> [(Property, f32); 3] {
        Axis::ALL.map(|axis| {
            (
                Property::Transform {
                    target,
                    channel,
                    axis,
                },
                axis.get(value),
            )
        })
    }
}
