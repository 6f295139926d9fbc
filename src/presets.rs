//! Per-device scroll choreography.
//!
//! Every device-dependent literal lives in one [`SectionPreset`] per section
//! and category; [`timelines`] turns the presets for one category, plus the
//! device-independent decoration, into timeline specs ordered top to bottom.

use std::f32::consts::PI;

use glam::Vec3;

use crate::config::SectionSide;
use crate::device::DeviceCategory;
use crate::property::{Axis, Channel, Corner, Property, SubNode, Target};
use crate::scroll::{SECTION_NAMES, Trigger};
use crate::timeline::{PROGRESS_SCRUB, SECTION_SCRUB, TargetValue, TimelineSpec, TrackSpec};
use crate::tween::Cue;

/// Label all tracks of a section share, so they move in lockstep.
const SAME: &str = "same";

/// Target for one vector channel: some axes may be left alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VecTarget {
    pub target: Target,
    pub channel: Channel,
    pub x: Option<TargetValue>,
    pub y: Option<TargetValue>,
    pub z: Option<TargetValue>,
}

impl VecTarget {
    /// All three axes to fixed values.
    pub fn all(target: Target, channel: Channel, value: Vec3) -> Self {
        Self {
            target,
            channel,
            x: Some(TargetValue::Fixed(value.x)),
            y: Some(TargetValue::Fixed(value.y)),
            z: Some(TargetValue::Fixed(value.z)),
        }
    }

    /// A single axis.
    pub fn axis(target: Target, channel: Channel, axis: Axis, value: TargetValue) -> Self {
        let mut out = Self {
            target,
            channel,
            x: None,
            y: None,
            z: None,
        };
        match axis {
            Axis::X => out.x = Some(value),
            Axis::Y => out.y = Some(value),
            Axis::Z => out.z = Some(value),
        }
        out
    }

    fn tracks(&self) -> impl Iterator<Item = TrackSpec> + '_ {
        Axis::ALL
            .into_iter()
            .zip([self.x, self.y, self.z])
            .filter_map(move |(axis, value)| {
                let property = Property::Transform {
                    target: self.target,
                    channel: self.channel,
                    axis,
                };
                value.map(|v| TrackSpec::to(property, v).at(SAME))
            })
    }
}

/// Device-specific targets of one section.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionPreset {
    pub targets: Vec<VecTarget>,
    /// Cue raised when the section's first track completes.
    pub cue: Cue,
}

impl SectionPreset {
    fn into_spec(self, section: usize) -> TimelineSpec {
        let mut tracks: Vec<TrackSpec> = self.targets.iter().flat_map(VecTarget::tracks).collect();
        if let Some(first) = tracks.first_mut() {
            first.cue = Some(self.cue);
        }
        TimelineSpec::new(SECTION_NAMES[section], Trigger::section(section), SECTION_SCRUB)
            .tracks(tracks)
    }
}

/// Section presets for `device`, top to bottom.
pub fn section_presets(device: DeviceCategory) -> [SectionPreset; 3] {
    use Channel::{Position, Rotation, Scale};
    use TargetValue::ViewportWidth;

    match device {
        DeviceCategory::Desktop => [
            SectionPreset {
                targets: vec![
                    VecTarget::axis(Target::Environment, Position, Axis::X, ViewportWidth(0.0004)),
                    VecTarget::axis(Target::SpotLight, Position, Axis::X, ViewportWidth(0.0002)),
                    VecTarget::axis(Target::SpotTarget, Position, Axis::X, ViewportWidth(0.00035)),
                ],
                cue: Cue::RotationCoarse,
            },
            SectionPreset {
                targets: vec![
                    VecTarget::all(Target::PovCamera, Position, Vec3::new(0.7, 1.15, 0.7)),
                    VecTarget::all(Target::SpotLight, Position, Vec3::new(0.4, 1.25, 0.15)),
                    VecTarget::all(Target::SpotTarget, Position, Vec3::new(0.3, 0.2, -0.25)),
                ],
                cue: Cue::RotationCoarse,
            },
            SectionPreset {
                targets: vec![
                    VecTarget::all(Target::PovCamera, Position, Vec3::new(0.3, 1.05, 1.0)),
                    VecTarget::axis(
                        Target::PovCamera,
                        Rotation,
                        Axis::X,
                        TargetValue::Fixed(-PI / 6.0),
                    ),
                    VecTarget::all(Target::PointLight, Position, Vec3::new(0.7, 0.8, 0.9)),
                ],
                cue: Cue::RotationFine,
            },
        ],
        DeviceCategory::Mobile => [
            SectionPreset {
                targets: vec![
                    VecTarget::all(Target::Environment, Scale, Vec3::splat(0.085)),
                    VecTarget::all(Target::SpotLight, Position, Vec3::new(-0.23, 0.47, 0.16)),
                ],
                cue: Cue::RotationCoarse,
            },
            SectionPreset {
                targets: vec![
                    VecTarget::all(Target::PovCamera, Position, Vec3::new(-0.2, 1.05, 0.6)),
                    VecTarget::all(Target::SpotLight, Position, Vec3::new(-0.23, 1.2, 0.16)),
                    VecTarget::all(Target::SpotTarget, Position, Vec3::new(0.0, 0.2, -0.4)),
                ],
                cue: Cue::RotationCoarse,
            },
            SectionPreset {
                targets: vec![
                    VecTarget::all(Target::PovCamera, Position, Vec3::new(0.0, 1.0, 0.8)),
                    VecTarget::axis(
                        Target::PovCamera,
                        Rotation,
                        Axis::X,
                        TargetValue::Fixed(-PI / 6.0),
                    ),
                    VecTarget::all(Target::PointLight, Position, Vec3::new(0.0, 0.95, 0.5)),
                ],
                cue: Cue::RotationFine,
            },
        ],
    }
}

/// Corner radii and the pinned progress bar of one section panel.
fn panel_specs(section: usize, side: SectionSide) -> [TimelineSpec; 3] {
    let name = SECTION_NAMES[section];
    let side = match side {
        SectionSide::Left => "right",
        SectionSide::Right => "left",
    };
    [
        TimelineSpec::new(format!("{name}/top-{side}-radius"), Trigger::entering(section), SECTION_SCRUB)
            .track(TrackSpec::fixed(
                Property::CornerRadius {
                    section,
                    corner: Corner::Top,
                },
                10.0,
            )),
        TimelineSpec::new(format!("{name}/bottom-{side}-radius"), Trigger::leaving(section), SECTION_SCRUB)
            .track(TrackSpec::fixed(
                Property::CornerRadius {
                    section,
                    corner: Corner::Bottom,
                },
                700.0,
            )),
        TimelineSpec::new(format!("{name}/progress"), Trigger::section(section), PROGRESS_SCRUB)
            .track(TrackSpec::fixed(Property::ProgressBar(section), 1.0).from(0.0)),
    ]
}

/// Background disc growth for one section. Section two also raises the
/// environment; that set has no device guard and is always bound.
fn disc_spec(section: usize) -> TimelineSpec {
    let mut spec = TimelineSpec::new(
        format!("{}/disc", SECTION_NAMES[section]),
        Trigger::section(section),
        SECTION_SCRUB,
    )
    .tracks(VecTarget::all(Target::Disc(section), Channel::Scale, Vec3::splat(3.0)).tracks());
    if section == 1 {
        spec = spec.track(
            TrackSpec::fixed(Property::position(Target::Environment, Axis::Y), 0.7).at(SAME),
        );
    }
    spec
}

/// Local height the parked sub-nodes rise to.
pub const LIFT_Y: f32 = 0.2;
const LIFT_DURATION: f32 = 10.0;

/// Off-stage sub-nodes rising one after another in the second half of the last section.
fn lift_spec() -> TimelineSpec {
    TimelineSpec::new("third-move/lift", Trigger::second_half(2), SECTION_SCRUB).tracks(
        SubNode::ALL.map(|sub| {
            TrackSpec::fixed(Property::position(Target::EnvironmentNode(sub), Axis::Y), LIFT_Y)
                .duration(LIFT_DURATION)
        }),
    )
}

/// Every timeline to bind for `device`, ordered by section.
///
/// Within a section the device timeline comes first, then decoration. The
/// order matters: properties shared between timelines chain their start
/// values in this order.
pub fn timelines(device: DeviceCategory, sides: [SectionSide; 3]) -> Vec<TimelineSpec> {
    let mut specs = Vec::new();
    for (section, preset) in section_presets(device).into_iter().enumerate() {
        specs.push(preset.into_spec(section));
        specs.extend(panel_specs(section, sides[section]));
        specs.push(disc_spec(section));
        if section == 2 {
            specs.push(lift_spec());
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sides() -> [SectionSide; 3] {
        [SectionSide::Left, SectionSide::Right, SectionSide::Left]
    }

    #[test]
    fn every_section_has_device_panel_and_disc_timelines() {
        for device in [DeviceCategory::Desktop, DeviceCategory::Mobile] {
            let specs = timelines(device, sides());
            assert_eq!(specs.len(), 3 * 5 + 1);
            assert_eq!(specs[0].name, "first-move");
            assert_eq!(specs.last().map(|s| s.name.as_str()), Some("third-move/lift"));
        }
    }

    #[test]
    fn section_tracks_share_one_label_and_cue_once() {
        let spec = section_presets(DeviceCategory::Desktop)[1].clone().into_spec(1);
        assert_eq!(spec.tracks.len(), 9);
        assert!(spec.tracks.iter().all(|t| t.position == crate::tween::Position::Label(SAME)));
        assert_eq!(spec.tracks.iter().filter(|t| t.cue.is_some()).count(), 1);
    }

    #[test]
    fn last_section_selects_fine_rotation() {
        for device in [DeviceCategory::Desktop, DeviceCategory::Mobile] {
            let [s1, s2, s3] = section_presets(device);
            assert_eq!(s1.cue, Cue::RotationCoarse);
            assert_eq!(s2.cue, Cue::RotationCoarse);
            assert_eq!(s3.cue, Cue::RotationFine);
        }
    }

    #[test]
    fn desktop_first_section_scales_with_width() {
        let spec = section_presets(DeviceCategory::Desktop)[0].clone().into_spec(0);
        assert_eq!(spec.tracks[0].to, TargetValue::ViewportWidth(0.0004));
        assert_eq!(
            spec.tracks[0].property,
            Property::position(Target::Environment, Axis::X)
        );
    }

    #[test]
    fn mobile_first_section_leaves_spot_target_alone() {
        let spec = section_presets(DeviceCategory::Mobile)[0].clone().into_spec(0);
        assert!(spec.tracks.iter().all(|t| !matches!(
            t.property,
            Property::Transform {
                target: Target::SpotTarget,
                ..
            }
        )));
    }

    #[test]
    fn lift_runs_sub_nodes_back_to_back() {
        let spec = lift_spec();
        assert_eq!(spec.tracks.len(), 5);
        assert!(spec.tracks.iter().all(|t| t.position == crate::tween::Position::End));
        assert_eq!(spec.trigger, Trigger::second_half(2));
    }

    #[test]
    fn panel_radius_sits_on_the_inner_side() {
        let [top, bottom, progress] = panel_specs(1, SectionSide::Right);
        assert_eq!(top.name, "second-move/top-left-radius");
        assert_eq!(bottom.trigger, Trigger::leaving(1));
        assert_eq!(progress.scrub, PROGRESS_SCRUB);
        assert_eq!(progress.tracks[0].from, Some(0.0));
    }
}
