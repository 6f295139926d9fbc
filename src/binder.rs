//! Binds the section timelines of one device category to the stage.
//!
//! Binding compiles every [`TimelineSpec`] for the active category, records
//! the untouched value of every property it will drive, and snaps each
//! timeline onto the current scroll progress. Rebinding is a wholesale
//! replace: the previous set is unbound (base values restored) before the
//! new one is compiled, so nothing bound for another category survives.

use std::collections::HashMap;

use crate::config::SectionSide;
use crate::device::DeviceCategory;
use crate::presets;
use crate::property::Property;
use crate::scroll::PageLayout;
use crate::stage::Stage;
use crate::timeline::{ScrollTimeline, TimelineSpec};
use crate::tween::Cue;

/// The live timeline set and what it needs to be undone.
#[derive(Debug, Default)]
pub struct TimelineBinder {
    device: Option<DeviceCategory>,
    timelines: Vec<ScrollTimeline>,
    base: Vec<(Property, f32)>,
    pending: Vec<Cue>,
}

impl TimelineBinder {
    /// An empty binder; nothing is bound until [`bind`](Self::bind).
    pub fn new() -> Self {
        Self::default()
    }

    /// Category of the bound set, if any.
    pub fn device(&self) -> Option<DeviceCategory> {
        self.device
    }

    /// True once a timeline set is live.
    pub fn is_bound(&self) -> bool {
        self.device.is_some()
    }

    /// Bound timelines in section order.
    pub fn timelines(&self) -> &[ScrollTimeline] {
        &self.timelines
    }

    /// Look a bound timeline up by name, e.g. `"second-move"`.
    pub fn timeline(&self, name: &str) -> Option<&ScrollTimeline> {
        self.timelines.iter().find(|t| t.name() == name)
    }

    /// Bind the preset set for `device`, replacing whatever was bound.
    pub fn bind(
        &mut self,
        stage: &mut Stage,
        device: DeviceCategory,
        layout: &PageLayout,
        scroll: f32,
        viewport_width: f32,
    ) {
        let sides: [SectionSide; 3] = std::array::from_fn(|i| stage.page.sections[i].side);
        self.bind_specs(
            stage,
            device,
            presets::timelines(device, sides),
            layout,
            scroll,
            viewport_width,
        );
    }

    /// Bind an explicit timeline set.
    pub fn bind_specs(
        &mut self,
        stage: &mut Stage,
        device: DeviceCategory,
        specs: Vec<TimelineSpec>,
        layout: &PageLayout,
        scroll: f32,
        viewport_width: f32,
    ) {
        self.unbind(stage);
        log::info!("Binding {} scroll timelines for {device:?}", specs.len());

        let mut chain: HashMap<Property, f32> = HashMap::new();
        let mut timelines = Vec::with_capacity(specs.len());
        for spec in &specs {
            let timeline = ScrollTimeline::compile(spec, viewport_width, |property, to| {
                let from = match chain.get(&property) {
                    Some(&end) => end,
                    None => stage.read(property)?,
                };
                chain.insert(property, to);
                Some(from)
            });
            timelines.push(timeline);
        }

        let mut base: Vec<(Property, f32)> = Vec::new();
        for track in timelines.iter().flat_map(|t| t.tracks()) {
            if base.iter().any(|(p, _)| *p == track.property) {
                continue;
            }
            if let Some(value) = stage.read(track.property) {
                base.push((track.property, value));
            }
        }

        for timeline in &mut timelines {
            let progress = layout.progress(timeline.trigger(), scroll);
            self.pending.extend(timeline.snap(progress));
        }

        self.device = Some(device);
        self.timelines = timelines;
        self.base = base;
        self.apply(stage);
    }

    /// Drop the bound set and restore every property it drove.
    pub fn unbind(&mut self, stage: &mut Stage) {
        if self.device.take().is_none() {
            return;
        }
        for &(property, value) in &self.base {
            stage.write(property, value);
        }
        log::debug!("Unbound {} scroll timelines", self.timelines.len());
        self.timelines.clear();
        self.base.clear();
        self.pending.clear();
    }

    /// Feed the current scroll offset, ease every playhead and write the
    /// resulting values. Returns completion cues, including any queued by
    /// the last bind.
    pub fn update(&mut self, stage: &mut Stage, layout: &PageLayout, scroll: f32, dt: f32) -> Vec<Cue> {
        let mut cues = std::mem::take(&mut self.pending);
        if self.timelines.is_empty() {
            return cues;
        }
        for timeline in &mut self.timelines {
            timeline.set_target(layout.progress(timeline.trigger(), scroll));
            cues.extend(timeline.step(dt));
        }
        self.apply(stage);
        cues
    }

    /// Write every bound property. For each property the latest timeline
    /// whose playhead has left zero wins; if none has, the first timeline
    /// holds it at its start value.
    fn apply(&self, stage: &mut Stage) {
        let mut values: Vec<(Property, f32)> = Vec::new();
        let mut slots: HashMap<Property, usize> = HashMap::new();
        for timeline in &self.timelines {
            let active = timeline.playhead() > 0.0;
            for (property, value) in timeline.sample() {
                match slots.get(&property) {
                    Some(&slot) if active => values[slot].1 = value,
                    Some(_) => {}
                    None => {
                        slots.insert(property, values.len());
                        values.push((property, value));
                    }
                }
            }
        }
        for (property, value) in values {
            stage.write(property, value);
        }
    }
}
