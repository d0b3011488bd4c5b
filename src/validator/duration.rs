use crate::graph::{BlockKind, Graph};
use serde::Deserialize;

/// Seconds a respondent is expected to spend on each block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct KindTimings {
    pub message: u32,
    pub text_input: u32,
    pub number_input: u32,
    pub single_choice: u32,
    pub multi_choice: u32,
    pub scale: u32,
    pub yes_no: u32,
    pub video: u32,
    pub contact_form: u32,
    pub demographics: u32,
    #[serde(rename = "final")]
    pub final_block: u32,
    /// Used for kinds this crate does not recognize.
    pub unrecognized: u32,
}

impl Default for KindTimings {
    fn default() -> Self {
        Self {
            message: 5,
            text_input: 30,
            number_input: 15,
            single_choice: 10,
            multi_choice: 20,
            scale: 15,
            yes_no: 10,
            video: 60,
            contact_form: 45,
            demographics: 30,
            final_block: 5,
            unrecognized: 15,
        }
    }
}

impl KindTimings {
    pub fn seconds_for(&self, kind: &BlockKind) -> u32 {
        match kind {
            BlockKind::Message => self.message,
            BlockKind::TextInput { .. } => self.text_input,
            BlockKind::NumberInput { .. } => self.number_input,
            BlockKind::SingleChoice { .. } => self.single_choice,
            BlockKind::MultiChoice { .. } => self.multi_choice,
            BlockKind::Scale { .. } => self.scale,
            BlockKind::YesNo => self.yes_no,
            BlockKind::Video { .. } => self.video,
            BlockKind::ContactForm { .. } => self.contact_form,
            BlockKind::Demographics { .. } => self.demographics,
            BlockKind::Final => self.final_block,
            BlockKind::Unrecognized { .. } => self.unrecognized,
        }
    }

    /// Mutable access by canonical kind name (`"unrecognized"` for the fallback).
    pub(crate) fn slot_mut(&mut self, kind: &str) -> Option<&mut u32> {
        Some(match kind {
            "message" => &mut self.message,
            "text-input" => &mut self.text_input,
            "number-input" => &mut self.number_input,
            "single-choice" => &mut self.single_choice,
            "multi-choice" => &mut self.multi_choice,
            "scale" => &mut self.scale,
            "yes-no" => &mut self.yes_no,
            "video" => &mut self.video,
            "contact-form" => &mut self.contact_form,
            "demographics" => &mut self.demographics,
            "final" => &mut self.final_block,
            "unrecognized" => &mut self.unrecognized,
            _ => return None,
        })
    }
}

/// Total seconds over every block of the graph, reachable or not.
pub fn estimate_seconds(graph: &Graph, timings: &KindTimings) -> u64 {
    graph.blocks().iter().fold(0u64, |total, block| {
        total.saturating_add(u64::from(timings.seconds_for(&block.kind)))
    })
}

/// Whole minutes, rounded up. Saturates at `u32::MAX`.
pub fn estimate_minutes(graph: &Graph, timings: &KindTimings) -> u32 {
    u32::try_from(estimate_seconds(graph, timings).div_ceil(60)).unwrap_or(u32::MAX)
}
