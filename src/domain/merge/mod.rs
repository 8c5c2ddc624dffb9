//! Section merge engine and typed partial inputs.

pub mod engine;
pub mod patch;

pub use engine::{merge_section, replace_maps};
pub use patch::{
    DataPatch, DisclaimerPatch, HelpSettingsPatch, MessagesPatch, SectionUpdate, UiPatch,
};
