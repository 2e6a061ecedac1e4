//! Modelos neutrales (ViewResponse, InputRecord, FlowStatus, FlowOutcome).

pub mod input;
pub mod outcome;
pub mod status;
pub mod view;

pub use input::InputRecord;
pub use outcome::{FlowInfo, FlowOutcome};
pub use status::FlowStatus;
pub use view::ViewResponse;
