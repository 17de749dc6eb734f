//! Submission: intent validation, record creation, signing handoff

mod coordinator;
mod flow;
mod intent;

pub use coordinator::SubmissionCoordinator;
pub use flow::TransferFlow;
pub use intent::{TransferIntent, TransferLink};
