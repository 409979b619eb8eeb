pub mod export_coordinator;
pub mod session_controller;
pub mod submission_builder;

pub use export_coordinator::{ExportCoordinator, ExportedFile};
pub use session_controller::SessionController;
pub use submission_builder::{Payload, SubmissionBuilder, SubmissionMode};
