pub mod assignments;
pub mod submissions;

pub use assignments::AssignmentService;
pub use submissions::SubmissionService;
