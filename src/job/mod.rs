mod descriptor;
mod outcome;

pub use descriptor::JobDescriptor;
pub use outcome::{JobOutcome, JobState};
