//! RAII guards that keep reporting consistent on every exit path.

mod step_guard;

pub use step_guard::StepGuard;
