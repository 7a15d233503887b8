//! In-process job queue and scheduler implementing the core job ports.

pub mod queue;
pub mod scheduler;

pub use queue::InMemoryJobQueue;
pub use scheduler::InMemoryScheduler;
