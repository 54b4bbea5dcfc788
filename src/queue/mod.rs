pub mod channel;
pub mod recovery;

pub use channel::{QueueError, TaskQueue, TaskReceiver, bounded};
pub use recovery::seed_queue;
