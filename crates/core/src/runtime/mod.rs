mod scheduler;
mod services;
mod shutdown;
mod worker;

pub use scheduler::Runtime;
pub use services::Services;
pub use shutdown::ShutdownGuard;
pub use worker::ChannelWorker;
