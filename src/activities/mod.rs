// Remote task invocation: the task seam, a reference echo task, and the retrying invoker

pub mod echo;
pub mod invoker;
pub mod retry;
pub mod traits;

pub use echo::EchoTask;
pub use invoker::TaskInvoker;
pub use retry::{ActivityOptions, Backoff, RetryPolicy};
pub use traits::RemoteTask;

#[cfg(test)]
pub use traits::MockRemoteTask;
