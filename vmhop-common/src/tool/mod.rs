pub mod invocation;
pub mod runner;

pub use invocation::Invocation;
pub use runner::{ProcessRunner, ToolOutput, ToolRunner};
