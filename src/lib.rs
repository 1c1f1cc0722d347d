// Running
mod runtime;
pub use runtime::RunState;

// Console driver
pub mod term;
pub use term::{Console, TermConsole};
