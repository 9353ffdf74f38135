pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;

pub use server::{handle_line, run_server};
pub use session::Session;
