pub use read::{handle_read, read_page, ReadParams, ReadRequest};
pub use server::{run_server, AppState};

mod read;
mod response;
mod server;
