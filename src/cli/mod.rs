pub mod app;
pub mod handler;

pub use app::Cli;
pub use handler::handle_command;
