pub mod command_queue;
pub mod command_server;
pub mod control_loop;
pub mod debouncer;
pub mod desktop;
pub mod grid;
pub mod tiler;
pub mod window_order;

pub use command_queue::CommandQueue;
pub use command_server::{send_command, CommandServer};
pub use control_loop::ControlLoop;
pub use debouncer::Debouncer;
pub use desktop::{DesktopBackend, DryRun, X11Desktop};
pub use tiler::Tiler;
