//! Local control channel: a UNIX stream socket carrying one newline-terminated
//! token per connection (`move-left`, `move-right`). The server only queues
//! recognised commands; executing them is the control loop's job.

mod client;
mod server;

pub use self::client::send_command;
pub use self::server::CommandServer;

/// Сколько байт запроса читаем с одного соединения
pub(crate) const MAX_REQUEST_BYTES: u64 = 128;
