use crate::error::Result;
use crate::events::Command;
use crate::services::CommandQueue;
use crate::tiler_error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::MAX_REQUEST_BYTES;

/// Слушатель канала команд: принимает соединения по одному и складывает
/// распознанные команды в общую очередь
pub struct CommandServer {
    path: PathBuf,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CommandServer {
    /// Создаёт сокет и запускает фоновую задачу приёма. Должен вызываться внутри runtime.
    pub fn start(path: &Path, queue: Arc<CommandQueue>) -> Result<Self> {
        remove_socket_file(path)?;

        let listener = UnixListener::bind(path)
            .map_err(|e| tiler_error!(transport, "не удалось создать сокет {:?}: {}", path, e))?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(accept_loop(listener, queue, shutdown_rx));

        info!("Канал команд слушает {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            shutdown,
            handle,
        })
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Закрывает сокет, дожидается завершения задачи приёма и удаляет файл сокета
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("Задача канала команд завершилась с ошибкой: {}", e);
        }
        if let Err(e) = remove_socket_file(&self.path) {
            warn!("Не удалось удалить сокет {:?}: {}", self.path, e);
        }
        info!("Канал команд закрыт");
    }
}

fn remove_socket_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn accept_loop(listener: UnixListener, queue: Arc<CommandQueue>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        command = read_command(stream) => match command {
                            Some(command) => {
                                debug!("Получена команда {}", command);
                                queue.push(command);
                            }
                            None => debug!("Запрос не распознан, отброшен"),
                        },
                    }
                }
                Err(e) => {
                    debug!("Ошибка accept на канале команд: {}", e);
                    sleep(Duration::from_millis(50)).await;
                }
            },
        }
    }
    debug!("Приём команд остановлен");
}

/// Читает одну строку запроса (не больше `MAX_REQUEST_BYTES`) и разбирает её.
/// Соединение закрывается при выходе, ответ не отправляется.
async fn read_command(stream: UnixStream) -> Option<Command> {
    let mut reader = BufReader::new(stream.take(MAX_REQUEST_BYTES));
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Command::parse(&line),
        Err(e) => {
            debug!("Не удалось прочитать запрос: {}", e);
            None
        }
    }
}
