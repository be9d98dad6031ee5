use crate::error::{Result, TilerError};
use crate::events::Command;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::debug;

/// Отправляет команду запущенному демону. Ответа протокол не предусматривает.
pub async fn send_command(path: &Path, command: Command) -> Result<()> {
    let mut stream = match UnixStream::connect(path).await {
        Ok(stream) => stream,
        Err(e) => {
            return TilerError::transport(format!(
                "не удалось подключиться к {:?}: {}. Убедитесь, что демон запущен",
                path, e
            ))
        }
    };

    let payload = format!("{}\n", command.token());
    if let Err(e) = stream.write_all(payload.as_bytes()).await {
        return TilerError::transport(format!("команда {} отправлена не полностью: {}", command, e));
    }
    // Закрываем запись, чтобы демон сразу увидел конец запроса
    let _ = stream.shutdown().await;

    debug!("Команда {} отправлена в {:?}", command, path);
    Ok(())
}
