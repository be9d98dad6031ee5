use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilerError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось подключиться к X-серверу (задана ли переменная DISPLAY?): {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("Соединение с X-сервером потеряно: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("Канал команд недоступен: {0}")]
    Transport(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl TilerError {
    pub fn transport<T>(msg: impl Into<String>) -> Result<T> {
        Err(TilerError::Transport(msg.into()))
    }

    /// Ошибки, после которых продолжать цикл управления бессмысленно
    pub fn is_fatal(&self) -> bool {
        matches!(self, TilerError::Connect(_) | TilerError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, TilerError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! tiler_error {
    (transport, $($arg:tt)*) => {
        $crate::error::TilerError::Transport(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::TilerError::Internal(format!($($arg)*))
    };
}
