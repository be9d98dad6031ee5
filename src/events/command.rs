use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Команда перестановки активного окна, приходящая по каналу управления
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    MoveLeft,
    MoveRight,
}

impl Command {
    /// Текстовый токен протокола (без завершающего перевода строки)
    pub fn token(&self) -> &'static str {
        match self {
            Command::MoveLeft => "move-left",
            Command::MoveRight => "move-right",
        }
    }

    /// Направление в стабильном порядке: `true` — к концу списка
    pub fn is_forward(&self) -> bool {
        matches!(self, Command::MoveRight)
    }

    /// Разбор строки запроса. Пробельные символы по краям игнорируются,
    /// всё остальное должно совпадать с токеном буквально.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "move-left" => Some(Command::MoveLeft),
            "move-right" => Some(Command::MoveRight),
            _ => None,
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s).ok_or_else(|| format!("неизвестная команда: {:?}", s))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
