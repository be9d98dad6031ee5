use crate::events::Command;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Почтовый ящик команд между слушателем сокета и циклом управления.
///
/// Блокировка держится только на время `push`/`drain_all`, никакого ввода-вывода под ней.
#[derive(Debug)]
pub struct CommandQueue<T = Command> {
    commands: Mutex<VecDeque<T>>,
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self {
            commands: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> CommandQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: T) {
        self.commands.lock().push_back(command);
    }

    /// Забирает все накопившиеся команды в порядке поступления, оставляя очередь пустой
    pub fn drain_all(&self) -> Vec<T> {
        self.commands.lock().drain(..).collect()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}
