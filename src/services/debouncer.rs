use std::time::{Duration, Instant};

/// Состояние отложенной перераскладки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetileState {
    Idle,
    Pending { deadline: Instant },
}

/// Откладывает перераскладку, пока поток уведомлений не затихнет.
///
/// Каждое уведомление переносит срок на `interval` от своего момента
/// (последний побеждает, сроки не накапливаются), а `poll` срабатывает
/// ровно один раз после наступления срока.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn notify_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// `true` ровно один раз, когда срок наступил; срок при этом сбрасывается
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> RetileState {
        match self.deadline {
            Some(deadline) => RetileState::Pending { deadline },
            None => RetileState::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}
