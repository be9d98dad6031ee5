use crate::config::Config;
use crate::error::Result;
use crate::services::desktop::DesktopBackend;
use crate::services::{CommandQueue, Debouncer, Tiler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Единственный владелец состояния раскладки.
///
/// Команды и уведомления приходят асинхронно, но порядок окон и изменения
/// окон трогает только этот цикл, поэтому блокировок вокруг них нет.
pub struct ControlLoop<B> {
    config: Arc<Config>,
    backend: B,
    tiler: Tiler,
    debouncer: Debouncer,
    commands: Arc<CommandQueue>,
}

impl<B: DesktopBackend> ControlLoop<B> {
    pub fn new(config: Arc<Config>, backend: B, commands: Arc<CommandQueue>) -> Self {
        Self {
            tiler: Tiler::new(Arc::clone(&config)),
            debouncer: Debouncer::new(config.debounce()),
            config,
            backend,
            commands,
        }
    }

    /// Крутит цикл до установки флага остановки. Между итерациями спит
    /// `poll_interval`, так что задержка реакции ограничена этим интервалом.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        info!(
            "Цикл управления запущен (debounce {}мс, опрос {}мс)",
            self.config.daemon.debounce_ms, self.config.daemon.poll_interval_ms
        );

        self.backend.watch()?;
        let initial = self.tiler.tile_current(&mut self.backend);
        self.absorb(initial)?;

        while !shutdown.load(Ordering::SeqCst) {
            self.iterate(Instant::now())?;
            std::thread::sleep(self.config.poll_interval());
        }

        // Команды, пришедшие перед остановкой, всё равно выполняем
        self.process_commands()?;
        info!("Цикл управления остановлен");
        Ok(())
    }

    /// Одна итерация: команды, затем уведомления, затем отложенная перераскладка
    pub fn iterate(&mut self, now: Instant) -> Result<()> {
        self.process_commands()?;

        let changes = self.backend.drain_events()?;
        if changes > 0 {
            // Команды могли занять время: срок отсчитывается от момента выборки уведомлений
            let observed = now.max(Instant::now());
            debug!("Получено {} уведомлений, перераскладка отложена", changes);
            self.debouncer.notify_at(observed);
        }

        if self.debouncer.poll(now) {
            let result = self.tiler.tile_current(&mut self.backend);
            self.absorb(result)?;
        }
        Ok(())
    }

    fn process_commands(&mut self) -> Result<()> {
        for command in self.commands.drain_all() {
            debug!("Выполняется команда {}", command);
            let result = self.tiler.apply_command(&mut self.backend, command);
            self.absorb(result)?;
        }
        Ok(())
    }

    /// Фатальные ошибки прерывают цикл, остальные только попадают в лог:
    /// следующая итерация или уведомление повторят попытку сами.
    fn absorb<T>(&self, result: Result<T>) -> Result<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_fatal() => {
                error!("Цикл управления прерван: {}", e);
                Err(e)
            }
            Err(e) => {
                warn!("Проход раскладки не удался: {}", e);
                Ok(())
            }
        }
    }

    #[allow(dead_code)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[allow(dead_code)]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[allow(dead_code)]
    pub fn is_retile_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Command, WindowId};
    use crate::services::desktop::fake::FakeDesktop;
    use std::time::Duration;

    fn control_loop(windows: &[u32]) -> (ControlLoop<FakeDesktop>, Arc<CommandQueue>) {
        let mut desktop = FakeDesktop::new(1000, 1000);
        desktop.current = 1;
        for id in windows {
            desktop.add_window(*id, Some(1));
        }
        let queue = Arc::new(CommandQueue::new());
        let control = ControlLoop::new(Arc::new(Config::default()), desktop, Arc::clone(&queue));
        (control, queue)
    }

    fn placed(control: &ControlLoop<FakeDesktop>) -> Vec<u32> {
        control
            .backend()
            .geometries()
            .iter()
            .map(|(window, _)| window.value())
            .collect()
    }

    #[test]
    fn test_notification_burst_retiles_once() {
        let (mut control, _queue) = control_loop(&[1, 2]);
        let start = Instant::now();
        let debounce = Duration::from_millis(200);

        for step in 0..5u64 {
            control.backend_mut().pending_events = 3;
            control.iterate(start + Duration::from_millis(step * 50)).unwrap();
            assert!(control.is_retile_pending());
        }
        let last = start + Duration::from_millis(200);
        assert_eq!(control.backend().flushes(), 0);

        control.iterate(last + debounce - Duration::from_millis(1)).unwrap();
        assert_eq!(control.backend().flushes(), 0);

        control.iterate(last + debounce).unwrap();
        assert_eq!(control.backend().flushes(), 1);
        assert!(!control.is_retile_pending());

        control.iterate(last + debounce * 10).unwrap();
        assert_eq!(control.backend().flushes(), 1);
    }

    #[test]
    fn test_deadline_counts_from_drain_time() {
        let (mut control, _queue) = control_loop(&[1]);
        let debounce = Duration::from_millis(200);
        let stale = Instant::now();
        std::thread::sleep(Duration::from_millis(30));

        control.backend_mut().pending_events = 1;
        control.iterate(stale).unwrap();
        assert!(control.is_retile_pending());

        // Интервал от устаревшей отметки уже прошёл, от момента выборки - ещё нет
        control.iterate(stale + debounce).unwrap();
        assert_eq!(control.backend().flushes(), 0);
        assert!(control.is_retile_pending());

        control.iterate(stale + debounce * 2).unwrap();
        assert_eq!(control.backend().flushes(), 1);
    }

    #[test]
    fn test_idle_loop_does_nothing() {
        let (mut control, _queue) = control_loop(&[1]);
        let start = Instant::now();
        for step in 0..10u64 {
            control.iterate(start + Duration::from_secs(step)).unwrap();
        }
        assert!(control.backend().ops().is_empty());
    }

    #[test]
    fn test_commands_applied_in_arrival_order() {
        let (mut control, queue) = control_loop(&[1, 2, 3]);
        control.backend_mut().set_active(Some(1));

        queue.push(Command::MoveRight);
        queue.push(Command::MoveRight);
        queue.push(Command::MoveLeft);
        control.iterate(Instant::now()).unwrap();

        assert!(queue.is_empty());
        assert_eq!(control.backend().flushes(), 3);
        let tiler_order = control.tiler.order().get(1).unwrap().to_vec();
        assert_eq!(tiler_order, vec![WindowId(2), WindowId(1), WindowId(3)]);
        // Последний проход раскладки отражает итоговый порядок
        assert_eq!(&placed(&control)[6..], &[2, 1, 3]);
    }

    #[test]
    fn test_run_tiles_initially_and_drains_on_shutdown() {
        let (mut control, queue) = control_loop(&[1, 2]);
        control.backend_mut().set_active(Some(1));
        queue.push(Command::MoveRight);

        // Флаг уже поднят: после начальной раскладки цикл сразу переходит к финальной выборке команд
        let shutdown = AtomicBool::new(true);
        control.run(&shutdown).unwrap();

        assert!(control.backend().watching);
        assert!(queue.is_empty());
        assert_eq!(control.backend().flushes(), 2);
        assert_eq!(placed(&control), vec![1, 2, 2, 1]);
    }
}
