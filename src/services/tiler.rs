use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{Command, DesktopId, WindowId};
use crate::services::desktop::{eligible_windows, DesktopSource, WindowSink};
use crate::services::grid::compute_positions;
use crate::services::window_order::{Direction, WindowOrder};
use std::sync::Arc;
use tracing::debug;

/// Раскладывает окна стола по сетке, помня их порядок между проходами
pub struct Tiler {
    config: Arc<Config>,
    order: WindowOrder,
}

impl Tiler {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            order: WindowOrder::new(),
        }
    }

    #[allow(dead_code)]
    pub fn order(&self) -> &WindowOrder {
        &self.order
    }

    /// Проход раскладки для стола. Возвращает число разложенных окон.
    pub fn tile<B>(&mut self, backend: &mut B, desktop: DesktopId) -> Result<usize>
    where
        B: DesktopSource + WindowSink + ?Sized,
    {
        let windows = eligible_windows(&*backend, desktop)?;
        if windows.is_empty() {
            debug!("На столе {} нет окон для раскладки", desktop);
            self.order.forget(desktop);
            return Ok(0);
        }

        let ordered = self.order.stabilize(desktop, &windows);
        self.apply(backend, desktop, &ordered)?;
        Ok(ordered.len())
    }

    fn apply<B>(&self, backend: &mut B, desktop: DesktopId, ordered: &[WindowId]) -> Result<()>
    where
        B: DesktopSource + WindowSink + ?Sized,
    {
        let (screen_width, screen_height) = backend.screen_size();
        let layout = self.config.layout_for(desktop);
        let positions = compute_positions(ordered.len(), screen_width, screen_height, &layout);

        debug!(
            "Раскладка стола {}: {} окон на экране {}x{}",
            desktop,
            ordered.len(),
            screen_width,
            screen_height
        );

        for (window, geometry) in ordered.iter().zip(&positions) {
            debug_if_enabled!("Окно {} -> {}", window, geometry);
            backend.clear_maximized_state(*window)?;
            backend.strip_decorations(*window)?;
            backend.set_geometry(*window, *geometry)?;
        }
        backend.flush()
    }

    /// Сдвигает активное окно на одну позицию и сразу перераскладывает стол.
    ///
    /// Возвращает `false`, если ничего не изменилось: нет активного окна,
    /// оно не на этом столе или уже стоит у края в нужном направлении.
    pub fn move_active<B>(&mut self, backend: &mut B, desktop: DesktopId, direction: Direction) -> Result<bool>
    where
        B: DesktopSource + WindowSink + ?Sized,
    {
        let windows = eligible_windows(&*backend, desktop)?;
        if windows.is_empty() {
            self.order.forget(desktop);
            return Ok(false);
        }
        self.order.stabilize(desktop, &windows);

        let Some(active) = backend.active_window()? else {
            debug!("Активное окно не определено, команда пропущена");
            return Ok(false);
        };

        if self.order.swap_neighbor(desktop, active, direction).is_none() {
            debug!("Окно {} нельзя сдвинуть {:?} на столе {}", active, direction, desktop);
            return Ok(false);
        }

        self.tile(backend, desktop)?;
        Ok(true)
    }

    /// Раскладывает текущий стол, если он входит в число плиточных
    pub fn tile_current<B>(&mut self, backend: &mut B) -> Result<usize>
    where
        B: DesktopSource + WindowSink + ?Sized,
    {
        let desktop = backend.current_desktop()?;
        if !self.config.should_tile(desktop) {
            debug!("Стол {} не входит в число плиточных", desktop);
            return Ok(0);
        }
        self.tile(backend, desktop)
    }

    /// Выполняет команду перестановки на текущем столе
    pub fn apply_command<B>(&mut self, backend: &mut B, command: Command) -> Result<bool>
    where
        B: DesktopSource + WindowSink + ?Sized,
    {
        let desktop = backend.current_desktop()?;
        if !self.config.should_tile(desktop) {
            debug!("Команда {} пропущена: стол {} не плиточный", command, desktop);
            return Ok(false);
        }

        let direction = if command.is_forward() {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.move_active(backend, desktop, direction)
    }
}
