use crate::error::Result;
use crate::events::{DesktopId, WindowGeometry, WindowId};
use tracing::info;

use super::r#trait::{DesktopSource, EventSource, WindowSink};

/// Обёртка для `--dry-run`: читает состояние настоящего стола,
/// но вместо изменения окон только пишет в лог, что было бы сделано.
pub struct DryRun<B> {
    inner: B,
    pending: usize,
}

impl<B> DryRun<B> {
    pub fn new(inner: B) -> Self {
        info!("Dry-run режим - окна не будут изменяться");
        Self { inner, pending: 0 }
    }
}

impl<B: DesktopSource> DesktopSource for DryRun<B> {
    fn list_stacked_windows(&self) -> Result<Vec<WindowId>> {
        self.inner.list_stacked_windows()
    }

    fn is_dock_or_desktop_type(&self, window: WindowId) -> Result<bool> {
        self.inner.is_dock_or_desktop_type(window)
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>> {
        self.inner.window_desktop(window)
    }

    fn is_viewable(&self, window: WindowId) -> Result<bool> {
        self.inner.is_viewable(window)
    }

    fn active_window(&self) -> Result<Option<WindowId>> {
        self.inner.active_window()
    }

    fn current_desktop(&self) -> Result<DesktopId> {
        self.inner.current_desktop()
    }

    fn desktop_count(&self) -> Result<Option<u32>> {
        self.inner.desktop_count()
    }

    fn screen_size(&self) -> (u32, u32) {
        self.inner.screen_size()
    }
}

impl<B> WindowSink for DryRun<B> {
    fn clear_maximized_state(&mut self, _window: WindowId) -> Result<()> {
        Ok(())
    }

    fn strip_decorations(&mut self, _window: WindowId) -> Result<()> {
        Ok(())
    }

    fn set_geometry(&mut self, window: WindowId, geometry: WindowGeometry) -> Result<()> {
        info!("[DRY RUN] Окно {} -> {}", window, geometry);
        self.pending += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending > 0 {
            info!("[DRY RUN] Проход раскладки: {} окон", self.pending);
            self.pending = 0;
        }
        Ok(())
    }
}

impl<B: EventSource> EventSource for DryRun<B> {
    fn watch(&mut self) -> Result<()> {
        self.inner.watch()
    }

    fn drain_events(&mut self) -> Result<usize> {
        self.inner.drain_events()
    }
}
