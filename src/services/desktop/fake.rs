//! In-memory desktop used by the tests: a scripted window list plus a log
//! of every mutation the tiler performs.

use crate::error::Result;
use crate::events::{DesktopId, WindowGeometry, WindowId};

use super::r#trait::{DesktopSource, EventSource, WindowSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOp {
    ClearMaximized(WindowId),
    StripDecorations(WindowId),
    SetGeometry(WindowId, WindowGeometry),
    Flush,
}

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub id: WindowId,
    pub desktop: Option<DesktopId>,
    pub dock: bool,
    pub viewable: bool,
}

#[derive(Debug, Default)]
pub struct FakeDesktop {
    pub windows: Vec<FakeWindow>,
    pub active: Option<WindowId>,
    pub current: DesktopId,
    pub count: Option<u32>,
    pub screen: (u32, u32),
    pub pending_events: usize,
    pub watching: bool,
    ops: Vec<SinkOp>,
}

impl FakeDesktop {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: (width, height),
            ..Default::default()
        }
    }

    /// Добавляет окно на вершину стека
    pub fn add_window(&mut self, id: u32, desktop: Option<DesktopId>) -> &mut FakeWindow {
        self.windows.push(FakeWindow {
            id: WindowId(id),
            desktop,
            dock: false,
            viewable: true,
        });
        self.windows.last_mut().expect("window was just pushed")
    }

    pub fn remove_window(&mut self, id: u32) {
        self.windows.retain(|window| window.id != WindowId(id));
    }

    pub fn set_active(&mut self, active: Option<u32>) {
        self.active = active.map(WindowId);
    }

    pub fn ops(&self) -> &[SinkOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SinkOp> {
        std::mem::take(&mut self.ops)
    }

    /// Геометрии из журнала изменений, в порядке применения
    pub fn geometries(&self) -> Vec<(WindowId, WindowGeometry)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SinkOp::SetGeometry(window, geometry) => Some((*window, *geometry)),
                _ => None,
            })
            .collect()
    }

    /// Число завершённых проходов раскладки
    pub fn flushes(&self) -> usize {
        self.ops.iter().filter(|op| **op == SinkOp::Flush).count()
    }

    fn find(&self, window: WindowId) -> Option<&FakeWindow> {
        self.windows.iter().find(|candidate| candidate.id == window)
    }
}

impl DesktopSource for FakeDesktop {
    fn list_stacked_windows(&self) -> Result<Vec<WindowId>> {
        Ok(self.windows.iter().map(|window| window.id).collect())
    }

    fn is_dock_or_desktop_type(&self, window: WindowId) -> Result<bool> {
        Ok(self.find(window).is_some_and(|window| window.dock))
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>> {
        Ok(self.find(window).and_then(|window| window.desktop))
    }

    fn is_viewable(&self, window: WindowId) -> Result<bool> {
        Ok(self.find(window).is_some_and(|window| window.viewable))
    }

    fn active_window(&self) -> Result<Option<WindowId>> {
        Ok(self.active)
    }

    fn current_desktop(&self) -> Result<DesktopId> {
        Ok(self.current)
    }

    fn desktop_count(&self) -> Result<Option<u32>> {
        Ok(self.count)
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }
}

impl WindowSink for FakeDesktop {
    fn clear_maximized_state(&mut self, window: WindowId) -> Result<()> {
        self.ops.push(SinkOp::ClearMaximized(window));
        Ok(())
    }

    fn strip_decorations(&mut self, window: WindowId) -> Result<()> {
        self.ops.push(SinkOp::StripDecorations(window));
        Ok(())
    }

    fn set_geometry(&mut self, window: WindowId, geometry: WindowGeometry) -> Result<()> {
        self.ops.push(SinkOp::SetGeometry(window, geometry));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ops.push(SinkOp::Flush);
        Ok(())
    }
}

impl EventSource for FakeDesktop {
    fn watch(&mut self) -> Result<()> {
        self.watching = true;
        Ok(())
    }

    fn drain_events(&mut self) -> Result<usize> {
        Ok(std::mem::take(&mut self.pending_events))
    }
}
