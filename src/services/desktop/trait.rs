use crate::error::Result;
use crate::events::{DesktopId, WindowGeometry, WindowId};

/// Запросы к оконной системе о столах и окнах
pub trait DesktopSource {
    /// Окна верхнего уровня в порядке стека (снизу вверх)
    fn list_stacked_windows(&self) -> Result<Vec<WindowId>>;

    fn is_dock_or_desktop_type(&self, window: WindowId) -> Result<bool>;

    /// Стол окна; `None` для «липких» окон и окон без стола
    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>>;

    fn is_viewable(&self, window: WindowId) -> Result<bool>;

    fn active_window(&self) -> Result<Option<WindowId>>;

    fn current_desktop(&self) -> Result<DesktopId>;

    fn desktop_count(&self) -> Result<Option<u32>>;

    /// Размер экрана в пикселях (ширина, высота)
    fn screen_size(&self) -> (u32, u32);
}

/// Изменение окон: снятие максимизации и декораций, геометрия
pub trait WindowSink {
    fn clear_maximized_state(&mut self, window: WindowId) -> Result<()>;

    fn strip_decorations(&mut self, window: WindowId) -> Result<()>;

    fn set_geometry(&mut self, window: WindowId, geometry: WindowGeometry) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// Уведомления об изменениях структуры окон
pub trait EventSource {
    /// Подписаться на уведомления корневого окна
    fn watch(&mut self) -> Result<()>;

    /// Неблокирующе выбрать все накопившиеся уведомления.
    /// Возвращает число тех, что требуют перераскладки.
    fn drain_events(&mut self) -> Result<usize>;
}

/// Полный набор возможностей, нужный циклу управления
pub trait DesktopBackend: DesktopSource + WindowSink + EventSource + Send {}

impl<T> DesktopBackend for T where T: DesktopSource + WindowSink + EventSource + Send {}
