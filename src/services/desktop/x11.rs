use crate::error::Result;
use crate::events::{DesktopId, WindowGeometry, WindowId};
use crate::trace_if_enabled;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureWindowAux,
    ConnectionExt as _, EventMask, MapState, PropMode, Window,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::r#trait::{DesktopSource, EventSource, WindowSink};

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_CLIENT_LIST_STACKING,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_DESKTOP,
        _NET_WM_DESKTOP,
        _NET_ACTIVE_WINDOW,
        _NET_CURRENT_DESKTOP,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_WM_STATE,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _MOTIF_WM_HINTS,
    }
}

/// Значение `_NET_WM_DESKTOP` для окон, видимых на всех столах
const DESKTOP_STICKY: u32 = 0xFFFF_FFFF;

/// `_NET_WM_STATE_REMOVE`
const NET_WM_STATE_REMOVE: u32 = 0;

/// `_MOTIF_WM_HINTS`: flags = MWM_HINTS_DECORATIONS, decorations = 0
const MOTIF_NO_DECORATIONS: [u32; 5] = [2, 0, 0, 0, 0];

/// Рабочий стол X11 с EWMH-совместимым оконным менеджером
pub struct X11Desktop {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    // Кэш размера экрана, обновляется по ConfigureNotify корневого окна
    screen: (u32, u32),
}

/// Ошибка X11 для отдельного окна - обычная гонка с оконным менеджером,
/// а не повод прерывать проход. Потеря соединения пробрасывается дальше.
fn benign<T>(result: std::result::Result<T, ReplyError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::X11Error(error)) => {
            trace_if_enabled!("X11 вернул ошибку, считаем окно недоступным: {:?}", error);
            Ok(None)
        }
        Err(ReplyError::ConnectionError(error)) => Err(error.into()),
    }
}

impl X11Desktop {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let (root, screen) = {
            let screen = &conn.setup().roots[screen_num];
            (
                screen.root,
                (u32::from(screen.width_in_pixels), u32::from(screen.height_in_pixels)),
            )
        };
        let atoms = Atoms::new(&conn)?.reply()?;

        info!(
            "Подключено к X-серверу: экран {}, {}x{}",
            screen_num, screen.0, screen.1
        );

        Ok(Self {
            conn,
            root,
            atoms,
            screen,
        })
    }

    /// Значение 32-битного свойства, если его тип совпадает с ожидаемым
    fn property32(&self, window: Window, property: Atom, expected: impl Into<Atom>) -> Result<Vec<u32>> {
        let expected = expected.into();
        let reply = benign(
            self.conn
                .get_property(false, window, property, expected, 0, u32::MAX)?
                .reply(),
        )?;

        let values = match reply {
            Some(reply) if reply.type_ == expected => match reply.value32() {
                Some(values) => values.collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(values)
    }

    fn cardinal(&self, window: Window, property: Atom) -> Result<Option<u32>> {
        Ok(self
            .property32(window, property, AtomEnum::CARDINAL)?
            .first()
            .copied())
    }
}

impl DesktopSource for X11Desktop {
    fn list_stacked_windows(&self) -> Result<Vec<WindowId>> {
        let windows = self.property32(self.root, self.atoms._NET_CLIENT_LIST_STACKING, AtomEnum::WINDOW)?;
        Ok(windows.into_iter().map(WindowId).collect())
    }

    fn is_dock_or_desktop_type(&self, window: WindowId) -> Result<bool> {
        let types = self.property32(window.value(), self.atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM)?;
        Ok(types.into_iter().any(|kind| {
            kind == self.atoms._NET_WM_WINDOW_TYPE_DOCK || kind == self.atoms._NET_WM_WINDOW_TYPE_DESKTOP
        }))
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<DesktopId>> {
        let desktop = self.cardinal(window.value(), self.atoms._NET_WM_DESKTOP)?;
        Ok(desktop.filter(|desktop| *desktop != DESKTOP_STICKY))
    }

    fn is_viewable(&self, window: WindowId) -> Result<bool> {
        let attributes = benign(self.conn.get_window_attributes(window.value())?.reply())?;
        Ok(attributes.is_some_and(|attributes| attributes.map_state == MapState::VIEWABLE))
    }

    fn active_window(&self) -> Result<Option<WindowId>> {
        let active = self.property32(self.root, self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW)?;
        Ok(active
            .first()
            .copied()
            .filter(|window| *window != x11rb::NONE)
            .map(WindowId))
    }

    fn current_desktop(&self) -> Result<DesktopId> {
        Ok(self
            .cardinal(self.root, self.atoms._NET_CURRENT_DESKTOP)?
            .unwrap_or(0))
    }

    fn desktop_count(&self) -> Result<Option<u32>> {
        self.cardinal(self.root, self.atoms._NET_NUMBER_OF_DESKTOPS)
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }
}

impl WindowSink for X11Desktop {
    fn clear_maximized_state(&mut self, window: WindowId) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            window.value(),
            self.atoms._NET_WM_STATE,
            [
                NET_WM_STATE_REMOVE,
                self.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
                self.atoms._NET_WM_STATE_MAXIMIZED_VERT,
                0,
                0,
            ],
        );
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )?
            .ignore_error();
        Ok(())
    }

    fn strip_decorations(&mut self, window: WindowId) -> Result<()> {
        self.conn
            .change_property32(
                PropMode::REPLACE,
                window.value(),
                self.atoms._MOTIF_WM_HINTS,
                self.atoms._MOTIF_WM_HINTS,
                &MOTIF_NO_DECORATIONS,
            )?
            .ignore_error();
        Ok(())
    }

    fn set_geometry(&mut self, window: WindowId, geometry: WindowGeometry) -> Result<()> {
        let changes = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.width)
            .height(geometry.height);
        self.conn.configure_window(window.value(), &changes)?.ignore_error();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}

impl EventSource for X11Desktop {
    fn watch(&mut self) -> Result<()> {
        let mask = EventMask::PROPERTY_CHANGE | EventMask::SUBSTRUCTURE_NOTIFY | EventMask::STRUCTURE_NOTIFY;
        self.conn
            .change_window_attributes(self.root, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()?;
        debug!("Подписка на события корневого окна 0x{:x} оформлена", self.root);
        Ok(())
    }

    fn drain_events(&mut self) -> Result<usize> {
        let mut changes = 0;
        while let Some(event) = self.conn.poll_for_event()? {
            match event {
                Event::ConfigureNotify(notify) => {
                    if notify.window == self.root {
                        let size = (u32::from(notify.width), u32::from(notify.height));
                        if size != self.screen {
                            info!("Размер экрана изменился: {}x{}", size.0, size.1);
                            self.screen = size;
                        }
                    }
                    changes += 1;
                }
                Event::PropertyNotify(_) | Event::CreateNotify(_) | Event::DestroyNotify(_) => {
                    changes += 1;
                }
                Event::Error(error) => {
                    trace_if_enabled!("Асинхронная ошибка X11: {:?}", error);
                }
                _ => {}
            }
        }
        Ok(changes)
    }
}
