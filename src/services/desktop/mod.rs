//! Desktop service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the windowing
//! system: answering which windows live on which desktop and applying geometry and
//! decoration changes. It MUST NOT decide window order or layout; that belongs to
//! the Tiler, which drives any backend through the traits below.

mod dry_run;
#[cfg(test)]
pub mod fake;
mod r#trait;
mod x11;

pub use self::dry_run::DryRun;
pub use self::r#trait::{DesktopBackend, DesktopSource, WindowSink};
pub use self::x11::X11Desktop;

use crate::error::Result;
use crate::events::{DesktopId, WindowId};

/// Окна стола, подлежащие раскладке, в порядке стека.
///
/// Отбрасываются доки и окна рабочего стола, «липкие» окна, окна других столов
/// и неотображаемые окна.
pub fn eligible_windows<S>(source: &S, desktop: DesktopId) -> Result<Vec<WindowId>>
where
    S: DesktopSource + ?Sized,
{
    let mut eligible = Vec::new();
    for window in source.list_stacked_windows()? {
        if source.is_dock_or_desktop_type(window)? {
            continue;
        }
        if source.window_desktop(window)? != Some(desktop) {
            continue;
        }
        if !source.is_viewable(window)? {
            continue;
        }
        eligible.push(window);
    }
    Ok(eligible)
}
