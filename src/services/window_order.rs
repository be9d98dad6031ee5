use crate::events::{DesktopId, WindowId};
use std::collections::{HashMap, HashSet};

/// Запомненный порядок окон для каждого стола.
///
/// Принадлежит циклу управления целиком и не разделяется между потоками,
/// поэтому обходится без блокировок.
#[derive(Debug, Default)]
pub struct WindowOrder {
    orders: HashMap<DesktopId, Vec<WindowId>>,
}

/// Куда сдвигать окно в стабильном порядке
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl WindowOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Сливает свежий набор окон стола с запомненным порядком.
    ///
    /// Выжившие окна сохраняют взаимный порядок, исчезнувшие выбрасываются,
    /// новые дописываются в конец в том порядке, в каком пришли в `current`.
    pub fn stabilize(&mut self, desktop: DesktopId, current: &[WindowId]) -> Vec<WindowId> {
        let mut remaining: HashSet<WindowId> = current.iter().copied().collect();
        let mut result = Vec::with_capacity(remaining.len());

        if let Some(stored) = self.orders.get(&desktop) {
            result.extend(stored.iter().copied().filter(|window| remaining.remove(window)));
        }
        result.extend(current.iter().copied().filter(|window| remaining.remove(window)));

        self.orders.insert(desktop, result.clone());
        result
    }

    /// Меняет окно местами с соседом в заданном направлении.
    ///
    /// Возвращает новый порядок, если перестановка состоялась. Окно, которого
    /// нет в порядке, или окно у края (без зацикливания) ничего не меняют.
    pub fn swap_neighbor(
        &mut self,
        desktop: DesktopId,
        window: WindowId,
        direction: Direction,
    ) -> Option<Vec<WindowId>> {
        let order = self.orders.get_mut(&desktop)?;
        let index = order.iter().position(|candidate| *candidate == window)?;
        let neighbor = match direction {
            Direction::Forward => index.checked_add(1).filter(|next| *next < order.len())?,
            Direction::Backward => index.checked_sub(1)?,
        };
        order.swap(index, neighbor);
        Some(order.clone())
    }

    /// Забывает порядок стола: когда на нём снова появятся окна, порядок начнётся заново
    pub fn forget(&mut self, desktop: DesktopId) {
        self.orders.remove(&desktop);
    }

    #[allow(dead_code)]
    pub fn get(&self, desktop: DesktopId) -> Option<&[WindowId]> {
        self.orders.get(&desktop).map(Vec::as_slice)
    }
}
