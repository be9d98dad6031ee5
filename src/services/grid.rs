//! Разбиение экрана на сетку прямоугольников.
//!
//! Форма строк задана таблицей, а не вычисляется: до шести окон раскладка
//! подобрана вручную, дальше экран набирается строками по три окна.
//! Результат детерминирован и совпадает до пикселя для одинаковых входных данных.

use crate::config::DesktopLayout;
use crate::events::WindowGeometry;
use smallvec::{smallvec, SmallVec};

/// Ширина строки сетки, начиная с которой окна переносятся на следующую строку
const MAX_COLUMNS: usize = 3;

/// Число окон в каждой строке, сверху вниз
pub type RowShape = SmallVec<[usize; 4]>;

pub fn row_shape(count: usize) -> RowShape {
    match count {
        0 => SmallVec::new(),
        1 => smallvec![1],
        2 => smallvec![2],
        3 => smallvec![3],
        4 => smallvec![2, 2],
        5 => smallvec![2, 3],
        6 => smallvec![3, 3],
        _ => {
            let mut rows = RowShape::new();
            let mut remaining = count;
            while remaining > 0 {
                let columns = remaining.min(MAX_COLUMNS);
                rows.push(columns);
                remaining -= columns;
            }
            rows
        }
    }
}

/// Честное целочисленное деление `total` на `slots` частей:
/// первые `total % slots` частей получают на пиксель больше.
pub fn distribute(total: u32, slots: usize) -> Vec<u32> {
    if slots == 0 {
        return Vec::new();
    }
    let slots_u64 = slots as u64;
    let base = u64::from(total) / slots_u64;
    let remainder = u64::from(total) % slots_u64;
    (0..slots_u64)
        .map(|i| (base + u64::from(i < remainder)) as u32)
        .collect()
}

/// Суммарная ширина зазоров между `slots` соседними ячейками
fn gaps_total(gap: u32, slots: usize) -> u32 {
    let between = u32::try_from(slots.saturating_sub(1)).unwrap_or(u32::MAX);
    gap.saturating_mul(between)
}

fn advance(origin: i32, size: u32, gap: u32) -> i32 {
    let next = i64::from(origin) + i64::from(size) + i64::from(gap);
    next.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn to_coordinate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Прямоугольники для `count` окон в порядке чтения: слева направо, сверху вниз.
///
/// Отступы и зазоры, не помещающиеся на экран, не считаются ошибкой: полезное
/// пространство обрезается до нуля и окна получают нулевую ширину или высоту.
pub fn compute_positions(
    count: usize,
    screen_width: u32,
    screen_height: u32,
    layout: &DesktopLayout,
) -> Vec<WindowGeometry> {
    let rows = row_shape(count);
    if rows.is_empty() {
        return Vec::new();
    }

    let usable_width = screen_width
        .saturating_sub(layout.left)
        .saturating_sub(layout.right);
    let usable_height = screen_height
        .saturating_sub(layout.top)
        .saturating_sub(layout.bottom)
        .saturating_sub(gaps_total(layout.gap, rows.len()));
    let row_heights = distribute(usable_height, rows.len());

    let mut result = Vec::with_capacity(count);
    let mut y = to_coordinate(layout.top);
    for (&columns, &height) in rows.iter().zip(&row_heights) {
        let row_width = usable_width.saturating_sub(gaps_total(layout.gap, columns));
        let mut x = to_coordinate(layout.left);
        for width in distribute(row_width, columns) {
            result.push(WindowGeometry::new(x, y, width, height));
            x = advance(x, width, layout.gap);
        }
        y = advance(y, height, layout.gap);
    }
    result
}
