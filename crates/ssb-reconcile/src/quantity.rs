use serde::{Deserialize, Serialize};

/// A stock amount split into whole lots plus remaining units.
///
/// Invariant (when produced by [`decompose`]): `units < lot_size`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuantity {
    pub lots: u64,
    pub units: u64,
}

impl StockQuantity {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.lots == 0 && self.units == 0
    }

    /// Dashboard rendering: `"2 lot(s) 5 unité(s)"`, zero parts omitted,
    /// `"-"` when empty.
    pub fn label(&self) -> String {
        match (self.lots, self.units) {
            (0, 0) => "-".to_string(),
            (l, 0) => format!("{l} lot(s)"),
            (0, u) => format!("{u} unité(s)"),
            (l, u) => format!("{l} lot(s) {u} unité(s)"),
        }
    }
}

/// Split `total_units` into lots of `lot_size`. A `lot_size` of 0 is read as 1.
pub fn decompose(total_units: u64, lot_size: u64) -> StockQuantity {
    let size = lot_size.max(1);
    StockQuantity {
        lots: total_units / size,
        units: total_units % size,
    }
}

/// Inverse of [`decompose`]: `lots * lot_size + units`, saturating.
pub fn compose(lots: u64, units: u64, lot_size: u64) -> u64 {
    lots.saturating_mul(lot_size).saturating_add(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_reconstructs_exactly() {
        for lot_size in 1..=25u64 {
            for total in 0..=200u64 {
                let q = decompose(total, lot_size);
                assert!(q.units < lot_size);
                assert_eq!(compose(q.lots, q.units, lot_size), total);
            }
        }
    }

    #[test]
    fn zero_lot_size_degenerates_to_units() {
        assert_eq!(decompose(7, 0), StockQuantity { lots: 7, units: 0 });
    }

    #[test]
    fn labels() {
        assert_eq!(StockQuantity::zero().label(), "-");
        assert_eq!(StockQuantity { lots: 2, units: 5 }.label(), "2 lot(s) 5 unité(s)");
        assert_eq!(StockQuantity { lots: 1, units: 0 }.label(), "1 lot(s)");
        assert_eq!(StockQuantity { lots: 0, units: 3 }.label(), "3 unité(s)");
    }
}
