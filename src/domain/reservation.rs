//! Quantity selection for a single reservation

use thiserror::Error;

use super::product::{ProductId, ProductRecord};

/// Reasons a requested quantity is refused before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is not a number")]
    NotANumber,
    #[error("quantity must be at least 1")]
    BelowMinimum,
    #[error("quantity exceeds the {max} available")]
    AboveAvailable { max: u32 },
    #[error("nothing left to reserve")]
    NothingAvailable,
}

/// Result of stepping the quantity up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Changed,
    /// The step hit the `[1, available]` bounds and was clamped
    Clamped,
}

/// An open reservation dialog
///
/// Lives from the moment a card is opened until the reservation is confirmed
/// or cancelled. `1 <= quantity <= available` holds at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationIntent {
    product_id: ProductId,
    article: String,
    unit_price: f64,
    available: u32,
    quantity: u32,
}

impl ReservationIntent {
    pub fn open(record: &ProductRecord) -> Result<Self, QuantityError> {
        let available = record.max_quantity();
        if available == 0 {
            return Err(QuantityError::NothingAvailable);
        }
        Ok(Self {
            product_id: record.id,
            article: record.article.clone(),
            unit_price: record.price,
            available,
            quantity: 1,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn article(&self) -> &str {
        &self.article
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }

    /// Move the quantity by `delta`, clamping into `[1, available]`
    pub fn step(&mut self, delta: i64) -> StepOutcome {
        let wanted = i64::from(self.quantity).saturating_add(delta);
        let clamped = wanted.clamp(1, i64::from(self.available));
        // clamped is within u32 range by construction
        self.quantity = u32::try_from(clamped).unwrap_or(1);
        if clamped == wanted {
            StepOutcome::Changed
        } else {
            StepOutcome::Clamped
        }
    }

    pub fn select_all(&mut self) {
        self.quantity = self.available;
    }

    /// Apply a quantity typed by the user
    ///
    /// Unlike [`step`](Self::step) this never clamps: an out-of-range value is
    /// reported back and the previous quantity is kept.
    pub fn set_custom(&mut self, input: &str) -> Result<u32, QuantityError> {
        let value: i64 = input
            .trim()
            .parse()
            .map_err(|_| QuantityError::NotANumber)?;
        let value = Self::check(value, self.available)?;
        self.quantity = value;
        Ok(value)
    }

    /// Re-check the invariant right before the reservation is sent
    pub fn validate(&self) -> Result<(), QuantityError> {
        Self::check(i64::from(self.quantity), self.available).map(|_| ())
    }

    fn check(value: i64, available: u32) -> Result<u32, QuantityError> {
        if value < 1 {
            return Err(QuantityError::BelowMinimum);
        }
        if value > i64::from(available) {
            return Err(QuantityError::AboveAvailable { max: available });
        }
        u32::try_from(value).map_err(|_| QuantityError::AboveAvailable { max: available })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn record() -> ProductRecord {
        ProductRecord {
            id: ProductId(7),
            article: "A-7".into(),
            name: "Washer".into(),
            department: "A".into(),
            group: None,
            price: 2.5,
            available: 10.0,
            balance_sum: 25.0,
            months_without_movement: 0,
            user_reserved: 0.0,
            user_reserved_sum: 0.0,
            is_different_department: false,
            locked_by_department: None,
        }
    }

    #[rstest]
    fn test_open_starts_at_one(record: ProductRecord) {
        let intent = ReservationIntent::open(&record).expect("stock available");
        assert_eq!(intent.quantity(), 1);
        assert_eq!(intent.available(), 10);
        assert_eq!(intent.product_id(), ProductId(7));
    }

    #[rstest]
    fn test_open_without_stock_is_refused(mut record: ProductRecord) {
        record.available = 0.0;
        assert_eq!(
            ReservationIntent::open(&record),
            Err(QuantityError::NothingAvailable)
        );
    }

    #[rstest]
    #[case(1, 2, StepOutcome::Changed)]
    #[case(-1, 1, StepOutcome::Clamped)]
    #[case(100, 10, StepOutcome::Clamped)]
    #[case(9, 10, StepOutcome::Changed)]
    fn test_step_clamps(
        record: ProductRecord,
        #[case] delta: i64,
        #[case] expected: u32,
        #[case] outcome: StepOutcome,
    ) {
        let mut intent = ReservationIntent::open(&record).expect("stock available");
        assert_eq!(intent.step(delta), outcome);
        assert_eq!(intent.quantity(), expected);
    }

    #[rstest]
    #[case("4", Ok(4))]
    #[case(" 10 ", Ok(10))]
    #[case("0", Err(QuantityError::BelowMinimum))]
    #[case("-3", Err(QuantityError::BelowMinimum))]
    #[case("11", Err(QuantityError::AboveAvailable { max: 10 }))]
    #[case("abc", Err(QuantityError::NotANumber))]
    fn test_set_custom(
        record: ProductRecord,
        #[case] input: &str,
        #[case] expected: Result<u32, QuantityError>,
    ) {
        let mut intent = ReservationIntent::open(&record).expect("stock available");
        assert_eq!(intent.set_custom(input), expected);
        if expected.is_err() {
            assert_eq!(intent.quantity(), 1, "rejected input keeps the old quantity");
        }
    }

    #[rstest]
    fn test_select_all_and_total(record: ProductRecord) {
        let mut intent = ReservationIntent::open(&record).expect("stock available");
        intent.select_all();
        assert_eq!(intent.quantity(), 10);
        assert_eq!(intent.total(), 25.0);
        assert!(intent.validate().is_ok());
    }
}
