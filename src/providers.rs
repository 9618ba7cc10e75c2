//! Shared provider traits for dependency injection.

use chrono::{Local, NaiveDate};

/// Trait for providing the calendar date a post is filed under.
///
/// # Example
///
/// ```
/// use orapost::providers::{DateProvider, FixedDateProvider};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// let provider = FixedDateProvider(date);
/// assert_eq!(provider.today(), date);
/// ```
pub trait DateProvider: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Today's date in the local time zone.
pub struct LocalDateProvider;

impl DateProvider for LocalDateProvider {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
pub struct FixedDateProvider(pub NaiveDate);

impl DateProvider for FixedDateProvider {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
