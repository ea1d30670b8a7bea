//! Calendar arithmetic: month values and recurrence scheduling

mod month;
mod recurrence;

pub use month::{CalendarMonth, shift_months, days_in_month};
pub use recurrence::{Frequency, RecurrenceScheduler};
