//! Cash-flow forecasting from recurring obligations and estimated income

mod obligation;
mod forecast;
mod projector;

pub use obligation::RecurringObligation;
pub use forecast::{CashFlowForecast, DailyBalancePoint, EventKind, ForecastEvent};
pub use projector::CashFlowProjector;
