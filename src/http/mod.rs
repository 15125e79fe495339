//! HTTP boundary: the admission guard middleware and the decision service.

mod guard;
mod server;
mod service;

pub use guard::{admission_guard, GuardState, REMAINING_DAILY_HEADER, REMAINING_HOURLY_HEADER};
pub use server::HttpServer;
pub use service::{router, CheckRequest, CheckResponse, QuotaQuery};
