mod activity;
mod company;
mod contractor;
mod measurement;
mod purchase_order;
mod site;
mod worker;

pub use activity::Activity;
pub use company::Company;
pub use contractor::Contractor;
pub use measurement::{MeasurementSheet, SheetLine, StoredLines, compute_total};
pub use purchase_order::PurchaseOrder;
pub use site::Site;
pub use worker::Worker;

/// Millisecond creation timestamp assigned on insert; collections list in
/// descending order of this value.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
