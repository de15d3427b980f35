pub mod client;
pub mod errors;
pub mod types;

pub use client::{BackendApi, HttpBackend};
pub use errors::BackendError;
pub use types::{
    ExternalPoRef, FeesPayload, LogEntry, NewPurchaseOrder, PoStatus, PurchaseOrder, ResponseMsg,
    StatusOverride,
};
