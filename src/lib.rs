// po-pilot library - purchase-order workflow engine
// This exposes the core components for testing and integration

pub mod backend;
pub mod config;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use backend::{
    BackendApi, BackendError, HttpBackend, LogEntry, NewPurchaseOrder, PoStatus, PurchaseOrder,
};
pub use config::{config, PoPilotConfig};
pub use telemetry::init_telemetry;
pub use workflow::{
    evaluate, find_by_operation, override_targets, sanitize_fee, undo_target, BusyTable,
    ExecuteError, InputError, InputShape, NotificationSink, PoRow, PollLoopHandle, Reconciler,
    RecordingSink, Severity, TracingSink, TransitionExecutor, TransitionInputs, TransitionKind,
    TransitionSpec, CATALOG,
};
