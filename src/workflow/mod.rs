pub mod busy;
pub mod catalog;
pub mod executor;
pub mod guard;
pub mod inputs;
pub mod notify;
pub mod reconciler;

pub use busy::{BusyGuard, BusyTable};
pub use catalog::{
    find_by_operation, override_targets, spec_for, undo_target, AtsRule, InputShape,
    TransitionKind, TransitionSpec, CATALOG,
};
pub use executor::{ExecuteError, TransitionExecutor};
pub use guard::evaluate;
pub use inputs::{sanitize_fee, InputError, TransitionInputs};
pub use notify::{NotificationSink, Notice, RecordingSink, Severity, TracingSink};
pub use reconciler::{PoRow, PoSnapshot, PollLoopHandle, Reconciler};
