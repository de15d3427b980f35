//! Transition execution.
//!
//! One transition at a time per purchase order: validate input, claim the
//! row, call the backend, report the outcome. The caller is expected to have
//! run the blocking confirmation step already; the executor only enforces
//! the machine-checkable preconditions.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::client::BackendApi;
use crate::backend::errors::BackendError;
use crate::backend::types::{NewPurchaseOrder, PoStatus, ResponseMsg, StatusOverride};
use crate::workflow::busy::BusyTable;
use crate::workflow::catalog::{self, TransitionKind};
use crate::workflow::inputs::{InputError, TransitionInputs};
use crate::workflow::notify::{NotificationSink, Severity};
use crate::workflow::reconciler::Reconciler;

#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Row-level single-flight: some transition is already in flight for this
    /// purchase order.
    #[error("another operation is already running for purchase order #{id}")]
    Busy { id: u64 },
    #[error("purchase order #{id} is not in the current snapshot")]
    UnknownPo { id: u64 },
    /// The transition's guard does not admit the PO's current status/type.
    #[error("'{operation}' is not available for purchase order #{id} ({status})")]
    NotEnabled {
        operation: &'static str,
        id: u64,
        status: PoStatus,
    },
    /// Manual override target outside the restricted menu for this PO type.
    #[error("status '{status}' cannot be applied to purchase order #{id}")]
    TargetNotAllowed { id: u64, status: PoStatus },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub struct TransitionExecutor {
    backend: Arc<dyn BackendApi>,
    sink: Arc<dyn NotificationSink>,
    reconciler: Arc<Reconciler>,
}

impl TransitionExecutor {
    pub fn new(
        backend: Arc<dyn BackendApi>,
        sink: Arc<dyn NotificationSink>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self {
            backend,
            sink,
            reconciler,
        }
    }

    fn busy(&self) -> &BusyTable {
        self.reconciler.busy_table()
    }

    /// Executes one catalog transition for the given purchase order.
    ///
    /// Returns the backend's success message. Validation and guard failures
    /// reject before any network call and never reach the sink; backend
    /// rejections are forwarded to the sink verbatim with error severity and
    /// leave the local snapshot untouched until the next refresh. A success
    /// triggers an immediate foreground refresh. Never retries.
    pub async fn execute(
        &self,
        id: u64,
        kind: TransitionKind,
        inputs: TransitionInputs,
    ) -> Result<String, ExecuteError> {
        let spec = catalog::spec_for(kind);
        let po = self
            .reconciler
            .get(id)
            .ok_or(ExecuteError::UnknownPo { id })?;
        if !spec.enabled_for(&po.status, po.is_ats) {
            return Err(ExecuteError::NotEnabled {
                operation: spec.operation,
                id,
                status: po.status,
            });
        }
        inputs.validate_for(spec.operation, spec.input)?;

        let _row = self.busy().try_begin(id).ok_or(ExecuteError::Busy { id })?;
        info!(id, operation = spec.operation, "executing transition");
        let outcome = self.dispatch(id, kind, &inputs).await;
        self.finish(id, spec.operation, outcome).await
    }

    /// Developer-only escape hatch: forces a status from the restricted menu,
    /// bypassing guards but keeping the busy and confirmation discipline.
    /// The request clears `spreadsheet_id`: a forced status discards
    /// downstream artifacts.
    pub async fn override_status(
        &self,
        id: u64,
        target: PoStatus,
    ) -> Result<String, ExecuteError> {
        let po = self
            .reconciler
            .get(id)
            .ok_or(ExecuteError::UnknownPo { id })?;
        if !catalog::override_targets(po.is_ats).contains(&target) {
            return Err(ExecuteError::TargetNotAllowed { id, status: target });
        }

        let _row = self.busy().try_begin(id).ok_or(ExecuteError::Busy { id })?;
        warn!(id, status = %target, "forcing purchase-order status");
        let outcome = self
            .backend
            .override_status(id, &StatusOverride::forced(target))
            .await;
        self.finish(id, "override-status", outcome).await
    }

    /// Creates a purchase order. Fire-and-forget: the backend acknowledges
    /// and the new row is discovered on the next refresh.
    pub async fn create(
        &self,
        name: String,
        is_ats: bool,
        currency: String,
    ) -> Result<(), ExecuteError> {
        let request = NewPurchaseOrder {
            name,
            is_ats,
            currency,
        };
        match self.backend.create_purchase_order(&request).await {
            Ok(()) => {
                self.sink.notify("Creating Purchase Order...", Severity::Success);
                self.reconciler.refresh(false).await;
                Ok(())
            }
            Err(err) => {
                self.sink.notify(&err.to_string(), Severity::Error);
                Err(err.into())
            }
        }
    }

    async fn dispatch(
        &self,
        id: u64,
        kind: TransitionKind,
        inputs: &TransitionInputs,
    ) -> Result<ResponseMsg, ExecuteError> {
        let response = match kind {
            TransitionKind::CreateBreakdown => self.backend.create_breakdown(id).await?,
            TransitionKind::CalculateNetSales => {
                self.backend.calculate_net_sales(id, &inputs.fees()?).await?
            }
            TransitionKind::CreateSkusAndPoAts => self.backend.create_skus_and_po_ats(id).await?,
            TransitionKind::CreateSkusAndPoNonAts => {
                self.backend
                    .create_skus_and_po_non_ats(id, &inputs.external_po_id()?)
                    .await?
            }
            TransitionKind::Delete => self.backend.delete_purchase_order(id).await?,
            TransitionKind::Undo => self.backend.undo_status(id).await?,
        };
        Ok(response)
    }

    /// Shared outcome handling: successes and backend rejections both reach
    /// the sink; only a success triggers a refresh. The caller's busy guard
    /// stays held through the refresh so the row cannot accept a second
    /// submission while its post-transition state is still being fetched.
    async fn finish(
        &self,
        id: u64,
        operation: &str,
        outcome: Result<ResponseMsg, impl Into<ExecuteError>>,
    ) -> Result<String, ExecuteError> {
        match outcome {
            Ok(response) => {
                info!(id, operation, message = %response.message, "transition accepted");
                self.sink.notify(&response.message, Severity::Success);
                self.reconciler.refresh(false).await;
                Ok(response.message)
            }
            Err(err) => {
                let err = err.into();
                if let ExecuteError::Backend(backend_err) = &err {
                    warn!(id, operation, error = %backend_err, "transition rejected");
                    self.sink.notify(&backend_err.to_string(), Severity::Error);
                }
                Err(err)
            }
        }
    }
}
