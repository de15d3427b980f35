//! Client-side input validation for transitions.
//!
//! Validation failures block submission before any network call and are
//! surfaced inline, never through the notification sink.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::types::{ExternalPoRef, FeesPayload};
use crate::workflow::catalog::InputShape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionInputs {
    None,
    Fees {
        shipping_fees: f64,
        customs_fees: f64,
        other_fees: f64,
    },
    ExternalPoId(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{field} must be a number greater than or equal to 0")]
    InvalidFee { field: &'static str },
    #[error("Invalid Purchase Order ID.")]
    InvalidExternalPoId,
    #[error("operation '{operation}' expects {expected} input")]
    WrongShape {
        operation: &'static str,
        expected: &'static str,
    },
}

/// Fee-entry normalization: a negative or non-numeric entry resets the field
/// to 0 rather than carrying garbage into the payload.
pub fn sanitize_fee(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

fn fee_ok(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl TransitionInputs {
    /// Checks this input against the shape the catalog row declares.
    pub fn validate_for(
        &self,
        operation: &'static str,
        shape: InputShape,
    ) -> Result<(), InputError> {
        match (shape, self) {
            (InputShape::None, TransitionInputs::None) => Ok(()),
            (
                InputShape::Fees,
                TransitionInputs::Fees {
                    shipping_fees,
                    customs_fees,
                    other_fees,
                },
            ) => {
                if !fee_ok(*shipping_fees) {
                    return Err(InputError::InvalidFee {
                        field: "shipping_fees",
                    });
                }
                if !fee_ok(*customs_fees) {
                    return Err(InputError::InvalidFee {
                        field: "customs_fees",
                    });
                }
                if !fee_ok(*other_fees) {
                    return Err(InputError::InvalidFee { field: "other_fees" });
                }
                Ok(())
            }
            (InputShape::ExternalPoId, TransitionInputs::ExternalPoId(po_id)) => {
                if *po_id == 0 {
                    return Err(InputError::InvalidExternalPoId);
                }
                Ok(())
            }
            (shape, _) => Err(InputError::WrongShape {
                operation,
                expected: match shape {
                    InputShape::None => "no",
                    InputShape::Fees => "fee",
                    InputShape::ExternalPoId => "external purchase-order id",
                },
            }),
        }
    }

    pub fn fees(&self) -> Result<FeesPayload, InputError> {
        match self {
            TransitionInputs::Fees {
                shipping_fees,
                customs_fees,
                other_fees,
            } => Ok(FeesPayload {
                shipping_fees: *shipping_fees,
                customs_fees: *customs_fees,
                other_fees: *other_fees,
            }),
            _ => Err(InputError::WrongShape {
                operation: "calculate-net-sales",
                expected: "fee",
            }),
        }
    }

    pub fn external_po_id(&self) -> Result<ExternalPoRef, InputError> {
        match self {
            TransitionInputs::ExternalPoId(po_id) => Ok(ExternalPoRef { po_id: *po_id }),
            _ => Err(InputError::WrongShape {
                operation: "create-skus-and-po-non-ats",
                expected: "external purchase-order id",
            }),
        }
    }
}
