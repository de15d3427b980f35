//! Guard evaluation: which transitions a purchase order currently exposes.

use crate::backend::types::PurchaseOrder;
use crate::workflow::catalog::{TransitionSpec, CATALOG};

/// Returns the transitions legal for `po`, in catalog order.
///
/// Pure and total: unrecognized statuses yield an empty set rather than an
/// error, so a backend vocabulary change degrades to "no actions" instead of
/// breaking the view. Callers must re-evaluate after every snapshot refresh;
/// results are only valid for the snapshot they were computed from.
pub fn evaluate(po: &PurchaseOrder) -> Vec<&'static TransitionSpec> {
    CATALOG
        .iter()
        .filter(|spec| spec.enabled_for(&po.status, po.is_ats))
        .collect()
}
