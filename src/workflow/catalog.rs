//! Transition catalog
//!
//! The set of legal purchase-order transitions as one declarative table,
//! keyed by (status, type). Guards are data, not scattered conditionals, so
//! every status × type combination can be enumerated and tested.
//!
//! Non-ATS purchase orders walk the full four-stage pipeline (worksheet →
//! breakdown → net sales → PO); ATS purchase orders skip the breakdown and
//! net-sales stages. A status may enable several transitions at once, so the
//! model is status × type → set, not a single next-state pointer.

use crate::backend::types::PoStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    CreateBreakdown,
    CalculateNetSales,
    CreateSkusAndPoAts,
    CreateSkusAndPoNonAts,
    Delete,
    Undo,
}

/// Client-side input a transition requires before it may be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    None,
    /// Shipping, customs and other fees, each numeric and >= 0.
    Fees,
    /// External purchase-order id, integer > 0.
    ExternalPoId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtsRule {
    Any,
    AtsOnly,
    NonAtsOnly,
}

/// One row of the transition catalog.
#[derive(Debug)]
pub struct TransitionSpec {
    pub kind: TransitionKind,
    /// Stable operation name, also the CLI spelling.
    pub operation: &'static str,
    pub label: &'static str,
    /// Statuses at which this transition is legal.
    pub statuses: &'static [PoStatus],
    pub ats: AtsRule,
    pub input: InputShape,
    pub method: &'static str,
    pub endpoint: &'static str,
    /// Informational only. The authoritative status always comes back from
    /// the backend on the next refresh. `None` when the row is removed
    /// (Delete) or the target depends on the current status (Undo).
    pub expected: Option<PoStatus>,
    /// Blocking confirmation shown before the call is issued; `None` for
    /// transitions whose own input entry acts as the confirmation step.
    pub confirm: Option<&'static str>,
}

impl TransitionSpec {
    /// The guard predicate: legal iff the status is in this row's set and the
    /// PO's type matches.
    pub fn enabled_for(&self, status: &PoStatus, is_ats: bool) -> bool {
        let type_ok = match self.ats {
            AtsRule::Any => true,
            AtsRule::AtsOnly => is_ats,
            AtsRule::NonAtsOnly => !is_ats,
        };
        type_ok && self.statuses.contains(status)
    }

    pub fn endpoint_for(&self, id: u64) -> String {
        self.endpoint.replace("{id}", &id.to_string())
    }
}

/// Catalog order is the UI order: pipeline-advancing actions first, then
/// Delete, then Undo.
pub const CATALOG: &[TransitionSpec] = &[
    TransitionSpec {
        kind: TransitionKind::CreateBreakdown,
        operation: "create-breakdown",
        label: "Create Breakdown",
        statuses: &[PoStatus::WorksheetCreated, PoStatus::BreakdownErrors],
        ats: AtsRule::NonAtsOnly,
        input: InputShape::None,
        method: "POST",
        endpoint: "purchase-orders/{id}/create-breakdown",
        expected: Some(PoStatus::BreakdownCreated),
        confirm: Some("Are all products ready for breakdown?"),
    },
    TransitionSpec {
        kind: TransitionKind::CalculateNetSales,
        operation: "calculate-net-sales",
        label: "Calculate Net Sales",
        statuses: &[PoStatus::BreakdownCreated, PoStatus::NetSalesErrors],
        ats: AtsRule::NonAtsOnly,
        input: InputShape::Fees,
        method: "POST",
        endpoint: "purchase-orders/{id}/calculate-net-sales",
        expected: Some(PoStatus::NetSalesCalculated),
        confirm: None,
    },
    TransitionSpec {
        kind: TransitionKind::CreateSkusAndPoAts,
        operation: "create-skus-and-po-ats",
        label: "Create SKUs and PO",
        statuses: &[PoStatus::WorksheetCreated],
        ats: AtsRule::AtsOnly,
        input: InputShape::None,
        method: "POST",
        endpoint: "purchase-orders/{id}/create-skus-and-po-ats",
        expected: Some(PoStatus::PoCreated),
        confirm: Some("Are all products finalized and ready to be uploaded?"),
    },
    TransitionSpec {
        kind: TransitionKind::CreateSkusAndPoNonAts,
        operation: "create-skus-and-po-non-ats",
        label: "Create SKUs and PO",
        statuses: &[PoStatus::NetSalesCalculated, PoStatus::CreateSkusAndPoErrors],
        ats: AtsRule::NonAtsOnly,
        input: InputShape::ExternalPoId,
        method: "POST",
        endpoint: "purchase-orders/{id}/create-skus-and-po-non-ats",
        expected: Some(PoStatus::PoCreated),
        confirm: Some("Create SKUs and PO for this purchase order?"),
    },
    TransitionSpec {
        kind: TransitionKind::Delete,
        operation: "delete",
        label: "Delete",
        statuses: &[
            PoStatus::WorksheetCreated,
            PoStatus::BreakdownErrors,
            PoStatus::CreateSkusAndPoErrors,
        ],
        ats: AtsRule::Any,
        input: InputShape::None,
        method: "DELETE",
        endpoint: "purchase-orders/{id}",
        expected: None,
        confirm: Some("Are you sure you want to delete this PO? This action is irreversible!"),
    },
    TransitionSpec {
        kind: TransitionKind::Undo,
        operation: "undo",
        label: "Undo",
        statuses: &[
            PoStatus::BreakdownCreated,
            PoStatus::NetSalesErrors,
            PoStatus::NetSalesCalculated,
        ],
        ats: AtsRule::NonAtsOnly,
        input: InputShape::None,
        method: "PUT",
        endpoint: "purchase-orders/{id}/undo-status",
        expected: None,
        confirm: Some("Are you sure you want to undo the latest process?"),
    },
];

pub fn spec_for(kind: TransitionKind) -> &'static TransitionSpec {
    match kind {
        TransitionKind::CreateBreakdown => &CATALOG[0],
        TransitionKind::CalculateNetSales => &CATALOG[1],
        TransitionKind::CreateSkusAndPoAts => &CATALOG[2],
        TransitionKind::CreateSkusAndPoNonAts => &CATALOG[3],
        TransitionKind::Delete => &CATALOG[4],
        TransitionKind::Undo => &CATALOG[5],
    }
}

pub fn find_by_operation(operation: &str) -> Option<&'static TransitionSpec> {
    CATALOG.iter().find(|spec| spec.operation == operation)
}

/// Reverse target the backend applies on undo, used only for confirmation
/// text; the backend recomputes it server-side from the current status.
pub fn undo_target(status: &PoStatus) -> Option<PoStatus> {
    match status {
        PoStatus::BreakdownCreated => Some(PoStatus::WorksheetCreated),
        PoStatus::NetSalesCalculated | PoStatus::NetSalesErrors => {
            Some(PoStatus::BreakdownCreated)
        }
        _ => None,
    }
}

/// Restricted target menu for the manual status override. Non-ATS purchase
/// orders may be forced to any pipeline stage; ATS purchase orders never pass
/// through the breakdown or net-sales stages, so those targets are withheld.
pub fn override_targets(is_ats: bool) -> Vec<PoStatus> {
    let mut targets = vec![PoStatus::WorksheetCreated];
    if !is_ats {
        targets.extend([
            PoStatus::BreakdownCreated,
            PoStatus::NetSalesCalculated,
            PoStatus::PoCreated,
        ]);
    }
    targets.extend([PoStatus::PoReceived, PoStatus::InternalError]);
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_for_returns_the_matching_row() {
        for kind in [
            TransitionKind::CreateBreakdown,
            TransitionKind::CalculateNetSales,
            TransitionKind::CreateSkusAndPoAts,
            TransitionKind::CreateSkusAndPoNonAts,
            TransitionKind::Delete,
            TransitionKind::Undo,
        ] {
            assert_eq!(spec_for(kind).kind, kind);
        }
    }

    #[test]
    fn catalog_has_one_row_per_kind() {
        let kinds: Vec<_> = CATALOG.iter().map(|spec| spec.kind).collect();
        for kind in [
            TransitionKind::CreateBreakdown,
            TransitionKind::CalculateNetSales,
            TransitionKind::CreateSkusAndPoAts,
            TransitionKind::CreateSkusAndPoNonAts,
            TransitionKind::Delete,
            TransitionKind::Undo,
        ] {
            assert_eq!(kinds.iter().filter(|k| **k == kind).count(), 1);
        }
    }

    #[test]
    fn pipeline_actions_precede_delete_and_undo() {
        let position = |kind| {
            CATALOG
                .iter()
                .position(|spec| spec.kind == kind)
                .unwrap()
        };
        assert!(position(TransitionKind::CreateBreakdown) < position(TransitionKind::Delete));
        assert!(position(TransitionKind::CreateSkusAndPoNonAts) < position(TransitionKind::Delete));
        assert!(position(TransitionKind::Delete) < position(TransitionKind::Undo));
    }

    #[test]
    fn delete_is_type_agnostic_and_side_effect_free_statuses_only() {
        let delete = spec_for(TransitionKind::Delete);
        assert!(delete.enabled_for(&PoStatus::WorksheetCreated, true));
        assert!(delete.enabled_for(&PoStatus::WorksheetCreated, false));
        assert!(!delete.enabled_for(&PoStatus::PoCreated, false));
        assert!(!delete.enabled_for(&PoStatus::NetSalesCalculated, false));
    }

    #[test]
    fn endpoint_templates_expand_the_id() {
        assert_eq!(
            spec_for(TransitionKind::CreateBreakdown).endpoint_for(42),
            "purchase-orders/42/create-breakdown"
        );
        assert_eq!(spec_for(TransitionKind::Delete).endpoint_for(7), "purchase-orders/7");
    }

    #[test]
    fn operations_resolve_by_name() {
        assert_eq!(
            find_by_operation("calculate-net-sales").map(|spec| spec.kind),
            Some(TransitionKind::CalculateNetSales)
        );
        assert!(find_by_operation("reticulate-splines").is_none());
    }

    #[test]
    fn undo_targets_follow_the_pipeline_backwards() {
        assert_eq!(
            undo_target(&PoStatus::BreakdownCreated),
            Some(PoStatus::WorksheetCreated)
        );
        assert_eq!(
            undo_target(&PoStatus::NetSalesCalculated),
            Some(PoStatus::BreakdownCreated)
        );
        assert_eq!(
            undo_target(&PoStatus::NetSalesErrors),
            Some(PoStatus::BreakdownCreated)
        );
        assert_eq!(undo_target(&PoStatus::WorksheetCreated), None);
    }

    #[test]
    fn override_menu_depends_on_type() {
        let lux = override_targets(false);
        assert_eq!(
            lux,
            vec![
                PoStatus::WorksheetCreated,
                PoStatus::BreakdownCreated,
                PoStatus::NetSalesCalculated,
                PoStatus::PoCreated,
                PoStatus::PoReceived,
                PoStatus::InternalError,
            ]
        );

        let ats = override_targets(true);
        assert_eq!(
            ats,
            vec![
                PoStatus::WorksheetCreated,
                PoStatus::PoReceived,
                PoStatus::InternalError,
            ]
        );
    }
}
