//! Property tests for the guard evaluator: total over arbitrary status
//! strings, deterministic, and the ATS path never exposes LUX-only stages.

use proptest::prelude::*;

use po_pilot::backend::{PoStatus, PurchaseOrder};
use po_pilot::workflow::{evaluate, TransitionKind};

fn po(is_ats: bool, status: PoStatus) -> PurchaseOrder {
    PurchaseOrder {
        id: 1,
        name: "proptest".to_string(),
        is_ats,
        status,
        spreadsheet_id: None,
        po_id: None,
        date_created: None,
        logs: vec![],
    }
}

proptest! {
    #[test]
    fn evaluate_is_total_and_deterministic(status in ".*", is_ats in any::<bool>()) {
        let po = po(is_ats, PoStatus::from(status));
        let first: Vec<_> = evaluate(&po).iter().map(|spec| spec.operation).collect();
        let second: Vec<_> = evaluate(&po).iter().map(|spec| spec.operation).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn ats_orders_never_expose_lux_only_stages(status in ".*") {
        let po = po(true, PoStatus::from(status));
        for spec in evaluate(&po) {
            prop_assert!(!matches!(
                spec.kind,
                TransitionKind::CreateBreakdown
                    | TransitionKind::CalculateNetSales
                    | TransitionKind::CreateSkusAndPoNonAts
                    | TransitionKind::Undo
            ));
        }
    }

    #[test]
    fn enabled_transitions_always_admit_the_current_snapshot(
        status in ".*",
        is_ats in any::<bool>(),
    ) {
        let po = po(is_ats, PoStatus::from(status));
        for spec in evaluate(&po) {
            prop_assert!(spec.enabled_for(&po.status, po.is_ats));
        }
    }
}
