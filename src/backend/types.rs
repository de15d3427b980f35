// Wire types for the purchase-order backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a purchase order.
///
/// The backend owns this field; the client only ever reads it back from a
/// snapshot. The `Unrecognized` variant keeps deserialization total when the
/// backend vocabulary grows; an unrecognized status renders as-is and maps
/// to no enabled transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PoStatus {
    WorksheetCreated,
    CreatingBreakdown,
    BreakdownCreated,
    BreakdownErrors,
    NetSalesCalculated,
    NetSalesErrors,
    PoCreated,
    CreateSkusAndPoErrors,
    PoReceived,
    InternalError,
    Unrecognized(String),
}

impl PoStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PoStatus::WorksheetCreated => "Worksheet Created",
            PoStatus::CreatingBreakdown => "Creating Breakdown",
            PoStatus::BreakdownCreated => "Breakdown Created",
            PoStatus::BreakdownErrors => "Errors in worksheet (Breakdown)",
            PoStatus::NetSalesCalculated => "Net Sales Calculated",
            PoStatus::NetSalesErrors => "Errors in worksheet (Net Sales)",
            PoStatus::PoCreated => "PO Created",
            PoStatus::CreateSkusAndPoErrors => "Errors in worksheet (Create SKUs and PO)",
            PoStatus::PoReceived => "PO Received",
            PoStatus::InternalError => "Internal Error",
            PoStatus::Unrecognized(raw) => raw,
        }
    }

    /// Terminal statuses accept no further pipeline transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PoStatus::PoReceived)
    }

    /// Worksheet-error statuses are recoverable: the user fixes the sheet and
    /// re-runs the failed step.
    pub fn is_worksheet_error(&self) -> bool {
        matches!(
            self,
            PoStatus::BreakdownErrors | PoStatus::NetSalesErrors | PoStatus::CreateSkusAndPoErrors
        )
    }
}

impl From<String> for PoStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Worksheet Created" => PoStatus::WorksheetCreated,
            "Creating Breakdown" => PoStatus::CreatingBreakdown,
            "Breakdown Created" => PoStatus::BreakdownCreated,
            "Errors in worksheet (Breakdown)" => PoStatus::BreakdownErrors,
            "Net Sales Calculated" => PoStatus::NetSalesCalculated,
            "Errors in worksheet (Net Sales)" => PoStatus::NetSalesErrors,
            "PO Created" => PoStatus::PoCreated,
            "Errors in worksheet (Create SKUs and PO)" => PoStatus::CreateSkusAndPoErrors,
            "PO Received" => PoStatus::PoReceived,
            "Internal Error" => PoStatus::InternalError,
            _ => PoStatus::Unrecognized(raw),
        }
    }
}

impl From<PoStatus> for String {
    fn from(status: PoStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase order snapshot as served by the backend.
///
/// The client holds a read-mostly cached copy, replaced wholesale on each
/// reconciliation; nothing here is written locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: u64,
    pub name: String,
    /// Fixed at creation. Selects the ATS transition path (skips the
    /// breakdown and net-sales stages) or the LUX path (full pipeline).
    pub is_ats: bool,
    pub status: PoStatus,
    /// Worksheet reference, set by backend side effects of some transitions.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// External purchase-order reference in the fulfillment system.
    #[serde(default)]
    pub po_id: Option<u64>,
    #[serde(default)]
    pub date_created: Option<String>,
    /// Append-only audit trail, backend-owned.
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl PurchaseOrder {
    pub fn kind_label(&self) -> &'static str {
        if self.is_ats {
            "ATS"
        } else {
            "LUX"
        }
    }
}

/// One backend-written log line on a purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub user: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
}

impl LogEntry {
    /// Log dates arrive as RFC 3339 strings; anything else displays raw.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Every successful mutating call answers with a human-readable message,
/// forwarded unmodified to the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMsg {
    pub message: String,
}

/// Error body of a non-2xx backend response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPurchaseOrder {
    pub name: String,
    pub is_ats: bool,
    pub currency: String,
}

/// Fee inputs for the net-sales calculation, USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeesPayload {
    pub shipping_fees: f64,
    pub customs_fees: f64,
    pub other_fees: f64,
}

/// External purchase-order reference required by the non-ATS SKU upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalPoRef {
    pub po_id: u64,
}

/// Manual status override payload. `spreadsheet_id` is always serialized as
/// null: a forced status discards downstream worksheet artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOverride {
    pub status: PoStatus,
    pub spreadsheet_id: Option<String>,
}

impl StatusOverride {
    pub fn forced(status: PoStatus) -> Self {
        Self {
            status,
            spreadsheet_id: None,
        }
    }
}
