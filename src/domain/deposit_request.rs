//! Pending external deposits awaiting upstream confirmation.
//!
//! A [`DepositRequest`] decouples an announced bank or crypto deposit
//! from the wallet until the upstream system confirms it. Confirmation
//! routes the amount through the deposit processor; rejection is final.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::DepositMethod;

/// Settlement state of a pending deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositRequestStatus {
    /// Announced, not yet confirmed upstream.
    Pending,
    /// Confirmed and applied to the wallet.
    Confirmed,
    /// Rejected upstream; never applied.
    Rejected,
}

/// A deposit announced by the customer but not yet settled.
///
/// The ledger does not validate the method details; they are pass-through
/// input for the confirming operator or upstream webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// User announcing the deposit.
    pub user_id: Uuid,
    /// Announced amount.
    pub amount: Decimal,
    /// Method-specific details.
    pub method: DepositMethod,
    /// Settlement state.
    pub status: DepositRequestStatus,
    /// Announcement timestamp.
    pub created_at: DateTime<Utc>,
    /// Settlement timestamp.
    pub settled_at: Option<DateTime<Utc>>,
}

impl DepositRequest {
    /// Creates a new pending deposit request.
    #[must_use]
    pub fn new(user_id: Uuid, amount: Decimal, method: DepositMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            method,
            status: DepositRequestStatus::Pending,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Marks the request confirmed.
    pub fn confirm(&mut self) {
        self.status = DepositRequestStatus::Confirmed;
        self.settled_at = Some(Utc::now());
    }

    /// Marks the request rejected.
    pub fn reject(&mut self) {
        self.status = DepositRequestStatus::Rejected;
        self.settled_at = Some(Utc::now());
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_request_is_pending() {
        let request = DepositRequest::new(
            Uuid::new_v4(),
            dec!(10000),
            DepositMethod::Manual { note: None },
        );
        assert_eq!(request.status, DepositRequestStatus::Pending);
        assert!(request.settled_at.is_none());
    }

    #[test]
    fn confirm_sets_status_and_timestamp() {
        let mut request = DepositRequest::new(
            Uuid::new_v4(),
            dec!(100),
            DepositMethod::Manual { note: None },
        );
        request.confirm();
        assert_eq!(request.status, DepositRequestStatus::Confirmed);
        assert!(request.settled_at.is_some());
    }

    #[test]
    fn reject_is_terminal_state() {
        let mut request = DepositRequest::new(
            Uuid::new_v4(),
            dec!(100),
            DepositMethod::Manual { note: None },
        );
        request.reject();
        assert_eq!(request.status, DepositRequestStatus::Rejected);
    }
}
