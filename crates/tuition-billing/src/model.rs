//! Billing data model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tuition_common::{
    AllocationId, BatchId, FeeStructureId, InstallmentId, PaymentId, StudentId, TuitionError,
    TuitionResult,
};

/// How often a fee structure bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingInterval {
    OneTime,
    #[default]
    Monthly,
    Yearly,
}

impl BillingInterval {
    /// Months between consecutive installments; `None` for one-time fees
    pub fn months(self) -> Option<u32> {
        match self {
            BillingInterval::OneTime => None,
            BillingInterval::Monthly => Some(1),
            BillingInterval::Yearly => Some(12),
        }
    }
}

/// Master fee definition, e.g. "Class 10 Tuition Fee" = 5000 monthly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStructure {
    pub id: FeeStructureId,
    pub name: String,
    pub base_amount: Decimal,
    pub interval: BillingInterval,
    /// Batch this fee applies to by default
    pub batch: Option<BatchId>,
    pub created_at: DateTime<Utc>,
}

/// Fee structure creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeStructureCreate {
    pub name: String,
    pub base_amount: Decimal,
    #[serde(default)]
    pub interval: BillingInterval,
    #[serde(default)]
    pub batch: Option<BatchId>,
}

/// A fee structure assigned to one student.
///
/// `final_amount` has no setter: it is recomputed from base and discount
/// every time either changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeAllocation {
    id: AllocationId,
    student: StudentId,
    fee_structure: FeeStructureId,
    base_amount: Decimal,
    discount: Decimal,
    final_amount: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
}

impl FeeAllocation {
    /// Allocate `structure` to `student` at its current base amount
    pub fn new(student: StudentId, structure: &FeeStructure, discount: Decimal) -> TuitionResult<Self> {
        validate_discount(structure.base_amount, discount)?;
        Ok(Self {
            id: AllocationId::new(),
            student,
            fee_structure: structure.id,
            base_amount: structure.base_amount,
            discount,
            final_amount: structure.base_amount - discount,
            active: true,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> AllocationId {
        self.id
    }

    pub fn student(&self) -> StudentId {
        self.student
    }

    pub fn fee_structure(&self) -> FeeStructureId {
        self.fee_structure
    }

    pub fn base_amount(&self) -> Decimal {
        self.base_amount
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    /// Always `base_amount - discount`
    pub fn final_amount(&self) -> Decimal {
        self.final_amount
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Change the discount and recompute the final amount
    pub fn set_discount(&mut self, discount: Decimal) -> TuitionResult<()> {
        validate_discount(self.base_amount, discount)?;
        self.discount = discount;
        self.final_amount = self.base_amount - discount;
        Ok(())
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }
}

fn validate_discount(base_amount: Decimal, discount: Decimal) -> TuitionResult<()> {
    if discount < Decimal::ZERO {
        return Err(TuitionError::invalid("discount", "Discount cannot be negative."));
    }
    if discount > base_amount {
        return Err(TuitionError::invalid("discount", "Discount cannot exceed the base amount."));
    }
    Ok(())
}

/// Installment status.
///
/// Stored status is always derived from paid and due. `Overdue` is only
/// ever produced by [`InstallmentStatus::as_of`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    /// Status implied by the amounts
    pub fn derive(amount_paid: Decimal, amount_due: Decimal) -> Self {
        if amount_paid >= amount_due {
            InstallmentStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            InstallmentStatus::Partial
        } else {
            InstallmentStatus::Pending
        }
    }

    /// Label shown on `as_of` for an installment due on `due_date`
    pub fn as_of(self, due_date: NaiveDate, as_of: NaiveDate) -> Self {
        if self != InstallmentStatus::Paid && due_date < as_of {
            InstallmentStatus::Overdue
        } else {
            self
        }
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentStatus::Pending => "PENDING",
            InstallmentStatus::Partial => "PARTIAL",
            InstallmentStatus::Paid => "PAID",
            InstallmentStatus::Overdue => "OVERDUE",
        };
        f.write_str(label)
    }
}

/// One bill under an allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Installment {
    id: InstallmentId,
    allocation: AllocationId,
    student: StudentId,
    fee_structure: FeeStructureId,
    due_date: NaiveDate,
    amount_due: Decimal,
    amount_paid: Decimal,
    status: InstallmentStatus,
    created_at: DateTime<Utc>,
}

impl Installment {
    /// Fresh, unpaid installment
    pub fn new(allocation: &FeeAllocation, due_date: NaiveDate, amount_due: Decimal) -> Self {
        Self {
            id: InstallmentId::new(),
            allocation: allocation.id(),
            student: allocation.student(),
            fee_structure: allocation.fee_structure(),
            due_date,
            amount_due,
            amount_paid: Decimal::ZERO,
            status: InstallmentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> InstallmentId {
        self.id
    }

    pub fn allocation(&self) -> AllocationId {
        self.allocation
    }

    pub fn student(&self) -> StudentId {
        self.student
    }

    pub fn fee_structure(&self) -> FeeStructureId {
        self.fee_structure
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn amount_due(&self) -> Decimal {
        self.amount_due
    }

    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    pub fn status(&self) -> InstallmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// What is still owed; never negative
    pub fn remaining(&self) -> Decimal {
        (self.amount_due - self.amount_paid).max(Decimal::ZERO)
    }

    pub fn display_status(&self, as_of: NaiveDate) -> InstallmentStatus {
        self.status.as_of(self.due_date, as_of)
    }

    /// Set the aggregated total of all payments and re-derive the status
    pub(crate) fn apply_total(&mut self, total_paid: Decimal) {
        self.amount_paid = total_paid;
        self.status = InstallmentStatus::derive(total_paid, self.amount_due);
    }
}

/// How money was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    #[default]
    Cash,
    Online,
    Cheque,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Online => "ONLINE",
            PaymentMode::Cheque => "CHEQUE",
        };
        f.write_str(label)
    }
}

/// Money received against one installment. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub installment: InstallmentId,
    pub student: StudentId,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub mode: PaymentMode,
    /// UPI ref, cheque number or gateway payment id
    pub transaction_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Payment recording request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub installment: InstallmentId,
    pub amount: Decimal,
    #[serde(default)]
    pub mode: PaymentMode,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    /// Defaults to today
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
}

/// Result of recording a payment: the receipt and the recomputed bill
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub installment: Installment,
}
