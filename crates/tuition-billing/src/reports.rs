//! Billing reports - due list, collections, balances
//!
//! All reports are read-only. In particular the due list never writes
//! `Overdue` back; it only labels rows.

use crate::engine::BillingEngine;
use crate::model::{InstallmentStatus, PaymentMode};
use crate::students::StudentContact;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tuition_common::money::checked_total;
use tuition_common::{AllocationId, FeeStructureId, InstallmentId, StudentId, TenantId, TuitionResult};

/// One unpaid installment that has fallen due
#[derive(Debug, Clone, Serialize)]
pub struct DueListRow {
    pub installment: InstallmentId,
    pub student: StudentId,
    pub student_name: String,
    pub enrollment_number: String,
    pub fee_name: String,
    pub due_date: NaiveDate,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub status: InstallmentStatus,
    /// `Overdue` once the due date has passed
    pub display_status: InstallmentStatus,
    pub contact: Option<String>,
}

/// Money received on one day
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub date: NaiveDate,
    pub total_collected: Decimal,
    pub payment_count: usize,
    pub by_mode: BTreeMap<PaymentMode, Decimal>,
    /// Installments not yet fully paid, across all dates
    pub pending_installments: usize,
}

/// What a set of students owes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentBalance {
    pub total_due: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
}

/// Scheduled versus allocated amounts of one allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub allocation: AllocationId,
    pub final_amount: Decimal,
    /// Sum of installment amounts due
    pub scheduled: Decimal,
    pub paid: Decimal,
    /// `final_amount - scheduled`; negative when over-scheduled
    pub unscheduled: Decimal,
}

impl BillingEngine {
    /// Unpaid installments due on or before `as_of`, earliest first
    pub async fn due_list(&self, tenant: TenantId, as_of: NaiveDate) -> TuitionResult<Vec<DueListRow>> {
        let fee_names: HashMap<FeeStructureId, String> = self
            .repo
            .list_structures(tenant)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let mut contacts: HashMap<StudentId, Option<StudentContact>> = HashMap::new();

        let mut rows = Vec::new();
        for installment in self.list_installments(tenant, None).await? {
            if installment.due_date() > as_of || installment.status() == InstallmentStatus::Paid {
                continue;
            }
            let contact = contacts
                .entry(installment.student())
                .or_insert_with(|| self.students.contact(tenant, installment.student()));

            rows.push(DueListRow {
                installment: installment.id(),
                student: installment.student(),
                student_name: contact.as_ref().map(|c| c.full_name.clone()).unwrap_or_default(),
                enrollment_number: contact
                    .as_ref()
                    .map(|c| c.enrollment_number.clone())
                    .unwrap_or_default(),
                fee_name: fee_names.get(&installment.fee_structure()).cloned().unwrap_or_default(),
                due_date: installment.due_date(),
                amount_due: installment.amount_due(),
                amount_paid: installment.amount_paid(),
                balance: installment.remaining(),
                status: installment.status(),
                display_status: installment.display_status(as_of),
                contact: contact.as_ref().and_then(|c| c.phone.clone()),
            });
        }

        tracing::debug!(tenant = %tenant, %as_of, rows = rows.len(), "due list computed");
        Ok(rows)
    }

    /// Collections on `date`, for the admin dashboard
    pub async fn collection_summary(&self, tenant: TenantId, date: NaiveDate) -> TuitionResult<CollectionSummary> {
        let mut summary = CollectionSummary {
            date,
            total_collected: Decimal::ZERO,
            payment_count: 0,
            by_mode: BTreeMap::new(),
            pending_installments: 0,
        };

        for payment in self.repo.list_payments(tenant).await? {
            if payment.paid_on != date {
                continue;
            }
            summary.total_collected = checked_total("total_collected", [summary.total_collected, payment.amount])?;
            summary.payment_count += 1;
            let by_mode = summary.by_mode.entry(payment.mode).or_default();
            *by_mode = checked_total("total_collected", [*by_mode, payment.amount])?;
        }
        summary.pending_installments = self
            .repo
            .list_installments(tenant)
            .await?
            .iter()
            .filter(|i| i.status() != InstallmentStatus::Paid)
            .count();

        Ok(summary)
    }

    /// Totals over the students' unpaid installments
    pub async fn student_balance(&self, tenant: TenantId, students: &[StudentId]) -> TuitionResult<StudentBalance> {
        let unpaid: Vec<_> = self
            .list_installments(tenant, Some(students))
            .await?
            .into_iter()
            .filter(|i| i.status() != InstallmentStatus::Paid)
            .collect();
        Ok(StudentBalance {
            total_due: checked_total("total_due", unpaid.iter().map(|i| i.amount_due()))?,
            total_paid: checked_total("total_paid", unpaid.iter().map(|i| i.amount_paid()))?,
            outstanding: checked_total("outstanding", unpaid.iter().map(|i| i.remaining()))?,
        })
    }

    /// Compare what was scheduled against what was allocated
    pub async fn allocation_summary(
        &self,
        tenant: TenantId,
        allocation: AllocationId,
    ) -> TuitionResult<AllocationSummary> {
        let allocation = self.get_allocation(tenant, allocation).await?;
        let installments: Vec<_> = self
            .repo
            .list_installments(tenant)
            .await?
            .into_iter()
            .filter(|i| i.allocation() == allocation.id())
            .collect();

        let scheduled = checked_total("scheduled", installments.iter().map(|i| i.amount_due()))?;
        let paid = checked_total("paid", installments.iter().map(|i| i.amount_paid()))?;
        Ok(AllocationSummary {
            allocation: allocation.id(),
            final_amount: allocation.final_amount(),
            scheduled,
            paid,
            unscheduled: allocation.final_amount() - scheduled,
        })
    }
}
