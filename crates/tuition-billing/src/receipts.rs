//! Receipts
//!
//! A receipt is a payment joined with who paid and what for. Rendering to a
//! document format goes through [`ReceiptRenderer`].

use crate::engine::BillingEngine;
use crate::model::PaymentMode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write as _;
use tuition_common::{InstallmentId, PaymentId, StudentId, TenantId, TuitionError, TuitionResult};

/// Shown when a payment carries no external reference
const NO_REFERENCE: &str = "N/A";

/// Printable receipt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// e.g. `RCPT-1A2B3C4D`
    pub number: String,
    pub payment: PaymentId,
    pub installment: InstallmentId,
    pub student: StudentId,
    pub student_name: String,
    pub enrollment_number: String,
    pub fee_name: String,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub mode: PaymentMode,
    pub transaction_ref: String,
}

/// Turns a receipt into a downloadable document
pub trait ReceiptRenderer: Send + Sync {
    /// MIME type of the rendered bytes
    fn content_type(&self) -> &'static str;
    /// File extension, without the dot
    fn extension(&self) -> &'static str;
    fn render(&self, institute: &str, receipt: &Receipt) -> TuitionResult<Vec<u8>>;
}

/// Plain-text receipt
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReceiptRenderer;

impl ReceiptRenderer for TextReceiptRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, institute: &str, receipt: &Receipt) -> TuitionResult<Vec<u8>> {
        let mut out = String::new();
        let rows = [
            ("Receipt No", receipt.number.clone()),
            ("Date", receipt.paid_on.format("%d %b %Y").to_string()),
            ("Student", receipt.student_name.clone()),
            ("Enrollment", receipt.enrollment_number.clone()),
            ("Fee", receipt.fee_name.clone()),
            ("Amount", format!("INR {:.2}", receipt.amount)),
            ("Mode", receipt.mode.to_string()),
            ("Txn Ref", receipt.transaction_ref.clone()),
        ];

        writeln!(out, "{}", institute).map_err(render_error)?;
        writeln!(out, "FEE RECEIPT").map_err(render_error)?;
        writeln!(out, "{}", "-".repeat(40)).map_err(render_error)?;
        for (label, value) in rows {
            writeln!(out, "{:<12}: {}", label, value).map_err(render_error)?;
        }
        writeln!(out, "{}", "-".repeat(40)).map_err(render_error)?;
        writeln!(out, "This is a computer generated receipt.").map_err(render_error)?;
        Ok(out.into_bytes())
    }
}

fn render_error(err: std::fmt::Error) -> TuitionError {
    TuitionError::Storage(format!("receipt rendering failed: {}", err))
}

impl BillingEngine {
    /// Receipt for one payment
    pub async fn receipt(&self, tenant: TenantId, payment: PaymentId) -> TuitionResult<Receipt> {
        let payment = self.repo.get_payment(tenant, payment).await?;
        let installment = self.repo.get_installment(tenant, payment.installment).await?;
        let structure = self.repo.get_structure(tenant, installment.fee_structure()).await?;
        let contact = self.students.contact(tenant, payment.student);

        Ok(Receipt {
            number: payment.id.short(),
            payment: payment.id,
            installment: installment.id(),
            student: payment.student,
            student_name: contact.as_ref().map(|c| c.full_name.clone()).unwrap_or_default(),
            enrollment_number: contact.map(|c| c.enrollment_number).unwrap_or_default(),
            fee_name: structure.name,
            amount: payment.amount,
            paid_on: payment.paid_on,
            mode: payment.mode,
            transaction_ref: payment.transaction_ref.unwrap_or_else(|| NO_REFERENCE.to_string()),
        })
    }

    /// Receipt of the most recent payment against an installment
    pub async fn latest_receipt_for_installment(
        &self,
        tenant: TenantId,
        installment: InstallmentId,
    ) -> TuitionResult<Receipt> {
        self.repo.get_installment(tenant, installment).await?;
        let latest = self
            .payments_for_installment(tenant, installment)
            .await?
            .pop()
            .ok_or_else(|| TuitionError::not_found("payment", installment))?;
        self.receipt(tenant, latest.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{cash, date, engine, structure};
    use crate::model::PaymentInput;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_receipt_fields() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1500)).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), dec!(1500))
            .await
            .unwrap();

        let cash_payment = engine.record_payment(tenant, cash(installment.id(), dec!(500))).await.unwrap();
        let receipt = engine.receipt(tenant, cash_payment.payment.id).await.unwrap();
        assert!(receipt.number.starts_with("RCPT-"));
        assert_eq!(receipt.student_name, "rahul");
        assert_eq!(receipt.enrollment_number, "ENR-RAHUL");
        assert_eq!(receipt.fee_name, "Class 10 Tuition");
        assert_eq!(receipt.transaction_ref, "N/A");

        let online = engine
            .record_payment(
                tenant,
                PaymentInput {
                    installment: installment.id(),
                    amount: dec!(1000),
                    mode: PaymentMode::Online,
                    transaction_ref: Some("pay_29QQoUBi66xm2f".into()),
                    paid_on: Some(date(3, 6)),
                },
            )
            .await
            .unwrap();
        let latest = engine.latest_receipt_for_installment(tenant, installment.id()).await.unwrap();
        assert_eq!(latest.payment, online.payment.id);
        assert_eq!(latest.transaction_ref, "pay_29QQoUBi66xm2f");

        let text = String::from_utf8(TextReceiptRenderer.render("Galaxy Academy", &latest).unwrap()).unwrap();
        assert!(text.contains("Galaxy Academy"));
        assert!(text.contains("INR 1000.00"));
        assert!(text.contains("ONLINE"));
    }

    #[tokio::test]
    async fn test_receipt_needs_a_payment() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1500)).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), dec!(1500))
            .await
            .unwrap();

        assert!(matches!(
            engine.latest_receipt_for_installment(tenant, installment.id()).await,
            Err(TuitionError::NotFound { .. })
        ));
        assert!(engine.receipt(TenantId::new(), PaymentId::new()).await.is_err());
    }
}
