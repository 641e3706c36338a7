//! Billing Engine - fee structures, allocations, installments and payments

use crate::locks::InstallmentLocks;
use crate::model::*;
use crate::repository::BillingRepository;
use crate::students::StudentDirectory;
use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tuition_common::money::{checked_total, max_amount, round_money};
use tuition_common::{
    AllocationId, FeeStructureId, FieldErrors, InstallmentId, PaymentId, StudentId, TenantId,
    TuitionError, TuitionResult,
};

/// Upper bound for scripted installment generation
const MAX_SCHEDULED_INSTALLMENTS: u32 = 120;

/// Billing engine
pub struct BillingEngine {
    pub(crate) repo: Arc<dyn BillingRepository>,
    pub(crate) students: Arc<dyn StudentDirectory>,
    locks: InstallmentLocks,
}

impl BillingEngine {
    pub fn new(repo: Arc<dyn BillingRepository>, students: Arc<dyn StudentDirectory>) -> Self {
        Self {
            repo,
            students,
            locks: InstallmentLocks::new(),
        }
    }

    // ----- Fee structures -----

    pub async fn create_fee_structure(
        &self,
        tenant: TenantId,
        input: FeeStructureCreate,
    ) -> TuitionResult<FeeStructure> {
        let mut errors = FieldErrors::new();
        if input.name.trim().is_empty() {
            errors.add("name", "This field may not be blank.");
        }
        if let Err(message) = check_amount(input.base_amount) {
            errors.add("base_amount", message);
        }
        if let Some(batch) = input.batch {
            if !self.students.batch_exists(tenant, batch) {
                errors.add("batch", format!("Batch {} does not exist.", batch));
            }
        }
        errors.into_result()?;

        let structure = FeeStructure {
            id: FeeStructureId::new(),
            name: input.name.trim().to_string(),
            base_amount: input.base_amount,
            interval: input.interval,
            batch: input.batch,
            created_at: Utc::now(),
        };
        self.repo.insert_structure(tenant, &structure).await?;

        tracing::info!(
            tenant = %tenant,
            structure = %structure.id,
            amount = %structure.base_amount,
            "fee structure created"
        );
        Ok(structure)
    }

    pub async fn get_structure(&self, tenant: TenantId, id: FeeStructureId) -> TuitionResult<FeeStructure> {
        Ok(self.repo.get_structure(tenant, id).await?)
    }

    /// Fee structures sorted by name
    pub async fn list_structures(&self, tenant: TenantId) -> TuitionResult<Vec<FeeStructure>> {
        let mut structures = self.repo.list_structures(tenant).await?;
        structures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(structures)
    }

    // ----- Allocations -----

    /// Assign a fee structure to a student
    pub async fn allocate_fee(
        &self,
        tenant: TenantId,
        student: StudentId,
        structure: FeeStructureId,
        discount: Decimal,
    ) -> TuitionResult<FeeAllocation> {
        if self.students.contact(tenant, student).is_none() {
            return Err(TuitionError::not_found("student", student));
        }
        let structure = self.repo.get_structure(tenant, structure).await?;
        let allocation = FeeAllocation::new(student, &structure, discount)?;
        self.repo.insert_allocation(tenant, &allocation).await?;

        tracing::info!(
            tenant = %tenant,
            allocation = %allocation.id(),
            student = %student,
            final_amount = %allocation.final_amount(),
            "fee allocated"
        );
        Ok(allocation)
    }

    /// Allocate a structure to every student of its default batch that does
    /// not already hold it
    pub async fn allocate_batch_defaults(
        &self,
        tenant: TenantId,
        structure: FeeStructureId,
    ) -> TuitionResult<Vec<FeeAllocation>> {
        let structure = self.repo.get_structure(tenant, structure).await?;
        let batch = structure
            .batch
            .ok_or_else(|| TuitionError::invalid("batch", "This fee structure has no default batch."))?;

        let holders: HashSet<StudentId> = self
            .repo
            .list_allocations(tenant)
            .await?
            .into_iter()
            .filter(|a| a.is_active() && a.fee_structure() == structure.id)
            .map(|a| a.student())
            .collect();

        let mut created = Vec::new();
        for student in self.students.batch_students(tenant, batch) {
            if holders.contains(&student) {
                continue;
            }
            let allocation = FeeAllocation::new(student, &structure, Decimal::ZERO)?;
            self.repo.insert_allocation(tenant, &allocation).await?;
            created.push(allocation);
        }

        tracing::info!(
            tenant = %tenant,
            structure = %structure.id,
            batch = %batch,
            count = created.len(),
            "batch default fees allocated"
        );
        Ok(created)
    }

    /// Change an allocation's discount; the final amount follows
    pub async fn update_discount(
        &self,
        tenant: TenantId,
        allocation: AllocationId,
        discount: Decimal,
    ) -> TuitionResult<FeeAllocation> {
        let mut allocation = self.repo.get_allocation(tenant, allocation).await?;
        allocation.set_discount(discount)?;
        self.repo.save_allocation(tenant, &allocation).await?;

        tracing::info!(
            tenant = %tenant,
            allocation = %allocation.id(),
            discount = %discount,
            "allocation discount updated"
        );
        Ok(allocation)
    }

    /// Stop billing an allocation; frees the (student, structure) slot
    pub async fn deactivate_allocation(
        &self,
        tenant: TenantId,
        allocation: AllocationId,
    ) -> TuitionResult<FeeAllocation> {
        let mut allocation = self.repo.get_allocation(tenant, allocation).await?;
        allocation.deactivate();
        self.repo.save_allocation(tenant, &allocation).await?;
        tracing::info!(tenant = %tenant, allocation = %allocation.id(), "allocation deactivated");
        Ok(allocation)
    }

    pub async fn get_allocation(&self, tenant: TenantId, id: AllocationId) -> TuitionResult<FeeAllocation> {
        Ok(self.repo.get_allocation(tenant, id).await?)
    }

    /// Allocations, optionally of one student, oldest first
    pub async fn list_allocations(
        &self,
        tenant: TenantId,
        student: Option<StudentId>,
    ) -> TuitionResult<Vec<FeeAllocation>> {
        let mut allocations: Vec<_> = self
            .repo
            .list_allocations(tenant)
            .await?
            .into_iter()
            .filter(|a| student.map_or(true, |s| a.student() == s))
            .collect();
        allocations.sort_by_key(|a| a.created_at());
        Ok(allocations)
    }

    // ----- Installments -----

    /// Create one bill. The sum of an allocation's installments is not
    /// checked against its final amount; see `allocation_summary`.
    pub async fn create_installment(
        &self,
        tenant: TenantId,
        allocation: AllocationId,
        due_date: NaiveDate,
        amount_due: Decimal,
    ) -> TuitionResult<Installment> {
        validate_amount("amount_due", amount_due)?;
        let allocation = self.billable_allocation(tenant, allocation).await?;

        let installment = Installment::new(&allocation, due_date, amount_due);
        self.repo
            .insert_installments(tenant, std::slice::from_ref(&installment))
            .await?;

        tracing::info!(
            tenant = %tenant,
            installment = %installment.id(),
            amount_due = %amount_due,
            %due_date,
            "installment created"
        );
        Ok(installment)
    }

    /// Split the allocation's final amount into `count` installments, one
    /// per billing interval starting at `first_due`. The last installment
    /// absorbs rounding.
    pub async fn schedule_installments(
        &self,
        tenant: TenantId,
        allocation: AllocationId,
        first_due: NaiveDate,
        count: u32,
    ) -> TuitionResult<Vec<Installment>> {
        if count == 0 || count > MAX_SCHEDULED_INSTALLMENTS {
            return Err(TuitionError::invalid(
                "count",
                format!("Must be between 1 and {}.", MAX_SCHEDULED_INSTALLMENTS),
            ));
        }
        let allocation = self.billable_allocation(tenant, allocation).await?;
        let structure = self.repo.get_structure(tenant, allocation.fee_structure()).await?;

        let step = match structure.interval.months() {
            Some(months) => months,
            None if count == 1 => 0,
            None => {
                return Err(TuitionError::invalid("count", "A one-time fee has a single installment."));
            }
        };

        let total = allocation.final_amount();
        let part = round_money(total / Decimal::from(count));
        let last = total - part * Decimal::from(count - 1);
        if part <= Decimal::ZERO || last <= Decimal::ZERO {
            return Err(TuitionError::invalid("count", "Too many installments for the amount."));
        }

        let mut installments = Vec::with_capacity(count as usize);
        for n in 0..count {
            let due_date = first_due
                .checked_add_months(Months::new(n * step))
                .ok_or_else(|| TuitionError::invalid("first_due", "Due date out of range."))?;
            let amount = if n + 1 == count { last } else { part };
            installments.push(Installment::new(&allocation, due_date, amount));
        }
        self.repo.insert_installments(tenant, &installments).await?;

        tracing::info!(
            tenant = %tenant,
            allocation = %allocation.id(),
            count,
            "installments scheduled"
        );
        Ok(installments)
    }

    pub async fn get_installment(&self, tenant: TenantId, id: InstallmentId) -> TuitionResult<Installment> {
        Ok(self.repo.get_installment(tenant, id).await?)
    }

    /// Installments by due date, optionally restricted to some students
    pub async fn list_installments(
        &self,
        tenant: TenantId,
        students: Option<&[StudentId]>,
    ) -> TuitionResult<Vec<Installment>> {
        let mut installments: Vec<_> = self
            .repo
            .list_installments(tenant)
            .await?
            .into_iter()
            .filter(|i| students.map_or(true, |s| s.contains(&i.student())))
            .collect();
        installments.sort_by(|a, b| a.due_date().cmp(&b.due_date()).then(a.created_at().cmp(&b.created_at())));
        tracing::debug!(tenant = %tenant, count = installments.len(), "installments listed");
        Ok(installments)
    }

    // ----- Payments -----

    /// Record money received against an installment.
    ///
    /// Under the installment's lock: load it, sum every earlier payment plus
    /// this one, re-derive the status and commit payment and installment as
    /// one unit. Overpayment is accepted and reads as `Paid`.
    pub async fn record_payment(&self, tenant: TenantId, input: PaymentInput) -> TuitionResult<PaymentOutcome> {
        validate_amount("amount", input.amount)?;

        // Lock entries exist only for installments that exist
        self.repo.get_installment(tenant, input.installment).await?;
        let _guard = self.locks.acquire(tenant, input.installment).await;

        let mut installment = self.repo.get_installment(tenant, input.installment).await?;
        let payment = Payment {
            id: PaymentId::new(),
            installment: installment.id(),
            student: installment.student(),
            amount: input.amount,
            paid_on: input.paid_on.unwrap_or_else(|| Utc::now().date_naive()),
            mode: input.mode,
            transaction_ref: input.transaction_ref.filter(|r| !r.trim().is_empty()),
            recorded_at: Utc::now(),
        };

        let earlier = self.repo.payments_for_installment(tenant, installment.id()).await?;
        let total = checked_total("amount", earlier.iter().map(|p| p.amount).chain([payment.amount]))?;
        installment.apply_total(total);

        self.repo.commit_payment(tenant, &payment, &installment).await?;

        tracing::info!(
            tenant = %tenant,
            payment = %payment.id,
            installment = %installment.id(),
            amount = %payment.amount,
            mode = %payment.mode,
            status = %installment.status(),
            "payment recorded"
        );
        Ok(PaymentOutcome { payment, installment })
    }

    pub async fn get_payment(&self, tenant: TenantId, id: PaymentId) -> TuitionResult<Payment> {
        Ok(self.repo.get_payment(tenant, id).await?)
    }

    /// Payments, newest first, optionally restricted to some students
    pub async fn list_payments(
        &self,
        tenant: TenantId,
        students: Option<&[StudentId]>,
    ) -> TuitionResult<Vec<Payment>> {
        let mut payments: Vec<_> = self
            .repo
            .list_payments(tenant)
            .await?
            .into_iter()
            .filter(|p| students.map_or(true, |s| s.contains(&p.student)))
            .collect();
        payments.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(payments)
    }

    /// Payments of one installment, oldest first
    pub async fn payments_for_installment(
        &self,
        tenant: TenantId,
        installment: InstallmentId,
    ) -> TuitionResult<Vec<Payment>> {
        let mut payments = self.repo.payments_for_installment(tenant, installment).await?;
        payments.sort_by_key(|p| p.recorded_at);
        Ok(payments)
    }

    async fn billable_allocation(&self, tenant: TenantId, id: AllocationId) -> TuitionResult<FeeAllocation> {
        let allocation = self.repo.get_allocation(tenant, id).await?;
        if !allocation.is_active() {
            return Err(TuitionError::invalid("allocation", "This allocation is no longer active."));
        }
        Ok(allocation)
    }
}

fn is_money(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

fn check_amount(amount: Decimal) -> Result<(), String> {
    if amount <= Decimal::ZERO {
        return Err("Ensure this value is greater than 0.".into());
    }
    if amount > max_amount() {
        return Err(format!("Ensure this value is less than or equal to {}.", max_amount()));
    }
    if !is_money(amount) {
        return Err("Ensure that there are no more than 2 decimal places.".into());
    }
    Ok(())
}

fn validate_amount(field: &str, amount: Decimal) -> TuitionResult<()> {
    check_amount(amount).map_err(|message| TuitionError::invalid(field, message))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::InMemoryBillingRepository;
    use crate::students::StudentContact;
    use parking_lot::RwLock;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tuition_common::{BatchId, PersonId};

    /// Student directory backed by a plain map
    #[derive(Default)]
    pub(crate) struct FakeStudents {
        students: RwLock<HashMap<(TenantId, StudentId), (StudentContact, Option<BatchId>)>>,
    }

    impl FakeStudents {
        pub(crate) fn add(&self, tenant: TenantId, name: &str, batch: Option<BatchId>) -> StudentId {
            let student = StudentId::new();
            let contact = StudentContact {
                student,
                person: PersonId::new(),
                full_name: name.into(),
                enrollment_number: format!("ENR-{}", name.to_uppercase()),
                phone: Some("9800000000".into()),
                parents: vec![],
            };
            self.students.write().insert((tenant, student), (contact, batch));
            student
        }
    }

    impl StudentDirectory for FakeStudents {
        fn contact(&self, tenant: TenantId, student: StudentId) -> Option<StudentContact> {
            self.students.read().get(&(tenant, student)).map(|(c, _)| c.clone())
        }

        fn batch_exists(&self, _tenant: TenantId, _batch: BatchId) -> bool {
            true
        }

        fn batch_students(&self, tenant: TenantId, batch: BatchId) -> Vec<StudentId> {
            self.students
                .read()
                .iter()
                .filter(|((t, _), (_, b))| *t == tenant && *b == Some(batch))
                .map(|((_, s), _)| *s)
                .collect()
        }
    }

    pub(crate) fn engine() -> (BillingEngine, Arc<FakeStudents>) {
        let students = Arc::new(FakeStudents::default());
        let engine = BillingEngine::new(Arc::new(InMemoryBillingRepository::new()), students.clone());
        (engine, students)
    }

    pub(crate) fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    pub(crate) async fn structure(engine: &BillingEngine, tenant: TenantId, amount: Decimal) -> FeeStructure {
        engine
            .create_fee_structure(
                tenant,
                FeeStructureCreate {
                    name: "Class 10 Tuition".into(),
                    base_amount: amount,
                    interval: BillingInterval::Monthly,
                    batch: None,
                },
            )
            .await
            .unwrap()
    }

    pub(crate) fn cash(installment: InstallmentId, amount: Decimal) -> PaymentInput {
        PaymentInput {
            installment,
            amount,
            mode: PaymentMode::Cash,
            transaction_ref: None,
            paid_on: Some(date(3, 5)),
        }
    }

    #[tokio::test]
    async fn test_fee_structure_validation() {
        let (engine, _) = engine();
        let err = engine
            .create_fee_structure(
                TenantId::new(),
                FeeStructureCreate {
                    name: "".into(),
                    base_amount: dec!(0),
                    interval: BillingInterval::OneTime,
                    batch: None,
                },
            )
            .await
            .unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.get("name").is_some());
        assert!(fields.get("base_amount").is_some());
    }

    #[tokio::test]
    async fn test_payment_lifecycle_with_overpayment() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1000)).await;

        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(200)).await.unwrap();
        assert_eq!(allocation.final_amount(), dec!(800));

        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), dec!(800))
            .await
            .unwrap();
        assert_eq!(installment.status(), InstallmentStatus::Pending);
        assert_eq!(installment.amount_paid(), dec!(0));

        let outcome = engine.record_payment(tenant, cash(installment.id(), dec!(500))).await.unwrap();
        assert_eq!(outcome.installment.status(), InstallmentStatus::Partial);
        assert_eq!(outcome.installment.amount_paid(), dec!(500));

        let outcome = engine.record_payment(tenant, cash(installment.id(), dec!(300))).await.unwrap();
        assert_eq!(outcome.installment.status(), InstallmentStatus::Paid);
        assert_eq!(outcome.installment.amount_paid(), dec!(800));

        let outcome = engine.record_payment(tenant, cash(installment.id(), dec!(50))).await.unwrap();
        assert_eq!(outcome.installment.status(), InstallmentStatus::Paid);
        assert_eq!(outcome.installment.amount_paid(), dec!(850));

        let stored = engine.get_installment(tenant, installment.id()).await.unwrap();
        assert_eq!(stored, outcome.installment);
        assert_eq!(engine.payments_for_installment(tenant, installment.id()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_non_positive_payment_rejected() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1000)).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), dec!(1000))
            .await
            .unwrap();

        for amount in [dec!(0), dec!(-10), dec!(10.005)] {
            let err = engine.record_payment(tenant, cash(installment.id(), amount)).await.unwrap_err();
            assert!(err.field_errors().unwrap().get("amount").is_some());
        }
        assert!(engine.list_payments(tenant, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_amounts_above_ceiling_rejected() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);

        let err = engine
            .create_fee_structure(
                tenant,
                FeeStructureCreate {
                    name: "Unbounded".into(),
                    base_amount: Decimal::MAX,
                    interval: BillingInterval::OneTime,
                    batch: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().get("base_amount").is_some());

        let structure = structure(&engine, tenant, max_amount()).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), max_amount())
            .await
            .unwrap();

        for _ in 0..2 {
            let err = engine
                .record_payment(tenant, cash(installment.id(), Decimal::MAX))
                .await
                .unwrap_err();
            assert!(err.field_errors().unwrap().get("amount").is_some());
        }

        // The ceiling itself is accepted, repeatedly
        engine.record_payment(tenant, cash(installment.id(), max_amount())).await.unwrap();
        let outcome = engine.record_payment(tenant, cash(installment.id(), max_amount())).await.unwrap();
        assert_eq!(outcome.installment.amount_paid(), max_amount() * dec!(2));
        assert_eq!(outcome.installment.status(), InstallmentStatus::Paid);
    }

    #[tokio::test]
    async fn test_unknown_installment_leaves_no_lock() {
        let (engine, _) = engine();
        let tenant = TenantId::new();

        for _ in 0..100 {
            let err = engine
                .record_payment(tenant, cash(InstallmentId::new(), dec!(10)))
                .await
                .unwrap_err();
            assert!(matches!(err, TuitionError::NotFound { .. }));
        }
        assert!(engine.locks.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_allocation_conflicts() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1000)).await;

        let first = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let err = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap_err();
        assert!(err.field_errors().unwrap().get("fee_structure").is_some());
        assert!(matches!(err, TuitionError::Conflict(_)));

        engine.deactivate_allocation(tenant, first.id()).await.unwrap();
        engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();

        // No new bills under the retired allocation
        let err = engine
            .create_installment(tenant, first.id(), date(3, 10), dec!(100))
            .await
            .unwrap_err();
        assert!(err.field_errors().unwrap().get("allocation").is_some());
    }

    #[tokio::test]
    async fn test_discount_larger_than_base_rejected() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1000)).await;

        assert!(engine.allocate_fee(tenant, student, structure.id, dec!(1200)).await.is_err());
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(100)).await.unwrap();

        let updated = engine.update_discount(tenant, allocation.id(), dec!(250)).await.unwrap();
        assert_eq!(updated.final_amount(), dec!(750));
        assert!(engine.update_discount(tenant, allocation.id(), dec!(1001)).await.is_err());
        assert_eq!(
            engine.get_allocation(tenant, allocation.id()).await.unwrap().final_amount(),
            dec!(750)
        );
    }

    #[tokio::test]
    async fn test_schedule_splits_final_amount() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(1000)).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();

        let installments = engine
            .schedule_installments(tenant, allocation.id(), date(1, 31), 3)
            .await
            .unwrap();

        let amounts: Vec<_> = installments.iter().map(|i| i.amount_due()).collect();
        assert_eq!(amounts, vec![dec!(333.33), dec!(333.33), dec!(333.34)]);
        let due: Vec<_> = installments.iter().map(|i| i.due_date()).collect();
        assert_eq!(due, vec![date(1, 31), date(2, 28), date(3, 31)]);
    }

    #[tokio::test]
    async fn test_one_time_fee_single_installment() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = engine
            .create_fee_structure(
                tenant,
                FeeStructureCreate {
                    name: "Admission".into(),
                    base_amount: dec!(2500),
                    interval: BillingInterval::OneTime,
                    batch: None,
                },
            )
            .await
            .unwrap();
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();

        assert!(engine.schedule_installments(tenant, allocation.id(), date(1, 1), 2).await.is_err());
        let one = engine.schedule_installments(tenant, allocation.id(), date(1, 1), 1).await.unwrap();
        assert_eq!(one[0].amount_due(), dec!(2500));
    }

    #[tokio::test]
    async fn test_allocate_batch_defaults_skips_holders() {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let batch = BatchId::new();
        let rahul = students.add(tenant, "rahul", Some(batch));
        students.add(tenant, "priya", Some(batch));
        students.add(tenant, "outsider", None);

        let structure = engine
            .create_fee_structure(
                tenant,
                FeeStructureCreate {
                    name: "Class 10 Tuition".into(),
                    base_amount: dec!(1500),
                    interval: BillingInterval::Monthly,
                    batch: Some(batch),
                },
            )
            .await
            .unwrap();
        engine.allocate_fee(tenant, rahul, structure.id, dec!(500)).await.unwrap();

        let created = engine.allocate_batch_defaults(tenant, structure.id).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_ne!(created[0].student(), rahul);
        assert!(engine.allocate_batch_defaults(tenant, structure.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let (engine, students) = engine();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let student = students.add(tenant_a, "rahul", None);
        let structure = structure(&engine, tenant_a, dec!(1000)).await;
        let allocation = engine.allocate_fee(tenant_a, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant_a, allocation.id(), date(3, 10), dec!(1000))
            .await
            .unwrap();
        let outcome = engine.record_payment(tenant_a, cash(installment.id(), dec!(100))).await.unwrap();

        assert!(engine.list_structures(tenant_b).await.unwrap().is_empty());
        assert!(engine.list_allocations(tenant_b, None).await.unwrap().is_empty());
        assert!(engine.list_installments(tenant_b, None).await.unwrap().is_empty());
        assert!(engine.list_payments(tenant_b, None).await.unwrap().is_empty());

        // Tenant B cannot pay, read or allocate against tenant A's rows
        assert!(matches!(
            engine.record_payment(tenant_b, cash(installment.id(), dec!(100))).await,
            Err(TuitionError::NotFound { .. })
        ));
        assert!(engine.get_payment(tenant_b, outcome.payment.id).await.is_err());
        assert!(engine.allocate_fee(tenant_b, student, structure.id, dec!(0)).await.is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_paid_is_sum_regardless_of_order(cents in proptest::collection::vec(1i64..1_000_000, 1..12)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let amounts: Vec<Decimal> = cents.iter().map(|c| Decimal::new(*c, 2)).collect();
            let expected: Decimal = amounts.iter().sum();

            let forward = runtime.block_on(pay_all(amounts.clone()));
            let backward = runtime.block_on(pay_all(amounts.into_iter().rev().collect()));

            proptest::prop_assert_eq!(forward.amount_paid(), expected);
            proptest::prop_assert_eq!(backward.amount_paid(), expected);
            proptest::prop_assert_eq!(forward.status(), backward.status());
        }
    }

    async fn pay_all(amounts: Vec<Decimal>) -> Installment {
        let (engine, students) = engine();
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(10000)).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), dec!(10000))
            .await
            .unwrap();
        for amount in amounts {
            engine.record_payment(tenant, cash(installment.id(), amount)).await.unwrap();
        }
        engine.get_installment(tenant, installment.id()).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_payments_all_counted() {
        let (engine, students) = engine();
        let engine = Arc::new(engine);
        let tenant = TenantId::new();
        let student = students.add(tenant, "rahul", None);
        let structure = structure(&engine, tenant, dec!(5000)).await;
        let allocation = engine.allocate_fee(tenant, student, structure.id, dec!(0)).await.unwrap();
        let installment = engine
            .create_installment(tenant, allocation.id(), date(3, 10), dec!(5000))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let engine = engine.clone();
            let id = installment.id();
            handles.push(tokio::spawn(async move {
                engine.record_payment(tenant, cash(id, dec!(10))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = engine.get_installment(tenant, installment.id()).await.unwrap();
        assert_eq!(stored.amount_paid(), dec!(500));
        assert_eq!(stored.status(), InstallmentStatus::Partial);
    }
}
