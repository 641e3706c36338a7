//! Billing repository - persistence seam for the billing engine
//!
//! Every call names its tenant. The in-memory implementation keeps one
//! ledger per tenant inside a [`PartitionStore`].

use crate::model::{FeeAllocation, FeeStructure, Installment, Payment};
use async_trait::async_trait;
use std::collections::HashMap;
use tuition_common::{
    AllocationId, FeeStructureId, InstallmentId, PartitionStore, PaymentId, RepoResult,
    RepositoryError, TenantId, NON_FIELD,
};

/// Billing repository trait
#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn insert_structure(&self, tenant: TenantId, structure: &FeeStructure) -> RepoResult<()>;
    async fn get_structure(&self, tenant: TenantId, id: FeeStructureId) -> RepoResult<FeeStructure>;
    async fn list_structures(&self, tenant: TenantId) -> RepoResult<Vec<FeeStructure>>;

    /// Insert a new allocation. Fails with `Conflict` when the student
    /// already holds an active allocation of the same structure.
    async fn insert_allocation(&self, tenant: TenantId, allocation: &FeeAllocation) -> RepoResult<()>;
    /// Overwrite an existing allocation
    async fn save_allocation(&self, tenant: TenantId, allocation: &FeeAllocation) -> RepoResult<()>;
    async fn get_allocation(&self, tenant: TenantId, id: AllocationId) -> RepoResult<FeeAllocation>;
    async fn list_allocations(&self, tenant: TenantId) -> RepoResult<Vec<FeeAllocation>>;

    /// Insert installments, all or none
    async fn insert_installments(&self, tenant: TenantId, installments: &[Installment]) -> RepoResult<()>;
    async fn get_installment(&self, tenant: TenantId, id: InstallmentId) -> RepoResult<Installment>;
    async fn list_installments(&self, tenant: TenantId) -> RepoResult<Vec<Installment>>;

    async fn get_payment(&self, tenant: TenantId, id: PaymentId) -> RepoResult<Payment>;
    async fn list_payments(&self, tenant: TenantId) -> RepoResult<Vec<Payment>>;
    async fn payments_for_installment(&self, tenant: TenantId, id: InstallmentId) -> RepoResult<Vec<Payment>>;

    /// Insert the payment and store the recomputed installment as one unit:
    /// either both land or neither does.
    async fn commit_payment(
        &self,
        tenant: TenantId,
        payment: &Payment,
        installment: &Installment,
    ) -> RepoResult<()>;
}

/// Billing rows of one tenant
#[derive(Default)]
struct BillingLedger {
    structures: HashMap<FeeStructureId, FeeStructure>,
    allocations: HashMap<AllocationId, FeeAllocation>,
    installments: HashMap<InstallmentId, Installment>,
    /// Insertion order is recording order
    payments: Vec<Payment>,
}

/// In-memory billing repository (for testing and development)
pub struct InMemoryBillingRepository {
    ledgers: PartitionStore<BillingLedger>,
}

impl InMemoryBillingRepository {
    pub fn new() -> Self {
        Self {
            ledgers: PartitionStore::new(),
        }
    }
}

impl Default for InMemoryBillingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingRepository for InMemoryBillingRepository {
    async fn insert_structure(&self, tenant: TenantId, structure: &FeeStructure) -> RepoResult<()> {
        self.ledgers.write(tenant, |ledger| {
            ledger.structures.insert(structure.id, structure.clone());
        });
        Ok(())
    }

    async fn get_structure(&self, tenant: TenantId, id: FeeStructureId) -> RepoResult<FeeStructure> {
        self.ledgers
            .read(tenant, |ledger| ledger.structures.get(&id).cloned())
            .ok_or_else(|| RepositoryError::not_found("fee structure", id))
    }

    async fn list_structures(&self, tenant: TenantId) -> RepoResult<Vec<FeeStructure>> {
        Ok(self
            .ledgers
            .read(tenant, |ledger| ledger.structures.values().cloned().collect()))
    }

    async fn insert_allocation(&self, tenant: TenantId, allocation: &FeeAllocation) -> RepoResult<()> {
        self.ledgers.write(tenant, |ledger| {
            let duplicate = ledger.allocations.values().any(|existing| {
                existing.is_active()
                    && existing.student() == allocation.student()
                    && existing.fee_structure() == allocation.fee_structure()
            });
            if duplicate {
                return Err(RepositoryError::Conflict {
                    field: "fee_structure",
                    message: "This fee is already allocated to the student.".into(),
                });
            }
            ledger.allocations.insert(allocation.id(), allocation.clone());
            Ok(())
        })
    }

    async fn save_allocation(&self, tenant: TenantId, allocation: &FeeAllocation) -> RepoResult<()> {
        self.ledgers.write(tenant, |ledger| {
            match ledger.allocations.get_mut(&allocation.id()) {
                Some(existing) => {
                    *existing = allocation.clone();
                    Ok(())
                }
                None => Err(RepositoryError::not_found("allocation", allocation.id())),
            }
        })
    }

    async fn get_allocation(&self, tenant: TenantId, id: AllocationId) -> RepoResult<FeeAllocation> {
        self.ledgers
            .read(tenant, |ledger| ledger.allocations.get(&id).cloned())
            .ok_or_else(|| RepositoryError::not_found("allocation", id))
    }

    async fn list_allocations(&self, tenant: TenantId) -> RepoResult<Vec<FeeAllocation>> {
        Ok(self
            .ledgers
            .read(tenant, |ledger| ledger.allocations.values().cloned().collect()))
    }

    async fn insert_installments(&self, tenant: TenantId, installments: &[Installment]) -> RepoResult<()> {
        self.ledgers.write(tenant, |ledger| {
            if let Some(missing) = installments
                .iter()
                .find(|i| !ledger.allocations.contains_key(&i.allocation()))
            {
                return Err(RepositoryError::not_found("allocation", missing.allocation()));
            }
            for installment in installments {
                ledger.installments.insert(installment.id(), installment.clone());
            }
            Ok(())
        })
    }

    async fn get_installment(&self, tenant: TenantId, id: InstallmentId) -> RepoResult<Installment> {
        self.ledgers
            .read(tenant, |ledger| ledger.installments.get(&id).cloned())
            .ok_or_else(|| RepositoryError::not_found("installment", id))
    }

    async fn list_installments(&self, tenant: TenantId) -> RepoResult<Vec<Installment>> {
        Ok(self
            .ledgers
            .read(tenant, |ledger| ledger.installments.values().cloned().collect()))
    }

    async fn get_payment(&self, tenant: TenantId, id: PaymentId) -> RepoResult<Payment> {
        self.ledgers
            .read(tenant, |ledger| ledger.payments.iter().find(|p| p.id == id).cloned())
            .ok_or_else(|| RepositoryError::not_found("payment", id))
    }

    async fn list_payments(&self, tenant: TenantId) -> RepoResult<Vec<Payment>> {
        Ok(self
            .ledgers
            .read(tenant, |ledger| ledger.payments.clone()))
    }

    async fn payments_for_installment(&self, tenant: TenantId, id: InstallmentId) -> RepoResult<Vec<Payment>> {
        Ok(self.ledgers.read(tenant, |ledger| {
            ledger
                .payments
                .iter()
                .filter(|p| p.installment == id)
                .cloned()
                .collect()
        }))
    }

    async fn commit_payment(
        &self,
        tenant: TenantId,
        payment: &Payment,
        installment: &Installment,
    ) -> RepoResult<()> {
        self.ledgers.write(tenant, |ledger| {
            if payment.installment != installment.id() {
                return Err(RepositoryError::StorageError(
                    "payment does not belong to the installment".into(),
                ));
            }
            if !ledger.installments.contains_key(&installment.id()) {
                return Err(RepositoryError::not_found("installment", installment.id()));
            }
            if ledger.payments.iter().any(|p| p.id == payment.id) {
                return Err(RepositoryError::Conflict {
                    field: NON_FIELD,
                    message: format!("payment {} already recorded", payment.id),
                });
            }
            ledger.payments.push(payment.clone());
            ledger.installments.insert(installment.id(), installment.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BillingInterval, PaymentMode};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use tuition_common::{StudentId, TuitionError};

    fn structure() -> FeeStructure {
        FeeStructure {
            id: FeeStructureId::new(),
            name: "Tuition".into(),
            base_amount: dec!(1000),
            interval: BillingInterval::Monthly,
            batch: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_active_allocation_unique() {
        let repo = InMemoryBillingRepository::new();
        let tenant = TenantId::new();
        let structure = structure();
        let student = StudentId::new();

        let mut first = FeeAllocation::new(student, &structure, dec!(0)).unwrap();
        repo.insert_allocation(tenant, &first).await.unwrap();

        let second = FeeAllocation::new(student, &structure, dec!(100)).unwrap();
        assert!(matches!(
            repo.insert_allocation(tenant, &second).await,
            Err(RepositoryError::Conflict { field: "fee_structure", .. })
        ));

        // Deactivating frees the slot
        first.deactivate();
        repo.save_allocation(tenant, &first).await.unwrap();
        repo.insert_allocation(tenant, &second).await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_payment_checks_before_writing() {
        let repo = InMemoryBillingRepository::new();
        let tenant = TenantId::new();
        let allocation = FeeAllocation::new(StudentId::new(), &structure(), dec!(0)).unwrap();
        repo.insert_allocation(tenant, &allocation).await.unwrap();

        let installment = Installment::new(&allocation, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), dec!(800));
        let payment = Payment {
            id: PaymentId::new(),
            installment: installment.id(),
            student: allocation.student(),
            amount: dec!(500),
            paid_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            mode: PaymentMode::Cash,
            transaction_ref: None,
            recorded_at: Utc::now(),
        };

        // Installment not stored yet: nothing is written
        assert!(repo.commit_payment(tenant, &payment, &installment).await.is_err());
        assert!(repo.list_payments(tenant).await.unwrap().is_empty());

        repo.insert_installments(tenant, &[installment.clone()]).await.unwrap();
        repo.commit_payment(tenant, &payment, &installment).await.unwrap();
        assert_eq!(repo.payments_for_installment(tenant, installment.id()).await.unwrap().len(), 1);

        // Same payment twice: conflict reported against the whole request
        let err = TuitionError::from(repo.commit_payment(tenant, &payment, &installment).await.unwrap_err());
        assert!(err.field_errors().unwrap().get(NON_FIELD).is_some());
        assert_eq!(repo.list_payments(tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ledgers_isolated_by_tenant() {
        let repo = InMemoryBillingRepository::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let structure = structure();

        repo.insert_structure(tenant_a, &structure).await.unwrap();

        assert!(repo.list_structures(tenant_b).await.unwrap().is_empty());
        assert!(matches!(
            repo.get_structure(tenant_b, structure.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
