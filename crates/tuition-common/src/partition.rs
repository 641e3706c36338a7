//! Tenant-partitioned storage
//!
//! Rows live inside one partition per tenant, each behind its own lock. The
//! only way in is through a `TenantId`, so a query issued under tenant A
//! cannot observe tenant B, and writes in A never wait on B.

use crate::ids::TenantId;
use dashmap::DashMap;
use parking_lot::RwLock;

/// One `RwLock`-guarded value of `T` per tenant, created on first write.
pub struct PartitionStore<T> {
    partitions: DashMap<TenantId, RwLock<T>>,
}

impl<T: Default> PartitionStore<T> {
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }

    /// Read inside the tenant's partition. A tenant that never wrote sees an
    /// empty partition.
    pub fn read<R>(&self, tenant: TenantId, f: impl FnOnce(&T) -> R) -> R {
        match self.partitions.get(&tenant) {
            Some(partition) => f(&partition.read()),
            None => f(&T::default()),
        }
    }

    /// Mutate inside the tenant's partition. The closure runs under that
    /// partition's write lock, so everything it does lands together.
    pub fn write<R>(&self, tenant: TenantId, f: impl FnOnce(&mut T) -> R) -> R {
        let partition = self.partitions.entry(tenant).or_default().downgrade();
        let mut guard = partition.write();
        f(&mut guard)
    }

    /// Number of tenants holding data
    pub fn tenant_count(&self) -> usize {
        self.partitions.len()
    }
}

impl<T: Default> Default for PartitionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_are_isolated() {
        let store: PartitionStore<Vec<&'static str>> = PartitionStore::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();

        store.write(tenant_a, |rows| rows.push("a-row"));

        assert_eq!(store.read(tenant_a, |rows| rows.clone()), vec!["a-row"]);
        assert!(store.read(tenant_b, |rows| rows.is_empty()));
        // Reading never materializes a partition
        assert_eq!(store.tenant_count(), 1);
    }

    #[test]
    fn test_writer_in_one_tenant_does_not_block_another() {
        let store: PartitionStore<Vec<u32>> = PartitionStore::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        store.write(tenant_b, |rows| rows.push(1));

        // B stays readable and writable while A's write lock is held
        store.write(tenant_a, |rows| {
            rows.push(7);
            assert_eq!(store.read(tenant_b, |rows| rows.len()), 1);
        });
        store.write(tenant_b, |rows| rows.push(2));
        assert_eq!(store.read(tenant_b, |rows| rows.clone()), vec![1, 2]);
        assert_eq!(store.read(tenant_a, |rows| rows.clone()), vec![7]);
    }
}
