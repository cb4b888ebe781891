use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

use crates::domain::entities::plans::PlanEntity;
use uuid::Uuid;

pub const DEFAULT_PLAN_CACHE_TTL: Duration = Duration::from_secs(300);

struct CachedPlan {
    plan: PlanEntity,
    expires_at: Instant,
}

/// Time-bound plan snapshots keyed by plan id.
///
/// Readers share the lock, writers take it exclusively. Every path that mutates a plan must call
/// [`PlanCache::invalidate`] before returning.
pub struct PlanCache {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, CachedPlan>>,
}

impl PlanCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, plan_id: Uuid) -> Option<PlanEntity> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&plan_id)
            .filter(|cached| Instant::now() < cached.expires_at)
            .map(|cached| cached.plan.clone())
    }

    pub fn put(&self, plan: PlanEntity) {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(plan.id, CachedPlan { plan, expires_at });
    }

    pub fn invalidate(&self, plan_id: Uuid) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&plan_id);
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_PLAN_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fixtures::sample_plan;
    use std::sync::Arc;

    #[test]
    fn put_then_get_returns_snapshot() {
        let cache = PlanCache::default();
        let plan = sample_plan(Uuid::new_v4(), 2000);

        cache.put(plan.clone());
        assert_eq!(cache.get(plan.id), Some(plan));
    }

    #[test]
    fn invalidate_removes_single_entry() {
        let cache = PlanCache::default();
        let kept = sample_plan(Uuid::new_v4(), 1000);
        let dropped = sample_plan(Uuid::new_v4(), 2000);
        cache.put(kept.clone());
        cache.put(dropped.clone());

        cache.invalidate(dropped.id);

        assert!(cache.get(dropped.id).is_none());
        assert_eq!(cache.get(kept.id), Some(kept));
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let cache = PlanCache::default();
        cache.put(sample_plan(Uuid::new_v4(), 1000));
        cache.put(sample_plan(Uuid::new_v4(), 2000));

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = PlanCache::new(Duration::ZERO);
        let plan = sample_plan(Uuid::new_v4(), 1000);
        cache.put(plan.clone());

        assert!(cache.get(plan.id).is_none());
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let cache = Arc::new(PlanCache::default());
        let plan = sample_plan(Uuid::new_v4(), 1000);
        cache.put(plan.clone());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let plan = plan.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            cache.put(plan.clone());
                        } else {
                            let _ = cache.get(plan.id);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.get(plan.id), Some(plan));
    }
}
