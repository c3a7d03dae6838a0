//! Candidate ordering for failover.

use std::time::Duration;

use crate::domain::provider_health::aggregate::ProviderHealth;
use crate::domain::provider_health::value_objects::ProviderRole;

/// Order routable providers of `role` from best to worst.
///
/// Unhealthy providers are excluded. Remaining providers sort by status,
/// then success rate (descending), then p95 latency (ascending). A provider
/// with no latency samples sorts after every measured one. The sort is stable
/// so configuration order breaks ties.
#[must_use]
pub fn rank_candidates<'a, I>(providers: I, role: ProviderRole) -> Vec<&'a ProviderHealth>
where
    I: IntoIterator<Item = &'a ProviderHealth>,
{
    let mut candidates: Vec<&ProviderHealth> = providers
        .into_iter()
        .filter(|h| h.provider().role == role && h.status().is_routable())
        .collect();

    candidates.sort_by(|a, b| {
        a.status()
            .rank()
            .cmp(&b.status().rank())
            .then_with(|| b.success_rate().total_cmp(&a.success_rate()))
            .then_with(|| {
                let pa = a.latency_percentile(95).unwrap_or(Duration::MAX);
                let pb = b.latency_percentile(95).unwrap_or(Duration::MAX);
                pa.cmp(&pb)
            })
    });
    candidates
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::provider_health::{HealthPolicy, ProbeSample, Provider};

    fn provider(id: &str, role: ProviderRole) -> ProviderHealth {
        ProviderHealth::new(
            Provider::new(id, format!("http://{id}"), role),
            HealthPolicy::default(),
        )
    }

    fn feed(h: &mut ProviderHealth, ok: usize, fail: usize, latency_ms: u64) {
        let now = Utc::now();
        for _ in 0..ok {
            h.record(ProbeSample::success(Duration::from_millis(latency_ms), now));
        }
        for _ in 0..fail {
            h.record(ProbeSample::failure(Duration::from_millis(latency_ms), now));
        }
    }

    fn ids(ranked: &[&ProviderHealth]) -> Vec<String> {
        ranked
            .iter()
            .map(|h| h.provider().id.to_string())
            .collect()
    }

    #[test]
    fn excludes_unhealthy_and_other_roles() {
        let mut a = provider("a", ProviderRole::Rpc);
        let b = provider("b", ProviderRole::Quote);
        let c = provider("c", ProviderRole::Rpc);
        feed(&mut a, 0, 10, 10);

        let all = [a, b, c];
        let ranked = rank_candidates(&all, ProviderRole::Rpc);
        assert_eq!(ids(&ranked), vec!["c"]);
    }

    #[test]
    fn healthy_before_degraded_then_by_success_then_latency() {
        let mut degraded = provider("degraded", ProviderRole::Rpc);
        let mut slow = provider("slow", ProviderRole::Rpc);
        let mut fast = provider("fast", ProviderRole::Rpc);
        let mut lossy = provider("lossy", ProviderRole::Rpc);
        feed(&mut degraded, 6, 4, 10);
        feed(&mut slow, 10, 0, 400);
        feed(&mut fast, 10, 0, 50);
        feed(&mut lossy, 19, 1, 10);

        let all = [degraded, slow, fast, lossy];
        let ranked = rank_candidates(&all, ProviderRole::Rpc);
        assert_eq!(ids(&ranked), vec!["fast", "slow", "lossy", "degraded"]);
    }

    #[test]
    fn unmeasured_provider_ranks_after_proven_one() {
        let untested = provider("untested", ProviderRole::Rpc);
        let mut proven = provider("proven", ProviderRole::Rpc);
        feed(&mut proven, 5, 0, 80);

        let all = [untested, proven];
        let ranked = rank_candidates(&all, ProviderRole::Rpc);
        assert_eq!(ids(&ranked), vec!["proven", "untested"]);
    }

    #[test]
    fn ties_keep_configuration_order() {
        let all = [
            provider("first", ProviderRole::Quote),
            provider("second", ProviderRole::Quote),
        ];
        let ranked = rank_candidates(&all, ProviderRole::Quote);
        assert_eq!(ids(&ranked), vec!["first", "second"]);
    }
}
