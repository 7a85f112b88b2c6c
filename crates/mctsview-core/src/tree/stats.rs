use crate::tree::cache::TreeCache;

/// Summary statistics over every materialized node of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreeStats {
    pub count: usize,
    pub mean_visits: f64,
    pub mean_value: f64,
    pub min_visits: u64,
    pub max_visits: u64,
    pub max_abs_value: f64,
}

impl TreeStats {
    /// Scan all nodes reachable through visible or collapsed children.
    /// Each node is counted once.
    pub fn scan(cache: &TreeCache) -> Self {
        let mut count = 0usize;
        let mut visit_sum = 0u128;
        let mut value_sum = 0.0f64;
        let mut min_visits = u64::MAX;
        let mut max_visits = 0u64;
        let mut max_abs_value = 0.0f64;

        let mut stack = vec![cache.root_id()];
        while let Some(id) = stack.pop() {
            let Ok(node) = cache.node(id) else {
                continue;
            };
            count += 1;
            visit_sum += u128::from(node.visits());
            value_sum += node.value();
            min_visits = min_visits.min(node.visits());
            max_visits = max_visits.max(node.visits());
            max_abs_value = max_abs_value.max(node.value().abs());
            stack.extend_from_slice(node.materialized_children());
        }

        if count == 0 {
            return TreeStats::default();
        }

        TreeStats {
            count,
            mean_visits: visit_sum as f64 / count as f64,
            mean_value: value_sum / count as f64,
            min_visits,
            max_visits,
            max_abs_value,
        }
    }

    /// Like [`TreeStats::scan`], but an absent tree yields zeroes.
    pub fn scan_opt(cache: Option<&TreeCache>) -> Self {
        cache.map(TreeStats::scan).unwrap_or_default()
    }
}
