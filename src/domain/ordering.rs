//! Position bookkeeping for user-scoped ordered lists (skills, external profiles).
//!
//! Positions are 1-based and contiguous per owner. Every mutation that moves
//! items is staged here as a [`ReorderPlan`] and handed to the storage layer,
//! which writes it through a disjoint temporary range inside one transaction.

use std::collections::HashSet;

use uuid::Uuid;

use crate::errors::AppError;

/// Why a submitted order was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderMismatch {
    Duplicate(Uuid),
    Foreign(Uuid),
    Missing(Vec<Uuid>),
}

impl OrderMismatch {
    pub fn into_app_error(self, field: &str) -> AppError {
        let message = match self {
            OrderMismatch::Duplicate(id) => format!("Item {id} is listed more than once"),
            OrderMismatch::Foreign(id) => format!("Item {id} does not belong to this list"),
            OrderMismatch::Missing(ids) => format!(
                "Every item must be listed; missing {}",
                ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
            ),
        };
        AppError::field(field, message)
    }
}

/// Final positions for an owner's list, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderPlan {
    assignments: Vec<(Uuid, i32)>,
}

impl ReorderPlan {
    /// Positions 1..N in the order given.
    pub fn sequential(ordered_ids: &[Uuid]) -> Self {
        let assignments = ordered_ids
            .iter()
            .zip(1..)
            .map(|(id, position)| (*id, position))
            .collect();

        ReorderPlan { assignments }
    }

    pub fn assignments(&self) -> &[(Uuid, i32)] {
        &self.assignments
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.assignments.iter().map(|(id, _)| *id).collect()
    }

    pub fn positions(&self) -> Vec<i32> {
        self.assignments.iter().map(|(_, position)| *position).collect()
    }

    pub fn position_of(&self, id: &Uuid) -> Option<i32> {
        self.assignments
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, position)| *position)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// True when `stored` (id, position) rows, in position order, already
    /// carry exactly these positions. Gapped positions are never a no-op.
    pub fn is_noop(&self, stored: &[(Uuid, i32)]) -> bool {
        stored == self.assignments.as_slice()
    }
}

/// Validates that `submitted` is exactly the `owned` set, reordered.
///
/// `owned` is the owner's ids as currently stored; `submitted` must contain
/// each of them once and nothing else.
pub fn plan_reorder(owned: &[Uuid], submitted: &[Uuid]) -> Result<ReorderPlan, OrderMismatch> {
    let owned_set: HashSet<&Uuid> = owned.iter().collect();
    let mut seen: HashSet<&Uuid> = HashSet::with_capacity(submitted.len());

    for id in submitted {
        if !owned_set.contains(id) {
            return Err(OrderMismatch::Foreign(*id));
        }
        if !seen.insert(id) {
            return Err(OrderMismatch::Duplicate(*id));
        }
    }

    let missing: Vec<Uuid> = owned
        .iter()
        .filter(|id| !seen.contains(id))
        .copied()
        .collect();

    if !missing.is_empty() {
        return Err(OrderMismatch::Missing(missing));
    }

    Ok(ReorderPlan::sequential(submitted))
}

/// Closes the gap left by `removed`, keeping the relative order of the rest.
pub fn plan_removal(current: &[Uuid], removed: &Uuid) -> ReorderPlan {
    let remaining: Vec<Uuid> = current.iter().filter(|id| *id != removed).copied().collect();
    ReorderPlan::sequential(&remaining)
}

/// Position for an item appended after the current maximum.
pub fn next_position(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0).max(0) + 1
}
