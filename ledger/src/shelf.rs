//! The per-(owner, token) slice shelf.
//!
//! An ordered sequence of balance slices, sorted ascending by
//! `expires_at`, with at most one live slice per distinct expiration.
//! Credits with an expiration already on the shelf merge into the
//! existing slice; everything else binary-searches its insertion point.

use ember_types::{Amount, Expiry, LedgerParams, Timestamp};
use serde::{Deserialize, Serialize};

use crate::slice::Slice;

/// One step of a FIFO consumption plan: take `take` from the slice at
/// `index`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Consume {
    pub index: usize,
    pub take: Amount,
    pub expires_at: Expiry,
}

/// A credit would push the shelf's stored total past `u128::MAX`. The
/// ledger refuses the whole operation rather than saturating away value.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SliceOverflow;

/// Outcome of a prune pass, for the caller to act and log on.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PruneOutcome {
    /// Slices dropped (expired or zeroed).
    pub removed: usize,
    /// The shelf ended the pass with no slices at all.
    pub cleared: bool,
    /// Backing storage was physically released.
    pub shrunk: bool,
}

/// Ordered slices for one (owner, token) pair.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SliceShelf {
    /// Sorted ascending by `expires_at`; unique expirations among live slices.
    slices: Vec<Slice>,
}

impl SliceShelf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Sum of all live slices at `now` (strictly `expires_at > now`).
    pub fn live_balance(&self, now: Timestamp) -> Amount {
        self.slices
            .iter()
            .filter(|s| s.is_live(now))
            .map(|s| s.amount)
            .sum()
    }

    /// Number of live slices at `now`.
    pub fn live_count(&self, now: Timestamp) -> usize {
        self.slices.iter().filter(|s| s.is_live(now)).count()
    }

    /// Sum of every stored slice, live or not. The credit-side capacity
    /// checks keep this at or below `u128::MAX`, so the saturating sum
    /// is exact.
    fn stored_total(&self) -> Amount {
        self.slices.iter().map(|s| s.amount).sum()
    }

    /// Add `amount` at an explicit expiration, merging into an existing
    /// slice with the same `expires_at` or inserting in sorted position.
    /// A credit that would push the shelf's stored total past capacity
    /// fails without mutating anything.
    ///
    /// Fast path O(1): expirations are monotone in practice, so most
    /// credits append at the end. Slow path: `partition_point` binary
    /// search + insert.
    pub(crate) fn credit_at(
        &mut self,
        amount: Amount,
        expires_at: Expiry,
    ) -> Result<(), SliceOverflow> {
        if self.stored_total().checked_add(amount).is_none() {
            return Err(SliceOverflow);
        }
        if self
            .slices
            .last()
            .map_or(true, |last| last.expires_at < expires_at)
        {
            self.slices.push(Slice::new(amount, expires_at));
            return Ok(());
        }
        let pos = self.slices.partition_point(|s| s.expires_at < expires_at);
        if let Some(existing) = self.slices.get_mut(pos) {
            if existing.expires_at == expires_at {
                existing.amount = existing.amount.checked_add(amount).ok_or(SliceOverflow)?;
                return Ok(());
            }
        }
        self.slices.insert(pos, Slice::new(amount, expires_at));
        Ok(())
    }

    /// Whether a credit of `amount` fits the shelf's remaining capacity.
    /// Every stored slice is at most the stored total, so this also
    /// rules out any single-slice merge overflow.
    pub(crate) fn can_credit(&self, amount: Amount) -> bool {
        self.stored_total().checked_add(amount).is_some()
    }

    /// Plan a FIFO consumption of `amount` at `now` without mutating.
    ///
    /// Walks slices oldest-expiring first, skipping expired and empty
    /// ones. Returns the per-slice takes on success, or the total that
    /// was actually available when the walk exhausted the shelf short.
    pub(crate) fn consume_plan(
        &self,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Vec<Consume>, Amount> {
        let mut remaining = amount;
        let mut plan = Vec::new();
        for (index, slice) in self.slices.iter().enumerate() {
            if remaining.is_zero() {
                break;
            }
            if !slice.is_live(now) {
                continue;
            }
            let take = slice.amount.min(remaining);
            plan.push(Consume {
                index,
                take,
                expires_at: slice.expires_at,
            });
            remaining = remaining.saturating_sub(take);
        }
        if remaining.is_zero() {
            Ok(plan)
        } else {
            Err(amount.saturating_sub(remaining))
        }
    }

    /// Apply a consumption plan produced by `consume_plan` on this exact
    /// shelf state. Fully consumed slices are zeroed; the trailing prune
    /// drops them.
    pub(crate) fn apply_consume(&mut self, plan: &[Consume]) {
        for step in plan {
            let slice = &mut self.slices[step.index];
            slice.amount = slice.amount.saturating_sub(step.take);
        }
    }

    /// Compact the shelf: keep live slices (in order), drop the rest.
    ///
    /// If the survivors are less than the configured fraction of the
    /// prior length and the shelf was long enough to matter, the backing
    /// storage is physically released as well.
    pub(crate) fn prune(&mut self, now: Timestamp, params: &LedgerParams) -> PruneOutcome {
        let prior_len = self.slices.len();
        if prior_len == 0 {
            return PruneOutcome::default();
        }
        self.slices.retain(|s| s.is_live(now));
        let survivors = self.slices.len();
        let removed = prior_len - survivors;

        if survivors == 0 {
            self.slices = Vec::new();
            return PruneOutcome {
                removed,
                cleared: true,
                shrunk: false,
            };
        }

        let mut shrunk = false;
        if prior_len > params.shrink_min_len
            && (survivors as u64) * 10_000 < (prior_len as u64) * u64::from(params.shrink_ratio_bps)
        {
            self.slices.shrink_to_fit();
            shrunk = true;
        }
        PruneOutcome {
            removed,
            cleared: false,
            shrunk,
        }
    }
}
