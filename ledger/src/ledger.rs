//! The ephemeral ledger — credit, FIFO debit, expiry-preserving move,
//! lazy pruning and balance queries over the two-level shelf map.

use std::collections::HashMap;

use ember_ttl::TtlRegistry;
use ember_types::{Amount, LedgerParams, OwnerAddress, Timestamp, TokenId};
use tracing::{debug, trace};

use crate::bucket::bucketed_expiry;
use crate::error::LedgerError;
use crate::shelf::SliceShelf;
use crate::slice::Slice;

/// Summary statistics for the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Owners with at least one shelf.
    pub owners: usize,
    /// (owner, token) shelves in total.
    pub shelves: usize,
    /// Slices currently stored across all shelves (live or not).
    pub slices: usize,
}

/// Multi-token balance ledger with per-slice expiration.
///
/// State is a sparse two-level map `owner -> token -> shelf`. Shelves
/// are only ever mutated through the operations below; each mutating
/// operation takes `&mut self` and runs to completion, so per-call
/// single-writer atomicity falls out of the borrow rules. Debit and move
/// plan their full consumption before touching anything, so a failed
/// operation commits no partial state.
#[derive(Debug)]
pub struct EphemeralLedger {
    registry: TtlRegistry,
    params: LedgerParams,
    shelves: HashMap<OwnerAddress, HashMap<TokenId, SliceShelf>>,
}

impl EphemeralLedger {
    pub fn new(registry: TtlRegistry) -> Self {
        Self::with_params(registry, LedgerParams::default())
    }

    pub fn with_params(registry: TtlRegistry, params: LedgerParams) -> Self {
        Self {
            registry,
            params,
            shelves: HashMap::new(),
        }
    }

    /// The TTL configuration store backing this ledger.
    pub fn registry(&self) -> &TtlRegistry {
        &self.registry
    }

    /// Mutable access for token configuration (set-once semantics are
    /// enforced by the registry itself).
    pub fn registry_mut(&mut self) -> &mut TtlRegistry {
        &mut self.registry
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    /// Credit `amount` of `token` to `owner` at `now`.
    ///
    /// The expiration is computed from the token's configured TTL via
    /// the bucketing calculator; the token must have its TTL set. The
    /// shelf is pruned first so reclaimed space is reused before growth.
    pub fn credit(
        &mut self,
        owner: &OwnerAddress,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let ttl = self.registry.ttl(token)?;
        let max_slices = self.registry.max_slices(token);
        self.prune(owner, token, now);
        let expires_at = bucketed_expiry(ttl, max_slices, now);
        self.shelf_mut(owner, token)
            .credit_at(amount, expires_at)
            .map_err(|_| LedgerError::AmountOverflow {
                account: owner.clone(),
                token,
            })
    }

    /// Debit `amount` of `token` from `owner` at `now`, consuming the
    /// soonest-expiring live slices first.
    ///
    /// Fails with `InsufficientBalance` (reporting what was actually
    /// available) without mutating anything if the live slices cannot
    /// cover the request.
    pub fn debit(
        &mut self,
        owner: &OwnerAddress,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let plan = {
            let shelf = self.shelf(owner, token);
            match shelf {
                Some(shelf) => shelf.consume_plan(amount, now),
                None => Err(Amount::ZERO),
            }
            .map_err(|available| LedgerError::InsufficientBalance {
                account: owner.clone(),
                token,
                available,
                requested: amount,
            })?
        };
        if let Some(shelf) = self.shelf_lookup_mut(owner, token) {
            shelf.apply_consume(&plan);
        }
        self.prune(owner, token, now);
        Ok(())
    }

    /// Move `amount` of `token` from `from` to `to` at `now`, preserving
    /// the expiration of every consumed slice.
    ///
    /// Transferring to oneself or moving zero is an explicit no-op, not
    /// an error. Otherwise this is a FIFO debit of `from` whose consumed
    /// portions are credited to `to` at their original `expires_at`
    /// (never recomputed), so a transfer can never extend a lifetime.
    pub fn move_balance(
        &mut self,
        from: &OwnerAddress,
        to: &OwnerAddress,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if from == to || amount.is_zero() {
            return Ok(());
        }
        let plan = {
            let shelf = self.shelf(from, token);
            match shelf {
                Some(shelf) => shelf.consume_plan(amount, now),
                None => Err(Amount::ZERO),
            }
            .map_err(|available| LedgerError::InsufficientBalance {
                account: from.clone(),
                token,
                available,
                requested: amount,
            })?
        };
        // Reject a destination-side overflow before mutating either
        // shelf, so failure commits nothing. The plan's takes sum to
        // exactly `amount`.
        if let Some(dest) = self.shelf(to, token) {
            if !dest.can_credit(amount) {
                return Err(LedgerError::AmountOverflow {
                    account: to.clone(),
                    token,
                });
            }
        }
        if let Some(shelf) = self.shelf_lookup_mut(from, token) {
            shelf.apply_consume(&plan);
        }
        let dest = self.shelf_mut(to, token);
        for step in &plan {
            // Validated against this exact destination state above.
            dest.credit_at(step.take, step.expires_at)
                .map_err(|_| LedgerError::AmountOverflow {
                    account: to.clone(),
                    token,
                })?;
        }
        self.prune(from, token, now);
        Ok(())
    }

    /// Sum of `owner`'s live `token` slices at `now`. Pure read; a slice
    /// expiring exactly at `now` contributes nothing.
    pub fn balance_of(&self, owner: &OwnerAddress, token: TokenId, now: Timestamp) -> Amount {
        self.shelf(owner, token)
            .map_or(Amount::ZERO, |shelf| shelf.live_balance(now))
    }

    /// The raw slice sequence for `(owner, token)` — introspection for
    /// tests and debugging. Empty if the shelf does not exist.
    pub fn slices_of(&self, owner: &OwnerAddress, token: TokenId) -> &[Slice] {
        self.shelf(owner, token).map_or(&[], SliceShelf::slices)
    }

    /// Drop expired and zeroed slices for `(owner, token)`, releasing
    /// storage when the shelf has mostly emptied out. Runs automatically
    /// around every mutation; safe to call opportunistically.
    pub fn prune(&mut self, owner: &OwnerAddress, token: TokenId, now: Timestamp) {
        let Some(tokens) = self.shelves.get_mut(owner) else {
            return;
        };
        let Some(shelf) = tokens.get_mut(&token) else {
            return;
        };
        let outcome = shelf.prune(now, &self.params);
        if outcome.shrunk {
            trace!(%owner, %token, removed = outcome.removed, "shelf storage shrunk");
        }
        if outcome.cleared {
            debug!(%owner, %token, removed = outcome.removed, "shelf cleared");
            tokens.remove(&token);
            if tokens.is_empty() {
                self.shelves.remove(owner);
            }
        }
    }

    /// Prune every shelf in the ledger. Maintenance hook for callers
    /// that want to reclaim storage eagerly (e.g. on a timer).
    pub fn prune_all(&mut self, now: Timestamp) {
        let keys: Vec<(OwnerAddress, TokenId)> = self
            .shelves
            .iter()
            .flat_map(|(owner, tokens)| {
                tokens.keys().map(move |token| (owner.clone(), *token))
            })
            .collect();
        for (owner, token) in keys {
            self.prune(&owner, token, now);
        }
    }

    /// Ledger summary statistics.
    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            owners: self.shelves.len(),
            shelves: self.shelves.values().map(HashMap::len).sum(),
            slices: self
                .shelves
                .values()
                .flat_map(HashMap::values)
                .map(SliceShelf::len)
                .sum(),
        }
    }

    fn shelf(&self, owner: &OwnerAddress, token: TokenId) -> Option<&SliceShelf> {
        self.shelves.get(owner).and_then(|tokens| tokens.get(&token))
    }

    fn shelf_lookup_mut(&mut self, owner: &OwnerAddress, token: TokenId) -> Option<&mut SliceShelf> {
        self.shelves
            .get_mut(owner)
            .and_then(|tokens| tokens.get_mut(&token))
    }

    fn shelf_mut(&mut self, owner: &OwnerAddress, token: TokenId) -> &mut SliceShelf {
        self.shelves
            .entry(owner.clone())
            .or_default()
            .entry(token)
            .or_default()
    }
}

impl EphemeralLedger {
    /// Serialize the two-level shelf map to bytes for persistence.
    pub fn save_shelves(&self) -> Vec<u8> {
        bincode::serialize(&self.shelves).unwrap_or_default()
    }

    /// Restore a ledger from serialized shelves plus a registry and
    /// parameters (both persisted separately by the caller).
    pub fn load_shelves(data: &[u8], registry: TtlRegistry, params: LedgerParams) -> Self {
        let shelves: HashMap<OwnerAddress, HashMap<TokenId, SliceShelf>> =
            bincode::deserialize(data).unwrap_or_default();
        Self {
            registry,
            params,
            shelves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ttl::TtlError;
    use ember_types::Expiry;

    fn owner(n: u8) -> OwnerAddress {
        OwnerAddress::new(format!("embr_{:0>60}", n))
    }

    fn token(n: u128) -> TokenId {
        TokenId::new(n)
    }

    fn amt(n: u128) -> Amount {
        Amount::new(n)
    }

    fn at(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    /// Ledger with one token configured: ttl 3600, max_slices 30.
    fn hourly_ledger() -> EphemeralLedger {
        let mut registry = TtlRegistry::new(30).unwrap();
        registry.set_ttl(token(1), 3600).unwrap();
        EphemeralLedger::new(registry)
    }

    #[test]
    fn credit_requires_configured_ttl() {
        let registry = TtlRegistry::new(30).unwrap();
        let mut ledger = EphemeralLedger::new(registry);
        let err = ledger.credit(&owner(1), token(9), amt(10), at(0)).unwrap_err();
        assert_eq!(err, LedgerError::Ttl(TtlError::NotSet(token(9))));
    }

    #[test]
    fn credit_rejects_zero_amount() {
        let mut ledger = hourly_ledger();
        assert_eq!(
            ledger.credit(&owner(1), token(1), Amount::ZERO, at(0)),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            ledger.debit(&owner(1), token(1), Amount::ZERO, at(0)),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn reference_scenario() {
        let mut ledger = hourly_ledger();
        let a = owner(1);

        ledger.credit(&a, token(1), amt(100), at(0)).unwrap();
        assert_eq!(
            ledger.slices_of(&a, token(1)),
            &[Slice::new(amt(100), Expiry::at(3720))]
        );

        ledger.credit(&a, token(1), amt(50), at(1800)).unwrap();
        assert_eq!(ledger.slices_of(&a, token(1)).len(), 2);
        assert_eq!(ledger.slices_of(&a, token(1))[1].expires_at, Expiry::at(5520));

        assert_eq!(ledger.balance_of(&a, token(1), at(3700)), amt(150));
        assert_eq!(ledger.balance_of(&a, token(1), at(3721)), amt(50));

        ledger.debit(&a, token(1), amt(30), at(3721)).unwrap();
        assert_eq!(
            ledger.slices_of(&a, token(1)),
            &[Slice::new(amt(20), Expiry::at(5520))]
        );
    }

    #[test]
    fn credits_in_same_bucket_merge() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        // Both land in the (0, 120] bucket window => same expiry 3720.
        ledger.credit(&a, token(1), amt(10), at(5)).unwrap();
        ledger.credit(&a, token(1), amt(15), at(100)).unwrap();
        assert_eq!(
            ledger.slices_of(&a, token(1)),
            &[Slice::new(amt(25), Expiry::at(3720))]
        );
    }

    #[test]
    fn credit_merge_overflow_errors_instead_of_losing_value() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        ledger.credit(&a, token(1), amt(u128::MAX), at(0)).unwrap();
        // Same bucket as the first credit: the merge would overflow.
        let err = ledger.credit(&a, token(1), amt(5), at(1)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::AmountOverflow {
                account: a.clone(),
                token: token(1),
            }
        );
        // The failed credit left the shelf exactly as it was.
        assert_eq!(ledger.balance_of(&a, token(1), at(1)), amt(u128::MAX));
        assert_eq!(ledger.slices_of(&a, token(1)).len(), 1);
        // A later bucket is rejected too: the shelf has no capacity left.
        let err = ledger.credit(&a, token(1), amt(5), at(1800)).unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow { .. }));
    }

    #[test]
    fn move_overflow_leaves_both_sides_untouched() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        let b = owner(2);
        // Both credits land in the (0, 120] bucket window => expiry 3720.
        ledger.credit(&a, token(1), amt(5), at(0)).unwrap();
        ledger.credit(&b, token(1), amt(u128::MAX), at(1)).unwrap();

        let err = ledger
            .move_balance(&a, &b, token(1), amt(5), at(2))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::AmountOverflow {
                account: b.clone(),
                token: token(1),
            }
        );
        assert_eq!(ledger.balance_of(&a, token(1), at(2)), amt(5));
        assert_eq!(ledger.balance_of(&b, token(1), at(2)), amt(u128::MAX));
        assert_eq!(
            ledger.slices_of(&a, token(1)),
            &[Slice::new(amt(5), Expiry::at(3720))]
        );
    }

    #[test]
    fn zero_ttl_token_never_expires() {
        let mut registry = TtlRegistry::new(30).unwrap();
        registry.set_ttl(token(2), 0).unwrap();
        let mut ledger = EphemeralLedger::new(registry);
        let a = owner(1);
        ledger.credit(&a, token(2), amt(40), at(0)).unwrap();
        assert_eq!(ledger.slices_of(&a, token(2))[0].expires_at, Expiry::NEVER);
        assert_eq!(ledger.balance_of(&a, token(2), at(u64::MAX - 1)), amt(40));
    }

    #[test]
    fn debit_insufficient_reports_available_and_mutates_nothing() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap();
        let before = ledger.slices_of(&a, token(1)).to_vec();

        let err = ledger.debit(&a, token(1), amt(150), at(10)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: a.clone(),
                token: token(1),
                available: amt(100),
                requested: amt(150),
            }
        );
        assert_eq!(ledger.slices_of(&a, token(1)), &before[..]);
    }

    #[test]
    fn debit_against_fully_expired_shelf_reports_zero_available() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap();
        // Everything expired by now=4000 (expiry was 3720).
        let err = ledger.debit(&a, token(1), amt(1), at(4000)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: a.clone(),
                token: token(1),
                available: amt(0),
                requested: amt(1),
            }
        );
    }

    #[test]
    fn debit_unknown_owner_is_insufficient() {
        let mut ledger = hourly_ledger();
        let err = ledger.debit(&owner(9), token(1), amt(1), at(0)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { available, .. } if available == amt(0)
        ));
    }

    #[test]
    fn debit_consumes_soonest_expiring_first() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap(); // expires 3720
        ledger.credit(&a, token(1), amt(50), at(1800)).unwrap(); // expires 5520

        ledger.debit(&a, token(1), amt(60), at(2000)).unwrap();
        assert_eq!(
            ledger.slices_of(&a, token(1)),
            &[
                Slice::new(amt(40), Expiry::at(3720)),
                Slice::new(amt(50), Expiry::at(5520)),
            ]
        );
    }

    #[test]
    fn credit_then_debit_round_trips() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        ledger.credit(&a, token(1), amt(77), at(500)).unwrap();
        ledger.debit(&a, token(1), amt(77), at(500)).unwrap();
        assert!(ledger.slices_of(&a, token(1)).is_empty());
        assert_eq!(ledger.balance_of(&a, token(1), at(500)), amt(0));
        // Shelf and owner entries are gone entirely.
        assert_eq!(ledger.summary(), LedgerSummary { owners: 0, shelves: 0, slices: 0 });
    }

    #[test]
    fn move_preserves_source_expirations() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        let b = owner(2);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap(); // expires 3720
        ledger.credit(&a, token(1), amt(50), at(1800)).unwrap(); // expires 5520

        ledger.move_balance(&a, &b, token(1), amt(120), at(2000)).unwrap();

        assert_eq!(
            ledger.slices_of(&b, token(1)),
            &[
                Slice::new(amt(100), Expiry::at(3720)),
                Slice::new(amt(20), Expiry::at(5520)),
            ]
        );
        assert_eq!(
            ledger.slices_of(&a, token(1)),
            &[Slice::new(amt(30), Expiry::at(5520))]
        );
    }

    #[test]
    fn move_merges_into_existing_destination_bucket() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        let b = owner(2);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap(); // expires 3720
        ledger.credit(&b, token(1), amt(10), at(60)).unwrap(); // expires 3720 too

        ledger.move_balance(&a, &b, token(1), amt(40), at(100)).unwrap();
        assert_eq!(
            ledger.slices_of(&b, token(1)),
            &[Slice::new(amt(50), Expiry::at(3720))]
        );
    }

    #[test]
    fn move_to_self_and_zero_are_no_ops() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        let b = owner(2);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap();
        let before = ledger.slices_of(&a, token(1)).to_vec();

        // Self-move of any amount, even more than the balance.
        ledger.move_balance(&a, &a, token(1), amt(1_000_000), at(10)).unwrap();
        assert_eq!(ledger.slices_of(&a, token(1)), &before[..]);

        // Zero-amount move, including to an owner with no shelf.
        ledger.move_balance(&a, &b, token(1), Amount::ZERO, at(10)).unwrap();
        assert_eq!(ledger.slices_of(&a, token(1)), &before[..]);
        assert!(ledger.slices_of(&b, token(1)).is_empty());
    }

    #[test]
    fn move_insufficient_leaves_both_sides_untouched() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        let b = owner(2);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap();
        ledger.credit(&b, token(1), amt(5), at(0)).unwrap();

        let err = ledger
            .move_balance(&a, &b, token(1), amt(101), at(10))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(&a, token(1), at(10)), amt(100));
        assert_eq!(ledger.balance_of(&b, token(1), at(10)), amt(5));
    }

    #[test]
    fn prune_all_sweeps_every_shelf() {
        let mut ledger = hourly_ledger();
        ledger.registry_mut().set_ttl(token(2), 3600).unwrap();
        ledger.credit(&owner(1), token(1), amt(10), at(0)).unwrap();
        ledger.credit(&owner(1), token(2), amt(10), at(0)).unwrap();
        ledger.credit(&owner(2), token(1), amt(10), at(0)).unwrap();
        assert_eq!(ledger.summary().shelves, 3);

        ledger.prune_all(at(10_000));
        assert_eq!(ledger.summary(), LedgerSummary { owners: 0, shelves: 0, slices: 0 });
    }

    #[test]
    fn bounded_slice_count_after_prune() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        // Credit every 7 seconds for two hours: far more credit instants
        // than buckets.
        let mut now = 0u64;
        while now < 7200 {
            ledger.credit(&a, token(1), amt(1), at(now)).unwrap();
            now += 7;
        }
        ledger.prune(&a, token(1), at(now));
        assert!(
            ledger.slices_of(&a, token(1)).len() <= 31,
            "got {} slices",
            ledger.slices_of(&a, token(1)).len()
        );
    }

    #[test]
    fn snapshot_round_trip() {
        let mut ledger = hourly_ledger();
        let a = owner(1);
        ledger.credit(&a, token(1), amt(100), at(0)).unwrap();
        ledger.credit(&a, token(1), amt(50), at(1800)).unwrap();

        let bytes = ledger.save_shelves();
        let mut registry = TtlRegistry::new(30).unwrap();
        registry.set_ttl(token(1), 3600).unwrap();
        let restored = EphemeralLedger::load_shelves(&bytes, registry, LedgerParams::default());

        assert_eq!(restored.slices_of(&a, token(1)), ledger.slices_of(&a, token(1)));
        assert_eq!(restored.summary(), ledger.summary());
    }
}
