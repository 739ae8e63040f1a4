//! Reconciliation of server-confirmed changes into rendered results
//!
//! The reconciler is the only writer of the [`ResultCache`] and of the
//! [`DepartmentContext`]. Every mutation returns the smallest list of
//! [`DomOp`]s that brings an already-rendered container in line with the
//! cache:
//!
//! - a changed card is swapped node-for-node, never by re-rendering its parent
//! - a card whose stock reaches zero is hidden, not removed
//! - only when the last visible card disappears does the container fall back
//!   to the empty-state message
//!
//! No sibling or ancestor node is rebuilt, so the scroll offset survives.

use crate::{
    core::error::ReconcileError,
    domain::{DepartmentContext, ProductId, ProductRecord},
    presentation::{
        patch::DomOp,
        renderer::{self, EmptyReason},
    },
};

use super::result_cache::ResultCache;

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    cache: ResultCache,
    context: DepartmentContext,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn context(&self) -> &DepartmentContext {
        &self.context
    }

    /// Drop every cached record, keeping the department context
    pub fn clear_results(&mut self) {
        self.cache.clear();
    }

    /// Replace the cache with the first page of a new search
    pub fn replace_results(&mut self, records: Vec<ProductRecord>) -> Vec<DomOp> {
        self.cache.clear();
        let received = records.len();
        self.cache.append(records);
        Self::derive_locks(&self.context, self.cache.iter_mut());

        if received == 0 {
            return vec![DomOp::ShowMessage(renderer::render_empty_state(
                EmptyReason::NothingFound,
            ))];
        }
        let cards = renderer::render_visible(self.cache.records());
        if cards.is_empty() {
            return vec![DomOp::ShowMessage(renderer::render_empty_state(
                EmptyReason::AllReserved,
            ))];
        }
        vec![DomOp::ReplaceContainer(cards)]
    }

    /// Append a continuation page after the records already rendered
    pub fn append_results(&mut self, records: Vec<ProductRecord>) -> Vec<DomOp> {
        let visible_before = self.cache.visible_count();
        let start = self.cache.append(records);
        let appended = self.cache.len() - start;
        Self::derive_locks(&self.context, self.cache.iter_mut().skip(start).take(appended));

        let cards = renderer::render_visible(self.cache.since(start));
        if cards.is_empty() {
            return Vec::new();
        }
        if visible_before == 0 {
            // The container holds the empty-state message, not cards
            return vec![DomOp::ReplaceContainer(renderer::render_visible(
                self.cache.records(),
            ))];
        }
        vec![DomOp::AppendCards(cards)]
    }

    /// Apply a reservation the server has already confirmed
    ///
    /// Never call this speculatively: a failed reservation must leave the
    /// cache untouched.
    pub fn apply_reservation(
        &mut self,
        id: ProductId,
        quantity: u32,
        unit_price: f64,
    ) -> Result<&ProductRecord, ReconcileError> {
        let record = self.cache.get_mut(id).ok_or(ReconcileError::NotFound(id))?;
        let quantity = f64::from(quantity);
        record.available -= quantity;
        record.user_reserved += quantity;
        record.user_reserved_sum += quantity * unit_price;
        Ok(record)
    }

    /// [`apply_reservation`](Self::apply_reservation) plus the patch for its card
    pub fn reconcile_reservation(
        &mut self,
        id: ProductId,
        quantity: u32,
        unit_price: f64,
    ) -> Result<Vec<DomOp>, ReconcileError> {
        let record = self.apply_reservation(id, quantity, unit_price)?;
        if record.is_available() {
            return Ok(vec![DomOp::ReplaceCard(renderer::render_card_node(record))]);
        }

        let mut ops = vec![DomOp::HideCard(id)];
        if self.cache.visible_count() == 0 {
            ops.push(DomOp::ShowMessage(renderer::render_empty_state(
                EmptyReason::AllReserved,
            )));
        }
        Ok(ops)
    }

    /// Install a new department context and recompute every lock flag
    ///
    /// Returns the ids whose `is_different_department` flag flipped, in cache
    /// order. This is exactly the set of cards that must be re-rendered;
    /// calling it again with the same context returns an empty set.
    pub fn recompute_locks(&mut self, context: DepartmentContext) -> Vec<ProductId> {
        self.context = context;
        let mut changed = Vec::new();
        for record in self.cache.iter_mut() {
            let was_locked = record.is_different_department;
            Self::derive_lock(&self.context, record);
            if record.is_different_department != was_locked {
                changed.push(record.id);
            }
        }
        changed
    }

    /// Node swaps for the given records, skipping the hidden ones
    pub fn lock_patch(&self, changed: &[ProductId]) -> Vec<DomOp> {
        changed
            .iter()
            .filter_map(|&id| self.cache.get(id))
            .filter(|record| record.is_available())
            .map(|record| DomOp::ReplaceCard(renderer::render_card_node(record)))
            .collect()
    }

    /// Recompute locks for `context` and patch the banner plus the changed cards
    pub fn apply_department_context(&mut self, context: DepartmentContext) -> Vec<DomOp> {
        let banner = DomOp::UpdateDepartmentInfo {
            department: context.department().cloned(),
            count: context.item_count(),
        };
        let changed = self.recompute_locks(context);
        log::debug!("Department lock flags changed for {} products", changed.len());

        let mut ops = vec![banner];
        ops.extend(self.lock_patch(&changed));
        ops
    }

    fn derive_locks<'a>(
        context: &DepartmentContext,
        records: impl Iterator<Item = &'a mut ProductRecord>,
    ) {
        for record in records {
            Self::derive_lock(context, record);
        }
    }

    fn derive_lock(context: &DepartmentContext, record: &mut ProductRecord) {
        record.is_different_department = context.locks(record);
        record.locked_by_department = if record.is_different_department {
            context.department().cloned()
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::DepartmentId, presentation::patch::CardNode, test_helpers::product};
    use pretty_assertions::assert_eq;

    fn reconciler_with(records: Vec<ProductRecord>) -> Reconciler {
        let mut reconciler = Reconciler::new();
        reconciler.replace_results(records);
        reconciler
    }

    fn context(department: &str) -> DepartmentContext {
        DepartmentContext::new(Some(DepartmentId::from(department)), 1)
    }

    #[test]
    fn test_replace_results_renders_visible_cards() {
        let mut sold_out = product(2, "A");
        sold_out.available = 0.0;
        let mut reconciler = Reconciler::new();

        let ops = reconciler.replace_results(vec![product(1, "A"), sold_out, product(3, "A")]);

        assert_eq!(reconciler.cache().len(), 3);
        match ops.as_slice() {
            [DomOp::ReplaceContainer(cards)] => {
                let ids: Vec<_> = cards.iter().map(|c| c.id).collect();
                assert_eq!(ids, vec![ProductId(1), ProductId(3)]);
            }
            other => panic!("unexpected ops: {other:?}"),
        }
    }

    #[test]
    fn test_replace_results_empty_states() {
        let mut reconciler = Reconciler::new();
        assert_eq!(
            reconciler.replace_results(vec![]),
            vec![DomOp::ShowMessage(renderer::render_empty_state(
                EmptyReason::NothingFound
            ))]
        );

        let mut sold_out = product(1, "A");
        sold_out.available = 0.0;
        assert_eq!(
            reconciler.replace_results(vec![sold_out]),
            vec![DomOp::ShowMessage(renderer::render_empty_state(
                EmptyReason::AllReserved
            ))]
        );
    }

    #[test]
    fn test_incoming_records_get_lock_flags() {
        let mut reconciler = Reconciler::new();
        reconciler.recompute_locks(context("A"));

        reconciler.replace_results(vec![product(1, "A"), product(2, "B")]);
        reconciler.append_results(vec![product(3, "B")]);

        let locked: Vec<_> = reconciler
            .cache()
            .records()
            .iter()
            .map(|r| r.is_different_department)
            .collect();
        assert_eq!(locked, vec![false, true, true]);
        assert_eq!(
            reconciler.cache().get(ProductId(3)).and_then(|r| r.locked_by_department.clone()),
            Some(DepartmentId::from("A"))
        );
    }

    #[test]
    fn test_append_results_appends_new_cards_only() {
        let mut reconciler = reconciler_with(vec![product(1, "A")]);

        let ops = reconciler.append_results(vec![product(2, "A"), product(3, "A")]);

        assert_eq!(
            ops,
            vec![DomOp::AppendCards(vec![
                renderer::render_card_node(&product(2, "A")),
                renderer::render_card_node(&product(3, "A")),
            ])]
        );
    }

    #[test]
    fn test_append_into_empty_state_replaces_container() {
        let mut sold_out = product(1, "A");
        sold_out.available = 0.0;
        let mut reconciler = reconciler_with(vec![sold_out]);

        let ops = reconciler.append_results(vec![product(2, "A")]);

        assert_eq!(
            ops,
            vec![DomOp::ReplaceContainer(vec![renderer::render_card_node(
                &product(2, "A")
            )])]
        );
    }

    #[test]
    fn test_apply_reservation_arithmetic() {
        let mut reconciler = reconciler_with(vec![product(1, "A")]);
        let before = reconciler.cache().get(ProductId(1)).cloned().expect("cached");

        let after = reconciler
            .apply_reservation(ProductId(1), 3, 2.5)
            .expect("cached")
            .clone();

        assert_eq!(after.available, before.available - 3.0);
        assert_eq!(after.user_reserved, before.user_reserved + 3.0);
        assert_eq!(after.user_reserved_sum, before.user_reserved_sum + 7.5);
    }

    #[test]
    fn test_apply_reservation_unknown_id_mutates_nothing() {
        let mut reconciler = reconciler_with(vec![product(1, "A")]);
        let snapshot = reconciler.cache().records().to_vec();

        let result = reconciler.apply_reservation(ProductId(99), 1, 1.0);

        assert_eq!(result.err(), Some(ReconcileError::NotFound(ProductId(99))));
        assert_eq!(reconciler.cache().records(), snapshot.as_slice());
    }

    #[test]
    fn test_reservation_patch_replaces_single_card() {
        let mut reconciler = reconciler_with(vec![product(1, "A"), product(2, "A")]);

        let ops = reconciler
            .reconcile_reservation(ProductId(2), 1, 2.0)
            .expect("cached");

        let updated = reconciler.cache().get(ProductId(2)).expect("cached");
        assert_eq!(
            ops,
            vec![DomOp::ReplaceCard(CardNode {
                id: ProductId(2),
                markup: renderer::render_card(updated),
            })]
        );
    }

    #[test]
    fn test_reservation_to_zero_hides_card() {
        let mut reconciler = reconciler_with(vec![product(1, "A"), product(2, "A")]);

        let ops = reconciler
            .reconcile_reservation(ProductId(1), 10, 2.0)
            .expect("cached");

        assert_eq!(ops, vec![DomOp::HideCard(ProductId(1))]);
        assert!(reconciler.cache().contains(ProductId(1)));
    }

    #[test]
    fn test_last_visible_card_falls_back_to_empty_state() {
        let mut reconciler = reconciler_with(vec![product(1, "A")]);

        let ops = reconciler
            .reconcile_reservation(ProductId(1), 10, 2.0)
            .expect("cached");

        assert_eq!(
            ops,
            vec![
                DomOp::HideCard(ProductId(1)),
                DomOp::ShowMessage(renderer::render_empty_state(EmptyReason::AllReserved)),
            ]
        );
    }

    #[test]
    fn test_recompute_locks_reports_flipped_records() {
        let mut reconciler = reconciler_with(vec![product(1, "B")]);

        let changed = reconciler.recompute_locks(context("A"));

        assert_eq!(changed, vec![ProductId(1)]);
        let record = reconciler.cache().get(ProductId(1)).expect("cached");
        assert!(record.is_different_department);
    }

    #[test]
    fn test_recompute_locks_is_idempotent() {
        let mut reconciler =
            reconciler_with(vec![product(1, "A"), product(2, "B"), product(3, "C")]);

        let first = reconciler.recompute_locks(context("A"));
        let second = reconciler.recompute_locks(context("A"));

        assert_eq!(first, vec![ProductId(2), ProductId(3)]);
        assert!(second.is_empty());
    }

    #[test]
    fn test_switching_departments_flips_both_sides() {
        let mut reconciler =
            reconciler_with(vec![product(1, "A"), product(2, "B"), product(3, "C")]);
        reconciler.recompute_locks(context("A"));

        let changed = reconciler.recompute_locks(context("C"));

        // Product 2 stays locked, only its explanation changes
        assert_eq!(changed, vec![ProductId(1), ProductId(3)]);
        assert_eq!(
            reconciler.cache().get(ProductId(2)).and_then(|r| r.locked_by_department.clone()),
            Some(DepartmentId::from("C"))
        );
    }

    #[test]
    fn test_lock_patch_skips_hidden_records() {
        let mut reconciler = reconciler_with(vec![product(1, "B"), product(2, "B")]);
        reconciler
            .reconcile_reservation(ProductId(2), 10, 1.0)
            .expect("cached");

        let ops = reconciler.apply_department_context(context("A"));

        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], DomOp::UpdateDepartmentInfo { .. }));
        assert!(matches!(&ops[1], DomOp::ReplaceCard(card) if card.id == ProductId(1)));
    }
}
