//! Tests for change intervals: emptiness, constriction against the old and
//! new orderings, merging and pooling.

use quickcheck_macros::quickcheck;
use vellum_dom::ElementId;
use vellum_paint::SharedBlock;
use vellum_render::{ChangeInterval, ChangeIntervalList, Drawable, DrawableId, DrawableSequence};

struct Stub(ElementId);

impl Drawable for Stub {
    fn element(&self) -> ElementId {
        self.0
    }

    fn is_dirty(&self) -> bool {
        false
    }

    fn is_disposed(&self) -> bool {
        false
    }

    fn update(&mut self) -> bool {
        false
    }

    fn update_svg_block(&mut self, _block: Option<SharedBlock>) {}

    fn dispose(&mut self) {}
}

/// A committed sequence of `n` stub drawables.
fn committed(n: usize) -> (DrawableSequence, Vec<DrawableId>) {
    let mut sequence = DrawableSequence::new();
    let ids: Vec<DrawableId> = (0..n)
        .map(|i| {
            let id = sequence.insert(Box::new(Stub(ElementId(i + 1))));
            sequence.push_back(id);
            id
        })
        .collect();
    sequence.commit();
    (sequence, ids)
}

// ========== emptiness ==========

#[test]
fn test_fresh_open_interval_is_not_empty() {
    let interval = ChangeInterval::new(None, None);
    assert!(!interval.is_empty());
    assert!(!interval.collapsed_empty());
}

#[test]
fn test_equal_boundaries_are_empty() {
    let (_, ids) = committed(2);
    assert!(ChangeInterval::new(Some(ids[0]), Some(ids[0])).is_empty());
    assert!(!ChangeInterval::new(Some(ids[0]), Some(ids[1])).is_empty());
    assert!(!ChangeInterval::new(None, Some(ids[0])).is_empty());
}

#[quickcheck]
fn prop_emptiness_follows_boundaries(before: u8, after: u8) -> bool {
    let (_, ids) = committed(4);
    let pick = |i: u8| ids.get(usize::from(i) % 5).copied();
    let (before, after) = (pick(before), pick(after));
    let interval = ChangeInterval::new(before, after);
    interval.is_empty() == (before.is_some() && before == after)
}

// ========== constriction ==========

#[test]
fn test_unchanged_run_constricts_to_empty() {
    let (sequence, ids) = committed(3);
    let mut interval = ChangeInterval::new(Some(ids[0]), Some(ids[2]));

    assert!(interval.constrict(&sequence));
    assert!(interval.is_empty());
    assert!(!interval.constrict(&sequence), "second constriction is a no-op");
}

#[test]
fn test_constriction_stops_at_insertion() {
    let (mut sequence, ids) = committed(3);
    let inserted = sequence.insert(Box::new(Stub(ElementId(10))));
    sequence.insert_after(Some(ids[0]), inserted);

    let mut interval = ChangeInterval::new(Some(ids[0]), Some(ids[1]));
    assert!(!interval.constrict(&sequence));
    assert_eq!(interval.drawable_before(), Some(ids[0]));
    assert_eq!(interval.drawable_after(), Some(ids[1]));
    assert!(!interval.is_empty());

    let (old_first, old_last) = (sequence.old_first(), sequence.old_last());
    let (new_first, new_last) = (sequence.new_first(), sequence.new_last());
    assert_eq!(interval.old_internal_drawable_count(&sequence, old_first, old_last), 0);
    assert_eq!(interval.new_internal_drawable_count(&sequence, new_first, new_last), 1);
}

#[test]
fn test_wide_interval_narrows_to_change() {
    // old: a b c d e, new: a b x d e
    let (mut sequence, ids) = committed(5);
    let replacement = sequence.insert(Box::new(Stub(ElementId(10))));
    let _ = sequence.remove(ids[2]);
    sequence.insert_after(Some(ids[1]), replacement);

    let mut interval = ChangeInterval::new(Some(ids[0]), Some(ids[4]));
    assert!(interval.constrict(&sequence));
    assert_eq!(interval.drawable_before(), Some(ids[1]));
    assert_eq!(interval.drawable_after(), Some(ids[3]));

    let (old_first, old_last) = (sequence.old_first(), sequence.old_last());
    let (new_first, new_last) = (sequence.new_first(), sequence.new_last());
    assert_eq!(interval.old_internal_drawable_count(&sequence, old_first, old_last), 1);
    assert_eq!(interval.new_internal_drawable_count(&sequence, new_first, new_last), 1);
}

#[test]
fn test_constriction_past_the_end_collapses() {
    let (sequence, ids) = committed(1);
    let mut interval = ChangeInterval::new(Some(ids[0]), None);

    assert!(interval.constrict(&sequence));
    assert!(interval.collapsed_empty());
    assert!(interval.is_empty());
    assert_eq!(interval.old_internal_drawable_count(&sequence, None, None), 0);
}

#[test]
fn test_open_interval_counts_whole_list() {
    let (sequence, ids) = committed(3);
    let interval = ChangeInterval::new(None, None);
    let count = interval.new_internal_drawable_count(&sequence, Some(ids[0]), Some(ids[2]));
    assert_eq!(count, 3);
}

#[test]
#[should_panic(expected = "interval collapsed past its end boundary")]
fn test_inverted_boundaries_panic_when_constricted() {
    let (sequence, ids) = committed(2);
    let mut interval = ChangeInterval::new(Some(ids[1]), Some(ids[0]));
    let _ = interval.constrict(&sequence);
}

// ========== widening ==========

#[test]
fn test_widening_skips_inserted_boundary() {
    let (mut sequence, ids) = committed(2);
    let inserted = sequence.insert(Box::new(Stub(ElementId(10))));
    sequence.insert_after(Some(ids[0]), inserted);

    let mut interval = ChangeInterval::new(Some(inserted), Some(ids[1]));
    assert!(interval.widen_to_stable(&sequence));
    assert_eq!(interval.drawable_before(), Some(ids[0]));
    assert_eq!(interval.drawable_after(), Some(ids[1]));
}

#[test]
fn test_widening_removed_boundary_opens_interval() {
    let (mut sequence, ids) = committed(3);
    let _ = sequence.remove(ids[0]);

    let mut interval = ChangeInterval::new(Some(ids[0]), Some(ids[1]));
    assert!(interval.widen_to_stable(&sequence));
    assert_eq!(interval.drawable_before(), None);
    assert_eq!(interval.drawable_after(), Some(ids[1]));
}

#[test]
fn test_widening_repairs_inverted_boundaries() {
    let (sequence, ids) = committed(4);
    let mut interval = ChangeInterval::new(Some(ids[2]), Some(ids[1]));

    assert!(interval.widen_to_stable(&sequence));
    assert_eq!(interval.drawable_before(), Some(ids[0]));
    assert_eq!(interval.drawable_after(), Some(ids[3]));
    assert!(interval.constrict(&sequence));
    assert!(interval.is_empty());
}

#[test]
fn test_stable_boundaries_are_not_widened() {
    let (sequence, ids) = committed(3);
    let mut interval = ChangeInterval::new(Some(ids[0]), Some(ids[2]));
    assert!(!interval.widen_to_stable(&sequence));
}

// ========== combining ==========

#[test]
fn test_combine_spans_both() {
    let (_, ids) = committed(3);
    let mut first = ChangeInterval::new(Some(ids[0]), Some(ids[1]));
    first.combine_with(&ChangeInterval::new(Some(ids[1]), Some(ids[2])));
    assert_eq!(first.drawable_before(), Some(ids[0]));
    assert_eq!(first.drawable_after(), Some(ids[2]));
}

#[test]
fn test_combine_ignores_empty_and_adopts_into_empty() {
    let (_, ids) = committed(3);
    let mut interval = ChangeInterval::new(Some(ids[0]), Some(ids[1]));
    interval.combine_with(&ChangeInterval::new(Some(ids[2]), Some(ids[2])));
    assert_eq!(interval.drawable_after(), Some(ids[1]));

    let mut empty = ChangeInterval::new(Some(ids[0]), Some(ids[0]));
    empty.combine_with(&ChangeInterval::new(Some(ids[1]), Some(ids[2])));
    assert_eq!(empty.drawable_before(), Some(ids[1]));
    assert_eq!(empty.drawable_after(), Some(ids[2]));
}

#[test]
fn test_list_combines_touching_intervals() {
    let (_, ids) = committed(4);
    let mut list = ChangeIntervalList::new(8);
    let first = list.new_change_interval(Some(ids[0]), Some(ids[1]));
    let _ = list.new_change_interval(Some(ids[1]), Some(ids[2]));
    let _ = list.new_change_interval(Some(ids[3]), None);

    assert_eq!(list.combine_adjacent(), 1);
    assert_eq!(list.len(), 2);
    let merged = list.get(first).expect("head survives");
    assert_eq!(merged.drawable_after(), Some(ids[2]));
}

// ========== pooling ==========

#[test]
fn test_list_links_in_allocation_order() {
    let (_, ids) = committed(2);
    let mut list = ChangeIntervalList::new(4);
    assert!(list.is_empty());
    let first = list.new_change_interval(None, Some(ids[0]));
    let second = list.new_change_interval(Some(ids[1]), None);

    assert_eq!(list.head(), Some(first));
    let order: Vec<_> = list.iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec![first, second]);
}

#[test]
fn test_dispose_all_respects_pool_capacity() {
    let mut list = ChangeIntervalList::new(2);
    for _ in 0..3 {
        let _ = list.new_change_interval(None, None);
    }

    assert_eq!(list.dispose_all(), 3);
    assert!(list.is_empty());
    assert_eq!(list.pooled(), 2);

    // pooled intervals come back reset
    let id = list.new_change_interval(None, None);
    assert_eq!(list.pooled(), 1);
    assert_eq!(list.get(id), Some(&ChangeInterval::new(None, None)));
}
