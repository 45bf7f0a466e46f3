use serde::Serialize;

use super::criterion::ResolvedCriterion;
use super::matcher::{matches_all, Tagged};

/// A catalogue entry that free-text search and criteria can be applied to
pub trait Searchable: Tagged {
    fn id(&self) -> i64;

    /// Case-sensitive substring test over the entry's text fields
    fn contains_text(&self, needle: &str) -> bool;
}

/// One page of search results plus the number of entries that matched overall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Paging window. `limit == 0` means "everything from `offset` on".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub limit: usize,
    pub offset: usize,
}

impl Window {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

/// Filter candidates by text and criteria, order by id, then cut one page.
pub fn search<T: Searchable>(
    mut candidates: Vec<T>,
    text: Option<&str>,
    criteria: &[ResolvedCriterion],
    window: Window,
) -> Page<T> {
    let text = text.filter(|t| !t.is_empty());

    candidates.retain(|entry| {
        text.map_or(true, |needle| entry.contains_text(needle)) && matches_all(entry, criteria)
    });
    candidates.sort_by_key(|entry| entry.id());

    paginate(candidates, window)
}

/// Cut a page out of already-ordered items. `total` is the count before paging.
pub fn paginate<T>(items: Vec<T>, window: Window) -> Page<T> {
    let total = items.len();
    if window.offset >= total {
        return Page { items: Vec::new(), total };
    }

    let take = if window.limit == 0 { total } else { window.limit };
    let items = items.into_iter().skip(window.offset).take(take).collect();
    Page { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::criterion::MatchMode;
    use crate::filter::types::{Association, FilterType, FilterValue};

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: i64,
        title: String,
        tags: Vec<Association>,
    }

    impl Tagged for Entry {
        fn associations(&self) -> &[Association] {
            &self.tags
        }
    }

    impl Searchable for Entry {
        fn id(&self) -> i64 {
            self.id
        }

        fn contains_text(&self, needle: &str) -> bool {
            self.title.contains(needle)
        }
    }

    fn entry(id: i64, title: &str, tags: Vec<Association>) -> Entry {
        Entry { id, title: title.into(), tags }
    }

    fn age(from: &str, to: &str) -> ResolvedCriterion {
        ResolvedCriterion {
            filter_id: 1,
            filter_type: FilterType::NumberRange,
            mode: MatchMode::Range {
                from: FilterType::NumberRange.parse_bound(from),
                to: FilterType::NumberRange.parse_bound(to),
            },
        }
    }

    fn catalogue() -> Vec<Entry> {
        let tagged = Association {
            id: 10,
            owner_id: 1,
            filter_id: 1,
            value: FilterValue::range(Some("18"), Some("25")),
        };
        vec![entry(2, "Benefit B", vec![]), entry(1, "Benefit A", vec![tagged])]
    }

    #[test]
    fn untagged_benefit_always_matches() {
        let page = search(catalogue(), None, &[age("20", "30")], Window::default());
        assert_eq!(page.total, 2);
        assert_eq!(page.items.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);

        let page = search(catalogue(), None, &[age("26", "30")], Window::default());
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, 2);
    }

    #[test]
    fn text_is_case_sensitive() {
        let page = search(catalogue(), Some("Benefit A"), &[], Window::default());
        assert_eq!(page.total, 1);
        let page = search(catalogue(), Some("benefit"), &[], Window::default());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn empty_text_is_ignored() {
        let page = search(catalogue(), Some(""), &[], Window::default());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn offset_past_end_keeps_total() {
        let first = search(catalogue(), None, &[], Window::new(1, 0));
        let past = search(catalogue(), None, &[], Window::new(1, 5));
        assert_eq!(first.items.len(), 1);
        assert!(past.items.is_empty());
        assert_eq!(first.total, past.total);
    }

    #[test]
    fn search_is_idempotent() {
        let a = search(catalogue(), None, &[age("0", "100")], Window::new(10, 0));
        let b = search(catalogue(), None, &[age("0", "100")], Window::new(10, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn paginate_clamps_to_tail() {
        let page = paginate(vec![1, 2, 3, 4, 5], Window::new(10, 3));
        assert_eq!(page.items, vec![4, 5]);
        let page = paginate(vec![1, 2, 3], Window::new(0, 1));
        assert_eq!(page.items, vec![2, 3]);
        assert_eq!(page.total, 3);
    }
}
