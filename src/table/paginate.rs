use serde::Serialize;

/// Never less than 1, so an empty table still has a page to sit on.
pub fn total_pages(row_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    row_count.div_ceil(page_size).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Rows of 1-based `page`. Pages past the end yield an empty slice; callers
/// clamp first.
pub fn page_slice<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "camelCase")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// Page buttons for `current` out of `total`: first, last, current and its
/// two neighbours. Each run of hidden pages collapses to one ellipsis.
pub fn page_window(current: usize, total: usize) -> Vec<PageItem> {
    let total = total.max(1);
    let current = clamp_page(current, total);

    let mut shown = vec![1, current.saturating_sub(1), current, current + 1, total];
    shown.retain(|p| (1..=total).contains(p));
    shown.sort_unstable();
    shown.dedup();

    let mut out = Vec::with_capacity(shown.len() * 2);
    let mut prev: Option<usize> = None;
    for p in shown {
        if let Some(prev) = prev {
            if p - prev > 1 {
                out.push(PageItem::Ellipsis);
            }
        }
        out.push(PageItem::Page(p));
        prev = Some(p);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_rows: usize,
    /// 1-based index of the first row shown, 0 when nothing is shown.
    pub first_row: usize,
    pub last_row: usize,
    pub window: Vec<PageItem>,
}

impl PageInfo {
    pub fn new(total_rows: usize, page_size: usize, page: usize) -> Self {
        let total = total_pages(total_rows, page_size);
        let current = clamp_page(page, total);
        let (first_row, last_row) = if total_rows == 0 {
            (0, 0)
        } else {
            let first = (current - 1) * page_size + 1;
            (first, (current * page_size).min(total_rows))
        };
        Self {
            current_page: current,
            total_pages: total,
            page_size,
            total_rows,
            first_row,
            last_row,
            window: page_window(current, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    #[test]
    fn total_pages_rounds_up_with_floor_of_one() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(30, 10), 3);
        assert_eq!(total_pages(31, 10), 4);
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
    }

    #[test]
    fn pages_concatenate_back_to_the_input() {
        let items: Vec<u32> = (0..47).collect();
        for size in [1, 5, 10, 47, 50] {
            let pages = total_pages(items.len(), size);
            let joined: Vec<u32> = (1..=pages)
                .flat_map(|p| page_slice(&items, size, p).iter().copied())
                .collect();
            assert_eq!(joined, items, "page size {size}");
        }
    }

    #[test]
    fn last_page_is_partial() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(page_slice(&items, 10, 3), &[20, 21, 22, 23, 24]);
        assert!(page_slice(&items, 10, 4).is_empty());
    }

    #[test]
    fn clamp_pulls_stale_page_back_into_range() {
        assert_eq!(clamp_page(4, 2), 2);
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(3, 1), 1);
    }

    #[test]
    fn small_page_counts_have_no_ellipsis() {
        assert_eq!(page_window(2, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_window(1, 1), vec![Page(1)]);
        assert_eq!(page_window(1, 2), vec![Page(1), Page(2)]);
    }

    #[test]
    fn large_page_counts_collapse_hidden_runs() {
        assert_eq!(
            page_window(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
        assert_eq!(page_window(1, 10), vec![Page(1), Page(2), Ellipsis, Page(10)]);
        assert_eq!(page_window(10, 10), vec![Page(1), Ellipsis, Page(9), Page(10)]);
        assert_eq!(page_window(3, 10), vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]);
    }

    #[test]
    fn window_stays_well_formed_while_stepping() {
        let total = 12;
        for current in 1..=total {
            let w = page_window(current, total);
            assert_eq!(w.first(), Some(&Page(1)));
            assert_eq!(w.last(), Some(&Page(total)));
            assert!(w.contains(&Page(current)));
            assert!(w.windows(2).all(|p| !(p[0] == Ellipsis && p[1] == Ellipsis)));
            let pages: Vec<usize> = w
                .iter()
                .filter_map(|i| match i {
                    Page(p) => Some(*p),
                    Ellipsis => None,
                })
                .collect();
            assert!(pages.windows(2).all(|p| p[0] < p[1]));
        }
    }

    #[test]
    fn page_info_reports_shown_range() {
        let info = PageInfo::new(25, 10, 3);
        assert_eq!((info.first_row, info.last_row), (21, 25));
        let info = PageInfo::new(0, 10, 4);
        assert_eq!(info.current_page, 1);
        assert_eq!(info.total_pages, 1);
        assert_eq!((info.first_row, info.last_row), (0, 0));
    }
}
