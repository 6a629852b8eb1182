use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub current: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub last: usize,
    pub total: usize,
}

impl Pager {
    /// Pages are numbered from zero. A page past the last one has no next
    /// page and points back at the last one.
    pub fn new(requested: Option<usize>, total: usize, per_page: usize) -> Self {
        let current = requested.unwrap_or(0);
        let last = if total == 0 { 0 } else { (total - 1) / per_page.max(1) };
        Self {
            current,
            next: (current < last).then(|| current + 1),
            previous: current.checked_sub(1).map(|previous| previous.min(last)),
            last,
            total,
        }
    }

    /// Pages from the current one to the last, in order.
    pub fn remaining(&self) -> impl Iterator<Item = usize> {
        self.current..=self.last.max(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page() {
        assert_eq!(Pager::new(None, 31, 15).last, 2);
        assert_eq!(Pager::new(None, 30, 15).last, 1);
        assert_eq!(Pager::new(None, 1, 15).last, 0);
        assert_eq!(Pager::new(None, 0, 15).last, 0);
    }

    #[test]
    fn neighbours() {
        let first = Pager::new(None, 40, 15);
        assert_eq!((first.current, first.previous, first.next), (0, None, Some(1)));

        let middle = Pager::new(Some(1), 40, 15);
        assert_eq!((middle.previous, middle.next), (Some(0), Some(2)));

        let last = Pager::new(Some(2), 40, 15);
        assert_eq!((last.previous, last.next), (Some(1), None));
    }

    #[test]
    fn page_past_the_end() {
        let pager = Pager::new(Some(99), 10, 15);
        assert_eq!((pager.current, pager.previous, pager.next, pager.last), (99, Some(0), None, 0));

        let pager = Pager::new(Some(7), 40, 15);
        assert_eq!((pager.previous, pager.next), (Some(2), None));
    }

    #[test]
    fn remaining_pages() {
        assert_eq!(Pager::new(Some(1), 40, 15).remaining().collect::<Vec<_>>(), [1, 2]);
        assert_eq!(Pager::new(None, 0, 15).remaining().collect::<Vec<_>>(), [0]);
        assert_eq!(Pager::new(Some(5), 10, 15).remaining().collect::<Vec<_>>(), [5]);
    }
}
