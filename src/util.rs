use crate::results::QueryResult;

/// Row-walking helpers over an executed [`QueryResult`].
///
/// Each helper advances the cursor with `next`, calls `f` on the rows it handles, and
/// returns how many rows that was. Inactive results handle nothing.
pub struct Util;

impl Util {
    /// Call `f` for every remaining row.
    pub fn each<F>(res: &mut QueryResult, f: F) -> usize
    where
        F: FnMut(&QueryResult),
    {
        Self::range(res, 0, usize::MAX, f)
    }

    /// Skip `start` rows, then call `f` for up to `count` rows.
    ///
    /// Returns 0 when the result runs out while skipping.
    pub fn range<F>(res: &mut QueryResult, start: usize, count: usize, mut f: F) -> usize
    where
        F: FnMut(&QueryResult),
    {
        if !res.is_active() {
            return 0;
        }
        for _ in 0..start {
            if !res.next() {
                return 0;
            }
        }
        let mut handled = 0;
        while handled < count && res.next() {
            f(res);
            handled += 1;
        }
        handled
    }

    /// Call `f` for up to `count` rows.
    pub fn top<F>(res: &mut QueryResult, count: usize, f: F) -> usize
    where
        F: FnMut(&QueryResult),
    {
        Self::range(res, 0, count, f)
    }

    /// Call `f` for the first row only.
    pub fn first<F>(res: &mut QueryResult, f: F) -> usize
    where
        F: FnMut(&QueryResult),
    {
        Self::top(res, 1, f)
    }
}
