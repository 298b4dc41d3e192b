use core::cmp::Ordering;

use crate::compare::Comparator;
use crate::error::Violation;

use super::arena::Arena;
use super::avl_tree::AvlTree;
use super::handle::Handle;
use super::links::Linked;

impl<T: Linked, C: Comparator<T>> AvlTree<T, C> {
    /// Checks every structural invariant and returns the tree's height.
    ///
    /// Verifies that each object sorts strictly between the bounds set by all of
    /// its ancestors, that each stored balance factor matches the actual subtree
    /// heights and lies in `-1..=1`, and that exactly [`len`](Self::len) objects
    /// are reachable. Runs in O(n) time, recursing once per level.
    ///
    /// # Errors
    ///
    /// The first [`Violation`] found.
    pub fn verify(&self, arena: &Arena<T>) -> Result<usize, Violation> {
        let mut walk = Walk {
            arena,
            cmp: self.comparator(),
            len: self.len(),
            counted: 0,
        };
        let height = walk.subtree(self.root(), None, None)?;
        if walk.counted != self.len() {
            return Err(Violation::LenMismatch {
                len: self.len(),
                counted: walk.counted,
            });
        }
        Ok(height)
    }
}

struct Walk<'a, T, C> {
    arena: &'a Arena<T>,
    cmp: &'a C,
    len: usize,
    counted: usize,
}

impl<T: Linked, C: Comparator<T>> Walk<'_, T, C> {
    /// Returns the height of the subtree at `node`, whose objects must all sort
    /// strictly between `lower` and `upper`.
    fn subtree(&mut self, node: Option<Handle>, lower: Option<Handle>, upper: Option<Handle>) -> Result<usize, Violation> {
        let Some(node) = node else {
            return Ok(0);
        };

        // Also stops a walk around a link cycle.
        self.counted += 1;
        if self.counted > self.len {
            return Err(Violation::LenMismatch {
                len: self.len,
                counted: self.counted,
            });
        }

        let elem = &self.arena[node];
        let above_lower = lower.is_none_or(|lower| self.cmp.compare(&self.arena[lower], elem) == Ordering::Less);
        let below_upper = upper.is_none_or(|upper| self.cmp.compare(elem, &self.arena[upper]) == Ordering::Less);
        if !(above_lower && below_upper) {
            return Err(Violation::OutOfOrder { node });
        }

        let links = *elem.links();
        let left = self.subtree(links.left(), lower, Some(node))?;
        let right = self.subtree(links.right(), Some(node), upper)?;

        if left.abs_diff(right) > 1 {
            return Err(Violation::Unbalanced { node, left, right });
        }
        // Heights are bounded by `len`.
        #[allow(clippy::cast_possible_wrap)]
        let actual = right as isize - left as isize;
        if actual != isize::from(links.balance()) {
            return Err(Violation::BalanceMismatch {
                node,
                stored: links.balance(),
                actual,
            });
        }

        Ok(1 + left.max(right))
    }
}
