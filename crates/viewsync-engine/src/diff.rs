use crate::model::Fragment;

/// The single contiguous span where two fragments differ, in absolute
/// positions of the compared region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSpan {
    pub start: usize,
    /// End of the changed span in the old fragment.
    pub end_old: usize,
    /// End of the changed span in the new fragment.
    pub end_new: usize,
}

impl DiffSpan {
    pub fn is_insertion(&self) -> bool {
        self.end_old == self.start && self.end_new > self.start
    }

    pub fn is_deletion(&self) -> bool {
        self.end_new == self.start && self.end_old > self.start
    }
}

/// Compare `old` and `new`, both starting at absolute position `pos`.
///
/// When the common prefix and suffix overlap (one side is shorter and the
/// edit sits in a run of repeated content) the span is slid back towards
/// `preferred_start` if it lies inside the overlap.
pub fn find_diff(
    old: &Fragment,
    new: &Fragment,
    pos: usize,
    preferred_start: usize,
) -> Option<DiffSpan> {
    let mut start = old.find_diff_start(new, pos)?;
    let (mut end_old, mut end_new) =
        old.find_diff_end(new, pos + old.size(), pos + new.size())?;
    if end_old < start && old.size() < new.size() {
        let shift = if preferred_start <= start && preferred_start >= end_old {
            start - preferred_start
        } else {
            0
        };
        start -= shift;
        end_new = start + (end_new - end_old);
        end_old = start;
    } else if end_new < start {
        let shift = if preferred_start <= start && preferred_start >= end_new {
            start - preferred_start
        } else {
            0
        };
        start -= shift;
        end_old = start + (end_old - end_new);
        end_new = start;
    }
    Some(DiffSpan {
        start,
        end_old,
        end_new,
    })
}
