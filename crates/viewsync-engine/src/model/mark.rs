use std::fmt;

/// An inline mark such as `strong` or `em`.
///
/// Mark sets are kept as sorted, duplicate-free vectors so two sets can be
/// compared with plain equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mark(String);

impl Mark {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.binary_search(self).is_ok()
    }

    /// Return a copy of `set` with this mark added.
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut marks = set.to_vec();
        if let Err(at) = marks.binary_search(self) {
            marks.insert(at, self.clone());
        }
        marks
    }

    /// Return a copy of `set` without this mark.
    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| *m != self).cloned().collect()
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalise an arbitrary list of marks into a set.
pub fn mark_set(marks: impl IntoIterator<Item = Mark>) -> Vec<Mark> {
    let mut set: Vec<Mark> = marks.into_iter().collect();
    set.sort();
    set.dedup();
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_keeps_set_sorted_and_unique() {
        let strong = Mark::new("strong");
        let em = Mark::new("em");

        let set = strong.add_to_set(&[]);
        let set = em.add_to_set(&set);
        let set = strong.add_to_set(&set);

        assert_eq!(set, vec![em.clone(), strong.clone()]);
        assert!(em.is_in_set(&set));
    }

    #[test]
    fn test_remove_from_set() {
        let set = mark_set([Mark::new("strong"), Mark::new("em")]);

        let set = Mark::new("em").remove_from_set(&set);

        assert_eq!(set, vec![Mark::new("strong")]);
        assert!(!Mark::new("em").is_in_set(&set));
    }
}
