use std::fmt;

use xi_rope::delta::{Builder, Transformer};
use xi_rope::{Delta, Rope, RopeInfo};

/// Which side of an insertion (or a deleted range) a position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Backward,
    Forward,
}

impl Bias {
    pub fn reverse(self) -> Self {
        match self {
            Bias::Backward => Bias::Forward,
            Bias::Forward => Bias::Backward,
        }
    }
}

/// Position map for a single replace step.
///
/// The step is held as an xi-rope delta over the model's position space:
/// the replaced range is swapped for a placeholder run as long as the
/// inserted content. Positions outside the replaced range are transformed
/// through the delta; positions touching it follow the step's bias rules.
/// Positions past the end of the space shift by the step's size change.
#[derive(Clone)]
pub struct StepMap {
    delta: Delta<RopeInfo>,
    base_len: usize,
    from: usize,
    to: usize,
    inserted: usize,
}

impl StepMap {
    /// Map for replacing `from..to` of a space of `base_len` positions with
    /// `inserted` new positions. `None` when the step moves nothing.
    pub fn replace(base_len: usize, from: usize, to: usize, inserted: usize) -> Option<Self> {
        if from == to && inserted == 0 {
            return None;
        }
        let mut builder = Builder::new(base_len);
        builder.replace(from..to, Rope::from("#".repeat(inserted)));
        Some(Self {
            delta: builder.build(),
            base_len,
            from,
            to,
            inserted,
        })
    }

    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        if pos < self.from || pos > self.to {
            let mut transformer = Transformer::new(&self.delta);
            let within = pos.min(self.base_len);
            return transformer.transform(within, bias == Bias::Forward) + (pos - within);
        }
        let start_side = self.from + if bias == Bias::Forward { self.inserted } else { 0 };
        if self.from == self.to {
            return start_side;
        }
        if pos == self.from {
            self.from
        } else if pos == self.to {
            self.from + self.inserted
        } else {
            start_side
        }
    }

    /// Whether `pos` sat strictly inside the replaced range.
    pub fn deletes(&self, pos: usize) -> bool {
        pos > self.from && pos < self.to
    }
}

impl fmt::Debug for StepMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.from, self.to - self.from, self.inserted)
    }
}

/// A composable sequence of step maps.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    steps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepMap) {
        self.steps.push(step);
    }

    /// Append every step of `other` after the steps of this mapping.
    pub fn append(&mut self, other: &Mapping) {
        self.steps.extend(other.steps.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        self.steps.iter().fold(pos, |pos, step| step.map(pos, bias))
    }

    /// Map with the default forward bias.
    pub fn map_forward(&self, pos: usize) -> usize {
        self.map(pos, Bias::Forward)
    }

    /// Whether any step deleted the content around `pos`.
    pub fn deletes(&self, pos: usize, bias: Bias) -> bool {
        let mut pos = pos;
        for step in &self.steps {
            if step.deletes(pos) {
                return true;
            }
            pos = step.map(pos, bias);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_identity_step_is_skipped() {
        assert!(StepMap::replace(10, 4, 4, 0).is_none());
    }

    #[rstest]
    #[case(2, Bias::Backward, 2)]
    #[case(5, Bias::Backward, 5)]
    #[case(5, Bias::Forward, 8)]
    #[case(6, Bias::Forward, 9)]
    #[case(10, Bias::Forward, 13)]
    fn test_insertion(#[case] pos: usize, #[case] bias: Bias, #[case] expected: usize) {
        let step = StepMap::replace(10, 5, 5, 3).unwrap();

        assert_eq!(step.map(pos, bias), expected);
    }

    #[rstest]
    #[case(3, Bias::Forward, 3)]
    #[case(4, Bias::Backward, 3)]
    #[case(4, Bias::Forward, 4)]
    #[case(5, Bias::Backward, 4)]
    #[case(8, Bias::Backward, 7)]
    fn test_replacement(#[case] pos: usize, #[case] bias: Bias, #[case] expected: usize) {
        // replace 3..5 with a single position
        let step = StepMap::replace(10, 3, 5, 1).unwrap();

        assert_eq!(step.map(pos, bias), expected);
    }

    #[test]
    fn test_insertion_at_start_of_space() {
        let step = StepMap::replace(4, 0, 0, 2).unwrap();

        assert_eq!(step.map(0, Bias::Backward), 0);
        assert_eq!(step.map(0, Bias::Forward), 2);
        assert_eq!(step.map(4, Bias::Backward), 6);
    }

    #[rstest]
    #[case(StepMap::replace(4, 1, 1, 1), 6, 7)]
    #[case(StepMap::replace(8, 1, 6, 0), 10, 5)]
    #[case(StepMap::replace(8, 2, 4, 3), 9, 10)]
    fn test_positions_past_the_space_shift(
        #[case] step: Option<StepMap>,
        #[case] pos: usize,
        #[case] expected: usize,
    ) {
        let step = step.unwrap();

        assert_eq!(step.map(pos, Bias::Forward), expected);
        assert_eq!(step.map(pos, Bias::Backward), expected);
    }

    #[test]
    fn test_composed_mapping_applies_steps_in_order() {
        let mut first = Mapping::new();
        first.push(StepMap::replace(10, 2, 2, 3).unwrap());
        let mut second = Mapping::new();
        second.push(StepMap::replace(13, 0, 4, 0).unwrap());

        let mut composed = first.clone();
        composed.append(&second);

        assert_eq!(composed.len(), 2);
        assert_eq!(composed.map_forward(8), 7);
        assert!(composed.deletes(1, Bias::Forward));
        assert!(!composed.deletes(8, Bias::Forward));
    }
}
