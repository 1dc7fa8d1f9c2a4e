/// A status enum with an explicit transition table.
///
/// Staying in the current status is always allowed so that repeating a
/// command is harmless. Anything outside the table has to go through the
/// administrative override on the service.
pub trait Lifecycle: Copy + Eq + std::fmt::Display + 'static {
    /// Statuses reachable from `self` in one step, excluding `self`.
    fn successors(self) -> &'static [Self];

    fn can_transition_to(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}
