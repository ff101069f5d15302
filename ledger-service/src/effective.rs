//! Optimistic balance override for in-session top-ups
//!
//! After a top-up the backend confirmation lags behind the user's action.
//! The purchased amount is applied to a local copy immediately so the
//! form can re-validate, then the copy is overwritten wholesale once the
//! balance provider's authoritative refresh resolves.

use common::points::Points;

/// An account's balance as seen by a single form session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePoints {
    /// Last value confirmed by the balance provider
    authoritative: Points,
    /// Locally applied top-up not yet confirmed
    optimistic: Option<Points>,
}

impl EffectivePoints {
    /// Start from a provider-confirmed balance
    pub fn new(authoritative: Points) -> Self {
        Self {
            authoritative,
            optimistic: None,
        }
    }

    /// The balance the form should validate against
    pub fn current(&self) -> Points {
        self.optimistic.unwrap_or(self.authoritative)
    }

    /// Apply a top-up locally before the provider confirms it
    pub fn observe_top_up(&mut self, purchased: Points) {
        self.optimistic = Some(self.current() + purchased);
    }

    /// Overwrite with the provider's authoritative refresh
    pub fn reconcile(&mut self, fresh: Points) {
        self.authoritative = fresh;
        self.optimistic = None;
    }

    /// True while an unconfirmed top-up is applied
    pub fn is_optimistic(&self) -> bool {
        self.optimistic.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::points::dec;

    #[test]
    fn top_up_is_visible_immediately() {
        let mut points = EffectivePoints::new(dec!(10));
        points.observe_top_up(dec!(15));

        assert_eq!(points.current(), dec!(25));
        assert!(points.is_optimistic());
    }

    #[test]
    fn reconcile_overwrites_optimistic_value() {
        let mut points = EffectivePoints::new(dec!(10));
        points.observe_top_up(dec!(15));

        // The provider settled on a different amount (e.g. a bonus applied)
        points.reconcile(dec!(30));

        assert_eq!(points.current(), dec!(30));
        assert!(!points.is_optimistic());
    }

    #[test]
    fn repeated_top_ups_accumulate_until_reconciled() {
        let mut points = EffectivePoints::new(dec!(0));
        points.observe_top_up(dec!(5));
        points.observe_top_up(dec!(5));

        assert_eq!(points.current(), dec!(10));

        points.reconcile(dec!(10));
        assert_eq!(points.current(), dec!(10));
    }
}
