use proptest::prelude::*;
use tourney_policy::{Mode, PolicyGuard, DEFAULT_CAPABILITIES, GUARDED_WARNED, SAFE_DENIED};

fn capability() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(SAFE_DENIED.to_vec()).prop_map(str::to_string),
        prop::sample::select(DEFAULT_CAPABILITIES.to_vec()).prop_map(str::to_string),
        "[a-z]{1,8}(:[a-z]{1,6})?",
    ]
}

fn mode() -> impl Strategy<Value = Mode> {
    prop::sample::select(Mode::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_evaluation_is_pure(
        mode in mode(),
        requested in proptest::collection::vec(capability(), 0..10)
    ) {
        let guard = PolicyGuard::new();
        let first = guard.evaluate(mode, &requested);
        let second = guard.evaluate(mode, &requested);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_request_order_is_irrelevant(
        mode in mode(),
        requested in proptest::collection::vec(capability(), 0..10)
    ) {
        let guard = PolicyGuard::new();
        let mut reversed = requested.clone();
        reversed.reverse();
        prop_assert_eq!(guard.evaluate(mode, &requested), guard.evaluate(mode, &reversed));
    }

    #[test]
    fn prop_safe_denies_iff_intersecting(
        requested in proptest::collection::vec(capability(), 0..10)
    ) {
        let guard = PolicyGuard::new();
        let decision = guard.evaluate(Mode::Safe, &requested);
        let intersects = requested.iter().any(|c| SAFE_DENIED.contains(&c.as_str()));

        prop_assert_eq!(decision.allowed, !intersects);
        prop_assert_eq!(decision.reason.is_some(), !decision.allowed);
    }

    #[test]
    fn prop_guarded_and_power_never_deny(
        requested in proptest::collection::vec(capability(), 0..10)
    ) {
        let guard = PolicyGuard::new();
        let guarded = guard.evaluate(Mode::Guarded, &requested);
        let power = guard.evaluate(Mode::Power, &requested);

        prop_assert!(guarded.allowed);
        prop_assert!(power.allowed);
        prop_assert!(power.warnings.is_empty());

        let mut sorted = guarded.warnings.clone();
        sorted.sort();
        prop_assert_eq!(&sorted, &guarded.warnings);
        for warning in &guarded.warnings {
            prop_assert!(GUARDED_WARNED.iter().any(|c| warning.contains(c)));
        }
    }
}
