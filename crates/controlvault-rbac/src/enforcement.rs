//! Access decision enforcement.
//!
//! Evaluates the role × zone decision table against a user record and
//! produces a structured verdict. This is the only code that mutates a
//! visitor's badge validity.

use controlvault_types::Zone;
use tracing::{error, info, warn};

use crate::roles::Role;
use crate::user::{RoleState, UserRecord};

/// Why an access request was refused.
///
/// These are expected policy outcomes, not errors: they are returned as
/// values, surfaced verbatim to the caller, and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// The role's row in the decision table forbids this zone.
    RoleForbiddenZone { role: Role, zone: Zone },

    /// The user record carries a role outside the closed set.
    ///
    /// A data-integrity condition, not routine policy: it means the
    /// record survived deserialization with a corrupt role string. Logged
    /// at a higher severity than routine denials.
    UnknownRole { raw: String },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::RoleForbiddenZone { role, zone } => {
                write!(f, "role {role} may not enter zone {zone}")
            }
            DenialReason::UnknownRole { raw } => {
                write!(f, "unknown role in user record: {raw}")
            }
        }
    }
}

/// The structured result of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Access permitted. For a visitor this implies the badge was just
    /// consumed: grant and decrement are atomic from the caller's view.
    Allowed,

    /// Access refused for the given reason. No state was mutated.
    Denied(DenialReason),

    /// The visitor's badge was already spent at evaluation time.
    ///
    /// Distinguished from [`Verdict::Denied`]: the expiry check precedes
    /// the zone check, so an expired visitor is rejected even for the
    /// lobby. No decrement occurs (validity never goes negative).
    VisitorExpired,
}

/// The result of executing an access request end to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The decision was `Allowed` and the entry notification was sent.
    Success,
    /// The decision was a denial; the sink was not invoked.
    Denied(DenialReason),
    /// The visitor's badge was expired; the sink was not invoked.
    VisitorExpired,
}

/// Receiver of zone-entry notifications.
///
/// The engine performs no I/O of its own; on a granted entry it hands
/// the user identity and zone to this seam. Implementations print,
/// append to an audit log, or both.
pub trait EntrySink {
    /// Called exactly once per successful entry, after the decision
    /// (and any badge consumption) has completed.
    fn zone_entered(&mut self, user: &UserRecord, zone: Zone);
}

/// A sink that drops every notification. Useful in tests and for pure
/// decision evaluation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EntrySink for NoopSink {
    fn zone_entered(&mut self, _user: &UserRecord, _zone: Zone) {}
}

/// The access policy engine.
///
/// Stateless apart from a tracing toggle: all mutable state lives in the
/// user record being evaluated. Each call is an independent, terminating
/// decision — there is no multi-step state machine.
#[derive(Debug, Clone)]
pub struct AccessEngine {
    /// Whether decisions emit tracing events.
    audit_enabled: bool,
}

impl AccessEngine {
    /// Creates a new engine with decision tracing enabled.
    pub fn new() -> Self {
        Self {
            audit_enabled: true,
        }
    }

    /// Disables decision tracing (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Evaluates an access request.
    ///
    /// Precedence:
    /// 1. Admin → `Allowed`, unconditionally, any zone.
    /// 2. Employee → table lookup; `ServerRoom` is denied.
    /// 3. Visitor → expiry check first, then the zone check; a granted
    ///    lobby entry consumes one badge unit.
    /// 4. Unrecognized role → `Denied(UnknownRole)`.
    ///
    /// Only a granted visitor entry mutates the record; every other path
    /// leaves it untouched, so repeated calls on non-mutating paths
    /// return the same verdict.
    pub fn decide(&self, user: &mut UserRecord, zone: Zone) -> Verdict {
        let verdict = match user.state_mut() {
            RoleState::Admin => Verdict::Allowed,

            RoleState::Employee => {
                if Role::Employee.permits(zone) {
                    Verdict::Allowed
                } else {
                    Verdict::Denied(DenialReason::RoleForbiddenZone {
                        role: Role::Employee,
                        zone,
                    })
                }
            }

            RoleState::Visitor { badge } => {
                if badge.is_expired() {
                    // Checked before the zone: an expired visitor is
                    // rejected even for the lobby.
                    Verdict::VisitorExpired
                } else if Role::Visitor.permits(zone) {
                    badge.consume();
                    Verdict::Allowed
                } else {
                    // Only successful entries consume validity.
                    Verdict::Denied(DenialReason::RoleForbiddenZone {
                        role: Role::Visitor,
                        zone,
                    })
                }
            }

            RoleState::Unrecognized { raw } => Verdict::Denied(DenialReason::UnknownRole {
                raw: raw.clone(),
            }),
        };

        if self.audit_enabled {
            self.trace_verdict(user, zone, &verdict);
        }

        verdict
    }

    /// Executes an access request end to end.
    ///
    /// Calls [`decide`](Self::decide); on `Allowed` notifies the sink and
    /// returns `Success`, otherwise returns the failure verdict unchanged.
    /// Denials and expiries are first-class outcomes of normal operation —
    /// this method never panics on them and never collapses them into a
    /// boolean.
    pub fn execute(
        &self,
        user: &mut UserRecord,
        zone: Zone,
        sink: &mut dyn EntrySink,
    ) -> ExecutionOutcome {
        match self.decide(user, zone) {
            Verdict::Allowed => {
                sink.zone_entered(user, zone);
                ExecutionOutcome::Success
            }
            Verdict::Denied(reason) => ExecutionOutcome::Denied(reason),
            Verdict::VisitorExpired => ExecutionOutcome::VisitorExpired,
        }
    }

    fn trace_verdict(&self, user: &UserRecord, zone: Zone, verdict: &Verdict) {
        match verdict {
            Verdict::Allowed => {
                info!(
                    user = %user.username(),
                    zone = %zone,
                    "zone access granted"
                );
            }
            Verdict::VisitorExpired => {
                warn!(
                    user = %user.username(),
                    zone = %zone,
                    "zone access refused: visitor badge expired"
                );
            }
            Verdict::Denied(DenialReason::RoleForbiddenZone { role, .. }) => {
                warn!(
                    user = %user.username(),
                    role = %role,
                    zone = %zone,
                    "zone access denied by policy"
                );
            }
            Verdict::Denied(DenialReason::UnknownRole { raw }) => {
                // Integrity failure, not routine policy
                error!(
                    user = %user.username(),
                    raw_role = %raw,
                    zone = %zone,
                    "user record carries a role outside the closed set"
                );
            }
        }
    }
}

impl Default for AccessEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use controlvault_types::{BadgeValidity, UserId, Zone};

    use super::*;

    fn admin() -> UserRecord {
        UserRecord::admin(UserId::new("U001"), "alice", "pw")
    }

    fn employee() -> UserRecord {
        UserRecord::employee(UserId::new("U002"), "bob", "pw")
    }

    fn visitor(badge: u32) -> UserRecord {
        UserRecord::visitor(UserId::new("V001"), "carol", "pw", BadgeValidity::new(badge))
    }

    fn unrecognized(raw: &str) -> UserRecord {
        UserRecord::new(
            UserId::new("U999"),
            "mallory",
            "pw",
            RoleState::Unrecognized {
                raw: raw.to_string(),
            },
        )
    }

    #[test]
    fn admin_is_allowed_everywhere_without_mutation() {
        let engine = AccessEngine::new().without_audit();
        let mut user = admin();
        let before = user.clone();

        for zone in Zone::ALL {
            assert_eq!(engine.decide(&mut user, zone), Verdict::Allowed);
        }

        assert_eq!(user, before);
    }

    #[test]
    fn employee_is_denied_the_server_room_only() {
        let engine = AccessEngine::new().without_audit();
        let mut user = employee();
        let before = user.clone();

        assert_eq!(engine.decide(&mut user, Zone::Lab), Verdict::Allowed);
        assert_eq!(engine.decide(&mut user, Zone::OfficeFloor), Verdict::Allowed);
        assert_eq!(engine.decide(&mut user, Zone::Lobby), Verdict::Allowed);
        assert_eq!(
            engine.decide(&mut user, Zone::ServerRoom),
            Verdict::Denied(DenialReason::RoleForbiddenZone {
                role: Role::Employee,
                zone: Zone::ServerRoom,
            })
        );

        assert_eq!(user, before);
    }

    #[test]
    fn visitor_lobby_entries_consume_the_badge_then_expire() {
        let engine = AccessEngine::new().without_audit();
        let mut user = visitor(3);

        for remaining in [2, 1, 0] {
            assert_eq!(engine.decide(&mut user, Zone::Lobby), Verdict::Allowed);
            assert_eq!(user.badge(), Some(BadgeValidity::new(remaining)));
        }

        // Fourth attempt: badge is spent, no decrement below zero.
        assert_eq!(engine.decide(&mut user, Zone::Lobby), Verdict::VisitorExpired);
        assert_eq!(user.badge(), Some(BadgeValidity::new(0)));
    }

    #[test]
    fn visitor_denied_zones_do_not_consume_the_badge() {
        let engine = AccessEngine::new().without_audit();
        let mut user = visitor(2);

        assert_eq!(
            engine.decide(&mut user, Zone::ServerRoom),
            Verdict::Denied(DenialReason::RoleForbiddenZone {
                role: Role::Visitor,
                zone: Zone::ServerRoom,
            })
        );
        assert_eq!(user.badge(), Some(BadgeValidity::new(2)));
    }

    #[test]
    fn expiry_check_precedes_the_zone_check() {
        let engine = AccessEngine::new().without_audit();
        let mut user = visitor(0);

        // Even the lobby is refused with VisitorExpired, not Denied.
        assert_eq!(engine.decide(&mut user, Zone::Lobby), Verdict::VisitorExpired);
        // And so is a forbidden zone.
        assert_eq!(engine.decide(&mut user, Zone::Lab), Verdict::VisitorExpired);
        assert_eq!(user.badge(), Some(BadgeValidity::new(0)));
    }

    #[test]
    fn unrecognized_role_is_denied_every_zone_without_mutation() {
        let engine = AccessEngine::new().without_audit();
        let mut user = unrecognized("SUPERUSER");
        let before = user.clone();

        for zone in Zone::ALL {
            assert_eq!(
                engine.decide(&mut user, zone),
                Verdict::Denied(DenialReason::UnknownRole {
                    raw: "SUPERUSER".to_string(),
                })
            );
        }

        assert_eq!(user, before);
    }

    #[test]
    fn non_mutating_paths_are_idempotent() {
        let engine = AccessEngine::new().without_audit();

        let mut emp = employee();
        let first = engine.decide(&mut emp, Zone::ServerRoom);
        for _ in 0..10 {
            assert_eq!(engine.decide(&mut emp, Zone::ServerRoom), first);
        }

        let mut vis = visitor(2);
        let first = engine.decide(&mut vis, Zone::Lab);
        for _ in 0..10 {
            assert_eq!(engine.decide(&mut vis, Zone::Lab), first);
        }
        assert_eq!(vis.badge(), Some(BadgeValidity::new(2)));
    }

    // ========================================================================
    // Execution (sink) tests
    // ========================================================================

    #[derive(Default)]
    struct RecordingSink {
        entries: Vec<(String, Zone)>,
    }

    impl EntrySink for RecordingSink {
        fn zone_entered(&mut self, user: &UserRecord, zone: Zone) {
            self.entries.push((user.username().to_string(), zone));
        }
    }

    #[test]
    fn execute_notifies_the_sink_only_on_success() {
        let engine = AccessEngine::new().without_audit();
        let mut sink = RecordingSink::default();

        let mut emp = employee();
        assert_eq!(
            engine.execute(&mut emp, Zone::Lab, &mut sink),
            ExecutionOutcome::Success
        );
        assert_eq!(
            engine.execute(&mut emp, Zone::ServerRoom, &mut sink),
            ExecutionOutcome::Denied(DenialReason::RoleForbiddenZone {
                role: Role::Employee,
                zone: Zone::ServerRoom,
            })
        );

        let mut vis = visitor(0);
        assert_eq!(
            engine.execute(&mut vis, Zone::Lobby, &mut sink),
            ExecutionOutcome::VisitorExpired
        );

        assert_eq!(sink.entries, vec![("bob".to_string(), Zone::Lab)]);
    }

    #[test]
    fn execute_consumes_the_badge_before_notifying() {
        let engine = AccessEngine::new().without_audit();

        struct BadgeObservingSink {
            observed: Option<BadgeValidity>,
        }

        impl EntrySink for BadgeObservingSink {
            fn zone_entered(&mut self, user: &UserRecord, _zone: Zone) {
                self.observed = user.badge();
            }
        }

        let mut sink = BadgeObservingSink { observed: None };
        let mut vis = visitor(1);

        assert_eq!(
            engine.execute(&mut vis, Zone::Lobby, &mut sink),
            ExecutionOutcome::Success
        );
        // The sink sees the post-consumption record: grant and decrement
        // are atomic from the caller's point of view.
        assert_eq!(sink.observed, Some(BadgeValidity::new(0)));
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    use proptest::prelude::*;

    fn any_zone() -> impl Strategy<Value = Zone> {
        prop::sample::select(Zone::ALL.to_vec())
    }

    proptest! {
        /// Property: admin decisions never mutate the record, whatever the
        /// zone sequence.
        #[test]
        fn prop_admin_record_is_invariant(zones in prop::collection::vec(any_zone(), 0..32)) {
            let engine = AccessEngine::new().without_audit();
            let mut user = admin();
            let before = user.clone();

            for zone in zones {
                prop_assert_eq!(engine.decide(&mut user, zone), Verdict::Allowed);
            }
            prop_assert_eq!(user, before);
        }

        /// Property: a visitor's badge decreases by exactly the number of
        /// granted entries and never underflows.
        #[test]
        fn prop_badge_decrements_once_per_grant(
            initial in 0u32..16,
            zones in prop::collection::vec(any_zone(), 0..64),
        ) {
            let engine = AccessEngine::new().without_audit();
            let mut user = visitor(initial);
            let mut granted = 0u32;

            for zone in zones {
                if engine.decide(&mut user, zone) == Verdict::Allowed {
                    granted += 1;
                }
            }

            prop_assert!(granted <= initial);
            prop_assert_eq!(user.badge(), Some(BadgeValidity::new(initial - granted)));
        }

        /// Property: once expired, a visitor stays expired and the verdict
        /// is always VisitorExpired.
        #[test]
        fn prop_expiry_is_permanent(zones in prop::collection::vec(any_zone(), 1..32)) {
            let engine = AccessEngine::new().without_audit();
            let mut user = visitor(0);

            for zone in zones {
                prop_assert_eq!(engine.decide(&mut user, zone), Verdict::VisitorExpired);
                prop_assert_eq!(user.badge(), Some(BadgeValidity::new(0)));
            }
        }

        /// Property: employee decisions are pure — same input, same verdict,
        /// no record mutation.
        #[test]
        fn prop_employee_decisions_are_pure(zones in prop::collection::vec(any_zone(), 0..32)) {
            let engine = AccessEngine::new().without_audit();
            let mut user = employee();
            let before = user.clone();

            for zone in zones {
                let expected = if zone == Zone::ServerRoom {
                    Verdict::Denied(DenialReason::RoleForbiddenZone {
                        role: Role::Employee,
                        zone,
                    })
                } else {
                    Verdict::Allowed
                };
                prop_assert_eq!(engine.decide(&mut user, zone), expected);
            }
            prop_assert_eq!(user, before);
        }
    }
}
