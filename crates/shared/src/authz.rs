//! Centralized role/flag capability table.
//!
//! Views ask `CapabilityTable::check` instead of testing roles inline. A
//! capability can be granted unconditionally for a role, or only while a
//! feature flag is switched on.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Instructor,
    Admin,
    Finance,
    Support,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlag {
    AttendanceScanner,
    Payments,
    Analytics,
    Chat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewCatalog,
    Enroll,
    ViewOwnGrades,
    ManageGrades,
    ScanAttendance,
    ViewAttendance,
    ManageSchedule,
    ViewPayments,
    RefundPayments,
    ManageTickets,
    SubmitTicket,
    ViewAnalytics,
    UseChat,
    ManageUsers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// Rendered as the inline "Access Denied" panel.
    Denied { reason: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityTable {
    grants: HashMap<(Role, Option<FeatureFlag>), HashSet<Capability>>,
}

impl CapabilityTable {
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// Grant `caps` to `role`, optionally gated behind `flag`.
    pub fn grant(
        mut self,
        role: Role,
        flag: Option<FeatureFlag>,
        caps: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.grants.entry((role, flag)).or_default().extend(caps);
        self
    }

    /// Everything `role` may do with the given flags switched on.
    pub fn capabilities(&self, role: Role, enabled: &HashSet<FeatureFlag>) -> HashSet<Capability> {
        self.grants
            .iter()
            .filter(|((r, flag), _)| {
                *r == role && flag.map_or(true, |f| enabled.contains(&f))
            })
            .flat_map(|(_, caps)| caps.iter().copied())
            .collect()
    }

    pub fn can(&self, role: Role, capability: Capability, enabled: &HashSet<FeatureFlag>) -> bool {
        self.capabilities(role, enabled).contains(&capability)
    }

    pub fn check(
        &self,
        role: Role,
        capability: Capability,
        enabled: &HashSet<FeatureFlag>,
    ) -> AccessDecision {
        if self.can(role, capability, enabled) {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied {
                reason: format!("{role:?} accounts cannot perform {capability:?}"),
            }
        }
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        use Capability::*;
        use FeatureFlag::*;

        Self::empty()
            .grant(Role::Student, None, [ViewCatalog, Enroll, ViewOwnGrades, SubmitTicket, ViewAttendance])
            .grant(Role::Student, Some(Payments), [ViewPayments])
            .grant(Role::Student, Some(Chat), [UseChat])
            .grant(
                Role::Instructor,
                None,
                [ViewCatalog, ManageGrades, ViewAttendance, ManageSchedule, SubmitTicket],
            )
            .grant(Role::Instructor, Some(AttendanceScanner), [ScanAttendance])
            .grant(Role::Instructor, Some(Analytics), [ViewAnalytics])
            .grant(Role::Instructor, Some(Chat), [UseChat])
            .grant(
                Role::Admin,
                None,
                [
                    ViewCatalog,
                    ManageGrades,
                    ViewAttendance,
                    ScanAttendance,
                    ManageSchedule,
                    ManageTickets,
                    ManageUsers,
                    ViewAnalytics,
                ],
            )
            .grant(Role::Admin, Some(Payments), [ViewPayments, RefundPayments])
            .grant(Role::Admin, Some(Chat), [UseChat])
            .grant(Role::Finance, None, [ViewCatalog])
            .grant(Role::Finance, Some(Payments), [ViewPayments, RefundPayments])
            .grant(Role::Finance, Some(Analytics), [ViewAnalytics])
            .grant(Role::Support, None, [ViewCatalog, ManageTickets, SubmitTicket])
            .grant(Role::Support, Some(Chat), [UseChat])
    }
}
