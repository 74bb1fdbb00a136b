//! Role resolution and visibility rules.
//!
//! Everything here is pure: the caller loads the acting user's
//! `user_buildings` rows (and whatever locations/devices are in play) and
//! the functions below decide what that user may see or do. A failed role
//! lookup must never be treated as anything but "no roles": checks fail
//! closed.
//!
//! Policy note: `admin` follows the locked-down semantics. Admins (and the
//! global system admin, which is admin-equivalent in every building) may
//! edit the building record itself but have no access to location/device
//! operational detail. Parents alone manage locations, devices and
//! children memberships.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::models::membership::{Role, UserBuilding, SYSTEM_ADMIN_BUILDING};

/// One resolved grant: the role plus, for children, the location allowlist.
#[derive(Debug, Clone)]
pub struct Grant {
    pub role: Role,
    pub assigned_locations: Vec<String>,
}

/// A user's resolved roles across all buildings, with the SystemAdmin
/// sentinel folded into a flag rather than kept as a "building".
#[derive(Debug, Clone, Default)]
pub struct RoleSet {
    grants: HashMap<String, Grant>,
    system_admin: bool,
}

impl RoleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from relationship rows. Rows with an unknown role string are
    /// dropped; a malformed grant must never widen access.
    pub fn from_rows(rows: &[UserBuilding]) -> Self {
        let mut set = Self::empty();
        for row in rows {
            if row.building_id == SYSTEM_ADMIN_BUILDING {
                set.system_admin = true;
                continue;
            }
            let Ok(role) = Role::from_str(&row.role) else {
                tracing::warn!(
                    "Ignoring grant with unknown role '{}' for {} in {}",
                    row.role,
                    row.user_email,
                    row.building_id
                );
                continue;
            };
            set.grants.insert(
                row.building_id.clone(),
                Grant {
                    role,
                    assigned_locations: row.assigned_locations.clone(),
                },
            );
        }
        set
    }

    pub fn is_system_admin(&self) -> bool {
        self.system_admin
    }

    pub fn role_in(&self, building_id: &str) -> Option<Role> {
        self.grants.get(building_id).map(|g| g.role)
    }

    pub fn grant_in(&self, building_id: &str) -> Option<&Grant> {
        self.grants.get(building_id)
    }

    /// Real building ids only; the sentinel never appears here.
    pub fn building_ids(&self) -> impl Iterator<Item = &str> {
        self.grants.keys().map(String::as_str)
    }

    /// Buildings where the user holds the given role.
    pub fn buildings_with_role(&self, role: Role) -> Vec<&str> {
        self.grants
            .iter()
            .filter(|(_, g)| g.role == role)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Per-(user, building) permission predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingPermissions {
    pub can_view_building: bool,
    pub can_edit_building: bool,
    pub can_delete_building: bool,
    pub can_manage_locations: bool,
    pub can_manage_children: bool,
    pub can_view_locations: bool,
}

impl BuildingPermissions {
    const NONE: Self = Self {
        can_view_building: false,
        can_edit_building: false,
        can_delete_building: false,
        can_manage_locations: false,
        can_manage_children: false,
        can_view_locations: false,
    };
}

pub fn building_permissions(roles: &RoleSet, building_id: &str) -> BuildingPermissions {
    let mut perms = match roles.role_in(building_id) {
        Some(Role::Parent) => BuildingPermissions {
            can_view_building: true,
            can_edit_building: true,
            can_delete_building: true,
            can_manage_locations: true,
            can_manage_children: true,
            can_view_locations: true,
        },
        Some(Role::Admin) => BuildingPermissions {
            can_view_building: true,
            can_edit_building: true,
            can_delete_building: true,
            can_manage_locations: false,
            can_manage_children: false,
            can_view_locations: false,
        },
        Some(Role::Children) => BuildingPermissions {
            can_view_building: true,
            can_edit_building: false,
            can_delete_building: false,
            can_manage_locations: false,
            can_manage_children: false,
            can_view_locations: true,
        },
        None => BuildingPermissions::NONE,
    };

    // The system admin is admin-equivalent in every building, on top of
    // whatever explicit grant exists there. Operational detail stays
    // locked out (admin semantics) unless an explicit grant opens it.
    if roles.is_system_admin() {
        perms.can_view_building = true;
        perms.can_edit_building = true;
        perms.can_delete_building = true;
    }

    perms
}

/// What a user may see of a building's locations and devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Parents: the full location and device sets.
    Full,
    /// Children: only the allowlisted location ids.
    Assigned(HashSet<String>),
    /// Children with an empty allowlist. Callers must surface the
    /// "ask a parent to assign you locations" message, not a generic 404.
    Unassigned,
    /// Admins, the system admin and non-members: operational detail hidden.
    Hidden,
}

pub fn location_visibility(roles: &RoleSet, building_id: &str) -> Visibility {
    match roles.grant_in(building_id) {
        Some(g) if g.role == Role::Parent => Visibility::Full,
        Some(g) if g.role == Role::Children => {
            if g.assigned_locations.is_empty() {
                Visibility::Unassigned
            } else {
                Visibility::Assigned(g.assigned_locations.iter().cloned().collect())
            }
        }
        _ => Visibility::Hidden,
    }
}

/// Filter a building's locations down to the visible subset.
/// `location_ids` must already be scoped to the building in question.
pub fn visible_location_ids<'a>(
    vis: &Visibility,
    location_ids: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    match vis {
        Visibility::Full => location_ids.into_iter().map(str::to_string).collect(),
        Visibility::Assigned(allowed) => location_ids
            .into_iter()
            .filter(|id| allowed.contains(*id))
            .map(str::to_string)
            .collect(),
        Visibility::Unassigned | Visibility::Hidden => Vec::new(),
    }
}

/// Filter `(device_id, location_id)` pairs to the devices sitting in a
/// visible location. Unassigned devices (no location) are only shown with
/// full visibility.
pub fn visible_device_ids<'a>(
    vis: &Visibility,
    devices: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> Vec<String> {
    match vis {
        Visibility::Full => devices.into_iter().map(|(id, _)| id.to_string()).collect(),
        Visibility::Assigned(allowed) => devices
            .into_iter()
            .filter(|(_, loc)| loc.map(|l| allowed.contains(l)).unwrap_or(false))
            .map(|(id, _)| id.to_string())
            .collect(),
        Visibility::Unassigned | Visibility::Hidden => Vec::new(),
    }
}

/// Cross-user access level for the Users screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAccess {
    /// May edit the target's memberships (remove from buildings, reassign
    /// locations).
    Manage,
    /// May look at the target's profile and (scoped) building list but
    /// never edit: the system admin's level.
    View,
    None,
}

/// Acting user may manage a target iff some building has acting=parent and
/// target=children; the system admin gets view-only; self is full.
pub fn cross_user_access(
    acting_email: &str,
    acting: &RoleSet,
    target_email: &str,
    target: &RoleSet,
) -> UserAccess {
    if acting_email == target_email {
        return UserAccess::Manage;
    }
    let manages = acting
        .buildings_with_role(Role::Parent)
        .into_iter()
        .any(|b| target.role_in(b) == Some(Role::Children));
    if manages {
        return UserAccess::Manage;
    }
    if acting.is_system_admin() {
        return UserAccess::View;
    }
    UserAccess::None
}

/// Which of the target's buildings the acting user gets to see when
/// inspecting the target's profile:
/// - self: everything (sentinel already excluded by `RoleSet`);
/// - system admin: only buildings where the *target* holds parent;
/// - a parent: the shared buildings where they are parent and the target is
///   children;
/// - anyone else: nothing.
pub fn visible_buildings_of_target(
    acting_email: &str,
    acting: &RoleSet,
    target_email: &str,
    target: &RoleSet,
) -> Vec<String> {
    if acting_email == target_email {
        let mut ids: Vec<String> = target.building_ids().map(str::to_string).collect();
        ids.sort();
        return ids;
    }
    if acting.is_system_admin() {
        let mut ids: Vec<String> = target
            .buildings_with_role(Role::Parent)
            .into_iter()
            .map(str::to_string)
            .collect();
        ids.sort();
        return ids;
    }
    let mut ids: Vec<String> = acting
        .buildings_with_role(Role::Parent)
        .into_iter()
        .filter(|b| target.role_in(b) == Some(Role::Children))
        .map(str::to_string)
        .collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(email: &str, building: &str, role: &str, assigned: &[&str]) -> UserBuilding {
        UserBuilding {
            user_email: email.into(),
            building_id: building.into(),
            role: role.into(),
            assigned_locations: assigned.iter().map(|s| s.to_string()).collect(),
            granted_at: Utc::now(),
        }
    }

    #[test]
    fn test_sentinel_never_listed_as_building() {
        let roles = RoleSet::from_rows(&[
            row("sam@x.com", SYSTEM_ADMIN_BUILDING, "admin", &[]),
            row("sam@x.com", "B1", "parent", &[]),
        ]);
        assert!(roles.is_system_admin());
        let ids: Vec<&str> = roles.building_ids().collect();
        assert_eq!(ids, vec!["B1"]);
    }

    #[test]
    fn test_unknown_role_is_dropped_not_elevated() {
        let roles = RoleSet::from_rows(&[row("u@x.com", "B1", "superuser", &[])]);
        assert_eq!(roles.role_in("B1"), None);
        assert_eq!(building_permissions(&roles, "B1"), BuildingPermissions::NONE);
    }

    #[test]
    fn test_roles_are_per_building() {
        let roles = RoleSet::from_rows(&[
            row("alice@x.com", "B1", "parent", &[]),
            row("alice@x.com", "B2", "children", &["L5"]),
        ]);
        assert_eq!(roles.role_in("B1"), Some(Role::Parent));
        assert_eq!(roles.role_in("B2"), Some(Role::Children));
        assert_eq!(roles.role_in("B3"), None);
    }

    #[test]
    fn test_parent_permissions() {
        let roles = RoleSet::from_rows(&[row("p@x.com", "B1", "parent", &[])]);
        let perms = building_permissions(&roles, "B1");
        assert!(perms.can_edit_building);
        assert!(perms.can_delete_building);
        assert!(perms.can_manage_locations);
        assert!(perms.can_manage_children);
        assert!(perms.can_view_locations);
    }

    #[test]
    fn test_admin_locked_out_of_operational_detail() {
        let roles = RoleSet::from_rows(&[row("a@x.com", "B1", "admin", &[])]);
        let perms = building_permissions(&roles, "B1");
        assert!(perms.can_edit_building);
        assert!(!perms.can_manage_locations);
        assert!(!perms.can_view_locations);
        assert_eq!(location_visibility(&roles, "B1"), Visibility::Hidden);
    }

    #[test]
    fn test_system_admin_is_admin_equivalent_everywhere() {
        let roles = RoleSet::from_rows(&[row("s@x.com", SYSTEM_ADMIN_BUILDING, "admin", &[])]);
        let perms = building_permissions(&roles, "B-never-seen");
        assert!(perms.can_edit_building);
        assert!(!perms.can_view_locations);
    }

    #[test]
    fn test_non_member_has_nothing() {
        let roles = RoleSet::empty();
        assert_eq!(building_permissions(&roles, "B1"), BuildingPermissions::NONE);
        assert_eq!(location_visibility(&roles, "B1"), Visibility::Hidden);
    }

    #[test]
    fn test_parent_sees_full_sets() {
        let roles = RoleSet::from_rows(&[row("p@x.com", "B1", "parent", &[])]);
        let vis = location_visibility(&roles, "B1");
        assert_eq!(vis, Visibility::Full);
        assert_eq!(
            visible_location_ids(&vis, ["B1Lobby", "B1Roof"]),
            vec!["B1Lobby", "B1Roof"]
        );
        assert_eq!(
            visible_device_ids(&vis, [("d1", Some("B1Lobby")), ("d2", None)]),
            vec!["d1", "d2"]
        );
    }

    #[test]
    fn test_children_with_empty_assignment_sees_nothing_distinctly() {
        let roles = RoleSet::from_rows(&[row("c@x.com", "B1", "children", &[])]);
        let vis = location_visibility(&roles, "B1");
        assert_eq!(vis, Visibility::Unassigned);
        assert!(visible_location_ids(&vis, ["B1Lobby"]).is_empty());
        assert!(visible_device_ids(&vis, [("d1", Some("B1Lobby"))]).is_empty());
    }

    #[test]
    fn test_children_restricted_to_assigned_locations() {
        // alice is parent in B1, children in B2 with only L5 assigned;
        // B2 has devices in both L5 and L6.
        let roles = RoleSet::from_rows(&[
            row("alice@x.com", "B1", "parent", &[]),
            row("alice@x.com", "B2", "children", &["L5"]),
        ]);
        let vis = location_visibility(&roles, "B2");
        assert_eq!(visible_location_ids(&vis, ["L5", "L6"]), vec!["L5"]);
        assert_eq!(
            visible_device_ids(
                &vis,
                [
                    ("d-in-l5", Some("L5")),
                    ("d-in-l6", Some("L6")),
                    ("d-unassigned", None)
                ]
            ),
            vec!["d-in-l5"]
        );
    }

    #[test]
    fn test_cross_user_self_is_manage() {
        let roles = RoleSet::empty();
        assert_eq!(
            cross_user_access("me@x.com", &roles, "me@x.com", &roles),
            UserAccess::Manage
        );
    }

    #[test]
    fn test_cross_user_parent_over_children() {
        let acting = RoleSet::from_rows(&[row("p@x.com", "B1", "parent", &[])]);
        let target = RoleSet::from_rows(&[row("c@x.com", "B1", "children", &["L1"])]);
        assert_eq!(
            cross_user_access("p@x.com", &acting, "c@x.com", &target),
            UserAccess::Manage
        );
        // No shared building where acting is parent and target is children.
        let stranger = RoleSet::from_rows(&[row("c@x.com", "B9", "children", &[])]);
        assert_eq!(
            cross_user_access("p@x.com", &acting, "c@x.com", &stranger),
            UserAccess::None
        );
        // Two parents in the same building do not manage each other.
        let peer = RoleSet::from_rows(&[row("q@x.com", "B1", "parent", &[])]);
        assert_eq!(
            cross_user_access("p@x.com", &acting, "q@x.com", &peer),
            UserAccess::None
        );
    }

    #[test]
    fn test_cross_user_system_admin_is_view_only() {
        let acting = RoleSet::from_rows(&[row("s@x.com", SYSTEM_ADMIN_BUILDING, "admin", &[])]);
        let target = RoleSet::from_rows(&[row("c@x.com", "B1", "children", &[])]);
        assert_eq!(
            cross_user_access("s@x.com", &acting, "c@x.com", &target),
            UserAccess::View
        );
    }

    #[test]
    fn test_system_admin_sees_only_targets_parent_buildings() {
        let acting = RoleSet::from_rows(&[row("s@x.com", SYSTEM_ADMIN_BUILDING, "admin", &[])]);
        let target = RoleSet::from_rows(&[
            row("t@x.com", "B1", "parent", &[]),
            row("t@x.com", "B2", "children", &["L5"]),
            row("t@x.com", "B3", "admin", &[]),
        ]);
        assert_eq!(
            visible_buildings_of_target("s@x.com", &acting, "t@x.com", &target),
            vec!["B1"]
        );
    }

    #[test]
    fn test_parent_sees_shared_children_buildings_of_target() {
        let acting = RoleSet::from_rows(&[
            row("p@x.com", "B1", "parent", &[]),
            row("p@x.com", "B2", "parent", &[]),
        ]);
        let target = RoleSet::from_rows(&[
            row("t@x.com", "B1", "children", &[]),
            row("t@x.com", "B2", "parent", &[]),
            row("t@x.com", "B3", "children", &[]),
        ]);
        assert_eq!(
            visible_buildings_of_target("p@x.com", &acting, "t@x.com", &target),
            vec!["B1"]
        );
    }

    #[test]
    fn test_self_listing_excludes_sentinel() {
        let target = RoleSet::from_rows(&[
            row("t@x.com", SYSTEM_ADMIN_BUILDING, "admin", &[]),
            row("t@x.com", "B2", "children", &[]),
            row("t@x.com", "B1", "parent", &[]),
        ]);
        assert_eq!(
            visible_buildings_of_target("t@x.com", &target, "t@x.com", &target),
            vec!["B1", "B2"]
        );
    }
}
