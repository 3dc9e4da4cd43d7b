//! Permission names and the per-request permission set.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

/// Permission name that matches any requirement.
pub const WILDCARD: &str = "*";

/// Permissions checked by the built-in routes.
///
/// Administrators may create any other permission name; these are only the
/// ones the server itself asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    ViewUsers,
    EditUsers,
    DeleteUsers,
    ViewRoles,
    CreateRoles,
    EditRoles,
    DeleteRoles,
    ViewPermissions,
    CreatePermissions,
    EditPermissions,
    DeletePermissions,
}

impl Permission {
    /// Returns the stored name of this permission.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat set of permission names resolved for one request.
///
/// Lookups are exact and case-sensitive. The wildcard is recorded once at
/// construction, so [`allows`] checks it before the general lookup.
///
/// [`allows`]: PermissionSet::allows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PermissionSet {
    names: HashSet<String>,
    wildcard: bool,
}

impl PermissionSet {
    /// Creates a set from permission names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        let wildcard = names.contains(WILDCARD);
        Self { names, wildcard }
    }

    /// Returns `true` if `name` is granted, either literally or by `*`.
    #[inline]
    pub fn allows(&self, name: &str) -> bool {
        self.wildcard || self.names.contains(name)
    }

    /// Returns `true` if `name` is literally present.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns `true` if the set holds the wildcard.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over the names in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the names sorted, for stable output.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl From<Vec<String>> for PermissionSet {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<PermissionSet> for Vec<String> {
    fn from(set: PermissionSet) -> Self {
        set.to_sorted_vec()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
