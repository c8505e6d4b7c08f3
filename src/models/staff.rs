use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Associate,
    Supervisor,
}

/// Zones a staff member may be assigned work in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "zones")]
pub enum ZoneScope {
    All,
    Zones(BTreeSet<String>),
}

impl ZoneScope {
    pub fn covers(&self, location_id: &str) -> bool {
        match self {
            ZoneScope::All => true,
            ZoneScope::Zones(zones) => zones.contains(location_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    pub on_shift: bool,
    pub scope: ZoneScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_all_covers_any_zone() {
        assert!(ZoneScope::All.covers("shelf-a"));
    }

    #[test]
    fn zone_scope_covers_only_listed_zones() {
        let scope = ZoneScope::Zones(["shelf-a".to_string()].into_iter().collect());
        assert!(scope.covers("shelf-a"));
        assert!(!scope.covers("warehouse"));
    }
}
