//! Cross-tenant visibility through identity sharing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use uuid::Uuid;
use warden_core::error::WardenResult;
use warden_core::graph::reachable;
use warden_core::models::group::Group;
use warden_core::models::member::Principal;
use warden_core::repository::{GroupInformer, SharingInformer};

/// Groups of the principal's home tenant that contain it (directly or
/// through nesting) and are shared into `destination`.
pub fn shared_groups<G: GroupInformer, S: SharingInformer>(
    groups: &G,
    sharings: &S,
    principal: Principal,
    home_tenant: Uuid,
    destination: Uuid,
) -> WardenResult<BTreeSet<Uuid>> {
    let shares = sharings.list_for_destination_tenant(destination)?;
    if shares.is_empty() {
        return Ok(BTreeSet::new());
    }
    let closure = groups.find_all_parent_groups(home_tenant, principal.id(), principal.kind())?;

    Ok(shares
        .iter()
        .flat_map(|share| share.groups.iter().copied())
        .filter(|group| closure.contains(group))
        .collect())
}

/// Groups shared into `destination` together with every group nested in
/// them, ordered by id. Archived groups, and the groups below them, are
/// left out unless `show_archived` is set.
pub fn shared_group_closure<G: GroupInformer, S: SharingInformer>(
    groups: &G,
    sharings: &S,
    destination: Uuid,
    show_archived: bool,
) -> WardenResult<Vec<Arc<Group>>> {
    let seeds: BTreeSet<Uuid> = sharings
        .list_for_destination_tenant(destination)?
        .iter()
        .flat_map(|share| share.groups.iter().copied())
        .collect();

    let mut found = BTreeMap::new();
    let mut visit = |id: &Uuid| -> WardenResult<BTreeSet<Uuid>> {
        let group = groups.get_group(*id)?;
        if group.archive.is_archived() && !show_archived {
            return Ok(BTreeSet::new());
        }
        let children = group.groups.iter().copied().collect();
        found.insert(group.uuid, group);
        Ok(children)
    };
    reachable(seeds, &mut visit)?;
    Ok(found.into_values().collect())
}
