// Multi-core snapshot merging: insert-or-sum by key, identity copied once.
// Pure logic; file reading stays in report::mod.

use crate::models::Snapshot;

/// Merges per-core snapshots into one. The first snapshot seeds the merge and
/// the rest fold in by value; inputs are consumed. An empty input yields an
/// empty snapshot.
pub fn merge_snapshots(snapshots: Vec<Snapshot>) -> Snapshot {
    let mut iter = snapshots.into_iter();
    let Some(mut merged) = iter.next() else {
        return Snapshot::default();
    };
    for snapshot in iter {
        fold_into(&mut merged, snapshot);
    }
    merged
}

/// Folds `other` into `merged`. Server and per-vhost fields merge
/// insert-or-sum per key, so a field or host present in only some cores
/// contributes its value unchanged. Extapps merge by (vhost, name); identity
/// fields stay as first seen.
fn fold_into(merged: &mut Snapshot, other: Snapshot) {
    merged.server.merge(&other.server);
    for vhost in other.vhosts {
        merged.vhost_fields(&vhost.name).merge(&vhost.fields);
    }
    for app in other.extapps {
        match merged.find_extapp_mut(&app.vhost, &app.name) {
            Some(existing) => existing.fields.merge(&app.fields),
            None => merged.extapps.push(app),
        }
    }
}
