// Device list ordering: priority reconciliation and stored-order lookup
use std::collections::HashSet;
use tracing::debug;

use crate::DeviceId;

/// Collapse duplicate entries in place, keeping the first occurrence of each device.
pub fn dedup_devices(devices: &mut Vec<DeviceId>) {
    let mut seen = HashSet::with_capacity(devices.len());
    devices.retain(|device| seen.insert(*device));
}

/// Rebuild the full device order so that the devices in `desired` come out in
/// the requested order.
///
/// `current` must be the complete list for the category, hidden devices
/// included. Every time a device is taken out of `current`, hidden devices
/// that directly follow it are taken with it. Entries of `desired` that are
/// not in `current` are ignored, and whatever `desired` never mentions keeps
/// its relative order at the end. The result is always a permutation of
/// `current`.
pub fn reconcile<F>(mut current: Vec<DeviceId>, desired: &[DeviceId], is_hidden: F) -> Vec<DeviceId>
where
    F: Fn(DeviceId) -> bool,
{
    let mut reordered = Vec::with_capacity(current.len());

    for &device in desired {
        let Some(found) = current.iter().position(|&d| d == device) else {
            debug!("Ignoring device {} that is not in the current list", device);
            continue;
        };

        reordered.push(current.remove(found));
        while found < current.len() && is_hidden(current[found]) {
            reordered.push(current.remove(found));
        }
    }

    reordered.append(&mut current);
    reordered
}

/// Order the live device list by a stored preference.
///
/// Stored entries the live list no longer has are dropped, live devices the
/// stored order does not mention are appended in live order. Lists with at
/// most one device are returned as they are.
pub fn sort_by_stored(stored: Option<&[DeviceId]>, mut live: Vec<DeviceId>) -> Vec<DeviceId> {
    if live.len() <= 1 {
        return live;
    }
    dedup_devices(&mut live);

    let Some(stored) = stored else {
        return live;
    };

    let mut sorted = Vec::with_capacity(live.len());
    for &device in stored {
        let before = live.len();
        live.retain(|&d| d != device);
        if live.len() != before {
            sorted.push(device);
        }
    }

    sorted.append(&mut live);
    sorted
}
