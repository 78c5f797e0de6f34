//! Left join of station status onto station information.

use std::collections::HashMap;

use crate::feed::{StationInformation, StationStatus};

use super::station::MergedStation;

/// Join status records with information records by station id.
///
/// Produces exactly one `MergedStation` per distinct status station id, in
/// status order. Unmatched status rows are kept with empty descriptive
/// fields. Duplicate ids resolve to the later record: for information the
/// later record replaces the earlier one in the lookup; for status the
/// later record replaces the earlier one in place.
pub fn merge_stations(
    information: Vec<StationInformation>,
    status: Vec<StationStatus>,
) -> Vec<MergedStation> {
    let lookup: HashMap<String, StationInformation> = information
        .into_iter()
        .map(|info| (info.station_id.clone(), info))
        .collect();

    let mut merged: Vec<MergedStation> = Vec::with_capacity(status.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(status.len());

    for record in status {
        let station = merge_one(record, &lookup);
        match positions.get(&station.station_id) {
            Some(&idx) => merged[idx] = station,
            None => {
                positions.insert(station.station_id.clone(), merged.len());
                merged.push(station);
            }
        }
    }

    merged
}

fn merge_one(status: StationStatus, lookup: &HashMap<String, StationInformation>) -> MergedStation {
    let info = lookup.get(&status.station_id);

    MergedStation {
        name: info.map(|i| i.name.clone()),
        lat: info.map(|i| i.lat),
        lon: info.map(|i| i.lon),
        address: info.and_then(|i| i.address.clone()),
        capacity: info.and_then(|i| i.capacity),
        station_id: status.station_id,
        num_bikes_available: status.num_bikes_available,
        num_docks_available: status.num_docks_available,
        last_reported: status.last_reported,
        is_renting: status.is_renting,
    }
}
