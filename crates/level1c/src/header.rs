//! Global header and output file name.

use chrono::{DateTime, Utc};
use l1c_common::{header_time, pps_filename_time, Attributes};

use crate::profile::InstrumentProfile;

/// Header attributes as written: the normalized scene header with
/// formatted time range and the profile's sensor name.
pub fn header_attrs(
    scene_header: &Attributes,
    profile: &InstrumentProfile,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Attributes {
    let mut header = scene_header.clone();
    header.insert("start_time", header_time(start));
    header.insert("end_time", header_time(end));
    header.insert("sensor", profile.sensor.as_str());
    header
}

/// Platform as it appears in file names: lower case without dashes.
pub fn filename_platform(platform: &str) -> String {
    platform.to_lowercase().replace('-', "")
}

/// `S_NWC_<sensor>_<platform>_<orbit>_<start>Z_<end>Z.nc`
pub fn compose_filename(
    profile: &InstrumentProfile,
    platform: &str,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
    orbit_number: u32,
) -> String {
    format!(
        "S_NWC_{}_{}_{:05}_{}Z_{}Z.nc",
        profile.sensor,
        filename_platform(platform),
        orbit_number,
        pps_filename_time(start),
        pps_filename_time(end)
    )
}
