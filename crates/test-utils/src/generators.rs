//! Generators for synthetic arrays and raw file names.
//!
//! Values follow simple, predictable patterns so tests can compute the
//! expected result by hand.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, ArrayD};

/// Creates a grid where each cell is `start + (row * cols + col) * step`.
///
/// # Example
///
/// ```
/// use test_utils::ramp;
///
/// let grid = ramp(2, 3, 280.0, 1.0);
/// assert_eq!(grid[[0, 0]], 280.0);
/// assert_eq!(grid[[1, 2]], 285.0);
/// ```
pub fn ramp(rows: usize, cols: usize, start: f64, step: f64) -> ArrayD<f64> {
    Array2::from_shape_fn((rows, cols), |(row, col)| start + (row * cols + col) as f64 * step).into_dyn()
}

/// Regular longitude/latitude grids spanning the given ranges, north-up.
///
/// Row 0 holds `lat_range.1`, the last row `lat_range.0`.
pub fn lonlat_grid(
    rows: usize,
    cols: usize,
    lon_range: (f64, f64),
    lat_range: (f64, f64),
) -> (Array2<f64>, Array2<f64>) {
    let step = |range: (f64, f64), n: usize| {
        if n > 1 {
            (range.1 - range.0) / (n - 1) as f64
        } else {
            0.0
        }
    };
    let dlon = step(lon_range, cols);
    let dlat = step(lat_range, rows);
    let lons = Array2::from_shape_fn((rows, cols), |(_, col)| lon_range.0 + col as f64 * dlon);
    let lats = Array2::from_shape_fn((rows, cols), |(row, _)| lat_range.1 - row as f64 * dlat);
    (lons, lats)
}

/// Per-line acquisition times in milliseconds since the Unix epoch.
pub fn scanline_times(start: &DateTime<Utc>, lines: usize, interval_ms: i64) -> Array1<f64> {
    let first = start.timestamp_millis();
    Array1::from_shape_fn(lines, |line| (first + line as i64 * interval_ms) as f64)
}

fn padded(value: &str, width: usize) -> String {
    format!("{:_<width$}", value, width = width)
}

/// MSG HRIT segment file name.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use test_utils::hrit_filename;
///
/// let t = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
/// assert_eq!(
///     hrit_filename("MSG3", "IR_108", "000001", &t),
///     "H-000-MSG3__-MSG3________-IR_108___-000001___-201410051115-__"
/// );
/// ```
pub fn hrit_filename(platform: &str, channel: &str, segment: &str, time: &DateTime<Utc>) -> String {
    format!(
        "H-000-{}-{}-{}-{}-{}-__",
        padded(platform, 6),
        padded(platform, 12),
        padded(channel, 9),
        padded(segment, 9),
        time.format("%Y%m%d%H%M")
    )
}

/// AVHRR GAC FDR level-1c file name.
pub fn gac_fdr_filename(platform: &str, start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    format!(
        "AVHRR-GAC_FDR_1C_{}_{}Z_{}Z_R_O_20200101T000000Z_0100.nc",
        platform,
        start.format("%Y%m%dT%H%M%S"),
        end.format("%Y%m%dT%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lonlat_grid_corners() {
        let (lons, lats) = lonlat_grid(3, 5, (0.0, 20.0), (40.0, 60.0));
        assert_eq!(lons[[0, 0]], 0.0);
        assert_eq!(lons[[2, 4]], 20.0);
        assert_eq!(lats[[0, 0]], 60.0);
        assert_eq!(lats[[2, 0]], 40.0);
    }

    #[test]
    fn test_single_cell_grid() {
        let (lons, lats) = lonlat_grid(1, 1, (5.0, 6.0), (50.0, 51.0));
        assert_eq!(lons[[0, 0]], 5.0);
        assert_eq!(lats[[0, 0]], 51.0);
    }

    #[test]
    fn test_scanline_times_spacing() {
        let t = Utc.with_ymd_and_hms(2009, 7, 1, 0, 35, 17).unwrap();
        let times = scanline_times(&t, 3, 500);
        assert_eq!(times[0], t.timestamp_millis() as f64);
        assert_eq!(times[2] - times[0], 1000.0);
    }

    #[test]
    fn test_prologue_filename() {
        let t = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
        assert_eq!(
            hrit_filename("MSG3", "", "PRO", &t),
            "H-000-MSG3__-MSG3________-_________-PRO______-201410051115-__"
        );
    }
}
