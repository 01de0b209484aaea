//! Geostationary area definitions and their longitude/latitude grids.
//!
//! Pixel positions are given in projection metres: scan angle times the
//! perspective height, as used by Meteosat area extents. The scan mirror
//! sweeps along the y axis.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A rectangular grid of a geostationary view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeostationaryArea {
    /// `[x0, y0, x1, y1]` outer edges in projection metres; (x0, y0) is the
    /// corner of the last row's first column, (x1, y1) of the first row's
    /// last column.
    pub area_extent: [f64; 4],
    pub rows: usize,
    pub cols: usize,
    /// Sub-satellite longitude (degrees).
    pub lon_0: f64,
    /// Satellite height above the ellipsoid (metres).
    pub perspective_height: f64,
    /// Equatorial radius (metres).
    pub semi_major_axis: f64,
    /// Polar radius (metres).
    pub semi_minor_axis: f64,
}

impl GeostationaryArea {
    /// SEVIRI 3 km full disk as delivered by the HRIT reader: south-up,
    /// east-left. Rotating it by 180° gives the north-up view.
    pub fn seviri_full_disk(lon_0: f64) -> Self {
        Self {
            area_extent: [5_567_248.0742, 5_570_248.4773, -5_570_248.4773, -5_567_248.0742],
            rows: 3712,
            cols: 3712,
            lon_0,
            perspective_height: 35_785_831.0,
            semi_major_axis: 6_378_169.0,
            semi_minor_axis: 6_356_583.8,
        }
    }

    /// Same area with the same pixel dimensions but a different extent.
    pub fn with_extent(&self, area_extent: [f64; 4]) -> Self {
        Self {
            area_extent,
            ..self.clone()
        }
    }

    /// Area matching data rotated by 180 degrees.
    pub fn rotated_180(&self) -> Self {
        let [x0, y0, x1, y1] = self.area_extent;
        self.with_extent([x1, y1, x0, y0])
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Satellite distance from the earth centre in equatorial radii.
    fn radius_g(&self) -> f64 {
        1.0 + self.perspective_height / self.semi_major_axis
    }

    fn radius_p(&self) -> f64 {
        self.semi_minor_axis / self.semi_major_axis
    }

    /// Projection coordinates (metres) of a pixel centre.
    pub fn pixel_to_projection(&self, row: f64, col: f64) -> (f64, f64) {
        let [x0, y0, x1, y1] = self.area_extent;
        let dx = (x1 - x0) / self.cols as f64;
        let dy = (y1 - y0) / self.rows as f64;
        (x0 + (col + 0.5) * dx, y1 - (row + 0.5) * dy)
    }

    /// Scan angles (radians) to longitude/latitude (degrees).
    ///
    /// Returns None if the line of sight misses the earth.
    pub fn scan_to_geo(&self, x_rad: f64, y_rad: f64) -> Option<(f64, f64)> {
        let rg = self.radius_g();
        let rp = self.radius_p();

        let vy = x_rad.tan();
        let vz = y_rad.tan() * 1.0_f64.hypot(vy);

        // Intersect the line of sight with the ellipsoid.
        let a = 1.0 + vy * vy + (vz / rp).powi(2);
        let b = -2.0 * rg;
        let det = b * b - 4.0 * a * (rg * rg - 1.0);
        if det < 0.0 {
            return None;
        }
        let k = (-b - det.sqrt()) / (2.0 * a);
        let px = rg - k;
        let py = vy * k;
        let pz = vz * k;

        let lambda = py.atan2(px);
        let phi = (pz * lambda.cos() / px).atan();
        let phi = (phi.tan() / (rp * rp)).atan();

        Some((lambda.to_degrees() + self.lon_0, phi.to_degrees()))
    }

    /// Longitude/latitude of a pixel centre, None off the disk.
    pub fn pixel_to_geo(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        let (x, y) = self.pixel_to_projection(row as f64, col as f64);
        let h = self.perspective_height;
        self.scan_to_geo(x / h, y / h)
    }

    /// Longitude and latitude grids of all pixel centres.
    ///
    /// Pixels looking past the limb get `f64::INFINITY` in both grids.
    pub fn lonlats(&self) -> (Array2<f64>, Array2<f64>) {
        debug!(rows = self.rows, cols = self.cols, lon_0 = self.lon_0, "Generating geostationary lon/lat grid");

        let mut lons = Array2::from_elem((self.rows, self.cols), f64::INFINITY);
        let mut lats = Array2::from_elem((self.rows, self.cols), f64::INFINITY);
        Zip::indexed(&mut lons)
            .and(&mut lats)
            .for_each(|(row, col), lon, lat| {
                if let Some((pixel_lon, pixel_lat)) = self.pixel_to_geo(row, col) {
                    *lon = pixel_lon;
                    *lat = pixel_lat;
                }
            });
        (lons, lats)
    }
}
