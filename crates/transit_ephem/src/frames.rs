//! Ecliptic frame helpers: obliquity, precession, nutation, rotations and
//! Cartesian/spherical conversion.
//!
//! Sources: IAU 2006 precession (Capitaine, Wallace & Chapront 2003),
//! IAU 2000B nutation (IERS Conventions 2010, Table 5.3b, leading terms only),
//! Meeus ch. 23 for annual aberration.

use std::f64::consts::TAU;

/// Arcseconds to radians.
const AS2RAD: f64 = TAU / 1_296_000.0;

/// Constant of aberration in arcseconds.
pub const ABERRATION_ARCSEC: f64 = 20.495_52;

/// Mean obliquity of the ecliptic (IAU 2006) in degrees.
///
/// `t` is Julian centuries of TT since J2000.0.
pub fn mean_obliquity_deg(t: f64) -> f64 {
    let arcsec = 84_381.406 - 46.836_769 * t - 0.000_183_1 * t * t + 0.002_003_40 * t * t * t;
    arcsec / 3600.0
}

/// IAU 2006 general precession in ecliptic longitude, in degrees.
///
/// Positive means the equinox has moved westward since J2000.0, so
/// longitudes of date exceed J2000 longitudes by this amount.
pub fn general_precession_longitude_deg(t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let arcsec = 5028.796_195 * t + 1.105_434_8 * t2 + 0.000_079_64 * t3;
    arcsec / 3600.0
}

/// Delaunay arguments `[l, l', F, D, Ω]` in radians.
fn fundamental_arguments(t: f64) -> [f64; 5] {
    let t2 = t * t;
    let l = (485_868.249_036 + 1_717_915_923.217_8 * t + 31.879_2 * t2) * AS2RAD;
    let lp = (1_287_104.793_05 + 129_596_581.048_1 * t - 0.553_2 * t2) * AS2RAD;
    let f = (335_779.526_232 + 1_739_527_262.847_8 * t - 12.751_2 * t2) * AS2RAD;
    let d = (1_072_260.703_69 + 1_602_961_601.209_0 * t - 6.370_6 * t2) * AS2RAD;
    let om = (450_160.398_036 - 6_962_890.543_1 * t + 7.472_2 * t2) * AS2RAD;
    [l, lp, f, d, om]
}

/// Leading IAU 2000B lunisolar terms.
///
/// Each row: `[nl, nl', nF, nD, nΩ, S, S', C, C']`, amplitudes in 0.1 µas.
#[rustfmt::skip]
static NUTATION_TERMS: [[i64; 9]; 31] = [
    [ 0,  0,  0,  0,  1, -172_064_161, -174_666, 92_052_331,  9_086],
    [ 0,  0,  2, -2,  2,  -13_170_906,   -1_675,  5_730_336, -3_015],
    [ 0,  0,  2,  0,  2,   -2_276_413,     -234,    978_459,   -485],
    [ 0,  0,  0,  0,  2,    2_074_554,      207,   -897_492,    470],
    [ 0,  1,  0,  0,  0,    1_475_877,   -3_633,     73_871,   -184],
    [ 0,  1,  2, -2,  2,     -516_821,    1_226,    224_386,   -677],
    [ 1,  0,  0,  0,  0,      711_159,       73,     -6_750,      0],
    [ 0,  0,  2,  0,  1,     -387_298,     -367,    200_728,     18],
    [ 1,  0,  2,  0,  2,     -301_461,      -36,    129_025,    -63],
    [ 0, -1,  2, -2,  2,      215_829,     -494,    -95_929,    299],
    [ 0,  0,  2, -2,  1,      128_227,      137,    -68_982,     -9],
    [-1,  0,  2,  0,  2,      123_457,       11,    -53_311,     32],
    [-1,  0,  0,  2,  0,      156_994,       10,     -1_235,      0],
    [ 1,  0,  0,  0,  1,       63_110,       63,    -33_228,      0],
    [-1,  0,  0,  0,  1,      -57_976,      -63,     31_429,      0],
    [-1,  0,  2,  2,  2,      -59_641,      -11,     25_543,    -11],
    [ 1,  0,  2,  0,  1,      -51_613,      -42,     26_366,      0],
    [-2,  0,  2,  0,  1,       45_893,       50,    -24_236,    -10],
    [ 0,  0,  0,  2,  0,       63_384,       11,     -1_220,      0],
    [ 0,  0,  2,  2,  2,      -38_571,       -1,     16_452,    -11],
    [ 0, -2,  2, -2,  2,       32_481,        0,    -13_870,      0],
    [-2,  0,  0,  2,  0,      -47_722,        0,        477,      0],
    [ 2,  0,  2,  0,  2,      -31_046,       -1,     13_238,    -11],
    [ 1,  0,  2, -2,  2,       28_593,        0,    -12_338,     10],
    [-1,  0,  2,  0,  1,       20_441,       21,    -10_758,      0],
    [ 2,  0,  0,  0,  0,       29_243,        0,       -609,      0],
    [ 0,  0,  2,  0,  0,       25_887,        0,       -550,      0],
    [ 0,  1,  0,  0,  1,      -14_053,      -25,      8_551,     -2],
    [-1,  0,  0,  2,  1,       15_164,       10,     -8_001,      0],
    [ 0,  2,  2, -2,  2,      -15_794,       72,      6_850,    -42],
    [ 0,  0, -2,  2,  0,       21_783,        0,       -167,      0],
];

/// Nutation in longitude and obliquity `(Δψ, Δε)` in degrees.
///
/// Truncated to the 31 largest terms; residual error stays below 0.05".
pub fn nutation_deg(t: f64) -> (f64, f64) {
    let args = fundamental_arguments(t);
    let mut dpsi = 0.0;
    let mut deps = 0.0;
    for row in &NUTATION_TERMS {
        let arg: f64 = row[..5]
            .iter()
            .zip(args.iter())
            .map(|(&n, &a)| n as f64 * a)
            .sum();
        dpsi += (row[5] as f64 + row[6] as f64 * t) * arg.sin();
        deps += (row[7] as f64 + row[8] as f64 * t) * arg.cos();
    }
    // 0.1 µas -> degrees
    (dpsi * 1e-7 / 3600.0, deps * 1e-7 / 3600.0)
}

/// Annual aberration in ecliptic longitude, in degrees.
///
/// `sun_lon_deg` is the Sun's geocentric longitude, `lon_deg`/`lat_deg` the
/// body's ecliptic coordinates.
pub fn aberration_longitude_deg(sun_lon_deg: f64, lon_deg: f64, lat_deg: f64) -> f64 {
    let cos_lat = lat_deg.to_radians().cos();
    if cos_lat.abs() < 1e-12 {
        return 0.0;
    }
    -ABERRATION_ARCSEC * (sun_lon_deg - lon_deg).to_radians().cos() / cos_lat / 3600.0
}

/// Rotate an ecliptic vector into the equatorial frame of the same epoch.
pub fn ecliptic_to_equatorial(v: &[f64; 3], obliquity_deg: f64) -> [f64; 3] {
    let (s, c) = obliquity_deg.to_radians().sin_cos();
    [v[0], v[1] * c - v[2] * s, v[1] * s + v[2] * c]
}

/// Rotate an equatorial vector into the ecliptic frame of the same epoch.
pub fn equatorial_to_ecliptic(v: &[f64; 3], obliquity_deg: f64) -> [f64; 3] {
    let (s, c) = obliquity_deg.to_radians().sin_cos();
    [v[0], v[1] * c + v[2] * s, -v[1] * s + v[2] * c]
}

/// Spherical coordinates of a Cartesian vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoords {
    /// Longitude in degrees, range [0, 360).
    pub lon_deg: f64,
    /// Latitude in degrees, range [-90, 90].
    pub lat_deg: f64,
    /// Distance in the vector's units.
    pub distance: f64,
}

/// Convert Cartesian `[x, y, z]` to spherical coordinates.
pub fn cartesian_to_spherical(xyz: &[f64; 3]) -> SphericalCoords {
    let [x, y, z] = *xyz;
    let r = (x * x + y * y + z * z).sqrt();
    if r == 0.0 {
        return SphericalCoords {
            lon_deg: 0.0,
            lat_deg: 0.0,
            distance: 0.0,
        };
    }
    SphericalCoords {
        lon_deg: y.atan2(x).to_degrees().rem_euclid(360.0),
        lat_deg: (z / r).asin().to_degrees(),
        distance: r,
    }
}

/// Convert spherical coordinates (degrees) back to Cartesian.
pub fn spherical_to_cartesian(lon_deg: f64, lat_deg: f64, distance: f64) -> [f64; 3] {
    let (sl, cl) = lon_deg.to_radians().sin_cos();
    let (sb, cb) = lat_deg.to_radians().sin_cos();
    [distance * cb * cl, distance * cb * sl, distance * sb]
}
