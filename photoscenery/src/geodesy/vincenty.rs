//! Vincenty direct and inverse solutions.

use std::f64::consts::{PI, TAU};

use super::{Ellipsoid, GeodesyError, CONVERGENCE_TOLERANCE, MAX_ITERATIONS};

/// Coordinates closer than this (degrees, per axis) are treated as identical.
const DEGENERATE_EPSILON_DEG: f64 = 1e-8;

/// Result of the inverse problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseSolution {
    /// Ellipsoidal distance in meters
    pub distance_m: f64,
    /// Azimuth at the first point towards the second, degrees in [0, 360)
    pub azimuth_forward: f64,
    /// Azimuth at the second point back towards the first, degrees in [0, 360)
    pub azimuth_back: f64,
}

/// Result of the forward (direct) problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardSolution {
    /// Destination longitude in degrees, [-180, 180)
    pub lon: f64,
    /// Destination latitude in degrees
    pub lat: f64,
    /// Azimuth at the destination pointing back to the origin, degrees in [0, 360)
    pub azimuth_back: f64,
}

/// Geodesic solver bound to one ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geodesic {
    ellipsoid: Ellipsoid,
}

/// Series coefficients shared by both solutions.
struct Series {
    a: f64,
    b: f64,
}

impl Series {
    fn new(cos_sq_alpha: f64, ellipsoid: &Ellipsoid) -> Self {
        let a = ellipsoid.semi_major();
        let b = ellipsoid.semi_minor();
        let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
        Self {
            a: 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq))),
            b: u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq))),
        }
    }

    fn delta_sigma(&self, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
        let b = self.b;
        let c2 = cos_2sigma_m * cos_2sigma_m;
        b * sin_sigma
            * (cos_2sigma_m
                + b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * c2)
                        - b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * c2)))
    }
}

fn lambda_correction(f: f64, cos_sq_alpha: f64) -> f64 {
    f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha))
}

fn converged(next: f64, prev: f64) -> bool {
    (next - prev).abs() <= CONVERGENCE_TOLERANCE * next.abs()
}

fn check_latitude(lat: f64) -> Result<(), GeodesyError> {
    if lat.is_nan() || lat.abs() > 90.0 {
        return Err(GeodesyError::InvalidLatitude(lat));
    }
    Ok(())
}

fn normalize_azimuth(rad: f64) -> f64 {
    rad.rem_euclid(TAU).to_degrees()
}

fn normalize_lon(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

impl Geodesic {
    /// Solver on the WGS84 ellipsoid.
    pub fn wgs84() -> Self {
        Self {
            ellipsoid: Ellipsoid::WGS84,
        }
    }

    /// Solver on a custom ellipsoid.
    pub fn new(a: f64, f: f64) -> Result<Self, GeodesyError> {
        Ok(Self {
            ellipsoid: Ellipsoid::new(a, f)?,
        })
    }

    /// The ellipsoid this solver uses.
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Distance and azimuths between two points.
    ///
    /// Coincident points (both deltas below 1e-8 degrees) yield a zero
    /// distance and zero azimuths.
    ///
    /// # Errors
    ///
    /// `InvalidLatitude` for `|lat| > 90`, `NoConvergence` when the lambda
    /// iteration does not settle (nearly antipodal points).
    pub fn inverse(
        &self,
        lon0: f64,
        lat0: f64,
        lon1: f64,
        lat1: f64,
    ) -> Result<InverseSolution, GeodesyError> {
        self.ellipsoid.validate()?;
        check_latitude(lat0)?;
        check_latitude(lat1)?;

        if (lat0 - lat1).abs() < DEGENERATE_EPSILON_DEG
            && (lon0 - lon1).abs() < DEGENERATE_EPSILON_DEG
        {
            return Ok(InverseSolution {
                distance_m: 0.0,
                azimuth_forward: 0.0,
                azimuth_back: 0.0,
            });
        }

        let f = self.ellipsoid.flattening();
        let b = self.ellipsoid.semi_minor();

        let l = (lon1 - lon0).to_radians();
        let u1 = ((1.0 - f) * lat0.to_radians().tan()).atan();
        let u2 = ((1.0 - f) * lat1.to_radians().tan()).atan();
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut iterations = 0;

        let (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m, sin_lambda, cos_lambda) = loop {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();
            let t1 = cos_u2 * sin_lambda;
            let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
            let sin_sigma = (t1 * t1 + t2 * t2).sqrt();
            if sin_sigma == 0.0 {
                return Ok(InverseSolution {
                    distance_m: 0.0,
                    azimuth_forward: 0.0,
                    azimuth_back: 0.0,
                });
            }
            let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            let sigma = sin_sigma.atan2(cos_sigma);
            let sin_alpha = (cos_u1 * cos_u2 * sin_lambda / sin_sigma).clamp(-1.0, 1.0);
            let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            // Equatorial lines have cos²α = 0
            let cos_2sigma_m = if cos_sq_alpha != 0.0 {
                cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
            } else {
                0.0
            };
            let c = lambda_correction(f, cos_sq_alpha);
            let prev = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m
                                + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

            if converged(lambda, prev) {
                break (
                    sin_sigma,
                    cos_sigma,
                    sigma,
                    cos_sq_alpha,
                    cos_2sigma_m,
                    sin_lambda,
                    cos_lambda,
                );
            }

            iterations += 1;
            if iterations >= MAX_ITERATIONS {
                return Err(GeodesyError::NoConvergence);
            }
        };

        let series = Series::new(cos_sq_alpha, &self.ellipsoid);
        let delta_sigma = series.delta_sigma(sin_sigma, cos_sigma, cos_2sigma_m);
        let distance_m = b * series.a * (sigma - delta_sigma);

        let alpha1 = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
        let alpha2 = (cos_u1 * sin_lambda).atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda);

        Ok(InverseSolution {
            distance_m,
            azimuth_forward: normalize_azimuth(alpha1),
            azimuth_back: normalize_azimuth(alpha2 + PI),
        })
    }

    /// Destination reached by travelling `distance_m` meters from a point
    /// along `azimuth` degrees.
    ///
    /// A zero distance returns the starting point with the reversed azimuth.
    ///
    /// # Errors
    ///
    /// `InvalidLatitude` for `|lat| > 90`, `NoConvergence` when the sigma
    /// iteration does not settle.
    pub fn forward(
        &self,
        lon: f64,
        lat: f64,
        azimuth: f64,
        distance_m: f64,
    ) -> Result<ForwardSolution, GeodesyError> {
        self.ellipsoid.validate()?;
        check_latitude(lat)?;

        let alpha1 = azimuth.to_radians();
        if distance_m == 0.0 {
            return Ok(ForwardSolution {
                lon,
                lat,
                azimuth_back: normalize_azimuth(alpha1 + PI),
            });
        }

        let f = self.ellipsoid.flattening();
        let b = self.ellipsoid.semi_minor();

        let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();
        let tan_u1 = (1.0 - f) * lat.to_radians().tan();
        let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
        let sin_u1 = tan_u1 * cos_u1;
        let sigma1 = tan_u1.atan2(cos_alpha1);
        let sin_alpha = cos_u1 * sin_alpha1;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let series = Series::new(cos_sq_alpha, &self.ellipsoid);

        let sigma0 = distance_m / (b * series.a);
        let mut sigma = sigma0;
        let mut iterations = 0;
        loop {
            let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
            let (sin_sigma, cos_sigma) = sigma.sin_cos();
            let prev = sigma;
            sigma = sigma0 + series.delta_sigma(sin_sigma, cos_sigma, cos_2sigma_m);
            if converged(sigma, prev) {
                break;
            }
            iterations += 1;
            if iterations >= MAX_ITERATIONS {
                return Err(GeodesyError::NoConvergence);
            }
        }

        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
        let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
            .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
        let lambda =
            (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
        let c = lambda_correction(f, cos_sq_alpha);
        let l = lambda
            - (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        let alpha2 = sin_alpha.atan2(-tmp);

        Ok(ForwardSolution {
            lon: normalize_lon(lon + l.to_degrees()),
            lat: lat2.to_degrees(),
            azimuth_back: normalize_azimuth(alpha2 + PI),
        })
    }
}
