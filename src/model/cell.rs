//! Periodic simulation cell.
//!
//! The cell matrix stores the three cell vectors as columns, in Ångström. Infinite cells use
//! a zero matrix; orthorhombic cells have a diagonal matrix; triclinic cells are upper
//! triangular when built from lengths and angles, matching the convention of PDB, GRO and
//! LAMMPS.

use super::types::{Point, Vector};
use nalgebra::Matrix3;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellShape {
    #[default]
    Infinite,
    Orthorhombic,
    Triclinic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    matrix: Matrix3<f64>,
    shape: CellShape,
}

impl Default for UnitCell {
    fn default() -> Self {
        Self::infinite()
    }
}

fn is_right_angle(angle: f64) -> bool {
    (angle - 90.0).abs() < 1e-3
}

impl UnitCell {
    pub fn infinite() -> Self {
        Self {
            matrix: Matrix3::zeros(),
            shape: CellShape::Infinite,
        }
    }

    /// Creates an orthorhombic cell, or an infinite one when every length is zero.
    pub fn from_lengths(a: f64, b: f64, c: f64) -> Self {
        if a == 0.0 && b == 0.0 && c == 0.0 {
            return Self::infinite();
        }
        Self {
            matrix: Matrix3::from_diagonal(&Vector::new(a, b, c)),
            shape: CellShape::Orthorhombic,
        }
    }

    /// Creates a cell from lengths (Å) and angles (degrees).
    ///
    /// Angles of 90° give an orthorhombic cell. Otherwise `a` is aligned with the x axis and
    /// `b` lies in the xy plane.
    pub fn from_lengths_angles(lengths: [f64; 3], angles: [f64; 3]) -> Self {
        let [a, b, c] = lengths;
        if angles.iter().all(|&angle| is_right_angle(angle)) {
            return Self::from_lengths(a, b, c);
        }

        let [alpha, beta, gamma] = angles.map(f64::to_radians);
        let cos_alpha = alpha.cos();
        let cos_beta = beta.cos();
        let (sin_gamma, cos_gamma) = gamma.sin_cos();

        let cx = cos_beta;
        let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz = (1.0 - cx * cx - cy * cy).max(0.0).sqrt();

        let matrix = Matrix3::new(
            a, b * cos_gamma, c * cx,
            0.0, b * sin_gamma, c * cy,
            0.0, 0.0, c * cz,
        );

        Self {
            matrix: clean_rounding(matrix),
            shape: CellShape::Triclinic,
        }
    }

    /// Creates a cell from a matrix whose columns are the cell vectors.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        let shape = if matrix.iter().all(|&v| v == 0.0) {
            CellShape::Infinite
        } else if (0..3).all(|i| (0..3).all(|j| i == j || matrix[(i, j)] == 0.0)) {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };
        Self { matrix, shape }
    }

    pub fn shape(&self) -> CellShape {
        self.shape
    }

    /// Overrides the shape without touching the matrix.
    ///
    /// This is used by formats that declare a triclinic box even when all tilt factors are
    /// zero.
    pub fn set_shape(&mut self, shape: CellShape) {
        self.shape = shape;
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        self.matrix
    }

    pub fn lengths(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| self.matrix.column(i).norm())
    }

    /// Returns `[alpha, beta, gamma]` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        if self.shape != CellShape::Triclinic {
            return [90.0; 3];
        }
        let a: Vector = self.matrix.column(0).into();
        let b: Vector = self.matrix.column(1).into();
        let c: Vector = self.matrix.column(2).into();
        [angle_degrees(&b, &c), angle_degrees(&a, &c), angle_degrees(&a, &b)]
    }

    pub fn a(&self) -> f64 {
        self.lengths()[0]
    }

    pub fn b(&self) -> f64 {
        self.lengths()[1]
    }

    pub fn c(&self) -> f64 {
        self.lengths()[2]
    }

    pub fn alpha(&self) -> f64 {
        self.angles()[0]
    }

    pub fn beta(&self) -> f64 {
        self.angles()[1]
    }

    pub fn gamma(&self) -> f64 {
        self.angles()[2]
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Converts a cartesian position to fractional coordinates.
    ///
    /// Returns `None` for infinite or degenerate cells.
    pub fn fractional(&self, point: &Point) -> Option<Vector> {
        if self.shape == CellShape::Infinite {
            return None;
        }
        self.matrix.try_inverse().map(|inverse| inverse * point.coords)
    }

    pub fn cartesian(&self, fractional: &Vector) -> Point {
        Point::from(self.matrix * fractional)
    }
}

fn angle_degrees(v1: &Vector, v2: &Vector) -> f64 {
    let denom = v1.norm() * v2.norm();
    if denom.abs() < f64::EPSILON {
        return 90.0;
    }
    let cos_angle = (v1.dot(v2) / denom).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

fn clean_rounding(mut matrix: Matrix3<f64>) -> Matrix3<f64> {
    for value in matrix.iter_mut() {
        if value.abs() < 1e-12 {
            *value = 0.0;
        }
    }
    matrix
}

impl fmt::Display for UnitCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.lengths();
        let [alpha, beta, gamma] = self.angles();
        write!(
            f,
            "UnitCell {{ {:?}, lengths: [{:.3}, {:.3}, {:.3}], angles: [{:.2}, {:.2}, {:.2}] }}",
            self.shape, a, b, c, alpha, beta, gamma
        )
    }
}
