use geo::{Area, EuclideanLength, Simplify};
use geo_types::{Coord, LineString, Polygon};
use image::GrayImage;
use imageproc::contours::BorderType;

/// A closed outer boundary traced from a binary image
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub points: Vec<[f64; 2]>,
}

impl Outline {
    /// Closed ring through all points
    pub fn ring(&self) -> LineString<f64> {
        let coords: Vec<Coord<f64>> = self.points
            .iter()
            .map(|&[x, y]| Coord { x, y })
            .collect();

        let mut ring = LineString::new(coords);
        ring.close();
        ring
    }

    /// Enclosed area (shoelace)
    pub fn area(&self) -> f64 {
        Polygon::new(self.ring(), vec![]).unsigned_area()
    }

    /// Length of the closed boundary
    pub fn perimeter(&self) -> f64 {
        self.ring().euclidean_length()
    }

    /// Vertices left after Douglas-Peucker simplification of the closed ring
    pub fn approximate_vertices(&self, epsilon: f64) -> usize {
        let simplified = self.ring().simplify(&epsilon);
        // The closing coordinate repeats the first one
        simplified.0.len().saturating_sub(1)
    }
}

/// Trace the outermost boundaries (contours without a parent) in traversal order.
pub fn external_outlines(binary_image: &GrayImage) -> Vec<Outline> {
    imageproc::contours::find_contours::<i32>(binary_image)
        .into_iter()
        .filter(|contour| contour.parent.is_none() && contour.border_type == BorderType::Outer)
        .map(|contour| Outline {
            points: contour.points
                .iter()
                .map(|p| [p.x as f64, p.y as f64])
                .collect(),
        })
        .collect()
}
