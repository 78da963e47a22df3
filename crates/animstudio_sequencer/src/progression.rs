// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-keyframe progression (easing) curves.
//!
//! A curve maps the linear time fraction of a keyframe to an eased fraction.
//! It is defined by user-placed control points between two fixed endpoints
//! at (0,0) and (1,1). Points may be placed in any order; they are re-sorted
//! by x lazily before evaluation.

use crate::error::{AnimationError, Result};
use crate::keyframe::Interpolation;
use serde::{Deserialize, Serialize};

/// Curve-local identifier of a control point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointId(pub u32);

/// A control point on a progression curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressionPoint {
    /// Identifier, stable across re-sorts
    pub id: PointId,
    /// Time fraction in [0, 1]
    pub x: f64,
    /// Eased fraction in [0, 1]
    pub y: f64,
    /// Fixed endpoint that can never be moved or removed
    pub required: bool,
}

/// Whether the point list is known to be ordered by x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortState {
    /// Sorted by x
    #[default]
    Clean,
    /// Needs a re-sort before evaluation
    Dirty,
}

/// Easing curve built from control points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionCurve {
    points: Vec<ProgressionPoint>,
    sort_state: SortState,
    next_id: u32,
}

impl ProgressionCurve {
    /// The identity curve: only the two endpoints
    pub fn linear() -> Self {
        Self {
            points: vec![
                ProgressionPoint {
                    id: PointId(0),
                    x: 0.0,
                    y: 0.0,
                    required: true,
                },
                ProgressionPoint {
                    id: PointId(1),
                    x: 1.0,
                    y: 1.0,
                    required: true,
                },
            ],
            sort_state: SortState::Clean,
            next_id: 2,
        }
    }

    /// Rebuild a curve from raw coordinates, as stored in animation files.
    ///
    /// The first (0,0) and the last (1,1) become the fixed endpoints; a list
    /// without both is rejected.
    pub fn from_coordinates(coordinates: &[(f64, f64)]) -> Result<Self> {
        let start = coordinates.iter().position(|&(x, y)| x == 0.0 && y == 0.0);
        let end = coordinates.iter().rposition(|&(x, y)| x == 1.0 && y == 1.0);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(AnimationError::malformed(
                "progression curve is missing its (0,0) or (1,1) endpoint",
            ));
        };
        if start == end {
            return Err(AnimationError::malformed("progression endpoints overlap"));
        }

        let mut points = Vec::with_capacity(coordinates.len());
        for (i, &(x, y)) in coordinates.iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(AnimationError::malformed("non-finite progression point"));
            }
            points.push(ProgressionPoint {
                id: PointId(i as u32),
                x,
                y,
                required: i == start || i == end,
            });
        }

        let mut curve = Self {
            points,
            sort_state: SortState::Dirty,
            next_id: coordinates.len() as u32,
        };
        curve.ensure_sorted();
        Ok(curve)
    }

    /// Points in stored order (x-sorted once [`ensure_sorted`](Self::ensure_sorted) has run)
    pub fn points(&self) -> &[ProgressionPoint] {
        &self.points
    }

    /// Points ordered by x, whatever the sort state
    pub fn sorted_points(&self) -> Vec<ProgressionPoint> {
        let mut sorted = self.points.clone();
        if self.sort_state == SortState::Dirty {
            sort_points(&mut sorted);
        }
        sorted
    }

    /// Look up a point
    pub fn point(&self, id: PointId) -> Option<&ProgressionPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Current sort state
    pub fn sort_state(&self) -> SortState {
        self.sort_state
    }

    /// Add an interior point. Coordinates are clamped to [0, 1].
    pub fn add_point(&mut self, x: f64, y: f64) -> Result<PointId> {
        check_finite(x, y)?;
        let id = PointId(self.next_id);
        self.next_id += 1;
        self.points.push(ProgressionPoint {
            id,
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            required: false,
        });
        self.sort_state = SortState::Dirty;
        Ok(id)
    }

    /// Move an interior point. Coordinates are clamped to [0, 1].
    pub fn move_point(&mut self, id: PointId, x: f64, y: f64) -> Result<()> {
        check_finite(x, y)?;
        let point = self.interior_point_mut(id)?;
        point.x = x.clamp(0.0, 1.0);
        point.y = y.clamp(0.0, 1.0);
        self.sort_state = SortState::Dirty;
        Ok(())
    }

    /// Remove an interior point, returning its index and value
    pub fn remove_point(&mut self, id: PointId) -> Result<(usize, ProgressionPoint)> {
        self.interior_point_mut(id)?;
        let index = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AnimationError::invalid(format!("no progression point {id:?}")))?;
        let point = self.points.remove(index);
        self.sort_state = SortState::Dirty;
        Ok((index, point))
    }

    /// Put back a point removed by [`remove_point`](Self::remove_point)
    pub fn restore_point(&mut self, index: usize, point: ProgressionPoint) {
        let index = index.min(self.points.len());
        self.points.insert(index, point);
        self.next_id = self.next_id.max(point.id.0 + 1);
        self.sort_state = SortState::Dirty;
    }

    fn interior_point_mut(&mut self, id: PointId) -> Result<&mut ProgressionPoint> {
        let point = self
            .points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AnimationError::invalid(format!("no progression point {id:?}")))?;
        if point.required {
            return Err(AnimationError::invalid("progression endpoints are fixed"));
        }
        Ok(point)
    }

    /// Re-sort the points by x if a mutation left them unordered
    pub fn ensure_sorted(&mut self) {
        if self.sort_state == SortState::Dirty {
            sort_points(&mut self.points);
            self.sort_state = SortState::Clean;
        }
    }

    /// Evaluate the eased fraction for a time fraction
    pub fn evaluate(&self, t: f64) -> f64 {
        match self.sort_state {
            SortState::Clean => evaluate_sorted(&self.points, t),
            SortState::Dirty => evaluate_sorted(&self.sorted_points(), t),
        }
    }
}

impl Default for ProgressionCurve {
    fn default() -> Self {
        Self::linear()
    }
}

fn check_finite(x: f64, y: f64) -> Result<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(AnimationError::invalid("progression point coordinates must be finite"))
    }
}

/// Sort by x; required endpoints stay outermost on ties, other ties go by id
/// so the order does not depend on edit history
fn sort_points(points: &mut [ProgressionPoint]) {
    points.sort_by(|a, b| {
        a.x.total_cmp(&b.x).then_with(|| match (a.required, b.required) {
            (true, false) if a.x == 0.0 => std::cmp::Ordering::Less,
            (false, true) if b.x == 0.0 => std::cmp::Ordering::Greater,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            _ => a.id.0.cmp(&b.id.0),
        })
    });
}

/// Piecewise-linear evaluation over x-sorted points
pub fn evaluate_sorted(points: &[ProgressionPoint], t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.x && t <= b.x {
            let width = b.x - a.x;
            if width <= f64::EPSILON {
                return b.y;
            }
            return Interpolation::lerp(a.y, b.y, (t - a.x) / width);
        }
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_curve_is_identity() {
        let curve = ProgressionCurve::linear();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_relative_eq!(curve.evaluate(0.25), 0.25);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_interior_point_bends_curve() {
        let mut curve = ProgressionCurve::linear();
        curve.add_point(0.5, 0.8).unwrap();
        assert_relative_eq!(curve.evaluate(0.25), 0.4);
        assert_relative_eq!(curve.evaluate(0.75), 0.9);
    }

    #[test]
    fn test_endpoints_are_invariant() {
        let mut curve = ProgressionCurve::linear();
        let id = curve.add_point(0.0, 0.7).unwrap();
        curve.add_point(1.0, 0.2).unwrap();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(1.0), 1.0);
        assert_eq!(curve.evaluate(-3.0), 0.0);
        assert_eq!(curve.evaluate(4.0), 1.0);

        curve.move_point(id, 0.3, 0.3).unwrap();
        assert_eq!(curve.evaluate(0.0), 0.0);
    }

    #[test]
    fn test_required_points_cannot_be_removed_or_moved() {
        let mut curve = ProgressionCurve::linear();
        let start = curve.points()[0].id;
        let end = curve.points()[1].id;

        assert!(matches!(curve.remove_point(start), Err(AnimationError::InvalidMutation(_))));
        assert!(matches!(curve.remove_point(end), Err(AnimationError::InvalidMutation(_))));
        assert!(curve.move_point(end, 0.5, 0.5).is_err());
        assert_eq!(curve.points().len(), 2);
    }

    #[test]
    fn test_mutation_marks_dirty_until_sorted() {
        let mut curve = ProgressionCurve::linear();
        curve.add_point(0.6, 0.5).unwrap();
        let early = curve.add_point(0.2, 0.1).unwrap();
        assert_eq!(curve.sort_state(), SortState::Dirty);

        // Evaluation while dirty already uses x order
        assert_relative_eq!(curve.evaluate(0.1), 0.05);

        curve.ensure_sorted();
        assert_eq!(curve.sort_state(), SortState::Clean);
        assert_eq!(curve.points()[1].id, early);
        let xs: Vec<f64> = curve.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.2, 0.6, 1.0]);
    }

    #[test]
    fn test_remove_and_restore_point() {
        let mut curve = ProgressionCurve::linear();
        let id = curve.add_point(0.5, 0.9).unwrap();
        curve.ensure_sorted();
        let before = curve.clone();

        let (index, point) = curve.remove_point(id).unwrap();
        assert_eq!(index, 1);
        curve.restore_point(index, point);
        curve.ensure_sorted();
        assert_eq!(curve, before);
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let mut curve = ProgressionCurve::linear();
        assert!(matches!(curve.add_point(f64::NAN, 0.5), Err(AnimationError::InvalidMutation(_))));
        assert!(curve.add_point(0.5, f64::INFINITY).is_err());
        assert_eq!(curve.points().len(), 2);
        assert_eq!(curve.sort_state(), SortState::Clean);

        let id = curve.add_point(0.5, 0.5).unwrap();
        assert!(curve.move_point(id, 0.2, f64::NAN).is_err());
        let point = curve.point(id).unwrap();
        assert_eq!((point.x, point.y), (0.5, 0.5));
    }

    #[test]
    fn test_ties_sort_by_id_whatever_the_edit_order() {
        let mut curve = ProgressionCurve::linear();
        let a = curve.add_point(0.5, 0.2).unwrap();
        let b = curve.add_point(0.5, 0.8).unwrap();
        curve.ensure_sorted();
        let before = curve.clone();

        curve.move_point(a, 0.9, 0.2).unwrap();
        curve.ensure_sorted();
        curve.move_point(a, 0.5, 0.2).unwrap();
        curve.ensure_sorted();
        assert_eq!(curve, before);
        assert_eq!(curve.points()[1].id, a);
        assert_eq!(curve.points()[2].id, b);
    }

    #[test]
    fn test_from_coordinates() {
        let curve = ProgressionCurve::from_coordinates(&[(0.0, 0.0), (0.5, 0.2), (1.0, 1.0)]).unwrap();
        assert!(curve.points()[0].required);
        assert!(!curve.points()[1].required);
        assert!(curve.points()[2].required);
        assert_relative_eq!(curve.evaluate(0.5), 0.2);

        let err = ProgressionCurve::from_coordinates(&[(0.0, 0.0), (0.5, 0.5)]).unwrap_err();
        assert!(matches!(err, AnimationError::MalformedFile(_)));
    }
}
