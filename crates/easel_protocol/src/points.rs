//! Point sets for the polygon and line segment bulk commands
//!
//! Callers may hand over the points of many shapes in three layouts. All of them end up as one
//! flat point buffer, one int32 buffer with the number of points of every shape and the shape
//! count.

use crate::array::{ArrayData, DType, NdArray};
use crate::errors::ProtocolError;

/// What the points describe, which determines the minimum number of points per item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    LineSegments,
    Polygons,
}

impl ShapeKind {
    pub fn min_points(self) -> usize {
        match self {
            ShapeKind::LineSegments => 2,
            ShapeKind::Polygons => 3,
        }
    }
}

/// Points of several shapes as supplied by the caller
#[derive(Debug, Clone)]
pub enum PointSet {
    /// One `(n, 2)` array per item
    Items(Vec<NdArray>),
    /// All points as `(m, 2)` or `(2m,)`, plus the number of points of each item
    Flat { points: NdArray, counts: NdArray },
    /// `(items, points_per_item, 2)`: every item has the same number of points
    Uniform(NdArray),
}

/// Normalized point set, ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPoint {
    /// 1-D buffer of `2 * total points` coordinates
    pub points: NdArray,
    /// int32 number of points per item
    pub counts: NdArray,
    pub items: usize,
}

impl PointSet {
    pub fn normalize(&self, kind: ShapeKind) -> Result<MultiPoint, ProtocolError> {
        match self {
            PointSet::Items(items) => normalize_items(items, kind),
            PointSet::Flat { points, counts } => normalize_flat(points, counts, kind),
            PointSet::Uniform(points) => normalize_uniform(points, kind),
        }
    }
}

impl From<Vec<NdArray>> for PointSet {
    fn from(items: Vec<NdArray>) -> Self {
        PointSet::Items(items)
    }
}

/// Checks a single `(n, 2)` point list and returns its number of points
pub fn validate_polyline(points: &NdArray, kind: ShapeKind) -> Result<usize, ProtocolError> {
    let found = item_point_count(points).ok_or_else(|| ProtocolError::InvalidPointShape {
        index: 0,
        shape: points.shape().to_vec(),
    })?;
    check_min_points(0, found, kind)?;
    Ok(found)
}

fn item_point_count(item: &NdArray) -> Option<usize> {
    match item.shape() {
        [n, 2] => Some(*n),
        _ => None,
    }
}

fn check_min_points(index: usize, found: usize, kind: ShapeKind) -> Result<(), ProtocolError> {
    if found < kind.min_points() {
        return Err(ProtocolError::TooFewPoints {
            index,
            found,
            required: kind.min_points(),
        });
    }
    Ok(())
}

fn counts_array(counts: Vec<i32>) -> NdArray {
    NdArray::from(counts)
}

fn normalize_items(items: &[NdArray], kind: ShapeKind) -> Result<MultiPoint, ProtocolError> {
    let mut counts = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let found = item_point_count(item).ok_or_else(|| ProtocolError::InvalidPointShape {
            index,
            shape: item.shape().to_vec(),
        })?;
        check_min_points(index, found, kind)?;
        counts.push(found as i32);
    }

    // mixed inputs are promoted to float64
    let dtype = match items.first() {
        Some(first) if items.iter().all(|item| item.dtype() == first.dtype()) => first.dtype(),
        _ => DType::Float64,
    };

    let parts: Vec<ArrayData> = items
        .iter()
        .map(|item| item.astype(dtype).to_contiguous().data().clone())
        .collect();
    let data = ArrayData::concat(&parts).unwrap_or(ArrayData::Float64(Vec::new()));
    let total = data.len();

    Ok(MultiPoint {
        points: NdArray::new(vec![total], data)?,
        counts: counts_array(counts),
        items: items.len(),
    })
}

fn normalize_flat(
    points: &NdArray,
    counts: &NdArray,
    kind: ShapeKind,
) -> Result<MultiPoint, ProtocolError> {
    let supplied = match points.shape() {
        [m, 2] => *m,
        [len] if len % 2 == 0 => len / 2,
        shape => {
            return Err(ProtocolError::invalid(
                "points",
                format!("expected (m, 2) or (2m,) points, got shape {shape:?}"),
            ))
        }
    };

    if counts.ndim() != 1 {
        return Err(ProtocolError::invalid(
            "counts",
            format!("expected a 1-D array, got shape {:?}", counts.shape()),
        ));
    }

    let mut per_item = Vec::with_capacity(counts.len());
    for (index, count) in counts.to_f64_vec().into_iter().enumerate() {
        if !(count.is_finite() && (0.0..=i32::MAX as f64).contains(&count) && count.fract() == 0.0)
        {
            return Err(ProtocolError::invalid(
                "counts",
                format!("item {index} has a point count of {count}"),
            ));
        }
        let count = count as usize;
        check_min_points(index, count, kind)?;
        per_item.push(count as i32);
    }

    let expected = per_item
        .iter()
        .try_fold(0usize, |total, &count| total.checked_add(count as usize))
        .ok_or_else(|| ProtocolError::invalid("counts", "total point count overflows"))?;
    if expected != supplied {
        return Err(ProtocolError::PointCountMismatch {
            expected,
            found: supplied,
        });
    }

    Ok(MultiPoint {
        points: points.reshape(vec![supplied * 2])?,
        items: per_item.len(),
        counts: counts_array(per_item),
    })
}

fn normalize_uniform(points: &NdArray, kind: ShapeKind) -> Result<MultiPoint, ProtocolError> {
    let (items, per_item) = match points.shape() {
        [items, per_item, 2] => (*items, *per_item),
        shape => {
            return Err(ProtocolError::invalid(
                "points",
                format!("expected (items, points per item, 2), got shape {shape:?}"),
            ))
        }
    };

    if items > 0 {
        check_min_points(0, per_item, kind)?;
    }

    Ok(MultiPoint {
        points: points.reshape(vec![items * per_item * 2])?,
        counts: counts_array(vec![per_item as i32; items]),
        items,
    })
}
