use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds2D, Point2, Vector2};
use crate::polygon;
use crate::shape::{Shape, polyline_length};

/// 首尾点判定闭合时的默认容差。
pub const DEFAULT_CLOSURE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(u64);

impl ChainId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain-{}", self.0)
    }
}

/// 首尾相接的图元序列，构成一条连续切割路径。
///
/// 相邻图元在拼接容差内共享端点；包围盒在构造时计算，离散边界按需缓存。
#[derive(Debug, Clone)]
pub struct ShapeChain {
    id: ChainId,
    shapes: Vec<Shape>,
    bounds: Option<Bounds2D>,
    boundary: OnceLock<Vec<Point2>>,
}

impl ShapeChain {
    pub fn new(id: ChainId, shapes: Vec<Shape>) -> Self {
        let mut bounds = Bounds2D::empty();
        for shape in &shapes {
            if let Some(shape_bounds) = shape.bounds() {
                bounds.include_bounds(&shape_bounds);
            }
        }
        Self {
            id,
            shapes,
            bounds: if bounds.is_empty() { None } else { Some(bounds) },
            boundary: OnceLock::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ChainId {
        self.id
    }

    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[inline]
    pub fn bounds(&self) -> Option<Bounds2D> {
        self.bounds
    }

    pub fn start_point(&self) -> Option<Point2> {
        self.shapes.first().and_then(Shape::start_point)
    }

    pub fn end_point(&self) -> Option<Point2> {
        self.shapes.last().and_then(Shape::end_point)
    }

    pub fn start_tangent(&self) -> Option<Vector2> {
        self.shapes.first().and_then(Shape::start_tangent)
    }

    pub fn end_tangent(&self) -> Option<Vector2> {
        self.shapes.last().and_then(Shape::end_tangent)
    }

    /// 闭合判定：单个整圆/整椭圆/闭合多段线天然闭合，否则比较首尾点距离。
    pub fn is_closed(&self, tolerance: f64) -> bool {
        if let [only] = self.shapes.as_slice() {
            if only.is_inherently_closed() {
                return true;
            }
        }
        match (self.start_point(), self.end_point()) {
            (Some(start), Some(end)) => start.distance(end) <= tolerance,
            _ => false,
        }
    }

    /// 整条链按行进方向离散后的点序列，已去除相邻重复点。
    pub fn boundary(&self) -> &[Point2] {
        self.boundary.get_or_init(|| {
            let mut points: Vec<Point2> = Vec::new();
            for shape in &self.shapes {
                for point in shape.tessellate() {
                    let duplicate = points
                        .last()
                        .is_some_and(|last| last.distance(point) <= 1e-9);
                    if !duplicate {
                        points.push(point);
                    }
                }
            }
            points
        })
    }

    pub fn length(&self) -> f64 {
        polyline_length(self.boundary())
    }

    /// 闭合边界的带符号面积，逆时针为正。
    pub fn signed_area(&self) -> f64 {
        polygon::signed_area(self.boundary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_chain(offset: f64) -> ShapeChain {
        let p = |x: f64, y: f64| Point2::new(x, y);
        ShapeChain::new(
            ChainId::new(1),
            vec![
                Shape::line(1, p(0.0, 0.0), p(10.0, 0.0)),
                Shape::line(2, p(10.0, 0.0), p(10.0, 10.0)),
                Shape::line(3, p(10.0, 10.0), p(0.0, 10.0)),
                Shape::line(4, p(0.0, 10.0), p(0.0, offset)),
            ],
        )
    }

    #[test]
    fn square_is_closed_within_tolerance() {
        let chain = square_chain(0.0);
        assert!(chain.is_closed(DEFAULT_CLOSURE_TOLERANCE));
        assert_eq!(chain.boundary().len(), 5);
        assert!((chain.signed_area() - 100.0).abs() < 1e-9);
        assert!((chain.length() - 40.0).abs() < 1e-9);

        let bounds = chain.bounds().expect("bounds");
        assert_eq!(bounds.width(), 10.0);
        assert_eq!(bounds.height(), 10.0);
    }

    #[test]
    fn offset_vertex_breaks_closure() {
        let chain = square_chain(0.5);
        assert!(!chain.is_closed(DEFAULT_CLOSURE_TOLERANCE));
        assert!(chain.is_closed(1.0));
    }

    #[test]
    fn single_circle_chain_is_closed() {
        let chain = ShapeChain::new(
            ChainId::new(7),
            vec![Shape::circle(1, Point2::new(0.0, 0.0), 3.0)],
        );
        assert!(chain.is_closed(0.0));
        assert_eq!(chain.id().to_string(), "chain-7");
    }

    #[test]
    fn empty_chain_has_no_geometry() {
        let chain = ShapeChain::new(ChainId::new(1), Vec::new());
        assert!(chain.is_empty());
        assert!(chain.bounds().is_none());
        assert!(chain.start_point().is_none());
        assert!(!chain.is_closed(DEFAULT_CLOSURE_TOLERANCE));
        assert!(chain.boundary().is_empty());
    }
}
