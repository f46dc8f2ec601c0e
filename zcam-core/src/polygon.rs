//! 多边形辅助函数：射线法点包含、带符号面积、质心与边界距离。
//!
//! 多边形以顶点序列表示，首尾隐式相连；若末点与首点重合也能正确处理。

use crate::geometry::Point2;

/// 射线法判断点是否位于多边形内部。边界上的点结果不确定，调用方需自行留容差。
pub fn point_in_polygon(point: Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let (px, py) = (point.x(), point.y());
    let mut inside = false;

    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i].x(), polygon[i].y());
        let (xj, yj) = (polygon[j].x(), polygon[j].y());

        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// 带符号面积（鞋带公式），逆时针为正。
pub fn signed_area(polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        sum += a.x() * b.y() - b.x() * a.y();
    }
    sum * 0.5
}

/// 面积加权质心；面积退化时退化为顶点平均值。
pub fn centroid(polygon: &[Point2]) -> Option<Point2> {
    if polygon.is_empty() {
        return None;
    }
    let area = signed_area(polygon);
    if area.abs() > f64::EPSILON {
        let n = polygon.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            let cross = a.x() * b.y() - b.x() * a.y();
            cx += (a.x() + b.x()) * cross;
            cy += (a.y() + b.y()) * cross;
        }
        let factor = 1.0 / (6.0 * area);
        return Some(Point2::new(cx * factor, cy * factor));
    }

    let count = polygon.len() as f64;
    let sum = polygon
        .iter()
        .fold(glam::DVec2::ZERO, |acc, point| acc + point.as_vec2());
    Some(Point2::from_vec(sum / count))
}

/// 点到线段的最短距离。
pub fn distance_to_segment(point: Point2, start: Point2, end: Point2) -> f64 {
    let p = point.as_vec2();
    let a = start.as_vec2();
    let b = end.as_vec2();
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// 点到闭合多边形边界的最短距离。
pub fn distance_to_boundary(point: Point2, polygon: &[Point2]) -> f64 {
    match polygon.len() {
        0 => f64::INFINITY,
        1 => point.distance(polygon[0]),
        n => (0..n)
            .map(|i| distance_to_segment(point, polygon[i], polygon[(i + 1) % n]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    #[test]
    fn ray_casting_classifies_points() {
        let polygon = square(10.0);
        assert!(point_in_polygon(Point2::new(5.0, 5.0), &polygon));
        assert!(!point_in_polygon(Point2::new(15.0, 5.0), &polygon));
        assert!(!point_in_polygon(Point2::new(-1.0, -1.0), &polygon));
        assert!(!point_in_polygon(Point2::new(5.0, 5.0), &polygon[..2]));
    }

    #[test]
    fn concave_polygon_excludes_notch() {
        // U 形：中间缺口不属于内部。
        let polygon = vec![
            Point2::new(0.0, 0.0),
            Point2::new(30.0, 0.0),
            Point2::new(30.0, 30.0),
            Point2::new(20.0, 30.0),
            Point2::new(20.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 30.0),
            Point2::new(0.0, 30.0),
        ];
        assert!(!point_in_polygon(Point2::new(15.0, 20.0), &polygon));
        assert!(point_in_polygon(Point2::new(5.0, 20.0), &polygon));
    }

    #[test]
    fn signed_area_follows_winding() {
        let mut polygon = square(2.0);
        assert!((signed_area(&polygon) - 4.0).abs() < 1e-12);
        polygon.reverse();
        assert!((signed_area(&polygon) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_of_square_is_center() {
        let c = centroid(&square(4.0)).expect("centroid");
        assert!((c.x() - 2.0).abs() < 1e-12);
        assert!((c.y() - 2.0).abs() < 1e-12);

        let degenerate = [Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)];
        let c = centroid(&degenerate).expect("vertex mean");
        assert!((c.x() - 1.0).abs() < 1e-12);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn boundary_distance_uses_segments() {
        let polygon = square(10.0);
        assert!((distance_to_boundary(Point2::new(5.0, 3.0), &polygon) - 3.0).abs() < 1e-12);
        assert!((distance_to_boundary(Point2::new(12.0, 5.0), &polygon) - 2.0).abs() < 1e-12);
    }
}
