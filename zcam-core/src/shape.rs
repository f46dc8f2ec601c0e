use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds2D, Point2, Vector2};

/// 圆弧/椭圆离散时每段允许的最大角度跨度。
pub const ANGULAR_STEP: f64 = PI / 32.0;
const MIN_CURVE_SEGMENTS: usize = 8;
const SPLINE_SAMPLES_PER_SPAN: usize = 8;
const FULL_TURN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(u64);

impl ShapeId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape-{}", self.0)
    }
}

/// 导入阶段产生的单个图元。创建后不可变，链检测只会生成反向副本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Line(Line),
    Arc(Arc),
    Circle(Circle),
    Polyline(Polyline),
    Spline(Spline),
    Ellipse(Ellipse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

/// 圆弧，角度以弧度储存；`clockwise` 决定从起始角走向结束角的方向。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    #[serde(default)]
    pub clockwise: bool,
}

/// 整圆，起止点都位于 0 弧度处。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
    #[serde(default)]
    pub clockwise: bool,
}

/// 椭圆，记录主轴向量、短长轴比与参数范围（弧度）。起止参数相同视为整椭圆。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2,
    pub major_axis: Vector2,
    pub ratio: f64,
    pub start_parameter: f64,
    pub end_parameter: f64,
    #[serde(default)]
    pub clockwise: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<PolylineVertex>,
    pub is_closed: bool,
}

/// 多段线顶点；`bulge` 作用于从该顶点出发的线段，正值为逆时针凸起。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolylineVertex {
    pub position: Point2,
    #[serde(default)]
    pub bulge: f64,
}

impl PolylineVertex {
    #[inline]
    pub fn new(position: Point2) -> Self {
        Self {
            position,
            bulge: 0.0,
        }
    }

    #[inline]
    pub fn with_bulge(position: Point2, bulge: f64) -> Self {
        Self { position, bulge }
    }
}

/// NURBS 样条。节点向量缺失或长度不符时按夹紧均匀节点处理；
/// 只有拟合点时按拟合点折线近似。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    pub degree: usize,
    #[serde(default)]
    pub control_points: Vec<Point2>,
    #[serde(default)]
    pub knots: Vec<f64>,
    #[serde(default)]
    pub weights: Vec<f64>,
    #[serde(default)]
    pub fit_points: Vec<Point2>,
}

impl Shape {
    pub fn new(id: ShapeId, geometry: Geometry) -> Self {
        Self {
            id,
            layer: None,
            geometry,
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn line(id: u64, start: Point2, end: Point2) -> Self {
        Self::new(ShapeId::new(id), Geometry::Line(Line { start, end }))
    }

    /// 逆时针圆弧。
    pub fn arc(id: u64, center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self::new(
            ShapeId::new(id),
            Geometry::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
                clockwise: false,
            }),
        )
    }

    pub fn circle(id: u64, center: Point2, radius: f64) -> Self {
        Self::new(
            ShapeId::new(id),
            Geometry::Circle(Circle {
                center,
                radius,
                clockwise: false,
            }),
        )
    }

    pub fn ellipse(
        id: u64,
        center: Point2,
        major_axis: Vector2,
        ratio: f64,
        start_parameter: f64,
        end_parameter: f64,
    ) -> Self {
        Self::new(
            ShapeId::new(id),
            Geometry::Ellipse(Ellipse {
                center,
                major_axis,
                ratio,
                start_parameter,
                end_parameter,
                clockwise: false,
            }),
        )
    }

    pub fn polyline<I>(id: u64, points: I, is_closed: bool) -> Self
    where
        I: IntoIterator<Item = Point2>,
    {
        let vertices = points.into_iter().map(PolylineVertex::new).collect();
        Self::new(
            ShapeId::new(id),
            Geometry::Polyline(Polyline {
                vertices,
                is_closed,
            }),
        )
    }

    pub fn polyline_with_vertices<I>(id: u64, vertices: I, is_closed: bool) -> Self
    where
        I: IntoIterator<Item = PolylineVertex>,
    {
        Self::new(
            ShapeId::new(id),
            Geometry::Polyline(Polyline {
                vertices: vertices.into_iter().collect(),
                is_closed,
            }),
        )
    }

    pub fn spline(id: u64, degree: usize, control_points: Vec<Point2>) -> Self {
        Self::new(
            ShapeId::new(id),
            Geometry::Spline(Spline {
                degree,
                control_points,
                knots: Vec::new(),
                weights: Vec::new(),
                fit_points: Vec::new(),
            }),
        )
    }

    #[inline]
    pub fn kind_name(&self) -> &'static str {
        match &self.geometry {
            Geometry::Line(_) => "line",
            Geometry::Arc(_) => "arc",
            Geometry::Circle(_) => "circle",
            Geometry::Polyline(_) => "polyline",
            Geometry::Spline(_) => "spline",
            Geometry::Ellipse(_) => "ellipse",
        }
    }

    /// 自身即构成闭环的图元：整圆、整椭圆与闭合多段线。
    pub fn is_inherently_closed(&self) -> bool {
        match &self.geometry {
            Geometry::Circle(_) => true,
            Geometry::Ellipse(ellipse) => ellipse.is_full(),
            Geometry::Polyline(polyline) => polyline.is_closed,
            Geometry::Line(_) | Geometry::Arc(_) | Geometry::Spline(_) => false,
        }
    }

    pub fn start_point(&self) -> Option<Point2> {
        let point = match &self.geometry {
            Geometry::Line(line) => Some(line.start),
            Geometry::Arc(arc) => arc.point_at(0.0),
            Geometry::Circle(circle) => circle.point_at(0.0),
            Geometry::Polyline(polyline) => polyline.vertices.first().map(|v| v.position),
            Geometry::Spline(spline) => spline.tessellate().first().copied(),
            Geometry::Ellipse(ellipse) => ellipse.point_at(0.0),
        };
        point.filter(|p| p.is_finite())
    }

    pub fn end_point(&self) -> Option<Point2> {
        let point = match &self.geometry {
            Geometry::Line(line) => Some(line.end),
            Geometry::Arc(arc) => arc.point_at(1.0),
            Geometry::Circle(circle) => circle.point_at(0.0),
            Geometry::Polyline(polyline) => {
                if polyline.is_closed {
                    polyline.vertices.first().map(|v| v.position)
                } else {
                    polyline.vertices.last().map(|v| v.position)
                }
            }
            Geometry::Spline(spline) => spline.tessellate().last().copied(),
            Geometry::Ellipse(ellipse) if ellipse.is_full() => ellipse.point_at(0.0),
            Geometry::Ellipse(ellipse) => ellipse.point_at(1.0),
        };
        point.filter(|p| p.is_finite())
    }

    /// 起点处沿行进方向的单位切向量。
    pub fn start_tangent(&self) -> Option<Vector2> {
        match &self.geometry {
            Geometry::Line(line) => Vector2::from_points(line.start, line.end).normalize(),
            Geometry::Arc(arc) => arc.tangent_at(0.0),
            Geometry::Circle(circle) => circle.tangent_at(0.0),
            Geometry::Ellipse(ellipse) => ellipse.tangent_at(0.0),
            Geometry::Polyline(polyline) => polyline.start_tangent(),
            Geometry::Spline(_) => head_direction(&self.tessellate()),
        }
    }

    /// 终点处沿行进方向的单位切向量。
    pub fn end_tangent(&self) -> Option<Vector2> {
        match &self.geometry {
            Geometry::Line(line) => Vector2::from_points(line.start, line.end).normalize(),
            Geometry::Arc(arc) => arc.tangent_at(1.0),
            Geometry::Circle(circle) => circle.tangent_at(1.0),
            Geometry::Ellipse(ellipse) => ellipse.tangent_at(1.0),
            Geometry::Polyline(polyline) => polyline.end_tangent(),
            Geometry::Spline(_) => tail_direction(&self.tessellate()),
        }
    }

    /// 生成反向副本：起点与终点互换，几何轨迹不变。
    pub fn reversed(&self) -> Shape {
        let geometry = match &self.geometry {
            Geometry::Line(line) => Geometry::Line(Line {
                start: line.end,
                end: line.start,
            }),
            Geometry::Arc(arc) => Geometry::Arc(Arc {
                center: arc.center,
                radius: arc.radius,
                start_angle: arc.end_angle,
                end_angle: arc.start_angle,
                clockwise: !arc.clockwise,
            }),
            Geometry::Circle(circle) => Geometry::Circle(Circle {
                center: circle.center,
                radius: circle.radius,
                clockwise: !circle.clockwise,
            }),
            Geometry::Ellipse(ellipse) => Geometry::Ellipse(Ellipse {
                center: ellipse.center,
                major_axis: ellipse.major_axis,
                ratio: ellipse.ratio,
                start_parameter: ellipse.end_parameter,
                end_parameter: ellipse.start_parameter,
                clockwise: !ellipse.clockwise,
            }),
            Geometry::Polyline(polyline) => Geometry::Polyline(polyline.reversed()),
            Geometry::Spline(spline) => Geometry::Spline(spline.reversed()),
        };
        Shape {
            id: self.id,
            layer: self.layer.clone(),
            geometry,
        }
    }

    /// 按行进方向离散为折线，首尾点即图元起止点；畸形几何返回空集合。
    pub fn tessellate(&self) -> Vec<Point2> {
        let points = match &self.geometry {
            Geometry::Line(line) => vec![line.start, line.end],
            Geometry::Arc(arc) => arc.tessellate(),
            Geometry::Circle(circle) => circle.tessellate(),
            Geometry::Polyline(polyline) => polyline.tessellate(),
            Geometry::Spline(spline) => spline.tessellate(),
            Geometry::Ellipse(ellipse) => ellipse.tessellate(),
        };
        if points.iter().all(|p| p.is_finite()) {
            points
        } else {
            Vec::new()
        }
    }

    pub fn bounds(&self) -> Option<Bounds2D> {
        match &self.geometry {
            Geometry::Arc(arc) => arc.bounds(),
            Geometry::Circle(circle) => circle.bounds(),
            _ => Bounds2D::from_points(self.tessellate()),
        }
    }

    pub fn length(&self) -> f64 {
        match &self.geometry {
            Geometry::Line(line) => line.start.distance(line.end),
            Geometry::Arc(arc) => arc.radius.abs() * arc.sweep(),
            Geometry::Circle(circle) => circle.radius.abs() * TAU,
            _ => polyline_length(&self.tessellate()),
        }
    }
}

impl Arc {
    /// 扫掠角（非负），起止角重合时为整圈。
    pub fn sweep(&self) -> f64 {
        let (from, to) = if self.clockwise {
            (self.end_angle, self.start_angle)
        } else {
            (self.start_angle, self.end_angle)
        };
        positive_span(from, to)
    }

    #[inline]
    fn direction(&self) -> f64 {
        if self.clockwise { -1.0 } else { 1.0 }
    }

    fn is_valid(&self) -> bool {
        self.radius.is_finite()
            && self.radius > f64::EPSILON
            && self.start_angle.is_finite()
            && self.end_angle.is_finite()
    }

    fn angle_at(&self, t: f64) -> f64 {
        self.start_angle + self.direction() * self.sweep() * t
    }

    /// `t` 为归一化参数（0 起点，1 终点）。
    pub fn point_at(&self, t: f64) -> Option<Point2> {
        if !self.is_valid() {
            return None;
        }
        Some(point_on_circle(self.center, self.radius, self.angle_at(t)))
    }

    pub fn tangent_at(&self, t: f64) -> Option<Vector2> {
        if !self.is_valid() {
            return None;
        }
        let angle = self.angle_at(t);
        Some(Vector2::new(-angle.sin(), angle.cos()).scale(self.direction()))
    }

    pub fn tessellate(&self) -> Vec<Point2> {
        if !self.is_valid() {
            return Vec::new();
        }
        let sweep = self.sweep();
        let segments = curve_segments(sweep);
        (0..=segments)
            .map(|i| {
                let t = i as f64 / segments as f64;
                point_on_circle(self.center, self.radius, self.angle_at(t))
            })
            .collect()
    }

    pub fn bounds(&self) -> Option<Bounds2D> {
        if !self.is_valid() {
            return None;
        }
        let (start, end) = if self.clockwise {
            (self.end_angle, self.start_angle)
        } else {
            (self.start_angle, self.end_angle)
        };
        let (start, end) = canonical_interval(start, end);
        let mut bounds = Bounds2D::empty();
        bounds.include_point(point_on_circle(self.center, self.radius, start));
        bounds.include_point(point_on_circle(self.center, self.radius, end));

        const QUADRANTS: [f64; 4] = [0.0, FRAC_PI_2, PI, FRAC_PI_2 * 3.0];
        for base in QUADRANTS {
            let mut candidate = base;
            while candidate < start {
                candidate += TAU;
            }
            if candidate <= end {
                bounds.include_point(point_on_circle(self.center, self.radius, candidate));
            }
        }
        Some(bounds)
    }
}

impl Circle {
    fn as_arc(&self) -> Arc {
        Arc {
            center: self.center,
            radius: self.radius,
            start_angle: 0.0,
            end_angle: 0.0,
            clockwise: self.clockwise,
        }
    }

    pub fn point_at(&self, t: f64) -> Option<Point2> {
        self.as_arc().point_at(t)
    }

    pub fn tangent_at(&self, t: f64) -> Option<Vector2> {
        self.as_arc().tangent_at(t)
    }

    pub fn tessellate(&self) -> Vec<Point2> {
        self.as_arc().tessellate()
    }

    pub fn bounds(&self) -> Option<Bounds2D> {
        if !(self.radius.is_finite() && self.radius > f64::EPSILON) {
            return None;
        }
        let r = self.radius;
        Some(Bounds2D::new(
            Point2::new(self.center.x() - r, self.center.y() - r),
            Point2::new(self.center.x() + r, self.center.y() + r),
        ))
    }
}

impl Ellipse {
    pub fn is_full(&self) -> bool {
        let span = (self.end_parameter - self.start_parameter).abs();
        span < FULL_TURN_EPSILON || (span - TAU).abs() < FULL_TURN_EPSILON
    }

    pub fn sweep(&self) -> f64 {
        if self.is_full() {
            return TAU;
        }
        let (from, to) = if self.clockwise {
            (self.end_parameter, self.start_parameter)
        } else {
            (self.start_parameter, self.end_parameter)
        };
        positive_span(from, to)
    }

    #[inline]
    fn direction(&self) -> f64 {
        if self.clockwise { -1.0 } else { 1.0 }
    }

    fn axes(&self) -> Option<(DVec2, DVec2)> {
        let major = self.major_axis.as_vec2();
        if !major.is_finite()
            || major.length_squared() <= f64::EPSILON
            || !self.ratio.is_finite()
            || self.ratio.abs() <= f64::EPSILON
            || !self.start_parameter.is_finite()
            || !self.end_parameter.is_finite()
        {
            return None;
        }
        let minor = major.perp() * self.ratio.abs();
        Some((major, minor))
    }

    fn parameter_at(&self, t: f64) -> f64 {
        self.start_parameter + self.direction() * self.sweep() * t
    }

    pub fn point_at(&self, t: f64) -> Option<Point2> {
        let (major, minor) = self.axes()?;
        let param = self.parameter_at(t);
        let offset = major * param.cos() + minor * param.sin();
        Some(self.center.translate(Vector2::from(offset)))
    }

    pub fn tangent_at(&self, t: f64) -> Option<Vector2> {
        let (major, minor) = self.axes()?;
        let param = self.parameter_at(t);
        let derivative = (minor * param.cos() - major * param.sin()) * self.direction();
        Vector2::from(derivative).normalize()
    }

    pub fn tessellate(&self) -> Vec<Point2> {
        if self.axes().is_none() {
            return Vec::new();
        }
        let segments = curve_segments(self.sweep());
        (0..=segments)
            .filter_map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }
}

impl Polyline {
    fn segment_count(&self) -> usize {
        let n = self.vertices.len();
        if n < 2 {
            0
        } else if self.is_closed {
            n
        } else {
            n - 1
        }
    }

    fn segment(&self, index: usize) -> (Point2, Point2, f64) {
        let n = self.vertices.len();
        let from = self.vertices[index];
        let to = self.vertices[(index + 1) % n];
        (from.position, to.position, from.bulge)
    }

    pub fn start_tangent(&self) -> Option<Vector2> {
        if self.segment_count() == 0 {
            return None;
        }
        let (from, to, bulge) = self.segment(0);
        bulge_tangents(from, to, bulge).map(|(start, _)| start)
    }

    pub fn end_tangent(&self) -> Option<Vector2> {
        let count = self.segment_count();
        if count == 0 {
            return None;
        }
        let (from, to, bulge) = self.segment(count - 1);
        bulge_tangents(from, to, bulge).map(|(_, end)| end)
    }

    pub fn tessellate(&self) -> Vec<Point2> {
        let count = self.segment_count();
        if count == 0 {
            return self.vertices.iter().map(|v| v.position).collect();
        }
        let mut points = vec![self.vertices[0].position];
        for index in 0..count {
            let (from, to, bulge) = self.segment(index);
            append_bulge_segment(&mut points, from, to, bulge);
        }
        points
    }

    /// 反向多段线：顶点逆序，凸度随线段反向取负。闭合多段线保持起点不变。
    pub fn reversed(&self) -> Polyline {
        let n = self.vertices.len();
        if n < 2 {
            return self.clone();
        }
        let vertices = if self.is_closed {
            (0..n)
                .map(|k| {
                    let position = self.vertices[(n - k) % n].position;
                    let bulge = -self.vertices[(2 * n - k - 1) % n].bulge;
                    PolylineVertex::with_bulge(position, bulge)
                })
                .collect()
        } else {
            (0..n)
                .map(|k| {
                    let position = self.vertices[n - 1 - k].position;
                    let bulge = if k + 1 < n {
                        -self.vertices[n - 2 - k].bulge
                    } else {
                        0.0
                    };
                    PolylineVertex::with_bulge(position, bulge)
                })
                .collect()
        };
        Polyline {
            vertices,
            is_closed: self.is_closed,
        }
    }
}

impl Spline {
    fn effective_degree(&self) -> usize {
        self.degree
            .clamp(1, self.control_points.len().saturating_sub(1).max(1))
    }

    /// 返回可用的节点向量；外部节点不合法时生成夹紧均匀节点。
    fn knot_vector(&self) -> Vec<f64> {
        let n = self.control_points.len();
        let p = self.effective_degree();
        let expected = n + p + 1;
        let monotonic = self.knots.windows(2).all(|w| w[0] <= w[1]);
        if self.knots.len() == expected
            && monotonic
            && self.knots.iter().all(|k| k.is_finite())
            && self.knots[n] > self.knots[p]
        {
            return self.knots.clone();
        }

        let interior = n - p;
        let mut knots = Vec::with_capacity(expected);
        knots.extend(std::iter::repeat_n(0.0, p + 1));
        for i in 1..interior {
            knots.push(i as f64 / interior as f64);
        }
        knots.extend(std::iter::repeat_n(1.0, p + 1));
        knots
    }

    fn weight(&self, index: usize) -> f64 {
        if self.weights.len() == self.control_points.len() {
            self.weights[index]
        } else {
            1.0
        }
    }

    /// de Boor 求值（齐次坐标，支持有理样条）。
    fn evaluate(&self, knots: &[f64], u: f64) -> Option<Point2> {
        let n = self.control_points.len();
        let p = self.effective_degree();
        let mut span = p;
        while span + 1 < n && knots[span + 1] <= u {
            span += 1;
        }

        let mut d: Vec<(DVec2, f64)> = (0..=p)
            .map(|j| {
                let index = j + span - p;
                let w = self.weight(index);
                (self.control_points[index].as_vec2() * w, w)
            })
            .collect();

        for r in 1..=p {
            for j in (r..=p).rev() {
                let left = knots[j + span - p];
                let right = knots[j + 1 + span - r];
                let denom = right - left;
                let alpha = if denom.abs() <= f64::EPSILON {
                    0.0
                } else {
                    (u - left) / denom
                };
                let (prev_p, prev_w) = d[j - 1];
                let (cur_p, cur_w) = d[j];
                d[j] = (
                    prev_p * (1.0 - alpha) + cur_p * alpha,
                    prev_w * (1.0 - alpha) + cur_w * alpha,
                );
            }
        }

        let (point, w) = d[p];
        if w.abs() <= f64::EPSILON {
            return None;
        }
        Some(Point2::from_vec(point / w))
    }

    pub fn tessellate(&self) -> Vec<Point2> {
        let n = self.control_points.len();
        if n < 2 {
            return self.fit_points.clone();
        }
        let p = self.effective_degree();
        let knots = self.knot_vector();
        let (start, end) = (knots[p], knots[n]);
        let samples = (SPLINE_SAMPLES_PER_SPAN * (n - p)).max(MIN_CURVE_SEGMENTS * 2);
        (0..=samples)
            .filter_map(|i| {
                let u = start + (end - start) * (i as f64 / samples as f64);
                self.evaluate(&knots, u)
            })
            .collect()
    }

    pub fn reversed(&self) -> Spline {
        let mut control_points = self.control_points.clone();
        control_points.reverse();
        let mut weights = self.weights.clone();
        weights.reverse();
        let mut fit_points = self.fit_points.clone();
        fit_points.reverse();
        let knots = match (self.knots.first(), self.knots.last()) {
            (Some(first), Some(last)) => self
                .knots
                .iter()
                .rev()
                .map(|k| first + last - k)
                .collect(),
            _ => Vec::new(),
        };
        Spline {
            degree: self.degree,
            control_points,
            knots,
            weights,
            fit_points,
        }
    }
}

/// 离散折线的总长度。
pub fn polyline_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

fn head_direction(points: &[Point2]) -> Option<Vector2> {
    let first = *points.first()?;
    points
        .iter()
        .skip(1)
        .find_map(|p| Vector2::from_points(first, *p).normalize())
}

fn tail_direction(points: &[Point2]) -> Option<Vector2> {
    let last = *points.last()?;
    points
        .iter()
        .rev()
        .skip(1)
        .find_map(|p| Vector2::from_points(*p, last).normalize())
}

fn point_on_circle(center: Point2, radius: f64, angle: f64) -> Point2 {
    let offset = Vector2::new(radius * angle.cos(), radius * angle.sin());
    center.translate(offset)
}

fn curve_segments(sweep: f64) -> usize {
    ((sweep.abs() / ANGULAR_STEP - 1e-9).ceil() as usize).max(MIN_CURVE_SEGMENTS)
}

fn normalize_angle(angle: f64) -> f64 {
    let mut result = angle % TAU;
    if result < 0.0 {
        result += TAU;
    }
    result
}

/// 从 `from` 逆时针走到 `to` 的跨度，取值 (0, 2π]。
fn positive_span(from: f64, to: f64) -> f64 {
    let span = normalize_angle(to - from);
    if span < FULL_TURN_EPSILON { TAU } else { span }
}

fn canonical_interval(start: f64, end: f64) -> (f64, f64) {
    let start = normalize_angle(start);
    let mut end = normalize_angle(end);
    if (end - start).abs() < FULL_TURN_EPSILON {
        end = start + TAU;
    } else if end < start {
        end += TAU;
    }
    (start, end)
}

/// 凸度线段在起点与终点处的切向量。
fn bulge_tangents(from: Point2, to: Point2, bulge: f64) -> Option<(Vector2, Vector2)> {
    let chord = Vector2::from_points(from, to).normalize()?;
    if bulge.abs() <= 1e-9 {
        return Some((chord, chord));
    }
    let half_theta = 2.0 * bulge.atan();
    Some((chord.rotated(-half_theta), chord.rotated(half_theta)))
}

fn append_bulge_segment(points: &mut Vec<Point2>, from: Point2, to: Point2, bulge: f64) {
    let chord = to.as_vec2() - from.as_vec2();
    let chord_len = chord.length();
    if bulge.abs() <= 1e-9 || chord_len <= f64::EPSILON {
        points.push(to);
        return;
    }

    let theta = 4.0 * bulge.atan();
    let half_theta = theta / 2.0;
    let radius = (chord_len / (2.0 * half_theta.sin())).abs();
    let midpoint = (from.as_vec2() + to.as_vec2()) * 0.5;
    let left = chord.perp() / chord_len;
    let center = midpoint + left * (chord_len / 2.0) / half_theta.tan();

    let start_dir = from.as_vec2() - center;
    let start_angle = start_dir.y.atan2(start_dir.x);
    let segments = curve_segments(theta);
    for i in 1..segments {
        let angle = start_angle + theta * (i as f64 / segments as f64);
        points.push(point_on_circle(Point2::from_vec(center), radius, angle));
    }
    points.push(to);
}
