use std::f64::consts::FRAC_PI_2;

use tracing::{debug, trace, warn};
use zcam_core::chain::{DEFAULT_CLOSURE_TOLERANCE, ShapeChain};
use zcam_core::geometry::{Bounds2D, Point2, Vector2};
use zcam_core::lead::{CutDirection, LeadConfig, LeadEnd, LeadGeometry, LeadKind, LeadResult};
use zcam_core::part::{ChainRole, DetectedPart};
use zcam_core::polygon;

use crate::validation::validate_lead_configuration_with_tolerance;

pub const ROTATION_STEP_DEGREES: f64 = 5.0;
pub const ROTATION_STEPS: usize = 72;
/// 避让搜索依次尝试的长度比例。
pub const LENGTH_TIERS: [f64; 4] = [1.0, 0.75, 0.5, 0.25];

const ARC_SWEEP: f64 = FRAC_PI_2;
const ARC_SEGMENTS: usize = 16;
/// 孔质心在该倍数的引线长度内时，外轮廓引线偏向该孔。
const HOLE_BIAS_FACTOR: f64 = 3.0;
const COLLISION_SAMPLES: usize = 20;
/// 距链自身边界不超过该值的采样点视为贴边。
const BOUNDARY_CLEARANCE: f64 = DEFAULT_CLOSURE_TOLERANCE;
/// 贴边豁免只作用于连接点附近：距连接点不超过引线长度的该比例。
const ANCHOR_ZONE_RATIO: f64 = 0.25;
const ANCHOR_EPSILON: f64 = 1e-9;
const CURVATURE_EPSILON: f64 = 1e-12;

/// 引线连接处的局部坐标：`tangent` 为链的行进方向，`side` 为引线所在一侧的单位法向。
#[derive(Debug, Clone, Copy)]
struct Frame {
    anchor: Point2,
    tangent: Vector2,
    side: Vector2,
}

impl Frame {
    /// 绕连接点整体旋转。
    fn rotated(self, angle: f64) -> Self {
        Self {
            anchor: self.anchor,
            tangent: self.tangent.rotated(angle),
            side: self.side.rotated(angle),
        }
    }
}

struct Placement {
    geometry: LeadGeometry,
    warning: Option<String>,
}

/// 计算链的引入/引出线。
///
/// 先校验两份配置，存在错误时直接返回且不生成几何。提供零件上下文时，
/// 候选引线若有采样点落入实体区域，会按 5° 步进旋转并逐级缩短长度重试；
/// 全部失败则退回基准方向和原长度，并附加警告。闭合判定使用默认容差。
pub fn calculate_leads(
    chain: &ShapeChain,
    lead_in: &LeadConfig,
    lead_out: &LeadConfig,
    cut_direction: CutDirection,
    part: Option<&DetectedPart<'_>>,
) -> LeadResult {
    calculate_leads_with_tolerance(
        chain,
        lead_in,
        lead_out,
        cut_direction,
        part,
        DEFAULT_CLOSURE_TOLERANCE,
    )
}

/// 同 [`calculate_leads`]，闭合判定使用调用方给定的容差，需与零件检测保持一致。
pub fn calculate_leads_with_tolerance(
    chain: &ShapeChain,
    lead_in: &LeadConfig,
    lead_out: &LeadConfig,
    cut_direction: CutDirection,
    part: Option<&DetectedPart<'_>>,
    closure_tolerance: f64,
) -> LeadResult {
    let mut validation = validate_lead_configuration_with_tolerance(
        lead_in,
        chain,
        cut_direction,
        part,
        closure_tolerance,
    );
    validation.merge(validate_lead_configuration_with_tolerance(
        lead_out,
        chain,
        cut_direction,
        part,
        closure_tolerance,
    ));

    let mut result = LeadResult {
        warnings: validation.warnings.clone(),
        validation,
        ..LeadResult::default()
    };
    if result.validation.has_errors() {
        debug!(chain = %chain.id(), "引线配置存在错误，跳过计算");
        return result;
    }

    let solid = part.map(|part| SolidRegion::new(part, chain));
    let builder = LeadBuilder {
        chain,
        cut_direction,
        closure_tolerance,
        part,
        role: part.and_then(|part| part.role_of(chain.id())),
        solid: solid.as_ref(),
    };

    for (end, config) in [(LeadEnd::In, lead_in), (LeadEnd::Out, lead_out)] {
        if !config.is_active() {
            continue;
        }
        let Some(placement) = builder.build(end, config) else {
            debug!(chain = %chain.id(), end = %end, "链端点几何无效，未生成引线");
            continue;
        };
        if let Some(warning) = placement.warning {
            result.warnings.push(warning);
        }
        match end {
            LeadEnd::In => result.lead_in = Some(placement.geometry),
            LeadEnd::Out => result.lead_out = Some(placement.geometry),
        }
    }

    debug!(
        chain = %chain.id(),
        lead_in = result.lead_in.is_some(),
        lead_out = result.lead_out.is_some(),
        warnings = result.warnings.len(),
        "引线计算完成"
    );
    result
}

struct LeadBuilder<'a> {
    chain: &'a ShapeChain,
    cut_direction: CutDirection,
    closure_tolerance: f64,
    part: Option<&'a DetectedPart<'a>>,
    role: Option<ChainRole>,
    solid: Option<&'a SolidRegion<'a>>,
}

impl LeadBuilder<'_> {
    fn build(&self, end: LeadEnd, config: &LeadConfig) -> Option<Placement> {
        let (anchor, tangent) = match end {
            LeadEnd::In => (self.chain.start_point()?, self.chain.start_tangent()?),
            LeadEnd::Out => (self.chain.end_point()?, self.chain.end_tangent()?),
        };
        let tangent = tangent.normalize()?;

        if let Some(degrees) = config.angle {
            // 手动角度直接使用，不做避让
            let side = Vector2::from_angle(degrees.to_radians());
            let normal = side.perp();
            let tangent = if normal.dot(tangent) >= 0.0 {
                normal
            } else {
                -normal
            };
            let frame = Frame {
                anchor,
                tangent,
                side,
            };
            return Some(Placement {
                geometry: tessellate(end, config.kind, frame, config.length),
                warning: None,
            });
        }

        let base = Frame {
            anchor,
            tangent,
            side: self.base_side(end, anchor, tangent, config),
        };
        let Some(solid) = self.solid else {
            return Some(Placement {
                geometry: tessellate(end, config.kind, base, config.length),
                warning: None,
            });
        };

        let tiers = if config.allows_shrink() {
            &LENGTH_TIERS[..]
        } else {
            &LENGTH_TIERS[..1]
        };
        for &tier in tiers {
            let length = config.length * tier;
            for step in 0..ROTATION_STEPS {
                let angle = (step as f64 * ROTATION_STEP_DEGREES).to_radians();
                let geometry = tessellate(end, config.kind, base.rotated(angle), length);
                let violations = solid.violations(&geometry.points, anchor, length);
                trace!(
                    chain = %self.chain.id(),
                    end = %end,
                    tier,
                    step,
                    violations,
                    "引线避让尝试"
                );
                if violations == 0 {
                    if step > 0 || tier < 1.0 {
                        debug!(
                            chain = %self.chain.id(),
                            end = %end,
                            rotation = step as f64 * ROTATION_STEP_DEGREES,
                            length,
                            "引线避让成功"
                        );
                    }
                    return Some(Placement {
                        geometry,
                        warning: None,
                    });
                }
            }
        }

        let label = match end {
            LeadEnd::In => "Lead-in",
            LeadEnd::Out => "Lead-out",
        };
        let role = self.role.map_or("shape", |role| role.describe());
        warn!(chain = %self.chain.id(), end = %end, role, "引线无法避开实体区域，退回基准方向");
        Some(Placement {
            geometry: tessellate(end, config.kind, base, config.length),
            warning: Some(format!(
                "{label} for {role} {} cannot be avoided from solid material; \
                 shorten the lead, flip its side or set a manual angle",
                self.chain.id()
            )),
        })
    }

    /// 基准侧：孔偏置优先，其次切割方向，最后按闭合链绕向或局部曲率推断。
    fn base_side(
        &self,
        end: LeadEnd,
        anchor: Point2,
        tangent: Vector2,
        config: &LeadConfig,
    ) -> Vector2 {
        let left = tangent.perp();
        let side = self
            .hole_bias(anchor, left, config.length)
            .unwrap_or_else(|| match self.effective_direction() {
                CutDirection::None => self.curvature_side(end, left),
                direction => self.direction_side(direction, left),
            });
        if config.flip_side { -side } else { side }
    }

    fn hole_bias(&self, anchor: Point2, left: Vector2, length: f64) -> Option<Vector2> {
        if self.role != Some(ChainRole::Shell) {
            return None;
        }
        let reach = HOLE_BIAS_FACTOR * length;
        let target = self
            .part?
            .holes
            .iter()
            .filter_map(|hole| polygon::centroid(hole.chain.boundary()))
            .map(|centroid| (anchor.distance(centroid), centroid))
            .filter(|(distance, _)| *distance <= reach)
            .min_by(|a, b| a.0.total_cmp(&b.0))?
            .1;
        let toward = anchor.vector_to(target);
        Some(if left.dot(toward) >= 0.0 { left } else { -left })
    }

    /// 未指定方向时，闭合链按其绕向视为对应的切割方向。
    ///
    /// 绕向只取决于整体面积，起点落在凹角处也能把外轮廓引线放到外侧；
    /// 局部曲率只留给开放链和面积退化的闭合链。
    fn effective_direction(&self) -> CutDirection {
        if self.cut_direction != CutDirection::None
            || !self.chain.is_closed(self.closure_tolerance)
        {
            return self.cut_direction;
        }
        let area = self.chain.signed_area();
        if area > f64::EPSILON {
            CutDirection::Counterclockwise
        } else if area < -f64::EPSILON {
            CutDirection::Clockwise
        } else {
            CutDirection::None
        }
    }

    /// 顺时针：外轮廓在左侧进刀、孔在右侧；逆时针相反。均落在废料一侧。
    fn direction_side(&self, direction: CutDirection, left: Vector2) -> Vector2 {
        let is_hole = self.role == Some(ChainRole::Hole);
        let on_left = match direction {
            CutDirection::Clockwise => !is_hole,
            CutDirection::Counterclockwise => is_hole,
            CutDirection::None => true,
        };
        if on_left { left } else { -left }
    }

    /// 由连接点附近三个离散点的转向判断凹侧：外轮廓取外侧，孔取内侧。
    fn curvature_side(&self, end: LeadEnd, left: Vector2) -> Vector2 {
        let points = self.chain.boundary();
        let n = points.len();
        if n < 3 {
            return left;
        }
        let (p0, p1, p2) = match end {
            LeadEnd::In => (points[0], points[1], points[2]),
            LeadEnd::Out => (points[n - 3], points[n - 2], points[n - 1]),
        };
        let turn = p0.vector_to(p1).cross(p1.vector_to(p2));
        if turn.abs() <= CURVATURE_EPSILON {
            return left;
        }
        let concave = if turn > 0.0 { left } else { -left };
        if self.role == Some(ChainRole::Hole) {
            concave
        } else {
            -concave
        }
    }
}

fn tessellate(end: LeadEnd, kind: LeadKind, frame: Frame, length: f64) -> LeadGeometry {
    let points = match kind {
        LeadKind::None => Vec::new(),
        // 直线引线沿所选侧的法向，与链在连接点处垂直
        LeadKind::Line => {
            let far = frame.anchor.translate(frame.side.scale(length));
            match end {
                LeadEnd::In => vec![far, frame.anchor],
                LeadEnd::Out => vec![frame.anchor, far],
            }
        }
        LeadKind::Arc => arc_points(end, frame, length),
    };
    LeadGeometry { kind, points }
}

/// 90° 圆弧引线，弧长等于引线长度。连接点取精确值，相邻点沿切向对齐以消除折角。
fn arc_points(end: LeadEnd, frame: Frame, length: f64) -> Vec<Point2> {
    let radius = length / ARC_SWEEP;
    let center = frame.anchor.translate(frame.side.scale(radius));
    let radial = center.vector_to(frame.anchor);
    let base_angle = radial.angle();
    // 连接点处逆时针方向的切向为 radial.perp()
    let turn = if radial.perp().dot(frame.tangent) >= 0.0 {
        1.0
    } else {
        -1.0
    };
    let step = ARC_SWEEP / ARC_SEGMENTS as f64;
    let chord = 2.0 * radius * (step * 0.5).sin();

    let mut points: Vec<Point2> = (0..=ARC_SEGMENTS)
        .map(|k| {
            let offset = match end {
                LeadEnd::In => -((ARC_SEGMENTS - k) as f64) * step,
                LeadEnd::Out => k as f64 * step,
            };
            center.translate(Vector2::from_angle(base_angle + turn * offset).scale(radius))
        })
        .collect();

    match end {
        LeadEnd::In => {
            points[ARC_SEGMENTS] = frame.anchor;
            points[ARC_SEGMENTS - 1] = frame.anchor.translate(frame.tangent.scale(-chord));
        }
        LeadEnd::Out => {
            points[0] = frame.anchor;
            points[1] = frame.anchor.translate(frame.tangent.scale(chord));
        }
    }
    points
}

/// 零件的实体区域：外轮廓内且不在任何直接孔内。
struct SolidRegion<'a> {
    shell: &'a [Point2],
    shell_bounds: Bounds2D,
    holes: Vec<(&'a [Point2], Bounds2D)>,
    own: &'a [Point2],
}

impl<'a> SolidRegion<'a> {
    fn new(part: &DetectedPart<'a>, chain: &'a ShapeChain) -> Self {
        Self {
            shell: part.shell.chain.boundary(),
            shell_bounds: part.shell.bounds,
            holes: part
                .holes
                .iter()
                .map(|hole| (hole.chain.boundary(), hole.bounds))
                .collect(),
            own: chain.boundary(),
        }
    }

    /// `near_anchor` 为真时，贴着链自身边界的点不算实体。
    fn contains(&self, point: Point2, near_anchor: bool) -> bool {
        if !self.shell_bounds.contains_point(point)
            || !polygon::point_in_polygon(point, self.shell)
        {
            return false;
        }
        if near_anchor
            && polygon::distance_to_boundary(point, self.own) <= BOUNDARY_CLEARANCE
        {
            return false;
        }
        !self
            .holes
            .iter()
            .any(|(outline, bounds)| {
                bounds.contains_point(point) && polygon::point_in_polygon(point, outline)
            })
    }

    /// 沿引线加密采样并统计落入实体的点数，连接点本身不计。
    fn violations(&self, points: &[Point2], anchor: Point2, length: f64) -> usize {
        let zone = length * ANCHOR_ZONE_RATIO;
        let segments = points.len().saturating_sub(1);
        if segments == 0 {
            return 0;
        }
        let per_segment = COLLISION_SAMPLES.div_ceil(segments).max(1);
        let mut samples = Vec::with_capacity(segments * per_segment + 1);
        samples.push(points[0]);
        for pair in points.windows(2) {
            let delta = pair[0].vector_to(pair[1]);
            for i in 1..=per_segment {
                let t = i as f64 / per_segment as f64;
                samples.push(pair[0].translate(delta.scale(t)));
            }
        }
        samples
            .into_iter()
            .filter(|sample| {
                let distance = sample.distance(anchor);
                distance > ANCHOR_EPSILON && self.contains(*sample, distance <= zone)
            })
            .count()
    }
}
