use std::collections::HashSet;

use zcam_core::chain::{ChainId, DEFAULT_CLOSURE_TOLERANCE, ShapeChain};
use zcam_core::geometry::Point2;
use zcam_core::lead::{CutDirection, LeadConfig, LeadGeometry, ValidationSeverity};
use zcam_core::part::{ChainRole, DetectedPart};
use zcam_core::polygon;
use zcam_core::shape::{PolylineVertex, Shape};
use zcam_engine::{calculate_leads, detect_parts, detect_shape_chains};

fn p(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

/// 四条直线组成的矩形，ID 从 `first_id` 起连续编号。
fn rect_lines(first_id: u64, x: f64, y: f64, w: f64, h: f64) -> Vec<Shape> {
    let corners = [p(x, y), p(x + w, y), p(x + w, y + h), p(x, y + h)];
    (0..4)
        .map(|i| Shape::line(first_id + i as u64, corners[i], corners[(i + 1) % 4]))
        .collect()
}

/// 以中心定位的正方形。
fn centered_square(first_id: u64, center: f64, size: f64) -> Vec<Shape> {
    let half = size / 2.0;
    rect_lines(first_id, center - half, center - half, size, size)
}

fn solid_points(lead: &LeadGeometry, part: &DetectedPart<'_>, anchor: Point2) -> usize {
    let shell = part.shell.chain.boundary();
    lead.points
        .iter()
        .filter(|point| point.distance(anchor) > 1e-9)
        .filter(|point| polygon::distance_to_boundary(**point, shell) > DEFAULT_CLOSURE_TOLERANCE)
        .filter(|point| polygon::point_in_polygon(**point, shell))
        .filter(|point| {
            !part
                .holes
                .iter()
                .any(|hole| polygon::point_in_polygon(**point, hole.chain.boundary()))
        })
        .count()
}

#[test]
fn chain_detection_partitions_input() {
    let mut shapes = rect_lines(1, 0.0, 0.0, 10.0, 10.0);
    shapes.push(Shape::circle(5, p(30.0, 30.0), 4.0));
    shapes.push(Shape::line(6, p(50.0, 0.0), p(60.0, 0.0)));
    // 与上一条反向相接
    shapes.push(Shape::line(7, p(70.0, 5.0), p(60.0, 0.0)));
    shapes.push(Shape::polyline_with_vertices(
        8,
        [
            PolylineVertex::with_bulge(p(70.0, 5.0), 0.5),
            PolylineVertex::new(p(80.0, 5.0)),
        ],
        false,
    ));
    shapes.push(Shape::spline(
        9,
        3,
        vec![p(100.0, 0.0), p(105.0, 10.0), p(110.0, -10.0), p(115.0, 0.0)],
    ));
    shapes.push(Shape::arc(10, p(0.0, 50.0), 5.0, 0.0, 1.0));

    let chains = detect_shape_chains(&shapes, 0.05);
    let mut seen = HashSet::new();
    let mut total = 0;
    for chain in &chains {
        for shape in chain.shapes() {
            assert!(seen.insert(shape.id), "{} appears twice", shape.id);
            total += 1;
        }
    }
    assert_eq!(total, shapes.len());
    assert_eq!(seen.len(), shapes.len());
    assert_eq!(chains.len(), 5);
}

#[test]
fn square_closure_respects_tolerance() {
    let closed = ShapeChain::new(ChainId::new(1), rect_lines(1, 0.0, 0.0, 10.0, 10.0));
    assert!(closed.is_closed(DEFAULT_CLOSURE_TOLERANCE));

    let mut shapes = rect_lines(1, 0.0, 0.0, 10.0, 10.0);
    shapes[3] = Shape::line(4, p(0.0, 10.0), p(0.0, 0.5));
    let open = ShapeChain::new(ChainId::new(2), shapes);
    assert!(!open.is_closed(DEFAULT_CLOSURE_TOLERANCE));
}

#[test]
fn shell_hole_and_island_parity() {
    let mut shapes = centered_square(1, 50.0, 100.0);
    shapes.extend(centered_square(10, 50.0, 20.0));
    let chains = detect_shape_chains(&shapes, 0.05);
    let detection = detect_parts(&chains);
    assert_eq!(detection.parts.len(), 1);
    assert_eq!(detection.parts[0].holes.len(), 1);
    assert!(detection.parts[0].holes[0].holes.is_empty());

    shapes.extend(centered_square(20, 50.0, 5.0));
    let chains = detect_shape_chains(&shapes, 0.05);
    let detection = detect_parts(&chains);
    let outer = &detection.parts[0];
    assert_eq!(outer.holes.len(), 1);
    assert_eq!(outer.holes[0].holes.len(), 1);
    let island = outer.holes[0].holes[0].chain.id();
    assert_eq!(outer.role_of(island), Some(ChainRole::Shell));
    // 岛自成零件，外部零件的孔数不变
    assert_eq!(detection.parts.len(), 2);
    assert_eq!(detection.parts[1].shell.chain.id(), island);
}

#[test]
fn arc_lead_in_is_tangent_to_line() {
    let chain = ShapeChain::new(
        ChainId::new(1),
        vec![Shape::line(1, p(0.0, 0.0), p(50.0, 0.0))],
    );
    let result = calculate_leads(
        &chain,
        &LeadConfig::arc(5.0),
        &LeadConfig::none(),
        CutDirection::Clockwise,
        None,
    );
    let lead = result.lead_in.expect("lead-in");
    let n = lead.points.len();
    let last = lead.points[n - 2].vector_to(lead.points[n - 1]);
    let line = p(0.0, 0.0).vector_to(p(50.0, 0.0));
    let angle = last.cross(line).atan2(last.dot(line)).abs();
    assert!(angle < 0.1, "angle {angle}");
    assert_eq!(lead.points[n - 1], p(0.0, 0.0));
}

#[test]
fn lead_length_matches_request() {
    let chain = ShapeChain::new(
        ChainId::new(1),
        vec![Shape::circle(1, p(0.0, 0.0), 30.0)],
    );
    for config in [LeadConfig::arc(7.0), LeadConfig::line(7.0)] {
        let result = calculate_leads(
            &chain,
            &config,
            &config,
            CutDirection::Counterclockwise,
            None,
        );
        for lead in [result.lead_in, result.lead_out] {
            let lead = lead.expect("lead");
            assert!((lead.length() - 7.0).abs() < 0.5, "{}", lead.length());
        }
    }
}

#[test]
fn avoidance_keeps_lead_out_of_solid_material() {
    let mut shapes = rect_lines(1, 0.0, 0.0, 100.0, 100.0);
    // 孔靠近外轮廓起点，孔偏置会把引线先指向实体
    shapes.extend(rect_lines(10, 5.0, 5.0, 10.0, 10.0));
    let chains = detect_shape_chains(&shapes, 0.05);
    let detection = detect_parts(&chains);
    let part = &detection.parts[0];
    let shell = &chains[0];

    let result = calculate_leads(
        shell,
        &LeadConfig::arc(5.0),
        &LeadConfig::arc(5.0),
        CutDirection::Clockwise,
        Some(part),
    );
    assert!(!result.warnings.iter().any(|w| w.contains("cannot be avoided")));
    let anchor = shell.start_point().expect("start");
    let lead_in = result.lead_in.expect("lead-in");
    assert_eq!(solid_points(&lead_in, part, anchor), 0);
    let lead_out = result.lead_out.expect("lead-out");
    assert_eq!(solid_points(&lead_out, part, anchor), 0);
}

#[test]
fn impossible_avoidance_is_reported() {
    let mut shapes = centered_square(1, 50.0, 100.0);
    shapes.extend(centered_square(10, 50.0, 2.0));
    let chains = detect_shape_chains(&shapes, 0.05);
    let detection = detect_parts(&chains);
    let part = &detection.parts[0];
    let hole = &chains[1];
    assert_eq!(part.role_of(hole.id()), Some(ChainRole::Hole));

    let result = calculate_leads(
        hole,
        &LeadConfig::line(40.0),
        &LeadConfig::none(),
        CutDirection::Clockwise,
        Some(part),
    );
    assert!(result.lead_in.is_some());
    let warning = result
        .warnings
        .iter()
        .find(|w| w.contains("cannot be avoided"))
        .expect("avoidance warning");
    assert!(warning.starts_with("Lead-in for hole chain-2"));
}

/// 100×100 板中央带一个半径 2 的圆孔，孔链为 chain-2。
fn plate_with_small_round_hole() -> Vec<ShapeChain> {
    let mut shapes = centered_square(1, 50.0, 100.0);
    shapes.push(Shape::circle(10, p(50.0, 50.0), 2.0));
    detect_shape_chains(&shapes, 0.05)
}

#[test]
fn lead_too_long_for_hole_is_shortened() {
    let chains = plate_with_small_round_hole();
    let detection = detect_parts(&chains);
    let part = &detection.parts[0];
    let hole = &chains[1];
    assert_eq!(part.role_of(hole.id()), Some(ChainRole::Hole));

    // 孔直径只有 4，整长 5 的直线无论朝哪都会穿出孔外
    let result = calculate_leads(
        hole,
        &LeadConfig::line(5.0),
        &LeadConfig::none(),
        CutDirection::Counterclockwise,
        Some(part),
    );
    assert!(!result.warnings.iter().any(|w| w.contains("cannot be avoided")));
    let lead = result.lead_in.expect("lead-in");
    assert!((lead.length() - 3.75).abs() < 1e-9, "{}", lead.length());
    let anchor = hole.start_point().expect("start");
    assert_eq!(lead.last_point(), Some(anchor));
    assert_eq!(solid_points(&lead, part, anchor), 0);
}

#[test]
fn fit_disabled_keeps_full_length_and_warns() {
    let chains = plate_with_small_round_hole();
    let detection = detect_parts(&chains);
    let part = &detection.parts[0];

    let result = calculate_leads(
        &chains[1],
        &LeadConfig::line(5.0).with_fit(false),
        &LeadConfig::none(),
        CutDirection::Counterclockwise,
        Some(part),
    );
    let lead = result.lead_in.expect("lead-in");
    assert!((lead.length() - 5.0).abs() < 1e-9, "{}", lead.length());
    let warning = result
        .warnings
        .iter()
        .find(|w| w.contains("cannot be avoided"))
        .expect("avoidance warning");
    assert!(warning.starts_with("Lead-in for hole chain-2"));
}

#[test]
fn manual_angle_skips_avoidance_with_part() {
    let chains = plate_with_small_round_hole();
    let detection = detect_parts(&chains);
    let part = &detection.parts[0];

    // 0° 指向孔外的实体，仍按原样输出
    let result = calculate_leads(
        &chains[1],
        &LeadConfig::line(5.0).with_angle(0.0),
        &LeadConfig::none(),
        CutDirection::Counterclockwise,
        Some(part),
    );
    assert!(!result.warnings.iter().any(|w| w.contains("cannot be avoided")));
    let lead = result.lead_in.expect("lead-in");
    assert_eq!(lead.points.len(), 2);
    assert!(lead.points[0].distance(p(57.0, 50.0)) < 1e-9);
    assert_eq!(lead.points[1], p(52.0, 50.0));
    assert!(solid_points(&lead, part, p(52.0, 50.0)) > 0);
}

#[test]
fn negative_length_blocks_calculation() {
    let chain = ShapeChain::new(ChainId::new(1), rect_lines(1, 0.0, 0.0, 10.0, 10.0));
    let result = calculate_leads(
        &chain,
        &LeadConfig::line(-5.0),
        &LeadConfig::none(),
        CutDirection::Clockwise,
        None,
    );
    assert!(!result.validation.is_valid);
    assert_eq!(result.validation.severity, ValidationSeverity::Error);
    assert!(result.lead_in.is_none());
}

#[test]
fn lead_calculation_is_idempotent() {
    let mut shapes = rect_lines(1, 0.0, 0.0, 100.0, 100.0);
    shapes.extend(rect_lines(10, 5.0, 5.0, 10.0, 10.0));
    let chains = detect_shape_chains(&shapes, 0.05);
    let detection = detect_parts(&chains);
    let run = || {
        calculate_leads(
            &chains[0],
            &LeadConfig::arc(6.0),
            &LeadConfig::line(3.0),
            CutDirection::None,
            detection.parts.first(),
        )
    };
    let first = run();
    for _ in 0..3 {
        assert_eq!(run(), first);
    }
}
