use std::f64::consts::{FRAC_PI_2, PI, TAU};

use tracing::debug;
use zcam_config::PlannerConfig;
use zcam_core::geometry::{Point2, Vector2};
use zcam_core::shape::Shape;
use zcam_engine::PlannerOptions;

use crate::errors::FrontendError;

/// 把配置转换为规划参数，容差非法时返回错误。
pub fn planner_options(config: &PlannerConfig) -> Result<PlannerOptions, FrontendError> {
    config
        .validate()
        .map_err(FrontendError::InvalidPlannerConfig)?;
    Ok(PlannerOptions {
        chain_tolerance: config.chain_tolerance,
        closure_tolerance: config.closure_tolerance,
        cut_direction: config.cut_direction,
        lead_in: config.lead_in,
        lead_out: config.lead_out,
    })
}

/// 内置演示图纸：圆角板（含圆孔、椭圆槽和带岛的窗口）、样条边耳片，
/// 以及一条跨越板边界的开放多段线。图元顺序刻意打乱，部分线段反向。
pub fn demo_drawing() -> Vec<Shape> {
    let p = Point2::new;
    let mut shapes = vec![
        Shape::line(1, p(10.0, 0.0), p(110.0, 0.0)),
        Shape::arc(2, p(110.0, 10.0), 10.0, -FRAC_PI_2, 0.0),
        Shape::line(3, p(120.0, 10.0), p(120.0, 70.0)),
        Shape::arc(4, p(110.0, 70.0), 10.0, 0.0, FRAC_PI_2),
        Shape::line(5, p(110.0, 80.0), p(10.0, 80.0)),
        Shape::arc(6, p(10.0, 70.0), 10.0, FRAC_PI_2, PI),
        // 反向录入
        Shape::line(7, p(0.0, 10.0), p(0.0, 70.0)),
        Shape::arc(8, p(10.0, 10.0), 10.0, PI, 1.5 * PI),
    ]
    .into_iter()
    .map(|shape| shape.with_layer("PLATE"))
    .collect::<Vec<_>>();

    shapes.push(Shape::circle(9, p(30.0, 40.0), 12.0).with_layer("HOLES"));
    shapes.push(
        Shape::polyline(
            10,
            [p(60.0, 15.0), p(110.0, 15.0), p(110.0, 65.0), p(60.0, 65.0)],
            true,
        )
        .with_layer("HOLES"),
    );
    shapes.push(
        Shape::polyline(
            11,
            [p(75.0, 30.0), p(95.0, 30.0), p(95.0, 50.0), p(75.0, 50.0)],
            true,
        )
        .with_layer("ISLAND"),
    );
    shapes.push(
        Shape::ellipse(12, p(30.0, 14.0), Vector2::new(12.0, 0.0), 0.3, 0.0, TAU)
            .with_layer("HOLES"),
    );
    shapes.push(
        Shape::spline(
            13,
            3,
            vec![p(140.0, 0.0), p(150.0, 30.0), p(170.0, 30.0), p(180.0, 0.0)],
        )
        .with_layer("TAB"),
    );
    shapes.push(Shape::line(14, p(180.0, 0.0), p(140.0, 0.0)).with_layer("TAB"));
    shapes.push(
        Shape::polyline(15, [p(100.0, 70.0), p(120.0, 85.0), p(135.0, 95.0)], false)
            .with_layer("SKETCH"),
    );

    debug!(shapes = shapes.len(), "已构建演示图纸");
    shapes
}
