use tracing::info;
use zcam_config::AppConfig;
use zcam_core::chain::ChainId;
use zcam_core::geometry::Point2;
use zcam_core::lead::LeadGeometry;
use zcam_core::part::ChainRole;
use zcam_core::shape::Shape;
use zcam_engine::{CutPlan, CutPlanner, PlannedPath};

use crate::errors::FrontendError;
use crate::loader::{demo_drawing, planner_options};

/// 简易 CLI 演示：对内置图纸执行完整规划，并打印链、零件与引线概览。
pub fn run_demo(config: &AppConfig) -> Result<(), FrontendError> {
    let options = planner_options(&config.planner)?;
    let shapes = demo_drawing();
    let planner = CutPlanner::new(options);
    let plan = planner.plan(&shapes);

    info!(
        shapes = shapes.len(),
        chains = plan.chains().len(),
        parts = plan.parts().len(),
        lead_warnings = plan.lead_warning_count(),
        "CLI 演示规划统计"
    );

    println!("Rust 版 ZCAM 切割路径规划演示");
    let options = planner.options();
    println!(
        "拼接容差={}, 闭合容差={}, 切割方向={}",
        options.chain_tolerance,
        options.closure_tolerance,
        options.cut_direction.describe()
    );
    println!(
        "引入线: {} {:.2}, 引出线: {} {:.2}",
        options.lead_in.kind.describe(),
        options.lead_in.length,
        options.lead_out.kind.describe(),
        options.lead_out.length
    );

    print_shapes(&shapes);
    print_chains(&plan);
    print_parts(&plan);
    print_paths(&plan, config.output.print_points);
    Ok(())
}

fn print_shapes(shapes: &[Shape]) {
    println!("输入图元（{} 个）：", shapes.len());
    for shape in shapes {
        println!(
            "  - {} {}, Layer={}",
            shape.kind_name(),
            shape.id,
            shape.layer.as_deref().unwrap_or("<无>")
        );
    }
}

fn print_chains(plan: &CutPlan) {
    println!("检测到链（{} 条）：", plan.chains().len());
    for (chain, path) in plan.chains().iter().zip(plan.paths()) {
        let ids: Vec<String> = chain.shapes().iter().map(|shape| shape.id.to_string()).collect();
        println!(
            "  - {}: {}, 长度={:.2}, 图元=[{}]",
            chain.id(),
            if path.closed { "闭合" } else { "开放" },
            chain.length(),
            ids.join(", ")
        );
    }
}

fn print_parts(plan: &CutPlan) {
    println!("检测到零件（{} 个）：", plan.parts().len());
    for part in plan.parts() {
        println!(
            "  - {}: 外轮廓={}, 孔=[{}], 孔内嵌套=[{}], 尺寸={:.2} x {:.2}",
            part.id,
            part.shell,
            join_ids(&part.holes),
            join_ids(&part.nested),
            part.bounds.width(),
            part.bounds.height()
        );
    }
    if plan.warnings().is_empty() {
        println!("零件检测无警告。");
    } else {
        println!("零件检测警告：");
        for warning in plan.warnings() {
            println!("  - [{}] {}", warning.kind.code(), warning.message);
        }
    }
}

fn print_paths(plan: &CutPlan, print_points: bool) {
    println!("切割路径：");
    for path in plan.paths() {
        println!(
            "  - {} ({}), 零件={}, 起点={}, 终点={}",
            path.chain,
            role_label(path),
            path.part
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<无>".to_string()),
            format_point_option(path.effective_start),
            format_point_option(path.effective_end)
        );
        println!("      引入线: {}", describe_lead(path.leads.lead_in.as_ref()));
        println!("      引出线: {}", describe_lead(path.leads.lead_out.as_ref()));
        if print_points {
            for (label, lead) in [
                ("引入", path.leads.lead_in.as_ref()),
                ("引出", path.leads.lead_out.as_ref()),
            ] {
                if let Some(lead) = lead {
                    let coords: Vec<String> =
                        lead.points.iter().copied().map(format_point).collect();
                    println!("      {label}点列: {}", coords.join(" -> "));
                }
            }
        }
        for warning in &path.leads.warnings {
            println!("      ! {warning}");
        }
        for suggestion in &path.leads.validation.suggestions {
            println!("      建议: {suggestion}");
        }
    }
}

fn role_label(path: &PlannedPath) -> &'static str {
    match (path.role, path.closed) {
        (Some(ChainRole::Shell), _) => "外轮廓",
        (Some(ChainRole::Hole), _) => "孔",
        (None, true) => "闭合图形",
        (None, false) => "开放图形",
    }
}

fn describe_lead(lead: Option<&LeadGeometry>) -> String {
    match lead {
        Some(lead) => format!(
            "{}, {} 点, 长度={:.2}",
            lead.kind.describe(),
            lead.points.len(),
            lead.length()
        ),
        None => "无".to_string(),
    }
}

fn join_ids(ids: &[ChainId]) -> String {
    ids.iter()
        .map(ChainId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_point(point: Point2) -> String {
    format!("({:.2}, {:.2})", point.x(), point.y())
}

fn format_point_option(value: Option<Point2>) -> String {
    value
        .map(format_point)
        .unwrap_or_else(|| "<无>".to_string())
}
