use tracing::debug;
use zcam_core::chain::{ChainId, DEFAULT_CLOSURE_TOLERANCE, ShapeChain};
use zcam_core::geometry::{Bounds2D, Point2};
use zcam_core::lead::{CutDirection, LeadConfig, LeadResult};
use zcam_core::part::{ChainRole, DetectedPart, PartHole, PartId, PartWarning};
use zcam_core::shape::Shape;

use crate::chain::detect_shape_chains;
use crate::errors::EngineError;
use crate::lead::calculate_leads_with_tolerance;
use crate::part::detect_parts_with_tolerance;

pub const DEFAULT_CHAIN_TOLERANCE: f64 = 0.05;
pub const DEFAULT_LEAD_IN_LENGTH: f64 = 5.0;

/// 规划参数，全部由调用方显式提供。`closure_tolerance` 同时用于零件检测和引线计算。
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOptions {
    pub chain_tolerance: f64,
    pub closure_tolerance: f64,
    pub cut_direction: CutDirection,
    pub lead_in: LeadConfig,
    pub lead_out: LeadConfig,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            chain_tolerance: DEFAULT_CHAIN_TOLERANCE,
            closure_tolerance: DEFAULT_CLOSURE_TOLERANCE,
            cut_direction: CutDirection::Counterclockwise,
            lead_in: LeadConfig::arc(DEFAULT_LEAD_IN_LENGTH),
            lead_out: LeadConfig::none(),
        }
    }
}

/// 零件摘要，只记录链 ID，不再借用链本身。
#[derive(Debug, Clone, PartialEq)]
pub struct PartSummary {
    pub id: PartId,
    pub shell: ChainId,
    /// 直接孔。
    pub holes: Vec<ChainId>,
    /// 孔内更深层的链（岛及岛上的孔）。
    pub nested: Vec<ChainId>,
    pub bounds: Bounds2D,
}

impl PartSummary {
    fn from_part(part: &DetectedPart<'_>) -> Self {
        fn collect(holes: &[PartHole<'_>], out: &mut Vec<ChainId>) {
            for hole in holes {
                out.push(hole.chain.id());
                collect(&hole.holes, out);
            }
        }
        let mut nested = Vec::new();
        for hole in &part.holes {
            collect(&hole.holes, &mut nested);
        }
        Self {
            id: part.id,
            shell: part.shell.chain.id(),
            holes: part.holes.iter().map(|hole| hole.chain.id()).collect(),
            nested,
            bounds: part.shell.bounds,
        }
    }
}

/// 单条链的切割路径：角色、所属零件、引线与实际起止点。
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    pub chain: ChainId,
    pub closed: bool,
    pub role: Option<ChainRole>,
    pub part: Option<PartId>,
    pub leads: LeadResult,
    /// 第一个引入点；无引入线时为链起点。
    pub effective_start: Option<Point2>,
    /// 最后一个引出点；无引出线时为链终点。
    pub effective_end: Option<Point2>,
}

#[derive(Debug, Clone)]
pub struct CutPlan {
    chains: Vec<ShapeChain>,
    parts: Vec<PartSummary>,
    warnings: Vec<PartWarning>,
    paths: Vec<PlannedPath>,
}

impl CutPlan {
    #[inline]
    pub fn chains(&self) -> &[ShapeChain] {
        &self.chains
    }

    #[inline]
    pub fn parts(&self) -> &[PartSummary] {
        &self.parts
    }

    #[inline]
    pub fn warnings(&self) -> &[PartWarning] {
        &self.warnings
    }

    #[inline]
    pub fn paths(&self) -> &[PlannedPath] {
        &self.paths
    }

    pub fn chain(&self, id: ChainId) -> Result<&ShapeChain, EngineError> {
        self.chains
            .iter()
            .find(|chain| chain.id() == id)
            .ok_or(EngineError::ChainNotFound(id))
    }

    pub fn path(&self, id: ChainId) -> Result<&PlannedPath, EngineError> {
        self.paths
            .iter()
            .find(|path| path.chain == id)
            .ok_or(EngineError::ChainNotFound(id))
    }

    /// 所有路径的引线提示总数。
    pub fn lead_warning_count(&self) -> usize {
        self.paths.iter().map(|path| path.leads.warnings.len()).sum()
    }
}

/// 依次执行链检测、零件检测和引线计算。
#[derive(Debug, Clone, Default)]
pub struct CutPlanner {
    options: PlannerOptions,
}

impl CutPlanner {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    pub fn plan(&self, shapes: &[Shape]) -> CutPlan {
        let options = &self.options;
        let chains = detect_shape_chains(shapes, options.chain_tolerance);

        let (parts, warnings, paths) = {
            let detection = detect_parts_with_tolerance(&chains, options.closure_tolerance);
            let paths = chains
                .iter()
                .map(|chain| {
                    let part = detection.part_for_chain(chain.id());
                    let leads = calculate_leads_with_tolerance(
                        chain,
                        &options.lead_in,
                        &options.lead_out,
                        options.cut_direction,
                        part,
                        options.closure_tolerance,
                    );
                    PlannedPath {
                        chain: chain.id(),
                        closed: chain.is_closed(options.closure_tolerance),
                        role: part.and_then(|part| part.role_of(chain.id())),
                        part: part.map(|part| part.id),
                        effective_start: leads.entry_point().or_else(|| chain.start_point()),
                        effective_end: leads.exit_point().or_else(|| chain.end_point()),
                        leads,
                    }
                })
                .collect::<Vec<_>>();
            let parts = detection
                .parts
                .iter()
                .map(PartSummary::from_part)
                .collect::<Vec<_>>();
            (parts, detection.warnings, paths)
        };

        debug!(
            shapes = shapes.len(),
            chains = chains.len(),
            parts = parts.len(),
            warnings = warnings.len(),
            "切割规划完成"
        );

        CutPlan {
            chains,
            parts,
            warnings,
            paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(first_id: u64, x: f64, y: f64, w: f64, h: f64) -> Vec<Shape> {
        let corners = [
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ];
        (0..4)
            .map(|i| Shape::line(first_id + i as u64, corners[i], corners[(i + 1) % 4]))
            .collect()
    }

    #[test]
    fn plan_classifies_paths_and_effective_points() {
        let mut shapes = rect(1, 0.0, 0.0, 100.0, 100.0);
        shapes.extend(rect(10, 40.0, 40.0, 20.0, 20.0));
        shapes.push(Shape::line(
            20,
            Point2::new(200.0, 0.0),
            Point2::new(210.0, 0.0),
        ));

        let plan = CutPlanner::default().plan(&shapes);
        assert_eq!(plan.chains().len(), 3);
        assert_eq!(plan.parts().len(), 1);
        assert_eq!(plan.parts()[0].holes, vec![ChainId::new(2)]);

        let shell = plan.path(ChainId::new(1)).expect("shell path");
        assert_eq!(shell.role, Some(ChainRole::Shell));
        assert!(shell.closed);
        assert_eq!(shell.effective_start, shell.leads.entry_point());
        assert!(shell.leads.lead_in.is_some());
        assert_eq!(shell.effective_end, Some(Point2::new(0.0, 0.0)));

        let hole = plan.path(ChainId::new(2)).expect("hole path");
        assert_eq!(hole.role, Some(ChainRole::Hole));
        assert_eq!(hole.part, Some(PartId::new(1)));

        let loose = plan.path(ChainId::new(3)).expect("open path");
        assert!(!loose.closed);
        assert!(loose.part.is_none());
        assert!(loose.role.is_none());
    }

    #[test]
    fn closure_tolerance_applies_to_leads_too() {
        let p = Point2::new;
        // 末端留 0.3 的缺口
        let shapes = vec![
            Shape::line(1, p(0.0, 0.0), p(100.0, 0.0)),
            Shape::line(2, p(100.0, 0.0), p(100.0, 100.0)),
            Shape::line(3, p(100.0, 100.0), p(0.0, 100.0)),
            Shape::line(4, p(0.0, 100.0), p(0.0, 0.3)),
        ];
        let is_open_notice = |warning: &String| warning.contains("not needed for open chain");

        let strict = CutPlanner::default().plan(&shapes);
        let path = strict.path(ChainId::new(1)).expect("path");
        assert!(!path.closed);
        assert!(strict.parts().is_empty());
        assert!(path.leads.warnings.iter().any(is_open_notice));

        let loose = CutPlanner::new(PlannerOptions {
            closure_tolerance: 0.5,
            ..PlannerOptions::default()
        })
        .plan(&shapes);
        let path = loose.path(ChainId::new(1)).expect("path");
        assert!(path.closed);
        assert_eq!(path.role, Some(ChainRole::Shell));
        assert!(!path.leads.warnings.iter().any(is_open_notice));
    }

    #[test]
    fn missing_chain_is_an_error() {
        let plan = CutPlanner::default().plan(&[]);
        let err = plan.path(ChainId::new(42)).unwrap_err();
        assert!(matches!(err, EngineError::ChainNotFound(id) if id == ChainId::new(42)));
        assert_eq!(err.to_string(), "chain-42 not found");
    }
}
