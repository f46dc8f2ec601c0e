use tracing::{debug, trace};
use zcam_core::chain::{DEFAULT_CLOSURE_TOLERANCE, ShapeChain};
use zcam_core::geometry::{Bounds2D, Point2};
use zcam_core::part::{
    DetectedPart, PartDetectionResult, PartHole, PartId, PartShell, PartWarning, PartWarningKind,
};
use zcam_core::polygon;

/// 参与包含关系计算的闭合链，`chain` 指向输入切片中的位置。
struct ClosedNode<'a> {
    chain: &'a ShapeChain,
    bounds: Bounds2D,
    area: f64,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// 使用默认闭合容差检测零件。
pub fn detect_parts(chains: &[ShapeChain]) -> PartDetectionResult<'_> {
    detect_parts_with_tolerance(chains, DEFAULT_CLOSURE_TOLERANCE)
}

/// 根据几何包含关系把闭合链组织成外轮廓/孔树。
///
/// 深度为偶数的链是外轮廓，奇数的是孔；孔内的岛既是孔的 `holes` 子节点，
/// 也作为独立零件的外轮廓输出。开放链不参与零件，仅检查是否跨越闭合链边界。
pub fn detect_parts_with_tolerance(
    chains: &[ShapeChain],
    tolerance: f64,
) -> PartDetectionResult<'_> {
    let mut result = PartDetectionResult::default();
    if chains.is_empty() {
        return result;
    }

    let mut nodes: Vec<ClosedNode<'_>> = Vec::new();
    let mut open: Vec<&ShapeChain> = Vec::new();
    for chain in chains {
        match chain.bounds() {
            Some(bounds) if chain.is_closed(tolerance) && chain.boundary().len() >= 3 => {
                nodes.push(ClosedNode {
                    chain,
                    bounds,
                    area: chain.signed_area().abs(),
                    parent: None,
                    children: Vec::new(),
                });
            }
            _ => open.push(chain),
        }
    }

    assign_parents(&mut nodes, tolerance);
    let depths = nesting_depths(&nodes);

    let mut next_id = 1;
    for (index, node) in nodes.iter().enumerate() {
        if depths[index] % 2 != 0 {
            continue;
        }
        let holes = node
            .children
            .iter()
            .map(|&child| build_hole(&nodes, child))
            .collect::<Vec<_>>();
        trace!(
            part = next_id,
            shell = %node.chain.id(),
            depth = depths[index],
            holes = holes.len(),
            "识别零件"
        );
        result.parts.push(DetectedPart {
            id: PartId::new(next_id),
            shell: PartShell {
                chain: node.chain,
                bounds: node.bounds,
            },
            holes,
        });
        next_id += 1;
    }

    for chain in &open {
        check_straddle(chain, &nodes, &mut result.warnings);
    }

    if nodes.is_empty() && !open.is_empty() {
        result.warnings.push(PartWarning {
            kind: PartWarningKind::OpenChainsOnly,
            chain_ids: open.iter().map(|chain| chain.id()).collect(),
            message: format!(
                "Only open chains were found ({}); no closed boundary can form a part",
                open.len()
            ),
        });
    } else if !nodes.is_empty() && result.parts.is_empty() {
        result.warnings.push(PartWarning {
            kind: PartWarningKind::NoPartsDetected,
            chain_ids: nodes.iter().map(|node| node.chain.id()).collect(),
            message: format!(
                "{} closed chains were found but no part could be built",
                nodes.len()
            ),
        });
    }

    debug!(
        chains = chains.len(),
        closed = nodes.len(),
        open = open.len(),
        parts = result.parts.len(),
        warnings = result.warnings.len(),
        "零件检测完成"
    );
    result
}

/// 为每条闭合链挑选直接父链：所有几何包含它的链中包围盒面积最小者，
/// 面积相同再比较多边形面积与输入顺序。
fn assign_parents(nodes: &mut [ClosedNode<'_>], tolerance: f64) {
    for child in 0..nodes.len() {
        let mut parent: Option<usize> = None;
        for candidate in 0..nodes.len() {
            if candidate == child || !contains(&nodes[candidate], &nodes[child], tolerance) {
                continue;
            }
            let tighter = parent.is_none_or(|current| {
                let (a, b) = (&nodes[candidate], &nodes[current]);
                let (box_a, box_b) = (a.bounds.area(), b.bounds.area());
                box_a < box_b || (box_a == box_b && a.area < b.area)
            });
            if tighter {
                parent = Some(candidate);
            }
        }
        nodes[child].parent = parent;
    }

    for child in 0..nodes.len() {
        if let Some(parent) = nodes[child].parent {
            nodes[parent].children.push(child);
        }
    }
}

/// 真实几何包含：父链面积严格更大，包围盒包含子链，且子链离散边界全部落在父多边形内。
/// 贴近父边界（容差内）的采样点不参与判定，至少需要一个采样点明确位于内部。
fn contains(parent: &ClosedNode<'_>, child: &ClosedNode<'_>, tolerance: f64) -> bool {
    if parent.area <= child.area || !parent.bounds.contains_bounds(&child.bounds, tolerance) {
        return false;
    }
    let outline = parent.chain.boundary();
    let mut decisive = 0usize;
    for &sample in child.chain.boundary() {
        if polygon::point_in_polygon(sample, outline) {
            decisive += 1;
        } else if polygon::distance_to_boundary(sample, outline) > tolerance {
            return false;
        }
    }
    decisive > 0
}

/// 沿父链接走到根计算深度；父链面积严格递减，因此不会成环。
fn nesting_depths(nodes: &[ClosedNode<'_>]) -> Vec<usize> {
    nodes
        .iter()
        .map(|node| {
            let mut depth = 0;
            let mut cursor = node.parent;
            while let Some(parent) = cursor {
                depth += 1;
                cursor = nodes[parent].parent;
            }
            depth
        })
        .collect()
}

fn build_hole<'a>(nodes: &[ClosedNode<'a>], index: usize) -> PartHole<'a> {
    let node = &nodes[index];
    PartHole {
        chain: node.chain,
        bounds: node.bounds,
        holes: node
            .children
            .iter()
            .map(|&child| build_hole(nodes, child))
            .collect(),
    }
}

/// 开放链两端一内一外跨越闭合链包围盒时给出警告。
fn check_straddle(chain: &ShapeChain, nodes: &[ClosedNode<'_>], warnings: &mut Vec<PartWarning>) {
    let (Some(start), Some(end)) = (chain.start_point(), chain.end_point()) else {
        return;
    };
    for node in nodes {
        let inside = |point: Point2| node.bounds.contains_point(point);
        if inside(start) != inside(end) {
            warnings.push(PartWarning {
                kind: PartWarningKind::OverlappingBoundary,
                chain_ids: vec![chain.id(), node.chain.id()],
                message: format!(
                    "Open chain {} crosses the boundary of closed chain {}",
                    chain.id(),
                    node.chain.id()
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zcam_core::chain::ChainId;
    use zcam_core::part::ChainRole;
    use zcam_core::shape::Shape;

    fn rect_chain(id: u64, x: f64, y: f64, w: f64, h: f64) -> ShapeChain {
        let points = [
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ];
        ShapeChain::new(ChainId::new(id), vec![Shape::polyline(id, points, true)])
    }

    #[test]
    fn empty_input_has_no_parts_or_warnings() {
        let result = detect_parts(&[]);
        assert!(result.parts.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn separate_rectangles_become_separate_parts() {
        let chains = vec![
            rect_chain(1, 0.0, 0.0, 10.0, 10.0),
            rect_chain(2, 20.0, 0.0, 10.0, 10.0),
        ];
        let result = detect_parts(&chains);
        assert_eq!(result.parts.len(), 2);
        assert!(result.parts.iter().all(|part| part.holes.is_empty()));
        assert_eq!(result.parts[1].id.to_string(), "part-2");
    }

    #[test]
    fn concave_notch_is_not_a_hole() {
        // U 形外轮廓，缺口中的小方块包围盒在内，但几何上位于外部。
        let u_shape = ShapeChain::new(
            ChainId::new(1),
            vec![Shape::polyline(
                1,
                [
                    Point2::new(0.0, 0.0),
                    Point2::new(30.0, 0.0),
                    Point2::new(30.0, 30.0),
                    Point2::new(20.0, 30.0),
                    Point2::new(20.0, 10.0),
                    Point2::new(10.0, 10.0),
                    Point2::new(10.0, 30.0),
                    Point2::new(0.0, 30.0),
                ],
                true,
            )],
        );
        let chains = vec![u_shape, rect_chain(2, 12.0, 15.0, 6.0, 6.0)];
        let result = detect_parts(&chains);
        assert_eq!(result.parts.len(), 2);
        assert!(result.parts.iter().all(|part| part.holes.is_empty()));
    }

    #[test]
    fn tightest_container_is_the_parent() {
        let chains = vec![
            rect_chain(1, 0.0, 0.0, 100.0, 100.0),
            rect_chain(2, 10.0, 10.0, 80.0, 80.0),
            rect_chain(3, 20.0, 20.0, 60.0, 60.0),
            rect_chain(4, 30.0, 30.0, 10.0, 10.0),
        ];
        let result = detect_parts(&chains);
        // 深度 0/2 为外轮廓，1/3 为孔
        assert_eq!(result.parts.len(), 2);
        let outer = &result.parts[0];
        assert_eq!(outer.holes.len(), 1);
        assert_eq!(outer.holes[0].chain.id(), ChainId::new(2));
        assert_eq!(outer.holes[0].holes[0].chain.id(), ChainId::new(3));
        assert_eq!(outer.role_of(ChainId::new(3)), Some(ChainRole::Shell));
        assert_eq!(outer.role_of(ChainId::new(4)), None);

        let island = &result.parts[1];
        assert_eq!(island.shell.chain.id(), ChainId::new(3));
        assert_eq!(island.holes[0].chain.id(), ChainId::new(4));
        assert_eq!(island.role_of(ChainId::new(4)), Some(ChainRole::Hole));
    }

    #[test]
    fn duplicate_boundaries_do_not_nest() {
        let chains = vec![
            rect_chain(1, 0.0, 0.0, 10.0, 10.0),
            rect_chain(2, 0.0, 0.0, 10.0, 10.0),
        ];
        let result = detect_parts(&chains);
        assert_eq!(result.parts.len(), 2);
    }

    #[test]
    fn straddling_open_chain_is_reported() {
        let chains = vec![
            rect_chain(1, 0.0, 0.0, 10.0, 10.0),
            ShapeChain::new(
                ChainId::new(2),
                vec![Shape::line(2, Point2::new(5.0, 5.0), Point2::new(15.0, 5.0))],
            ),
        ];
        let result = detect_parts(&chains);
        assert_eq!(result.parts.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        let warning = &result.warnings[0];
        assert_eq!(warning.kind, PartWarningKind::OverlappingBoundary);
        assert_eq!(warning.chain_ids, vec![ChainId::new(2), ChainId::new(1)]);
    }

    #[test]
    fn open_chains_only_produce_diagnostic() {
        let chains = vec![ShapeChain::new(
            ChainId::new(1),
            vec![Shape::line(1, Point2::new(0.0, 0.0), Point2::new(5.0, 0.0))],
        )];
        let result = detect_parts(&chains);
        assert!(result.parts.is_empty());
        assert_eq!(result.warnings[0].kind, PartWarningKind::OpenChainsOnly);
    }
}
