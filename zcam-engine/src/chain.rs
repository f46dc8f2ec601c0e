use std::collections::VecDeque;

use tracing::{debug, trace};
use zcam_core::chain::{ChainId, ShapeChain};
use zcam_core::geometry::Point2;
use zcam_core::shape::Shape;

/// 候选图元接到链端点时的朝向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Growth {
    /// 从链尾向后延伸，候选图元的起点接链尾。
    Forward,
    /// 从链首向前延伸，候选图元的终点接链首。
    Backward,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    reverse: bool,
    distance: f64,
}

/// 按端点邻近关系把图元串成链。
///
/// 每个图元恰好属于一条输出链；整圆、整椭圆和闭合多段线单独成链。
/// 链的顺序即种子图元在输入中的顺序，链内顺序即遍历顺序，必要时图元会被反向。
pub fn detect_shape_chains(shapes: &[Shape], tolerance: f64) -> Vec<ShapeChain> {
    let tolerance = if tolerance.is_finite() && tolerance >= 0.0 {
        tolerance
    } else {
        0.0
    };

    let mut visited = vec![false; shapes.len()];
    let mut chains = Vec::new();

    for seed in 0..shapes.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let id = ChainId::new(chains.len() as u64 + 1);
        let seed_shape = &shapes[seed];

        if !is_linkable(seed_shape) {
            chains.push(ShapeChain::new(id, vec![seed_shape.clone()]));
            continue;
        }

        let mut links = VecDeque::from([seed_shape.clone()]);
        let mut closed = grow(
            shapes,
            &mut visited,
            &mut links,
            tolerance,
            Growth::Forward,
        );
        if !closed {
            closed = grow(
                shapes,
                &mut visited,
                &mut links,
                tolerance,
                Growth::Backward,
            );
        }

        trace!(chain = %id, shapes = links.len(), closed, "链生长结束");
        chains.push(ShapeChain::new(id, links.into()));
    }

    debug!(
        shapes = shapes.len(),
        chains = chains.len(),
        tolerance,
        "链检测完成"
    );
    chains
}

/// 能否参与拼接：天然闭合或端点无效的图元只能单独成链。
fn is_linkable(shape: &Shape) -> bool {
    !shape.is_inherently_closed() && shape.start_point().is_some() && shape.end_point().is_some()
}

/// 沿指定方向延伸链，返回链是否已首尾闭合。
fn grow(
    shapes: &[Shape],
    visited: &mut [bool],
    links: &mut VecDeque<Shape>,
    tolerance: f64,
    growth: Growth,
) -> bool {
    loop {
        let (Some(head), Some(tail)) = (
            links.front().and_then(Shape::start_point),
            links.back().and_then(Shape::end_point),
        ) else {
            return false;
        };
        if head.distance(tail) <= tolerance {
            return true;
        }

        let anchor = match growth {
            Growth::Forward => tail,
            Growth::Backward => head,
        };
        let Some(candidate) = nearest_candidate(shapes, visited, anchor, tolerance, growth) else {
            return false;
        };

        visited[candidate.index] = true;
        let shape = &shapes[candidate.index];
        let shape = if candidate.reverse {
            shape.reversed()
        } else {
            shape.clone()
        };
        trace!(
            shape = %shape.id,
            reversed = candidate.reverse,
            distance = candidate.distance,
            "拼接图元"
        );
        match growth {
            Growth::Forward => links.push_back(shape),
            Growth::Backward => links.push_front(shape),
        }
    }
}

/// 在未访问图元中寻找离锚点最近的可接端点；距离相同时取输入顺序靠前者，
/// 同一图元两端距离相同时优先不反向。
fn nearest_candidate(
    shapes: &[Shape],
    visited: &[bool],
    anchor: Point2,
    tolerance: f64,
    growth: Growth,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for (index, shape) in shapes.iter().enumerate() {
        if visited[index] || !is_linkable(shape) {
            continue;
        }
        let (Some(start), Some(end)) = (shape.start_point(), shape.end_point()) else {
            continue;
        };
        // 正向延伸时起点相接无需反向；反向延伸时终点相接无需反向。
        let (keep, flip) = match growth {
            Growth::Forward => (start, end),
            Growth::Backward => (end, start),
        };
        for (point, reverse) in [(keep, false), (flip, true)] {
            let distance = anchor.distance(point);
            if distance > tolerance {
                continue;
            }
            if best.is_none_or(|current| distance < current.distance) {
                best = Some(Candidate {
                    index,
                    reverse,
                    distance,
                });
            }
        }
    }
    best
}
