use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::{ChainId, ShapeChain};
use crate::geometry::Bounds2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(u64);

impl PartId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part-{}", self.0)
    }
}

/// 链在零件树中的角色，由嵌套深度奇偶决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainRole {
    Shell,
    Hole,
}

impl ChainRole {
    pub fn describe(&self) -> &'static str {
        match self {
            ChainRole::Shell => "shell",
            ChainRole::Hole => "hole",
        }
    }
}

/// 零件外轮廓；借用检测阶段的链，不做拷贝。
#[derive(Debug, Clone)]
pub struct PartShell<'a> {
    pub chain: &'a ShapeChain,
    pub bounds: Bounds2D,
}

/// 孔。`holes` 记录孔内的岛（孔中之孔），构成一棵不会成环的树。
#[derive(Debug, Clone)]
pub struct PartHole<'a> {
    pub chain: &'a ShapeChain,
    pub bounds: Bounds2D,
    pub holes: Vec<PartHole<'a>>,
}

#[derive(Debug, Clone)]
pub struct DetectedPart<'a> {
    pub id: PartId,
    pub shell: PartShell<'a>,
    /// 仅包含直接孔。
    pub holes: Vec<PartHole<'a>>,
}

impl<'a> DetectedPart<'a> {
    /// 按树深度奇偶判断链的角色；链不属于该零件时返回 `None`。
    pub fn role_of(&self, chain_id: ChainId) -> Option<ChainRole> {
        if self.shell.chain.id() == chain_id {
            return Some(ChainRole::Shell);
        }
        fn search(holes: &[PartHole<'_>], chain_id: ChainId, depth: usize) -> Option<usize> {
            for hole in holes {
                if hole.chain.id() == chain_id {
                    return Some(depth);
                }
                if let Some(found) = search(&hole.holes, chain_id, depth + 1) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.holes, chain_id, 1).map(|depth| {
            if depth % 2 == 1 {
                ChainRole::Hole
            } else {
                ChainRole::Shell
            }
        })
    }

    /// 直接孔是否包含指定链。
    pub fn has_direct_hole(&self, chain_id: ChainId) -> bool {
        self.holes.iter().any(|hole| hole.chain.id() == chain_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartWarningKind {
    /// 开放链的两个端点分处闭合链包围范围内外。
    OverlappingBoundary,
    /// 存在闭合链但未生成任何零件。
    NoPartsDetected,
    /// 只有开放链，无法构成零件。
    OpenChainsOnly,
}

impl PartWarningKind {
    pub fn code(&self) -> &'static str {
        match self {
            PartWarningKind::OverlappingBoundary => "overlapping_boundary",
            PartWarningKind::NoPartsDetected => "no_parts_detected",
            PartWarningKind::OpenChainsOnly => "open_chains_only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartWarning {
    pub kind: PartWarningKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain_ids: Vec<ChainId>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct PartDetectionResult<'a> {
    pub parts: Vec<DetectedPart<'a>>,
    pub warnings: Vec<PartWarning>,
}

impl<'a> PartDetectionResult<'a> {
    /// 查找以该链为外轮廓或直接孔的零件。
    pub fn part_for_chain(&self, chain_id: ChainId) -> Option<&DetectedPart<'a>> {
        self.parts
            .iter()
            .find(|part| part.shell.chain.id() == chain_id || part.has_direct_hole(chain_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;
    use crate::shape::Shape;

    fn circle_chain(id: u64, radius: f64) -> ShapeChain {
        ShapeChain::new(
            ChainId::new(id),
            vec![Shape::circle(id, Point2::new(0.0, 0.0), radius)],
        )
    }

    #[test]
    fn role_follows_tree_depth_parity() {
        let outer = circle_chain(1, 50.0);
        let hole = circle_chain(2, 20.0);
        let island = circle_chain(3, 5.0);
        let stray = circle_chain(4, 1.0);

        let hole_bounds = hole.bounds().expect("bounds");
        let part = DetectedPart {
            id: PartId::new(1),
            shell: PartShell {
                chain: &outer,
                bounds: outer.bounds().expect("bounds"),
            },
            holes: vec![PartHole {
                chain: &hole,
                bounds: hole_bounds,
                holes: vec![PartHole {
                    chain: &island,
                    bounds: island.bounds().expect("bounds"),
                    holes: Vec::new(),
                }],
            }],
        };

        assert_eq!(part.role_of(outer.id()), Some(ChainRole::Shell));
        assert_eq!(part.role_of(hole.id()), Some(ChainRole::Hole));
        assert_eq!(part.role_of(island.id()), Some(ChainRole::Shell));
        assert_eq!(part.role_of(stray.id()), None);
        assert!(part.has_direct_hole(hole.id()));
        assert!(!part.has_direct_hole(island.id()));
    }
}
