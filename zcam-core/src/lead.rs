use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::shape::polyline_length;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    #[default]
    None,
    Line,
    Arc,
}

impl LeadKind {
    pub fn describe(&self) -> &'static str {
        match self {
            LeadKind::None => "none",
            LeadKind::Line => "line",
            LeadKind::Arc => "arc",
        }
    }
}

/// 切割方向。`None` 表示未指定，由几何推断引线侧。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutDirection {
    Clockwise,
    Counterclockwise,
    #[default]
    None,
}

impl CutDirection {
    pub fn describe(&self) -> &'static str {
        match self {
            CutDirection::Clockwise => "clockwise",
            CutDirection::Counterclockwise => "counterclockwise",
            CutDirection::None => "none",
        }
    }
}

/// 引线配置。`angle` 以度为单位的绝对方向（0° 为 +X，逆时针为正），
/// 设置后跳过自动切向与避让搜索；`fit` 为 `Some(false)` 时避让搜索不缩短长度。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadConfig {
    #[serde(default)]
    pub kind: LeadKind,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub flip_side: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<bool>,
}

impl LeadConfig {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn line(length: f64) -> Self {
        Self {
            kind: LeadKind::Line,
            length,
            ..Self::default()
        }
    }

    pub fn arc(length: f64) -> Self {
        Self {
            kind: LeadKind::Arc,
            length,
            ..Self::default()
        }
    }

    pub fn with_flip_side(mut self, flip_side: bool) -> Self {
        self.flip_side = flip_side;
        self
    }

    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = Some(degrees);
        self
    }

    pub fn with_fit(mut self, fit: bool) -> Self {
        self.fit = Some(fit);
        self
    }

    /// 是否会生成几何：类型非 none 且长度为正。
    #[inline]
    pub fn is_active(&self) -> bool {
        self.kind != LeadKind::None && self.length > 0.0
    }

    #[inline]
    pub fn allows_shrink(&self) -> bool {
        self.fit.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEnd {
    In,
    Out,
}

impl fmt::Display for LeadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadEnd::In => f.write_str("lead-in"),
            LeadEnd::Out => f.write_str("lead-out"),
        }
    }
}

/// 生成的引线折线。引入线末点恰为链起点，引出线首点恰为链终点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadGeometry {
    pub kind: LeadKind,
    pub points: Vec<Point2>,
}

impl LeadGeometry {
    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    #[inline]
    pub fn first_point(&self) -> Option<Point2> {
        self.points.first().copied()
    }

    #[inline]
    pub fn last_point(&self) -> Option<Point2> {
        self.points.last().copied()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    #[default]
    Info,
    Warning,
    Error,
}

impl ValidationSeverity {
    pub fn describe(&self) -> &'static str {
        match self {
            ValidationSeverity::Info => "info",
            ValidationSeverity::Warning => "warning",
            ValidationSeverity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    pub severity: ValidationSeverity,
}

impl Default for LeadValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            warnings: Vec::new(),
            suggestions: Vec::new(),
            severity: ValidationSeverity::Info,
        }
    }
}

impl LeadValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条提示并按需提升严重级别；只有 `Error` 会使结果失效。
    pub fn report(&mut self, severity: ValidationSeverity, warning: impl Into<String>) {
        self.warnings.push(warning.into());
        self.escalate(severity);
    }

    pub fn suggest(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }

    fn escalate(&mut self, severity: ValidationSeverity) {
        self.severity = self.severity.max(severity);
        self.is_valid = self.severity < ValidationSeverity::Error;
    }

    /// 合并另一份结果，重复的提示与建议只保留一次。
    pub fn merge(&mut self, other: LeadValidationResult) {
        for warning in other.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        for suggestion in other.suggestions {
            if !self.suggestions.contains(&suggestion) {
                self.suggestions.push(suggestion);
            }
        }
        self.escalate(other.severity);
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.severity == ValidationSeverity::Error
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_in: Option<LeadGeometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_out: Option<LeadGeometry>,
    pub warnings: Vec<String>,
    pub validation: LeadValidationResult,
}

impl LeadResult {
    /// 刀具实际起点：引入线首点，没有引入线时为 `None`。
    pub fn entry_point(&self) -> Option<Point2> {
        self.lead_in.as_ref().and_then(LeadGeometry::first_point)
    }

    pub fn exit_point(&self) -> Option<Point2> {
        self.lead_out.as_ref().and_then(LeadGeometry::last_point)
    }
}
