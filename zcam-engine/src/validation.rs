use tracing::debug;
use zcam_core::chain::{DEFAULT_CLOSURE_TOLERANCE, ShapeChain};
use zcam_core::lead::{CutDirection, LeadConfig, LeadKind, LeadValidationResult, ValidationSeverity};
use zcam_core::part::{ChainRole, DetectedPart};
use zcam_core::polygon;

/// 引线长度超过链包围盒对角线的该倍数时提示过长。
const DIAGONAL_FACTOR: f64 = 2.0;
const SMALL_CHAIN_DIMENSION: f64 = 3.0;
const SMALL_CHAIN_LEAD: f64 = 10.0;
const VERY_LONG_LEAD: f64 = 50.0;
const VERY_SHORT_LEAD: f64 = 0.5;
/// 引线长度达到到孔距离的该比例即视为贴近。
const HOLE_PROXIMITY_RATIO: f64 = 0.8;

/// 校验引线配置。
///
/// 五组检查互不依赖，依次追加提示并提升严重级别；只有负长度、角度越界和空链会令结果无效，
/// 其余均为建议。闭合判定使用默认容差。
pub fn validate_lead_configuration(
    config: &LeadConfig,
    chain: &ShapeChain,
    cut_direction: CutDirection,
    part: Option<&DetectedPart<'_>>,
) -> LeadValidationResult {
    validate_lead_configuration_with_tolerance(
        config,
        chain,
        cut_direction,
        part,
        DEFAULT_CLOSURE_TOLERANCE,
    )
}

/// 同 [`validate_lead_configuration`]，闭合判定使用给定容差。
pub fn validate_lead_configuration_with_tolerance(
    config: &LeadConfig,
    chain: &ShapeChain,
    cut_direction: CutDirection,
    part: Option<&DetectedPart<'_>>,
    closure_tolerance: f64,
) -> LeadValidationResult {
    let mut result = LeadValidationResult::new();

    check_basic(config, &mut result);
    check_chain_geometry(config, chain, &mut result);
    if let Some(part) = part {
        check_part_context(config, chain, part, &mut result);
    }
    check_absolute_length(config, &mut result);
    check_cut_direction(config, chain, cut_direction, closure_tolerance, &mut result);

    debug!(
        chain = %chain.id(),
        kind = config.kind.describe(),
        length = config.length,
        severity = result.severity.describe(),
        warnings = result.warnings.len(),
        "引线配置校验完成"
    );
    result
}

fn check_basic(config: &LeadConfig, result: &mut LeadValidationResult) {
    let length = config.length;
    if !length.is_finite() {
        result.report(
            ValidationSeverity::Error,
            format!("Lead length must be a finite number, got {length}"),
        );
    } else if length < 0.0 {
        result.report(
            ValidationSeverity::Error,
            format!("Lead length cannot be negative ({length})"),
        );
        result.suggest("Use a positive lead length or set the lead type to none");
    } else if config.kind != LeadKind::None && length == 0.0 {
        result.report(
            ValidationSeverity::Warning,
            format!(
                "Lead type is {} but length is zero; no lead will be generated",
                config.kind.describe()
            ),
        );
    } else if config.kind == LeadKind::None && length > 0.0 {
        result.report(
            ValidationSeverity::Warning,
            format!("Lead length {length} is ignored because the lead type is none"),
        );
    }

    if let Some(angle) = config.angle {
        if !(angle.is_finite() && (0.0..360.0).contains(&angle)) {
            result.report(
                ValidationSeverity::Error,
                format!("Lead angle {angle} is outside the range [0, 360)"),
            );
            result.suggest("Specify the lead angle in degrees between 0 and 360");
        }
    }
}

fn check_chain_geometry(config: &LeadConfig, chain: &ShapeChain, result: &mut LeadValidationResult) {
    if chain.is_empty() {
        result.report(
            ValidationSeverity::Error,
            format!("Chain {} contains no shapes", chain.id()),
        );
        return;
    }
    let Some(bounds) = chain.bounds() else {
        return;
    };
    let length = config.length;

    let diagonal = bounds.diagonal();
    if length > DIAGONAL_FACTOR * diagonal {
        result.report(
            ValidationSeverity::Warning,
            format!(
                "Lead length {length} exceeds twice the size of chain {} ({diagonal:.2})",
                chain.id()
            ),
        );
        result.suggest("Reduce the lead length to fit the chain size");
    }
    if length > SMALL_CHAIN_LEAD && bounds.max_dimension() < SMALL_CHAIN_DIMENSION {
        result.report(
            ValidationSeverity::Warning,
            format!(
                "Lead length {length} is large for the small chain {}",
                chain.id()
            ),
        );
    }
}

fn check_part_context(
    config: &LeadConfig,
    chain: &ShapeChain,
    part: &DetectedPart<'_>,
    result: &mut LeadValidationResult,
) {
    match part.role_of(chain.id()) {
        None => {
            result.report(
                ValidationSeverity::Warning,
                format!("Chain {} does not belong to part {}", chain.id(), part.id),
            );
        }
        Some(ChainRole::Shell) if config.length > 0.0 => {
            let Some(start) = chain.start_point() else {
                return;
            };
            for hole in &part.holes {
                let distance = polygon::distance_to_boundary(start, hole.chain.boundary());
                if config.length > HOLE_PROXIMITY_RATIO * distance {
                    result.report(
                        ValidationSeverity::Warning,
                        format!(
                            "Lead length {} approaches hole {} ({distance:.2} away)",
                            config.length,
                            hole.chain.id()
                        ),
                    );
                    result.suggest("Shorten the lead or move the chain start away from the hole");
                }
            }
        }
        Some(ChainRole::Hole) if config.kind != LeadKind::None => {
            result.report(
                ValidationSeverity::Info,
                format!("Lead on hole {} is placed inside the hole", chain.id()),
            );
        }
        Some(_) => {}
    }
}

fn check_absolute_length(config: &LeadConfig, result: &mut LeadValidationResult) {
    let length = config.length;
    if length > VERY_LONG_LEAD {
        result.report(
            ValidationSeverity::Warning,
            format!("Lead length {length} is very long"),
        );
    } else if length > 0.0 && length < VERY_SHORT_LEAD {
        result.report(
            ValidationSeverity::Info,
            format!("Lead length {length} is very short"),
        );
    }
}

fn check_cut_direction(
    config: &LeadConfig,
    chain: &ShapeChain,
    cut_direction: CutDirection,
    closure_tolerance: f64,
    result: &mut LeadValidationResult,
) {
    if config.kind == LeadKind::None || chain.is_empty() {
        return;
    }
    let closed = chain.is_closed(closure_tolerance);
    match (closed, cut_direction) {
        (true, CutDirection::None) => {
            result.report(
                ValidationSeverity::Info,
                format!(
                    "No cut direction set for closed chain {}; lead side is inferred from geometry",
                    chain.id()
                ),
            );
            result.suggest("Set a clockwise or counterclockwise cut direction");
        }
        (false, CutDirection::Clockwise | CutDirection::Counterclockwise) => {
            result.report(
                ValidationSeverity::Info,
                format!(
                    "Cut direction {} is not needed for open chain {}",
                    cut_direction.describe(),
                    chain.id()
                ),
            );
        }
        _ => {}
    }
    if config.angle.is_some() && cut_direction != CutDirection::None {
        result.report(
            ValidationSeverity::Info,
            "Manual lead angle overrides automatic tangency",
        );
    }
}
