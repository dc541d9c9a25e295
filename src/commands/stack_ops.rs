//! Structural stack commands.

use tracing::warn;

use super::support::require_stack;
use super::Patch;
use crate::board::BoardState;
use crate::core::config::{BoardConfig, Point};
use crate::core::error::{BoardError, Result};
use crate::core::ids::StackId;
use crate::rules::{validate_merge, MergeCandidate};

pub(crate) fn move_stack(board: &mut BoardState, stack: StackId, x: f64, y: f64) -> Result<Patch> {
    if !board.move_stack(stack, x, y) {
        return Err(BoardError::not_found("stack", stack));
    }
    Ok(Patch::new().updated(stack))
}

pub(crate) fn bring_to_front(board: &mut BoardState, stack: StackId) -> Result<Patch> {
    if !board.bring_to_front(stack) {
        return Err(BoardError::not_found("stack", stack));
    }
    Ok(Patch::new().updated(stack))
}

/// Validated merge of `source` onto `target`.
pub(crate) fn merge(board: &mut BoardState, target: StackId, source: StackId, config: &BoardConfig) -> Result<Patch> {
    require_stack(board, target)?;
    require_stack(board, source)?;
    if target == source {
        return Ok(Patch::new().with_info("merged", false));
    }

    let candidate = MergeCandidate::from_board(board, target, source);
    if let Err(violation) = validate_merge(&config.stacking, &candidate) {
        warn!(%target, %source, %violation, "merge rejected");
        return Err(violation.into());
    }

    board.merge_stacks(target, source);
    Ok(Patch::new().updated(target).removed(source).with_info("merged", true))
}

fn offset_from(board: &BoardState, stack: StackId, config: &BoardConfig) -> Result<Point> {
    let s = require_stack(board, stack)?;
    let offset = config.layout.respawn_offset;
    Ok(Point::new(s.x + offset, s.y + offset))
}

/// Split `[index, len)` off. An out-of-range index splits nothing.
pub(crate) fn split(
    board: &mut BoardState,
    stack: StackId,
    index: usize,
    at: Option<Point>,
    config: &BoardConfig,
) -> Result<Patch> {
    let at = match at {
        Some(at) => at,
        None => offset_from(board, stack, config)?,
    };
    require_stack(board, stack)?;

    Ok(match board.split_stack(stack, index, at) {
        Some(upper) => Patch::new().updated(stack).created(upper).with_info("split", true),
        None => Patch::new().with_info("split", false),
    })
}

pub(crate) fn unstack(board: &mut BoardState, stack: StackId, config: &BoardConfig) -> Result<Patch> {
    require_stack(board, stack)?;
    let ids = board.unstack(stack, config.layout.respawn_offset);
    Ok(Patch::new()
        .updated(stack)
        .created_all(ids.into_iter().filter(|&id| id != stack)))
}

pub(crate) fn pop_bottom(board: &mut BoardState, stack: StackId, at: Option<Point>, config: &BoardConfig) -> Result<Patch> {
    let at = match at {
        Some(at) => at,
        None => offset_from(board, stack, config)?,
    };
    require_stack(board, stack)?;

    Ok(match board.pop_bottom(stack, at) {
        Some(popped) => Patch::new().updated(stack).created(popped),
        None => Patch::new().with_info("popped", false),
    })
}
