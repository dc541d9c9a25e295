//! Opening deck packs.
//!
//! The pack's deck id is the sub-id of its deck card (`deck.starter` opens
//! deck `starter`). Drawn cards are laid out evenly on a circle around the
//! pack's position, then the pack stack is removed.

use std::f64::consts::TAU;

use tracing::info;

use super::support::{initial_data, require_stack, sub_id_of};
use super::{CommandContext, Patch};
use crate::board::BoardState;
use crate::core::error::{BoardError, Result};
use crate::core::ids::StackId;
use crate::core::kind::CardKind;
use crate::core::rng::{RngSource, WeightedPool};

pub(crate) fn open_pack(
    board: &mut BoardState,
    stack: StackId,
    seed: Option<u64>,
    radius: Option<f64>,
    ctx: &CommandContext<'_>,
) -> Result<Patch> {
    let pack = require_stack(board, stack)?;
    let center = (pack.x, pack.y);
    let deck_card = board
        .find_in(stack, CardKind::Deck)
        .ok_or_else(|| BoardError::rule(format!("{stack} is not a deck pack")))?;
    let deck_id = sub_id_of(deck_card)?;

    let deck = ctx.config.deck(&deck_id)?;
    let count = usize::try_from(deck.draws.count)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| BoardError::config(format!("deck '{deck_id}' has a non-positive draw count")))?;
    let pool = WeightedPool::new(deck.pool.iter().map(|entry| (entry.card.def_id(), entry.weight)));
    if pool.is_empty() {
        return Err(BoardError::config(format!("deck '{deck_id}' has an empty pool")));
    }

    let deterministic = ctx
        .config
        .deterministic_deck_draws
        .then(|| (deck_id.clone(), stack, board.z_counter()));
    let mut rng = RngSource::resolve(seed, deterministic).into_rng();
    let drawn: Vec<_> = pool.draw_many(&mut rng, count).into_iter().cloned().collect();

    let radius = radius.or(deck.radius).unwrap_or(ctx.config.layout.pack_radius);
    let mut patch = Patch::new();
    for (i, def_id) in drawn.iter().enumerate() {
        let angle = TAU * i as f64 / drawn.len() as f64;
        let x = center.0 + radius * angle.cos();
        let y = center.1 + radius * angle.sin();
        let (created, _) = board.spawn_card(def_id.clone(), initial_data(ctx.config, def_id), x, y);
        patch = patch.created(created);
    }
    board.remove_stack(stack);

    ctx.players.increment_deck_opens(&deck_id);
    ctx.players.increment_metric("packs_opened", 1);
    info!(deck = %deck_id, %stack, drawn = drawn.len(), seed = rng.seed(), "opened deck pack");

    Ok(patch
        .removed(stack)
        .with_info("deckId", deck_id)
        .with_info("seed", rng.seed()))
}
