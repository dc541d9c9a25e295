//! Spawning commands: single cards, deck packs, the starting layout.

use tracing::info;

use super::support::initial_data;
use super::{CommandContext, Patch};
use crate::board::BoardState;
use crate::cards::CardData;
use crate::core::config::{BoardConfig, Point};
use crate::core::error::Result;
use crate::core::kind::{CardKind, DefId};

pub(crate) fn spawn_card(
    board: &mut BoardState,
    def_id: &DefId,
    at: Point,
    data: &CardData,
    config: &BoardConfig,
) -> Result<Patch> {
    let mut bag = initial_data(config, def_id);
    bag.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
    let (stack, _) = board.spawn_card(def_id.clone(), bag, at.x, at.y);
    Ok(Patch::new().created(stack))
}

/// Buy a deck pack. The deck's coin cost is charged first.
pub(crate) fn spawn_pack(board: &mut BoardState, deck_id: &str, at: Point, ctx: &CommandContext<'_>) -> Result<Patch> {
    let deck = ctx.config.deck(deck_id)?;
    let coin = &ctx.config.economy.coin;
    if deck.cost > 0 {
        ctx.players.spend_loot(coin, deck.cost)?;
    }

    let (stack, _) = board.spawn_card(DefId::of(CardKind::Deck, deck_id), CardData::default(), at.x, at.y);
    ctx.players.increment_metric("packs_spawned", 1);
    Ok(Patch::new().created(stack).with_info("coinSpent", deck.cost.max(0)))
}

/// Lay out the starting cards on an empty board. Does nothing otherwise.
pub(crate) fn seed_default(board: &mut BoardState, config: &BoardConfig) -> Result<Patch> {
    if !board.is_empty() {
        return Ok(Patch::new().with_info("seeded", false));
    }

    let layout = &config.layout;
    let mut patch = Patch::new();
    for (i, def_id) in layout.default_seed.iter().enumerate() {
        let x = layout.seed_origin.x + layout.seed_spacing * i as f64;
        let (stack, _) = board.spawn_card(def_id.clone(), initial_data(config, def_id), x, layout.seed_origin.y);
        patch = patch.created(stack);
    }
    info!(stacks = patch.created.len(), "seeded default board");
    Ok(patch.with_info("seeded", true))
}
