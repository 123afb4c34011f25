//! Bag contents and the 1.3.2 → 2.0 item id remapping.
//!
//! Each bag slot is `id u16 | quantity u16`, with the quantity XORed against
//! the low half of the save's encryption key.  Id 0 marks an unused slot.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use tracing::warn;

use crate::profile::FormatProfile;

pub const ITEM_SLOT_SIZE:    usize = 4;

pub const LAST_BALL_V1:      u16 = 27;
pub const LAST_BALL_V2:      u16 = 28;
/// Shift applied to every V1 id past the ball range.
pub const ITEM_ID_SHIFT:     u16 = 11;
pub const LAST_EVOLUTION_V2: u16 = 256;
pub const FIRST_BERRY_V2:    u16 = 525;
pub const LAST_BERRY_V2:     u16 = 592;
pub const FIRST_TMHM_V2:     u16 = 593;
pub const LAST_TMHM_V2:      u16 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemStack {
    pub id:       u16,
    pub quantity: u16,
}

impl ItemStack {
    pub fn new(id: u16, quantity: u16) -> Self {
        Self { id, quantity }
    }
}

/// Bag pockets of the 2.0 layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pocket {
    Items,
    Balls,
    Berries,
    TmHm,
}

pub fn pocket_v2(id: u16) -> Option<Pocket> {
    match id {
        1..=LAST_BALL_V2                     => Some(Pocket::Balls),
        29..=LAST_EVOLUTION_V2               => Some(Pocket::Items),
        FIRST_BERRY_V2..=LAST_BERRY_V2       => Some(Pocket::Berries),
        FIRST_TMHM_V2..=LAST_TMHM_V2         => Some(Pocket::TmHm),
        _                                    => None,
    }
}

/// Remap a V1 bag for a V2 save.
///
/// Ids past the V1 ball range move up by [`ITEM_ID_SHIFT`]; the result is
/// stably sorted by id and regrouped as the Items pocket followed by the Balls
/// pocket.  Berries, TMs / HMs and anything outside a known pocket are not
/// carried over.
pub fn to_version2_layout(items: &[ItemStack]) -> Vec<ItemStack> {
    let mut remapped: Vec<ItemStack> = items
        .iter()
        .map(|it| ItemStack {
            id: if it.id > LAST_BALL_V1 { it.id.saturating_add(ITEM_ID_SHIFT) } else { it.id },
            ..*it
        })
        .collect();
    remapped.sort_by_key(|it| it.id);

    [Pocket::Items, Pocket::Balls]
        .iter()
        .flat_map(|&pocket| {
            remapped
                .iter()
                .copied()
                .filter(move |it| pocket_v2(it.id) == Some(pocket))
        })
        .collect()
}

/// Non-empty bag slots, with quantities deciphered.
pub fn read_bag(sb1: &[u8], profile: &FormatProfile, key: u32) -> Vec<ItemStack> {
    let mask = key as u16;
    (0..profile.bag_capacity)
        .filter_map(|i| {
            let at = profile.items_offset + i * ITEM_SLOT_SIZE;
            let slot = sb1.get(at..at + ITEM_SLOT_SIZE)?;
            let id = LittleEndian::read_u16(&slot[0..2]);
            (id != 0).then(|| ItemStack::new(id, LittleEndian::read_u16(&slot[2..4]) ^ mask))
        })
        .collect()
}

/// Replace the whole bag with `items`.
///
/// Slots past the end of `items` are zeroed (raw zero, not ciphered); items
/// beyond the bag capacity are dropped.  Returns the number of stacks written.
pub fn write_bag(sb1: &mut [u8], profile: &FormatProfile, key: u32, items: &[ItemStack]) -> usize {
    let mask = key as u16;
    if items.len() > profile.bag_capacity {
        warn!(
            capacity = profile.bag_capacity,
            dropped = items.len() - profile.bag_capacity,
            "bag over capacity, dropping trailing items"
        );
    }

    for i in 0..profile.bag_capacity {
        let at = profile.items_offset + i * ITEM_SLOT_SIZE;
        let slot = &mut sb1[at..at + ITEM_SLOT_SIZE];
        match items.get(i) {
            Some(it) => {
                LittleEndian::write_u16(&mut slot[0..2], it.id);
                LittleEndian::write_u16(&mut slot[2..4], it.quantity ^ mask);
            }
            None => slot.fill(0),
        }
    }
    items.len().min(profile.bag_capacity)
}
