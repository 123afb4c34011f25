//! Mutation requests and the pure region transform that applies them.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, info, warn};

use super::{box_slot_offset, read_key, GameStateSnapshot, TranscodeError};
use crate::items::{to_version2_layout, write_bag, ItemStack};
use crate::mon::{self, PokemonRecord};
use crate::pokedex::{self, DexStatus};
use crate::profile::{
    FormatProfile, FormatVersion, BOX_MON_SIZE, MONS_PER_BOX, PLAY_HOURS_OFFSET,
    PLAY_MINUTES_OFFSET, TOTAL_BOXES,
};
use crate::sector::RegionName;
use crate::store::RegionSet;

pub const TAMPER_MONEY: u32 = 99_999;
pub const TAMPER_ITEM:  ItemStack = ItemStack { id: 4, quantity: 20 };

/// Changes to apply to a save.  Every field is optional; the default leaves
/// the save untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    pub money:   Option<u32>,
    pub hours:   Option<u16>,
    pub minutes: Option<u8>,
    /// Replaces the whole bag.
    pub items:   Option<Vec<ItemStack>>,
    /// Copy the first party member into the first empty box slot.
    pub clone_party_into_first_empty_box_slot: bool,
    /// Placed into the remaining empty box slots in order.
    pub inject_records:     Vec<PokemonRecord>,
    pub fill_entire_pokedex: bool,
    /// Merged into the dex masks (V2 saves only).
    pub pokedex_override:   Option<Vec<DexStatus>>,
}

impl Mutation {
    /// Debug preset: lots of money, a stack of balls, a cloned party lead and
    /// a completed dex.
    pub fn tamper() -> Self {
        Self {
            money: Some(TAMPER_MONEY),
            items: Some(vec![TAMPER_ITEM]),
            clone_party_into_first_empty_box_slot: true,
            fill_entire_pokedex: true,
            ..Self::default()
        }
    }

    /// Carry money, play time, bag, records and dex of `source` over to a save
    /// of version `target`.
    pub fn merge_from(source: &GameStateSnapshot, target: FormatVersion) -> Self {
        let items = if source.version == FormatVersion::V1 && target == FormatVersion::V2 {
            to_version2_layout(&source.items)
        } else {
            source.items.clone()
        };
        Self {
            money:            Some(source.stats.money),
            hours:            Some(source.stats.hours),
            minutes:          Some(source.stats.minutes),
            items:            Some(items),
            inject_records:   source.records().cloned().collect(),
            pokedex_override: Some(source.pokedex.entries.clone()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Box placement plan: empty slots are taken in scan order, first by the
/// clone (if any), then by injected records.
fn place_records<'a>(
    snapshot: &'a GameStateSnapshot,
    mutation: &'a Mutation,
) -> Vec<((usize, usize), &'a PokemonRecord)> {
    let mut pending: Vec<&PokemonRecord> = Vec::new();
    if mutation.clone_party_into_first_empty_box_slot {
        match snapshot.party.first() {
            Some(lead) => pending.push(lead),
            None => warn!("clone requested but the party is empty"),
        }
    }
    pending.extend(mutation.inject_records.iter());

    let empty_slots = (0..TOTAL_BOXES)
        .flat_map(|b| (0..MONS_PER_BOX).map(move |s| (b, s)))
        .filter(|&(b, s)| !snapshot.is_box_slot_occupied(b + 1, s + 1));

    let placed: Vec<_> = empty_slots.zip(pending.iter().copied()).collect();
    if placed.len() < pending.len() {
        warn!(
            requested = pending.len(),
            placed = placed.len(),
            "not enough empty box slots"
        );
    }
    placed
}

/// Apply `mutation` to a copy of `regions`.
///
/// `snapshot` must have been extracted from `regions` with the same profile.
pub fn apply_mutation(
    regions:  &RegionSet,
    profile:  &FormatProfile,
    snapshot: &GameStateSnapshot,
    mutation: &Mutation,
) -> Result<RegionSet, TranscodeError> {
    let mut out = regions.clone();
    let key = read_key(&out[RegionName::Slot1SaveBlock2].data, profile);
    let trainer_id = snapshot.trainer.id;

    // SAVEBLOCK2: play time.
    {
        let sb2 = &mut out[RegionName::Slot1SaveBlock2].data;
        if let Some(hours) = mutation.hours {
            LittleEndian::write_u16(&mut sb2[PLAY_HOURS_OFFSET..], hours);
        }
        if let Some(minutes) = mutation.minutes {
            sb2[PLAY_MINUTES_OFFSET] = minutes;
        }
    }

    // PKMNSTORAGE: clone + injections.
    let placed = place_records(snapshot, mutation);
    {
        let storage = &mut out[RegionName::Slot1PkmnStorage].data;
        for &((box_index, slot_index), record) in &placed {
            let at = box_slot_offset(box_index, slot_index);
            let raw = mon::encode(record, profile.version, Some(trainer_id));
            storage[at..at + BOX_MON_SIZE].copy_from_slice(&raw);
            debug!(
                box_number = box_index + 1,
                slot = slot_index + 1,
                species = record.species(),
                "placed record"
            );
        }
    }

    // SAVEBLOCK1: money, bag, pokedex.
    let sb1 = &mut out[RegionName::Slot1SaveBlock1].data;
    if let Some(money) = mutation.money {
        LittleEndian::write_u32(&mut sb1[profile.money_offset..], money ^ key);
    }
    if let Some(items) = &mutation.items {
        let written = write_bag(sb1, profile, key, items);
        debug!(written, "rewrote bag");
    }

    let seen_range   = profile.dex_seen_offset..profile.dex_seen_offset + profile.dex_size;
    let caught_range = profile.dex_caught_offset()..profile.dex_caught_offset() + profile.dex_size;
    if mutation.fill_entire_pokedex {
        pokedex::fill(&mut sb1[seen_range.clone()]);
        pokedex::fill(&mut sb1[caught_range.clone()]);
    }
    if let Some(entries) = &mutation.pokedex_override {
        if profile.version == FormatVersion::V2 {
            let records = snapshot.records().chain(placed.iter().map(|&(_, r)| r));
            let (seen, caught) = pokedex::to_bitmasks(
                entries,
                records,
                &sb1[seen_range.clone()],
                &sb1[caught_range.clone()],
                profile.version,
            );
            sb1[seen_range].copy_from_slice(&seen);
            sb1[caught_range].copy_from_slice(&caught);
        } else {
            info!("pokedex merge into a {} save is not supported, leaving it unchanged", profile.version);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::read_bag;
    use crate::profile::{
        PARTY_COUNT_OFFSET, PARTY_OFFSET, PROFILE_V1, PROFILE_V2, TRAINER_ID_OFFSET,
        VERSION_FIELD_OFFSET, VERSION_FIELD_V1,
    };
    use crate::transcoder::extract_snapshot;

    fn regions(profile: &FormatProfile) -> RegionSet {
        let mut r = RegionSet::new(profile);
        let field = if profile.version == FormatVersion::V1 { VERSION_FIELD_V1 } else { 0 };
        let sb1 = &mut r[RegionName::Slot1SaveBlock1];
        LittleEndian::write_u16(&mut sb1.data[VERSION_FIELD_OFFSET..], field);
        sb1.sectors_merged = 1;
        let sb2 = &mut r[RegionName::Slot1SaveBlock2].data;
        LittleEndian::write_u32(&mut sb2[profile.encryption_key_offset..], 0x5555_1111);
        LittleEndian::write_u32(&mut sb2[TRAINER_ID_OFFSET..], 0xCAFE_0000);
        r
    }

    fn with_party_lead(mut r: RegionSet, profile: &FormatProfile) -> RegionSet {
        let sb1 = &mut r[RegionName::Slot1SaveBlock1].data;
        sb1[PARTY_COUNT_OFFSET] = 1;
        let at = PARTY_OFFSET;
        LittleEndian::write_u32(&mut sb1[at..], 24);
        LittleEndian::write_u32(&mut sb1[at + 4..], 0x0000_0777);
        r
    }

    #[test]
    fn default_mutation_changes_nothing() {
        let p = &PROFILE_V2;
        let r = regions(p);
        let snap = extract_snapshot(&r, p).unwrap();
        assert!(Mutation::default().is_empty());
        assert_eq!(apply_mutation(&r, p, &snap, &Mutation::default()).unwrap(), r);
    }

    #[test]
    fn tamper_preset_rewrites_money_bag_dex_and_clones() {
        let p = &PROFILE_V2;
        let r = with_party_lead(regions(p), p);
        let snap = extract_snapshot(&r, p).unwrap();
        let out = apply_mutation(&r, p, &snap, &Mutation::tamper()).unwrap();
        let after = extract_snapshot(&out, p).unwrap();

        assert_eq!(after.stats.money, TAMPER_MONEY);
        assert_eq!(after.items, vec![TAMPER_ITEM]);
        assert_eq!(after.boxes.len(), 1);
        assert_eq!((after.boxes[0].box_number, after.boxes[0].slot), (1, 1));
        assert_eq!(after.boxes[0].record.personality, 24);
        assert_eq!(after.boxes[0].record.trainer_id, 0xCAFE_0000);
        assert_eq!(after.pokedex.caught, p.dex_size * 8 - 1);
    }

    #[test]
    fn clone_without_party_is_skipped() {
        let p = &PROFILE_V1;
        let r = regions(p);
        let snap = extract_snapshot(&r, p).unwrap();
        let m = Mutation { clone_party_into_first_empty_box_slot: true, ..Mutation::default() };
        let out = apply_mutation(&r, p, &snap, &m).unwrap();
        assert!(extract_snapshot(&out, p).unwrap().boxes.is_empty());
    }

    #[test]
    fn injected_records_fill_free_slots_and_are_reowned() {
        let p = &PROFILE_V2;
        let mut r = regions(p);
        // occupy box 1 slot 1
        LittleEndian::write_u32(&mut r[RegionName::Slot1PkmnStorage].data[box_slot_offset(0, 0) + 4..], 9);

        let donor = with_party_lead(regions(p), p);
        let donor = extract_snapshot(&donor, p).unwrap().party[0].clone();

        let snap = extract_snapshot(&r, p).unwrap();
        let m = Mutation { inject_records: vec![donor.clone(), donor], ..Mutation::default() };
        let after = extract_snapshot(&apply_mutation(&r, p, &snap, &m).unwrap(), p).unwrap();

        let placed: Vec<_> = after.boxes.iter().map(|b| (b.box_number, b.slot, b.record.trainer_id)).collect();
        assert_eq!(placed, vec![(1, 1, 9), (1, 2, 0xCAFE_0000), (1, 3, 0xCAFE_0000)]);
        assert!(after.boxes[1].record.has_valid_checksum());
    }

    #[test]
    fn minutes_and_hours_are_written_to_their_own_fields() {
        let p = &PROFILE_V2;
        let r = regions(p);
        let snap = extract_snapshot(&r, p).unwrap();
        let m = Mutation { hours: Some(300), minutes: Some(59), ..Mutation::default() };
        let after = extract_snapshot(&apply_mutation(&r, p, &snap, &m).unwrap(), p).unwrap();
        assert_eq!((after.stats.hours, after.stats.minutes), (300, 59));
    }

    #[test]
    fn pokedex_override_is_ignored_on_v1() {
        let p = &PROFILE_V1;
        let r = regions(p);
        let snap = extract_snapshot(&r, p).unwrap();
        let m = Mutation { pokedex_override: Some(vec![DexStatus::Caught; 10]), ..Mutation::default() };
        assert_eq!(apply_mutation(&r, p, &snap, &m).unwrap(), r);
    }

    #[test]
    fn merge_from_v1_remaps_bag() {
        let p = &PROFILE_V1;
        let mut r = regions(p);
        let key = 0x5555_1111;
        write_bag(&mut r[RegionName::Slot1SaveBlock1].data, p, key, &[ItemStack::new(4, 2), ItemStack::new(30, 1)]);
        let source = extract_snapshot(&r, p).unwrap();
        assert_eq!(read_bag(&r[RegionName::Slot1SaveBlock1].data, p, key).len(), 2);

        let m = Mutation::merge_from(&source, FormatVersion::V2);
        assert_eq!(m.items, Some(vec![ItemStack::new(41, 1), ItemStack::new(4, 2)]));
        assert_eq!(m.money, Some(source.stats.money));
        assert_eq!(m.inject_records.len(), source.party.len() + source.boxes.len());
        assert!(!m.fill_entire_pokedex);

        let same = Mutation::merge_from(&source, FormatVersion::V1);
        assert_eq!(same.items, Some(source.items.clone()));
    }
}
