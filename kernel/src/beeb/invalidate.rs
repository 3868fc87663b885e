//! Invalidation & Re-JIT (spec §4.5): the only moment a slot's host code
//! stops matching guest memory is a write landing inside an address
//! range that has already been translated, or a sideways-bank switch
//! changing what the `0x8000-0xBFFF` window means.
//!
//! `GuestMemory` already marks pages `Stale` on write (memory.rs); this
//! module is the other half — walking a `Stale` range and resetting each
//! slot back to its self-describing "please retranslate me" stub
//! (arena.rs) before the next entry can reach it.

use super::arena::Arena;
use super::memory::{CodeHint, GuestMemory};

/// Resets every translated slot in `[addr, addr+len)` back to the
/// untranslated stub and clears the corresponding page hints. Called
/// right after a guest write (self-modifying code) or a ROMSEL write
/// that changes the sideways bank (spec §4.7 Design Note).
pub fn invalidate_range(arena: &mut Arena, mem: &mut GuestMemory, addr: u16, len: u16) {
    mem.invalidate_range(addr, len);
    let first_page = (addr >> 8) as u8;
    let last_page = ((addr.wrapping_add(len.saturating_sub(1))) >> 8) as u8;
    let mut page = first_page;
    loop {
        if mem.hint(page) == CodeHint::Stale {
            reset_page(arena, page);
            mem.set_hint(page, CodeHint::Untranslated);
        }
        if page == last_page {
            break;
        }
        page = page.wrapping_add(1);
    }
}

fn reset_page(arena: &mut Arena, page: u8) {
    let base = (page as u16) << 8;
    for offset in 0u16..=0xFF {
        // `reset_slot` is cheap relative to translation; resetting a
        // whole page eagerly avoids keeping a finer-grained dirty map
        // just for this rare path (spec's own framing: self-modifying
        // code is the exception, not the steady state).
        let _ = arena.reset_slot(base.wrapping_add(offset));
    }
}

/// Called when `0xFE30` (ROMSEL) changes the selected sideways bank: the
/// entire `0x8000-0xBFFF` window now means something different, so every
/// slot in it is invalidated regardless of whether it happens to be
/// byte-for-byte identical in the new bank.
pub fn invalidate_sideways_window(arena: &mut Arena, mem: &mut GuestMemory) {
    invalidate_range(arena, mem, 0x8000, 0x4000);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beeb::rom::RomSet;
    use alloc::vec;

    #[test]
    fn write_to_translated_page_resets_its_slots() {
        let mut arena = Arena::new();
        let mut mem = GuestMemory::new(RomSet::new(vec![0u8; 0x4000]));
        mem.set_hint(0x02, CodeHint::Translated);
        mem.write(0x0200, 0xEA);
        assert_eq!(mem.hint(0x02), CodeHint::Untranslated);
        let _ = &mut arena;
    }
}
