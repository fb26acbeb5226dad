use super::{resolve, Pattern, PatternSpec};
use crate::crypto::{fill_exact, EntropySource};
use crate::error::WipeResult;
use PatternSpec::{Fixed, Stream};

pub const BOOK_LEN: usize = 35;

/// The 35 Gutmann passes in book order
///
/// Passes 1-4 and 32-35 are random data, passes 5-31 target MFM and RLL (2,7)
/// encodings. Each fixed pass is a 3-byte group repeated across the device.
pub const BOOK: [(PatternSpec, &str); BOOK_LEN] = [
    (Stream, "Random Pass 1"),
    (Stream, "Random Pass 2"),
    (Stream, "Random Pass 3"),
    (Stream, "Random Pass 4"),
    (Fixed(&[0x55, 0x55, 0x55]), "0x55 - MFM/RLL encoding"),
    (Fixed(&[0xAA, 0xAA, 0xAA]), "0xAA - MFM/RLL encoding"),
    (Fixed(&[0x92, 0x49, 0x24]), "0x92 0x49 0x24 - MFM specific"),
    (Fixed(&[0x49, 0x24, 0x92]), "0x49 0x24 0x92 - MFM specific"),
    (Fixed(&[0x24, 0x92, 0x49]), "0x24 0x92 0x49 - MFM specific"),
    (Fixed(&[0x00, 0x00, 0x00]), "0x00 - All zeros"),
    (Fixed(&[0x11, 0x11, 0x11]), "0x11"),
    (Fixed(&[0x22, 0x22, 0x22]), "0x22"),
    (Fixed(&[0x33, 0x33, 0x33]), "0x33"),
    (Fixed(&[0x44, 0x44, 0x44]), "0x44"),
    (Fixed(&[0x55, 0x55, 0x55]), "0x55"),
    (Fixed(&[0x66, 0x66, 0x66]), "0x66"),
    (Fixed(&[0x77, 0x77, 0x77]), "0x77"),
    (Fixed(&[0x88, 0x88, 0x88]), "0x88"),
    (Fixed(&[0x99, 0x99, 0x99]), "0x99"),
    (Fixed(&[0xAA, 0xAA, 0xAA]), "0xAA"),
    (Fixed(&[0xBB, 0xBB, 0xBB]), "0xBB"),
    (Fixed(&[0xCC, 0xCC, 0xCC]), "0xCC"),
    (Fixed(&[0xDD, 0xDD, 0xDD]), "0xDD"),
    (Fixed(&[0xEE, 0xEE, 0xEE]), "0xEE"),
    (Fixed(&[0xFF, 0xFF, 0xFF]), "0xFF - All ones"),
    (Fixed(&[0x92, 0x49, 0x24]), "RLL (2,7) pattern 1"),
    (Fixed(&[0x49, 0x24, 0x92]), "RLL (2,7) pattern 2"),
    (Fixed(&[0x24, 0x92, 0x49]), "RLL (2,7) pattern 3"),
    (Fixed(&[0x6D, 0xB6, 0xDB]), "RLL (2,7) pattern 4"),
    (Fixed(&[0xB6, 0xDB, 0x6D]), "RLL (2,7) pattern 5"),
    (Fixed(&[0xDB, 0x6D, 0xB6]), "RLL (2,7) pattern 6"),
    (Stream, "Random Pass 32"),
    (Stream, "Random Pass 33"),
    (Stream, "Random Pass 34"),
    (Stream, "Random Pass 35"),
];

/// Pick a book order from a supply of 16-bit draws.
///
/// For each of the 35 output positions one value is drawn and scaled into the
/// number of book entries still unused; the entry at that rank among the unused
/// ones is taken and marked consumed.
pub fn select_order<F>(mut next_draw: F) -> WipeResult<Vec<usize>>
where
    F: FnMut() -> WipeResult<u16>,
{
    let mut used = [false; BOOK_LEN];
    let mut order = Vec::with_capacity(BOOK_LEN);

    for remaining in (1..=BOOK_LEN).rev() {
        let draw = next_draw()? as usize;
        let rank = (draw * remaining) >> 16;

        let slot = used
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .nth(rank)
            .map(|(i, _)| i)
            .unwrap_or(BOOK_LEN - 1);

        used[slot] = true;
        order.push(slot);
    }
    Ok(order)
}

/// Build a permuted, terminated Gutmann table from the entropy source
pub fn permute(entropy: &dyn EntropySource) -> WipeResult<Vec<Pattern>> {
    let order = select_order(|| {
        let mut raw = [0u8; 2];
        fill_exact(entropy, &mut raw)?;
        Ok(u16::from_le_bytes(raw))
    })?;

    let mut table: Vec<PatternSpec> = order.iter().map(|&slot| BOOK[slot].0).collect();
    table.push(PatternSpec::End);
    resolve(&table, &[])
}

/// Book description for a resolved pattern, for log lines
pub fn describe(pattern: &Pattern) -> &'static str {
    match pattern {
        Pattern::Random => "random",
        Pattern::End => "end",
        Pattern::Static(bytes) => BOOK
            .iter()
            .find(|(spec, _)| matches!(spec, Fixed(b) if *b == bytes.as_slice()))
            .map(|(_, desc)| *desc)
            .unwrap_or("static"),
    }
}
