/// Cells per memory bank
pub const BANK_SIZE: usize = 64;
pub const BANK_COUNT: usize = 10;
/// Longest waveform the device can hold
pub const MAX_SAMPLES: usize = BANK_SIZE * BANK_COUNT;

/// Location of a sample in the device's paged memory
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Address {
    pub bank: u32,
    pub position: u32,
}

impl Address {
    /// The device only knows its current bank, so one must be selected
    /// before touching the first cell of each.
    pub fn starts_bank(&self) -> bool {
        self.position == 0
    }
}

pub fn address_of(index: usize) -> Address {
    Address {
        // Out of range banks saturate and are rejected by bank-select
        bank: u32::try_from(index / BANK_SIZE).unwrap_or(u32::MAX),
        position: (index % BANK_SIZE) as u32,
    }
}
