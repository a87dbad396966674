//! Trim persistence in the last flash sector
//!
//! One tiny fixed record: a magic word followed by the two trim values.
//! The sector is excluded from the program image in memory.x. A missing or
//! foreign magic word reads as "no record", never as an error.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use trundle_core::hal::{StorageError, TrimStore};
use trundle_core::CalibrationOffsets;

use crate::system::resources::FlashResources;

/// Total flash fitted on the board
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Record location: the reserved last sector
const RECORD_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// "TRM1"
const MAGIC: u32 = 0x5452_4D31;

pub struct FlashTrims {
    flash: Flash<'static, FLASH, Blocking, FLASH_SIZE>,
}

impl FlashTrims {
    pub fn new(r: FlashResources) -> Self {
        Self {
            flash: Flash::new_blocking(r.flash),
        }
    }
}

impl TrimStore for FlashTrims {
    fn load(&mut self) -> Result<Option<CalibrationOffsets>, StorageError> {
        let mut buf = [0u8; 8];
        self.flash
            .blocking_read(RECORD_OFFSET, &mut buf)
            .map_err(|_| StorageError)?;

        let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != MAGIC {
            return Ok(None);
        }
        Ok(Some(CalibrationOffsets {
            left: i16::from_le_bytes([buf[4], buf[5]]),
            right: i16::from_le_bytes([buf[6], buf[7]]),
        }))
    }

    fn save(&mut self, trims: &CalibrationOffsets) -> Result<(), StorageError> {
        let mut buf = [0u8; 8];
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..6].copy_from_slice(&trims.left.to_le_bytes());
        buf[6..8].copy_from_slice(&trims.right.to_le_bytes());

        self.flash
            .blocking_erase(RECORD_OFFSET, RECORD_OFFSET + ERASE_SIZE as u32)
            .map_err(|_| StorageError)?;
        self.flash
            .blocking_write(RECORD_OFFSET, &buf)
            .map_err(|_| StorageError)
    }
}
