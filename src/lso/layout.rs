//! Byte layout of an Octa (8 channel, 16 bit) light-sequence object.
//!
//! ```text
//! header (512 bytes)
//!   0..4    script length, LE u32
//!   4..8    frame data end, LE u32 (= script length)
//!   8..12   signature 02 18 02 65
//!   16      channel count
//!   17      bytes per channel
//!   18      don't repeat flag
//!   19      tag
//!   24      smoothing flag
//! frame record (32 bytes, from 512 + 32 * i)
//!   0..10   channels 0-4, LE u16 each
//!   10..12  subroutine call (0 = none)
//!   12..16  duration ms, LE u32
//!   16..22  channels 5-7, LE u16 each
//!   22..32  unused
//! ```

pub const HEADER_SIZE: usize = 512;
pub const FRAME_DATA_BEGINS: usize = HEADER_SIZE;
pub const FRAME_SIZE: usize = 32;
pub const NUM_CHANNELS: usize = 8;
pub const BYTES_PER_CHANNEL: usize = 2;

pub const SIGNATURE: [u8; 4] = [0x02, 0x18, 0x02, 0x65];
pub const TAG: u8 = 0x01;

/// Header field offsets
pub mod header {
    pub const SCRIPT_SIZE: usize = 0;
    pub const FRAME_DATA_END: usize = 4;
    pub const SIGNATURE: usize = 8;
    pub const NUM_CHANNELS: usize = 16;
    pub const BYTES_PER_CHANNEL: usize = 17;
    pub const DONT_REPEAT_FLAG: usize = 18;
    pub const TAG: usize = 19;
    pub const SMOOTHING: usize = 24;
}

/// Frame record field offsets, relative to the record start
pub mod frame {
    /// Channels below this index sit before the subroutine field
    pub const LOW_BANK_CHANNELS: usize = 5;
    /// Shift applied to channels in the high bank
    pub const HIGH_BANK_SHIFT: usize = 6;
    pub const SUBROUTINE: usize = 10;
    pub const DURATION: usize = 12;
}

/// Offset of a channel's low byte within a frame record
pub const fn channel_offset(chan: usize) -> usize {
    if chan < frame::LOW_BANK_CHANNELS {
        chan * BYTES_PER_CHANNEL
    } else {
        chan * BYTES_PER_CHANNEL + frame::HIGH_BANK_SHIFT
    }
}

/// Total image length for a given frame count
pub const fn script_len(frames: usize) -> usize {
    HEADER_SIZE + frames * FRAME_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_offsets() {
        let offsets: Vec<usize> = (0..NUM_CHANNELS).map(channel_offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6, 8, 16, 18, 20]);
    }

    #[test]
    fn test_fields_do_not_overlap() {
        let mut used = [false; FRAME_SIZE];
        let mut claim = |start: usize, len: usize| {
            for slot in &mut used[start..start + len] {
                assert!(!*slot, "byte {} claimed twice", start);
                *slot = true;
            }
        };

        for chan in 0..NUM_CHANNELS {
            claim(channel_offset(chan), BYTES_PER_CHANNEL);
        }
        claim(frame::SUBROUTINE, 2);
        claim(frame::DURATION, 4);
    }

    #[test]
    fn test_script_len() {
        assert_eq!(script_len(0), 512);
        assert_eq!(script_len(1), 544);
        assert_eq!(script_len(10), 832);
    }
}
