use super::layout::{self, channel_offset, FRAME_SIZE, NUM_CHANNELS};
use crate::vector::Frame;

/// Scale a drive level to 16 bit fixed point.
///
/// Truncates toward zero and keeps the low 16 bits, so out-of-range levels
/// wrap the way the firmware tooling always has. A level that does not
/// scale to a finite number drives the channel at 0.
pub fn scale_level(level: f64) -> u16 {
    let scaled = (level * 65535.0).trunc();
    if !scaled.is_finite() {
        return 0;
    }
    // rem_euclid is exact here, even past 2^53
    scaled.rem_euclid(65536.0) as u16
}

/// Encode one frame into its 32 byte record.
///
/// `frame` must carry exactly `NUM_CHANNELS` levels; the encoder checks
/// this before any record is written.
pub fn write_frame(record: &mut [u8], frame: &Frame) {
    debug_assert_eq!(record.len(), FRAME_SIZE);
    debug_assert_eq!(frame.channels.len(), NUM_CHANNELS);

    for (chan, &level) in frame.channels.iter().enumerate() {
        let offset = channel_offset(chan);
        record[offset..offset + 2].copy_from_slice(&scale_level(level).to_le_bytes());
    }

    // Subroutine call reference: 0x0000, no call
    record[layout::frame::SUBROUTINE..layout::frame::SUBROUTINE + 2].fill(0);

    record[layout::frame::DURATION..layout::frame::DURATION + 4]
        .copy_from_slice(&frame.duration_ms.to_le_bytes());
}

/// Build a standalone frame record
pub fn build_frame(frame: &Frame) -> [u8; FRAME_SIZE] {
    let mut record = [0u8; FRAME_SIZE];
    write_frame(&mut record, frame);
    record
}
