//! Light-sequence object (LSO) encoder.

pub mod frame;
pub mod header;
pub mod layout;

pub use frame::{build_frame, scale_level, write_frame};
pub use header::build_header;

use log::{debug, trace};
use thiserror::Error;

use crate::config::Options;
use crate::vector::Frame;
use layout::{channel_offset, FRAME_DATA_BEGINS, FRAME_SIZE, HEADER_SIZE, NUM_CHANNELS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("frame {frame} has {found} drive levels, expected {expected}", expected = NUM_CHANNELS)]
    ChannelCountMismatch { frame: usize, found: usize },

    #[error("{frames} frames do not fit in a 32 bit script length")]
    ScriptTooLarge { frames: usize },
}

/// A complete LSO file image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Never true for an image produced by [`encode`]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn frame_count(&self) -> usize {
        (self.bytes.len() - HEADER_SIZE) / FRAME_SIZE
    }

    pub fn script_len(&self) -> u32 {
        self.read_u32(layout::header::SCRIPT_SIZE)
    }

    pub fn frame_data_end(&self) -> u32 {
        self.read_u32(layout::header::FRAME_DATA_END)
    }

    pub fn repeats(&self) -> bool {
        self.bytes[layout::header::DONT_REPEAT_FLAG] == 0
    }

    pub fn smooth(&self) -> bool {
        self.bytes[layout::header::SMOOTHING] != 0
    }

    /// Raw 32 byte record of frame `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.frame_count()`.
    pub fn frame_record(&self, index: usize) -> &[u8] {
        let base = FRAME_DATA_BEGINS + index * FRAME_SIZE;
        &self.bytes[base..base + FRAME_SIZE]
    }

    /// Fixed point drive level of `chan` in frame `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.frame_count()` or `chan >= NUM_CHANNELS`.
    pub fn level(&self, index: usize, chan: usize) -> u16 {
        assert!(chan < NUM_CHANNELS, "channel {} out of range", chan);
        let record = self.frame_record(index);
        let offset = channel_offset(chan);
        u16::from_le_bytes([record[offset], record[offset + 1]])
    }

    /// Hold time of frame `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.frame_count()`.
    pub fn duration_ms(&self, index: usize) -> u32 {
        let offset = FRAME_DATA_BEGINS + index * FRAME_SIZE + layout::frame::DURATION;
        self.read_u32(offset)
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes[offset..offset + 4]);
        u32::from_le_bytes(buf)
    }
}

impl AsRef<[u8]> for EncodedImage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode a script into an LSO image.
///
/// Every frame is checked before any byte is produced. A script with no
/// frames encodes to a bare header.
pub fn encode(script: &[Frame], options: &Options) -> Result<EncodedImage, EncodeError> {
    if let Some((frame, found)) = script
        .iter()
        .enumerate()
        .map(|(i, f)| (i, f.channels.len()))
        .find(|&(_, n)| n != NUM_CHANNELS)
    {
        return Err(EncodeError::ChannelCountMismatch { frame, found });
    }

    let total = layout::script_len(script.len());
    let script_len = u32::try_from(total).map_err(|_| EncodeError::ScriptTooLarge {
        frames: script.len(),
    })?;

    let mut bytes = vec![0u8; total];

    for (fnum, (frame, record)) in script
        .iter()
        .zip(bytes[FRAME_DATA_BEGINS..].chunks_exact_mut(FRAME_SIZE))
        .enumerate()
    {
        debug!(
            "Frame#{}: duration(mS)={} drive_vector={:?}",
            fnum, frame.duration_ms, frame.channels
        );
        write_frame(record, frame);
        trace!("Frame#{} record: {}", fnum, hex(record));
    }

    bytes[..HEADER_SIZE].copy_from_slice(&build_header(script_len, options));
    trace!("Header: {}", hex(&bytes[..32]));

    Ok(EncodedImage { bytes })
}

fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zero_frame(duration_ms: u32) -> Frame {
        Frame::new(duration_ms, vec![0.0; NUM_CHANNELS])
    }

    #[test]
    fn test_single_dark_frame() {
        let options = Options {
            looping: false,
            smooth: true,
            dark_after: false,
        };
        let image = encode(&[zero_frame(1000)], &options).unwrap();
        let bytes = image.as_bytes();

        assert_eq!(image.len(), 544);
        assert_eq!(bytes[18], 1);
        assert_eq!(bytes[24], 1);
        assert_eq!(&bytes[512 + 12..512 + 16], &[0xE8, 0x03, 0x00, 0x00]);
        for chan in 0..NUM_CHANNELS {
            assert_eq!(image.level(0, chan), 0);
        }
        assert_eq!(image.script_len(), 544);
        assert_eq!(image.frame_data_end(), 544);
        assert!(!image.repeats());
        assert!(image.smooth());
    }

    #[test]
    fn test_channel_count_mismatch() {
        let script = vec![
            zero_frame(100),
            Frame::new(100, vec![0.0; 7]),
            Frame::new(100, vec![0.0; 9]),
        ];
        let err = encode(&script, &Options::default()).unwrap_err();
        assert_eq!(err, EncodeError::ChannelCountMismatch { frame: 1, found: 7 });
    }

    #[test]
    fn test_loop_ignores_dark_after() {
        for dark_after in [false, true] {
            let options = Options {
                looping: true,
                smooth: false,
                dark_after,
            };
            let image = encode(&[zero_frame(1)], &options).unwrap();
            assert_eq!(image.as_bytes()[18], 0);
            assert!(image.repeats());
        }
    }

    #[test]
    fn test_empty_script_is_bare_header() {
        let image = encode(&[], &Options::default()).unwrap();
        assert_eq!(image.len(), HEADER_SIZE);
        assert_eq!(image.frame_count(), 0);
        assert_eq!(image.script_len(), 512);
    }

    #[test]
    fn test_frames_in_playback_order() {
        let script = vec![
            Frame::new(10, vec![0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            Frame::new(20, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2]),
            Frame::new(30, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.3, 0.0, 0.0]),
        ];
        let image = encode(&script, &Options::default()).unwrap();

        assert_eq!(image.frame_count(), 3);
        assert_eq!(image.duration_ms(0), 10);
        assert_eq!(image.duration_ms(1), 20);
        assert_eq!(image.duration_ms(2), 30);
        assert_eq!(image.level(0, 0), scale_level(0.1));
        assert_eq!(image.level(1, 7), scale_level(0.2));
        assert_eq!(image.level(2, 5), scale_level(0.3));
        assert_eq!(image.frame_record(1), &build_frame(&script[1]));
    }

    #[test]
    #[should_panic]
    fn test_frame_record_past_end_panics() {
        let image = encode(&[zero_frame(1)], &Options::default()).unwrap();
        image.frame_record(1);
    }

    #[test]
    #[should_panic(expected = "channel 8 out of range")]
    fn test_level_past_last_channel_panics() {
        let image = encode(&[zero_frame(1)], &Options::default()).unwrap();
        image.level(0, NUM_CHANNELS);
    }

    #[test]
    fn test_high_bank_never_at_legacy_offsets() {
        let script = vec![Frame::new(0, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0])];
        let image = encode(&script, &Options::default()).unwrap();
        let record = image.frame_record(0);

        assert_eq!(&record[10..16], &[0u8; 6]);
        assert_eq!(&record[16..22], &[0xFF; 6]);
    }

    fn frame_strategy() -> impl Strategy<Value = Frame> {
        (any::<u32>(), prop::collection::vec(0.0f64..=1.0, NUM_CHANNELS))
            .prop_map(|(duration_ms, channels)| Frame::new(duration_ms, channels))
    }

    fn options_strategy() -> impl Strategy<Value = Options> {
        (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(looping, smooth, dark_after)| {
            Options {
                looping,
                smooth,
                dark_after,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_length_and_header(
            script in prop::collection::vec(frame_strategy(), 0..40),
            options in options_strategy(),
        ) {
            let image = encode(&script, &options).unwrap();
            prop_assert_eq!(image.len(), 512 + 32 * script.len());
            prop_assert_eq!(image.script_len() as usize, image.len());
            prop_assert_eq!(image.frame_data_end(), image.script_len());
            prop_assert_eq!(&image.as_bytes()[8..12], &layout::SIGNATURE[..]);
        }

        #[test]
        fn prop_levels_decode(frame in frame_strategy()) {
            let image = encode(std::slice::from_ref(&frame), &Options::default()).unwrap();
            for (chan, &v) in frame.channels.iter().enumerate() {
                prop_assert_eq!(image.level(0, chan), (v * 65535.0).floor() as u16);
            }
            prop_assert_eq!(image.duration_ms(0), frame.duration_ms);
        }

        #[test]
        fn prop_deterministic(
            script in prop::collection::vec(frame_strategy(), 1..10),
            options in options_strategy(),
        ) {
            let first = encode(&script, &options).unwrap();
            let second = encode(&script, &options).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
