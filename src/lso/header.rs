use super::layout::{self, header, HEADER_SIZE};
use crate::config::Options;

/// Build the 512 byte script header.
///
/// `script_len` covers the header plus all frame records. There is no
/// trailer region, so the frame data end offset is the script length too.
/// `dark_after` has no field in this format version.
pub fn build_header(script_len: u32, options: &Options) -> [u8; HEADER_SIZE] {
    let mut out = [0u8; HEADER_SIZE];

    put_u32(&mut out, header::SCRIPT_SIZE, script_len);
    put_u32(&mut out, header::FRAME_DATA_END, script_len);
    out[header::SIGNATURE..header::SIGNATURE + 4].copy_from_slice(&layout::SIGNATURE);

    out[header::NUM_CHANNELS] = layout::NUM_CHANNELS as u8;
    out[header::BYTES_PER_CHANNEL] = layout::BYTES_PER_CHANNEL as u8;
    out[header::DONT_REPEAT_FLAG] = u8::from(!options.looping);
    out[header::TAG] = layout::TAG;
    out[header::SMOOTHING] = u8::from(options.smooth);

    out
}

fn put_u32(out: &mut [u8], offset: usize, v: u32) {
    out[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}
