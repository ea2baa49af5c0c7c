//! Small helpers for mono 16-bit PCM.

/// Nearest-neighbour rate conversion. Good enough for prompts and speech
/// recognition input, not for music.
pub fn resample_nearest(pcm: &[i16], from_hz: u32, to_hz: u32) -> Vec<i16> {
    if from_hz == to_hz || from_hz == 0 || pcm.is_empty() {
        return pcm.to_vec();
    }
    let out_len = (pcm.len() as u64 * u64::from(to_hz) / u64::from(from_hz)) as usize;
    (0..out_len)
        .map(|i| {
            let src = (i as u64 * u64::from(from_hz) / u64::from(to_hz)) as usize;
            pcm[src.min(pcm.len() - 1)]
        })
        .collect()
}

/// Root mean square level of a block, on the i16 scale.
pub fn rms(pcm: &[i16]) -> f32 {
    if pcm.is_empty() {
        return 0.0;
    }
    let sum: f64 = pcm.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / pcm.len() as f64).sqrt() as f32
}

/// Scale to the -1.0..1.0 range most recognisers expect.
pub fn to_f32(pcm: &[i16]) -> Vec<f32> {
    pcm.iter().map(|&s| f32::from(s) / 32768.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_doubles_length() {
        let out = resample_nearest(&[1, 2, 3, 4], 8000, 16000);
        assert_eq!(out, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        assert_eq!(resample_nearest(&[5, 6], 16000, 16000), vec![5, 6]);
    }

    #[test]
    fn test_rms_of_square_wave() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[1000, -1000, 1000, -1000]), 1000.0);
    }

    #[test]
    fn test_to_f32_scale() {
        assert_eq!(to_f32(&[0, -32768, 16384]), vec![0.0, -1.0, 0.5]);
    }
}
