use crate::error::{GateError, GateResult};

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// PKCS#7 pad. Always adds between 1 and `block_size` bytes; an aligned
/// input gets a full block of padding.
pub fn pkcs7_pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let padding = block_size - (data.len() % block_size);
    let mut out = Vec::with_capacity(data.len() + padding);
    out.extend_from_slice(data);
    out.resize(data.len() + padding, padding as u8);
    out
}

/// Strip PKCS#7 padding, checking every pad byte.
pub fn pkcs7_unpad(data: &[u8]) -> GateResult<&[u8]> {
    let length = data.len();
    let Some(&last) = data.last() else {
        return Err(GateError::Padding("empty data".into()));
    };

    let padding = last as usize;
    if padding == 0 || padding > length {
        return Err(GateError::Padding("invalid padding size".into()));
    }

    if data[length - padding..].iter().any(|&b| b != last) {
        return Err(GateError::Padding("invalid padding".into()));
    }

    Ok(&data[..length - padding])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_length_across_several_blocks() {
        for len in 0..=(BLOCK_SIZE * 3) {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let padded = pkcs7_pad(&data, BLOCK_SIZE);

            assert_eq!(padded.len() % BLOCK_SIZE, 0);
            let added = padded.len() - len;
            assert!((1..=BLOCK_SIZE).contains(&added), "len {} added {}", len, added);

            assert_eq!(pkcs7_unpad(&padded).unwrap(), data.as_slice());
        }
    }

    #[test]
    fn aligned_input_gets_a_full_block() {
        let padded = pkcs7_pad(&[7u8; 16], BLOCK_SIZE);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn rejects_zero_pad_byte() {
        let mut data = vec![b'a'; 15];
        data.push(0);
        assert!(matches!(pkcs7_unpad(&data), Err(GateError::Padding(_))));
    }

    #[test]
    fn rejects_pad_longer_than_buffer() {
        assert!(matches!(pkcs7_unpad(&[5, 5, 5]), Err(GateError::Padding(_))));
    }

    #[test]
    fn rejects_inconsistent_pad_bytes() {
        let mut data = vec![b'a'; 12];
        data.extend_from_slice(&[4, 4, 3, 4]);
        assert!(matches!(pkcs7_unpad(&data), Err(GateError::Padding(_))));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(pkcs7_unpad(&[]), Err(GateError::Padding(_))));
    }
}
