//! Length-prefixed framing: a 4-byte ASCII decimal header followed by
//! exactly that many payload bytes.
//!
//! ```text
//! 0053{"service":"auth","path":"/login","data":{"ok":true}}
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::IngestError;

/// Size of the length header in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest payload a 4-digit header can describe.
pub const MAX_PAYLOAD_LEN: usize = 9999;

/// Read one frame and return its payload.
///
/// Consumes exactly `HEADER_LEN + N` bytes on success. A bad header stops
/// reading right after the header.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, IngestError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    let got = read_full(reader, &mut header).await?;
    if got < HEADER_LEN {
        return Err(IngestError::MalformedLength);
    }
    let len = parse_length(header)?;

    let mut payload = vec![0u8; len];
    let received = read_full(reader, &mut payload).await?;
    if received < len {
        return Err(IngestError::TruncatedPayload { expected: len, received });
    }
    Ok(payload)
}

/// Decode the length header. Only ASCII digits are accepted: no sign,
/// no whitespace.
pub fn parse_length(header: [u8; HEADER_LEN]) -> Result<usize, IngestError> {
    header.iter().try_fold(0usize, |acc, b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + usize::from(b - b'0'))
        } else {
            Err(IngestError::MalformedLength)
        }
    })
}

/// Build a frame for `payload`.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, IngestError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(IngestError::PayloadTooLarge(payload.len()));
    }
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(format!("{:04}", payload.len()).as_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Fill `buf` until it is full or the peer closes. Returns bytes read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize, IngestError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(IngestError::Read(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_length_accepts_zero_padded_digits() {
        assert_eq!(parse_length(*b"0042").unwrap(), 42);
        assert_eq!(parse_length(*b"0000").unwrap(), 0);
        assert_eq!(parse_length(*b"9999").unwrap(), 9999);
    }

    #[test]
    fn parse_length_rejects_non_digits() {
        for header in [b"abcd", b"  42", b"+042", b"-001", b"42\n\n", b"0x10"] {
            assert!(
                matches!(parse_length(*header), Err(IngestError::MalformedLength)),
                "accepted {:?}",
                String::from_utf8_lossy(header)
            );
        }
    }

    #[tokio::test]
    async fn reads_exactly_one_frame() {
        let mut input = Cursor::new(b"0005hello0003abc".to_vec());
        let payload = read_frame(&mut input).await.unwrap();
        assert_eq!(payload, b"hello");
        assert_eq!(input.position(), 9);
    }

    #[tokio::test]
    async fn bad_header_reads_nothing_more() {
        let mut input = Cursor::new(b"abcd{\"service\":\"a\"}".to_vec());
        let err = read_frame(&mut input).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedLength));
        assert_eq!(input.position(), 4);
    }

    #[tokio::test]
    async fn short_header_is_malformed_length() {
        let mut input = Cursor::new(b"00".to_vec());
        let err = read_frame(&mut input).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedLength));
    }

    #[tokio::test]
    async fn empty_stream_is_malformed_length() {
        let mut input = Cursor::new(Vec::new());
        assert!(matches!(read_frame(&mut input).await, Err(IngestError::MalformedLength)));
    }

    #[tokio::test]
    async fn short_payload_is_truncated() {
        let mut input = Cursor::new(b"01000123456789".to_vec());
        let err = read_frame(&mut input).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::TruncatedPayload { expected: 100, received: 10 }
        ));
    }

    #[tokio::test]
    async fn zero_length_frame_has_empty_payload() {
        let mut input = Cursor::new(b"0000".to_vec());
        assert!(read_frame(&mut input).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn encoded_frame_is_readable() {
        let payload = br#"{"service":"auth","path":"/login","data":{"ok":true}}"#;
        let frame = encode_frame(payload).unwrap();
        assert_eq!(&frame[..HEADER_LEN], b"0053");

        let mut input = Cursor::new(frame);
        assert_eq!(read_frame(&mut input).await.unwrap(), payload);
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let payload = vec![b'x'; MAX_PAYLOAD_LEN + 1];
        assert!(matches!(
            encode_frame(&payload),
            Err(IngestError::PayloadTooLarge(10000))
        ));
        assert!(encode_frame(&payload[..MAX_PAYLOAD_LEN]).is_ok());
    }
}
