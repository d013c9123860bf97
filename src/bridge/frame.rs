use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Browsers refuse host messages above 1 MiB.
pub const MAX_OUTGOING_FRAME: usize = 1024 * 1024;
pub const MAX_INCOMING_FRAME: usize = 64 * 1024 * 1024;

/// Read one length-prefixed JSON frame. `None` on a clean end of stream.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Value>> {
    let mut len = [0u8; 4];
    let mut filled = 0;
    while filled < len.len() {
        let n = reader
            .read(&mut len[filled..])
            .await
            .context("Failed to read frame length")?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            bail!("truncated frame header after {} bytes", filled);
        }
        filled += n;
    }

    let len = u32::from_ne_bytes(len) as usize;
    if len > MAX_INCOMING_FRAME {
        bail!("incoming frame of {} bytes exceeds limit", len);
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .context("truncated frame")?;
    let value = serde_json::from_slice(&payload).context("frame is not valid JSON")?;
    Ok(Some(value))
}

pub fn encode_frame(value: &Value) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value).context("serialize frame")?;
    if payload.len() > MAX_OUTGOING_FRAME {
        bail!("outgoing frame of {} bytes exceeds limit", payload.len());
    }
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
