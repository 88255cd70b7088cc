//! Decrypt-on-read support for privately held objects.
//!
//! Private objects are stored as a 16-byte initialisation vector followed by
//! the AES-CTR ciphertext. The pre-shared key is looked up out of band (hex
//! encoded in the secret store) and selects AES-128 or AES-256 by length.
//! CTR mode means decryption is a pure keystream XOR, so a stream can be
//! decrypted chunk by chunk without buffering the object.

use crate::error::{StorageError, StorageResult};
use crate::traits::ByteStream;
use aes::{Aes128, Aes256};
use bytes::{Bytes, BytesMut};
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Length of the IV prefix on every encrypted object.
pub const IV_LEN: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;
type Aes256Ctr = Ctr128BE<Aes256>;

/// AES-CTR keystream selected by pre-shared key length.
enum PskCipher {
    Aes128(Box<Aes128Ctr>),
    Aes256(Box<Aes256Ctr>),
}

impl PskCipher {
    fn new(psk: &[u8], iv: &[u8; IV_LEN]) -> StorageResult<Self> {
        let cipher = match psk.len() {
            16 => Aes128Ctr::new_from_slices(psk, iv).map(Box::new).map(Self::Aes128),
            32 => Aes256Ctr::new_from_slices(psk, iv).map(Box::new).map(Self::Aes256),
            n => {
                return Err(StorageError::InvalidPsk(format!(
                    "unsupported key length: {n} bytes (expected 16 or 32)"
                )));
            }
        };
        cipher.map_err(|e| StorageError::InvalidPsk(e.to_string()))
    }

    fn apply_keystream(&mut self, buf: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.apply_keystream(buf),
            Self::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

enum DecryptState {
    /// Accumulating the IV prefix; holds the PSK until the cipher can be built.
    AwaitingIv { psk: Vec<u8>, buf: BytesMut },
    Streaming(PskCipher),
    Done,
}

/// A byte stream adapter that decrypts an IV-prefixed AES-CTR ciphertext
/// stream on the fly.
pub struct DecryptStream {
    inner: ByteStream,
    state: DecryptState,
}

impl DecryptStream {
    /// Wrap a ciphertext stream. Fails immediately if the key length is
    /// unsupported so a bad PSK never reaches the response path.
    pub fn new(inner: ByteStream, psk: &[u8]) -> StorageResult<Self> {
        if psk.len() != 16 && psk.len() != 32 {
            return Err(StorageError::InvalidPsk(format!(
                "unsupported key length: {} bytes (expected 16 or 32)",
                psk.len()
            )));
        }
        Ok(Self {
            inner,
            state: DecryptState::AwaitingIv {
                psk: psk.to_vec(),
                buf: BytesMut::with_capacity(IV_LEN),
            },
        })
    }
}

impl Stream for DecryptStream {
    type Item = StorageResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let chunk = match this.inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Err(e))) => {
                    this.state = DecryptState::Done;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Some(Ok(chunk))) => Some(chunk),
                Poll::Ready(None) => None,
            };

            match (std::mem::replace(&mut this.state, DecryptState::Done), chunk) {
                (DecryptState::AwaitingIv { psk, mut buf }, Some(chunk)) => {
                    buf.extend_from_slice(&chunk);
                    if buf.len() < IV_LEN {
                        this.state = DecryptState::AwaitingIv { psk, buf };
                        continue;
                    }
                    let mut rest = buf.split_off(IV_LEN);
                    let mut iv = [0u8; IV_LEN];
                    iv.copy_from_slice(&buf);
                    let mut cipher = match PskCipher::new(&psk, &iv) {
                        Ok(cipher) => cipher,
                        Err(e) => return Poll::Ready(Some(Err(e))),
                    };
                    if rest.is_empty() {
                        this.state = DecryptState::Streaming(cipher);
                        continue;
                    }
                    cipher.apply_keystream(&mut rest);
                    this.state = DecryptState::Streaming(cipher);
                    return Poll::Ready(Some(Ok(rest.freeze())));
                }
                (DecryptState::AwaitingIv { buf, .. }, None) => {
                    if buf.is_empty() {
                        // Empty object: nothing was encrypted.
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Err(StorageError::TruncatedObject(format!(
                        "stream ended after {} bytes, before the {IV_LEN}-byte IV",
                        buf.len()
                    )))));
                }
                (DecryptState::Streaming(mut cipher), Some(chunk)) => {
                    let mut plain = BytesMut::from(&chunk[..]);
                    cipher.apply_keystream(&mut plain);
                    this.state = DecryptState::Streaming(cipher);
                    return Poll::Ready(Some(Ok(plain.freeze())));
                }
                (DecryptState::Streaming(_), None) | (DecryptState::Done, _) => {
                    return Poll::Ready(None);
                }
            }
        }
    }
}

/// Encrypt a payload into the IV-prefixed wire form. Used to seed stores in
/// tests and tooling; the gateway itself only ever decrypts.
pub fn encrypt(psk: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> StorageResult<Bytes> {
    let mut cipher = PskCipher::new(psk, iv)?;
    let mut out = BytesMut::with_capacity(IV_LEN + plaintext.len());
    out.extend_from_slice(iv);
    let mut body = BytesMut::from(plaintext);
    cipher.apply_keystream(&mut body);
    out.extend_from_slice(&body);
    Ok(out.freeze())
}
