//! SQLite-backed explanation store; explanation bodies are AES-GCM encrypted at rest since
//! they quote email content. Key derived from a caller-supplied secret.

use crate::error::CacheStoreError;
use crate::explain::CacheStore;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, CacheStoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CacheStoreError::Encrypt)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|_| CacheStoreError::Encrypt)?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, CacheStoreError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| CacheStoreError::Decrypt(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(CacheStoreError::Decrypt("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CacheStoreError::Decrypt(e.to_string()))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|_| CacheStoreError::Decrypt("authentication failed".into()))
}

pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl SqliteCacheStore {
    /// Open or create DB at path. Key is derived from `secret`.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, CacheStoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS explanations (
                key TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                body_enc TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    pub fn len(&self) -> Result<u64, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::Poisoned)?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM explanations", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn is_empty(&self) -> Result<bool, CacheStoreError> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let conn = self.conn.lock().map_err(|_| CacheStoreError::Poisoned)?;
        let enc: Option<String> = conn
            .query_row(
                "SELECT body_enc FROM explanations WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);
        match enc {
            Some(enc) => {
                let plain = decrypt(&self.key, &enc)?;
                let body = String::from_utf8(plain)
                    .map_err(|e| CacheStoreError::Decrypt(e.to_string()))?;
                Ok(Some(body))
            }
            None => Ok(None),
        }
    }

    /// Last writer wins.
    fn put(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        let enc = encrypt(&self.key, value.as_bytes())?;
        self.conn
            .lock()
            .map_err(|_| CacheStoreError::Poisoned)?
            .execute(
                "INSERT OR REPLACE INTO explanations (key, created_at, body_enc) VALUES (?1, ?2, ?3)",
                params![key, Utc::now().timestamp_millis(), enc],
            )?;
        Ok(())
    }
}
