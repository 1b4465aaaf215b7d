use super::DecisionTree;
use super::compiler::verify_arena;
use crate::error::TreeError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Marks a compiled tree cache and its layout version.
const CACHE_MAGIC: &[u8; 5] = b"SNTK\x02";

#[derive(Serialize)]
struct CacheEnvelopeRef<'a> {
    source_sha256: Option<&'a str>,
    tree: &'a DecisionTree,
}

#[derive(Deserialize)]
struct CacheEnvelope {
    source_sha256: Option<String>,
    tree: DecisionTree,
}

impl DecisionTree {
    /// Serializes the validated tree into the compiled cache format.
    pub fn to_cache_bytes(&self) -> Result<Vec<u8>, TreeError> {
        self.encode_cache(None)
    }

    /// Deserializes a compiled tree and re-checks its invariants.
    pub fn from_cache_bytes(bytes: &[u8]) -> Result<Self, TreeError> {
        decode_cache(bytes).map(|envelope| envelope.tree)
    }

    /// Saves the compiled tree to a file.
    pub fn save_cache(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        write_cache(path.as_ref(), &self.to_cache_bytes()?)
    }

    /// Loads a compiled tree from a file.
    pub fn from_cache_file(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        Self::from_cache_bytes(&read_cache(path.as_ref())?)
    }

    /// Loads the tree from `source`, going through the compiled cache at `cache`.
    ///
    /// The cache records the SHA-256 of the source it was built from and is only
    /// used while that still matches; otherwise the source is parsed and the cache
    /// rewritten. A cache that cannot be read or written only costs a re-parse.
    pub fn load_cached(source: impl AsRef<Path>, cache: impl AsRef<Path>) -> Result<Self, TreeError> {
        let (source, cache) = (source.as_ref(), cache.as_ref());
        let json = read_source(source)?;
        let digest = source_sha256(json.as_bytes());

        match read_cache(cache).and_then(|bytes| decode_cache(&bytes)) {
            Ok(envelope) if envelope.source_sha256.as_deref() == Some(digest.as_str()) => {
                tracing::debug!(cache = %cache.display(), "Loaded decision tree from cache");
                return Ok(envelope.tree);
            }
            Ok(_) => {
                tracing::debug!(cache = %cache.display(), "Tree cache is stale, rebuilding");
            }
            Err(e) if cache.exists() => {
                tracing::warn!(cache = %cache.display(), error = %e, "Ignoring unreadable tree cache");
            }
            Err(_) => {}
        }

        tracing::debug!(path = %source.display(), "Loading decision tree source");
        let tree = Self::from_json_str(&json)?;
        if let Err(e) = tree
            .encode_cache(Some(&digest))
            .and_then(|bytes| write_cache(cache, &bytes))
        {
            tracing::warn!(cache = %cache.display(), error = %e, "Could not write tree cache");
        }
        Ok(tree)
    }

    /// Parses `source` and writes its compiled cache to `cache`, stamped so that
    /// `load_cached` picks it up. Unlike `load_cached`, a failed write is an error.
    pub fn compile_cache(source: impl AsRef<Path>, cache: impl AsRef<Path>) -> Result<Self, TreeError> {
        let (source, cache) = (source.as_ref(), cache.as_ref());
        let json = read_source(source)?;
        let tree = Self::from_json_str(&json)?;
        let bytes = tree.encode_cache(Some(&source_sha256(json.as_bytes())))?;
        write_cache(cache, &bytes)?;
        Ok(tree)
    }

    fn encode_cache(&self, source_sha256: Option<&str>) -> Result<Vec<u8>, TreeError> {
        let envelope = CacheEnvelopeRef {
            source_sha256,
            tree: self,
        };
        let body = encode_to_vec(&envelope, standard())
            .map_err(|e| TreeError::Cache(format!("Serialization failed: {}", e)))?;
        let mut bytes = Vec::with_capacity(CACHE_MAGIC.len() + body.len());
        bytes.extend_from_slice(CACHE_MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }
}

fn decode_cache(bytes: &[u8]) -> Result<CacheEnvelope, TreeError> {
    let body = bytes
        .strip_prefix(CACHE_MAGIC.as_slice())
        .ok_or_else(|| TreeError::Cache("not a compiled tree cache".to_string()))?;
    let (envelope, _): (CacheEnvelope, usize) = decode_from_slice(body, standard())
        .map_err(|e| TreeError::Cache(format!("Deserialization failed: {}", e)))?;
    verify_arena(&envelope.tree.nodes)?;
    Ok(envelope)
}

fn source_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn read_source(path: &Path) -> Result<String, TreeError> {
    fs::read_to_string(path).map_err(|e| TreeError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn read_cache(path: &Path) -> Result<Vec<u8>, TreeError> {
    let mut file = fs::File::open(path).map_err(|e| {
        TreeError::Cache(format!("Could not open file '{}': {}", path.display(), e))
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| {
        TreeError::Cache(format!("Could not read from file '{}': {}", path.display(), e))
    })?;
    Ok(bytes)
}

fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), TreeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TreeError::Cache(format!("Could not create '{}': {}", parent.display(), e))
        })?;
    }
    let mut file = fs::File::create(path).map_err(|e| {
        TreeError::Cache(format!("Could not create file '{}': {}", path.display(), e))
    })?;
    file.write_all(bytes).map_err(|e| {
        TreeError::Cache(format!("Could not write to file '{}': {}", path.display(), e))
    })?;
    Ok(())
}
