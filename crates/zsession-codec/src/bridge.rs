//! Concurrency bridge
//!
//! Runs compute-bound codec calls either inline or on tokio's blocking
//! pool, bounded by a semaphore. The choice is made per call and never
//! changes the result. There is no cancellation: once a job starts it runs
//! to completion, even if the awaiting future is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};
use tracing::debug;
use zsession_types::{
    AsyncChunkCompressor, AsyncChunkDecompressor, BridgeMode, Error, Result, SessionStats,
};

use crate::oneshot;
use crate::options::{CompressOptions, DecompressOptions};
use crate::streaming::{CompressionSession, DecompressionSession};

/// Executes codec jobs inline or on the blocking pool
#[derive(Debug, Clone)]
pub struct ExecutionBridge {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ExecutionBridge {
    /// Create a bridge allowing `max_concurrent` offloaded jobs at once
    pub fn new(max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(Error::parameter("bridge needs at least one concurrent job"));
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        })
    }

    /// Maximum number of offloaded jobs running at once
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run `job` according to `mode`
    ///
    /// With [`BridgeMode::Offload`] the job waits for a permit, runs on the
    /// blocking pool, and the calling task yields until it completes.
    pub async fn invoke<F, T>(&self, mode: BridgeMode, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        match mode {
            BridgeMode::Inline => job(),
            BridgeMode::Offload => {
                let permit = Arc::clone(&self.permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::bridge("bridge semaphore closed"))?;
                debug!(available = self.permits.available_permits(), "Offloading codec job");
                tokio::task::spawn_blocking(move || {
                    let result = job();
                    drop(permit);
                    result
                })
                .await
                .map_err(|error| Error::bridge(format!("codec job did not complete: {}", error)))?
            }
        }
    }
}

impl Default for ExecutionBridge {
    fn default() -> Self {
        let max_concurrent = num_cpus::get().max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }
}

/// Compress `input` through the bridge
pub async fn compress_async(
    bridge: &ExecutionBridge,
    input: Vec<u8>,
    options: CompressOptions,
    mode: BridgeMode,
) -> Result<Vec<u8>> {
    bridge
        .invoke(mode, move || oneshot::compress(&input, &options))
        .await
}

/// Decompress `input` through the bridge
pub async fn decompress_async(
    bridge: &ExecutionBridge,
    input: Vec<u8>,
    options: DecompressOptions,
    mode: BridgeMode,
) -> Result<Vec<u8>> {
    bridge
        .invoke(mode, move || oneshot::decompress(&input, &options))
        .await
}

/// A [`CompressionSession`] driven through the bridge
///
/// The session sits behind an async mutex, so calls on one session run
/// strictly one after another even when issued concurrently.
#[derive(Clone)]
pub struct AsyncCompressionSession {
    session: Arc<Mutex<CompressionSession>>,
    bridge: ExecutionBridge,
    mode: BridgeMode,
}

impl AsyncCompressionSession {
    /// Create a session configured by `options`
    pub fn new(options: &CompressOptions, bridge: ExecutionBridge, mode: BridgeMode) -> Result<Self> {
        Ok(Self::from_session(CompressionSession::new(options)?, bridge, mode))
    }

    /// Wrap an existing session
    pub fn from_session(session: CompressionSession, bridge: ExecutionBridge, mode: BridgeMode) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            bridge,
            mode,
        }
    }

    /// Feed `chunk` and return whatever output is ready
    pub async fn compress(&self, chunk: Vec<u8>) -> Result<Vec<u8>> {
        let mut session = Arc::clone(&self.session).lock_owned().await;
        self.bridge
            .invoke(self.mode, move || session.compress(&chunk))
            .await
    }

    /// Emit everything buffered so far without closing the frame
    pub async fn flush(&self) -> Result<Vec<u8>> {
        let mut session = Arc::clone(&self.session).lock_owned().await;
        self.bridge.invoke(self.mode, move || session.flush()).await
    }

    /// Close the current frame and return its remaining bytes
    pub async fn finish(&self) -> Result<Vec<u8>> {
        let mut session = Arc::clone(&self.session).lock_owned().await;
        self.bridge.invoke(self.mode, move || session.finish()).await
    }

    /// Counters accumulated since the session was created
    pub async fn stats(&self) -> SessionStats {
        self.session.lock().await.stats()
    }
}

#[async_trait]
impl AsyncChunkCompressor for AsyncCompressionSession {
    async fn compress_chunk(&self, input: Vec<u8>) -> Result<Vec<u8>> {
        self.compress(input).await
    }

    async fn flush(&self) -> Result<Vec<u8>> {
        AsyncCompressionSession::flush(self).await
    }

    async fn finish(&self) -> Result<Vec<u8>> {
        AsyncCompressionSession::finish(self).await
    }
}

/// A [`DecompressionSession`] driven through the bridge
#[derive(Clone)]
pub struct AsyncDecompressionSession {
    session: Arc<Mutex<DecompressionSession>>,
    bridge: ExecutionBridge,
    mode: BridgeMode,
}

impl AsyncDecompressionSession {
    /// Create a session configured by `options`
    pub fn new(options: &DecompressOptions, bridge: ExecutionBridge, mode: BridgeMode) -> Result<Self> {
        Ok(Self {
            session: Arc::new(Mutex::new(DecompressionSession::new(options)?)),
            bridge,
            mode,
        })
    }

    /// Feed `chunk` and return all output it makes available
    pub async fn decompress(&self, chunk: Vec<u8>) -> Result<Vec<u8>> {
        let mut session = Arc::clone(&self.session).lock_owned().await;
        self.bridge
            .invoke(self.mode, move || session.decompress(&chunk))
            .await
    }

    /// Counters accumulated since the session was created
    pub async fn stats(&self) -> SessionStats {
        self.session.lock().await.stats()
    }
}

#[async_trait]
impl AsyncChunkDecompressor for AsyncDecompressionSession {
    async fn decompress_chunk(&self, input: Vec<u8>) -> Result<Vec<u8>> {
        self.decompress(input).await
    }
}
