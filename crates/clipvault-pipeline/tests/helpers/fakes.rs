//! In-process stand-ins for ffprobe/ffmpeg, randomness and the object store.

use async_trait::async_trait;
use bytes::Bytes;
use clipvault_processing::{CommandOutput, CommandRunner, CommandSpec, ProcessingError};
use clipvault_storage::{KeyError, RandomSource, Storage, StorageBackend, StorageError, StorageResult};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Prefix the fake ffmpeg prepends to the input bytes.
pub const REMUX_MARKER: &[u8] = b"faststart:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemuxBehavior {
    /// Write `REMUX_MARKER + input` to the output path and exit 0.
    Succeed,
    /// Exit 1 without writing output.
    Fail,
    /// Write a partial output, then never finish.
    Hang,
}

pub struct ScriptedRunner {
    probe: CommandOutput,
    remux: RemuxBehavior,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        let json = format!(
            r#"{{"streams":[{{"index":0,"codec_name":"h264","codec_type":"video","width":{},"height":{}}}]}}"#,
            width, height
        );
        Self::new(
            CommandOutput {
                status_code: Some(0),
                stdout: json.into_bytes(),
                stderr: Vec::new(),
            },
            RemuxBehavior::Succeed,
        )
    }

    pub fn probe_fails() -> Self {
        Self::new(
            CommandOutput {
                status_code: Some(1),
                stdout: Vec::new(),
                stderr: b"Invalid data found when processing input".to_vec(),
            },
            RemuxBehavior::Succeed,
        )
    }

    pub fn new(probe: CommandOutput, remux: RemuxBehavior) -> Self {
        Self {
            probe,
            remux,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_remux(mut self, remux: RemuxBehavior) -> Self {
        self.remux = remux;
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    async fn remux(&self, spec: &CommandSpec) -> CommandOutput {
        let input_at = spec.args.iter().position(|a| a == "-i").unwrap() + 1;
        let input = PathBuf::from(&spec.args[input_at]);
        let output = PathBuf::from(spec.args.last().unwrap());

        match self.remux {
            RemuxBehavior::Succeed => {
                let mut data = REMUX_MARKER.to_vec();
                data.extend(tokio::fs::read(&input).await.unwrap());
                tokio::fs::write(&output, data).await.unwrap();
                CommandOutput {
                    status_code: Some(0),
                    ..Default::default()
                }
            }
            RemuxBehavior::Fail => CommandOutput {
                status_code: Some(1),
                stdout: Vec::new(),
                stderr: b"moov atom not found".to_vec(),
            },
            RemuxBehavior::Hang => {
                tokio::fs::write(&output, b"partial").await.unwrap();
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: CommandSpec) -> Result<CommandOutput, ProcessingError> {
        self.calls.lock().unwrap().push(spec.clone());
        match spec.program.as_str() {
            "ffprobe" => Ok(self.probe.clone()),
            "ffmpeg" => Ok(self.remux(&spec).await),
            other => panic!("unexpected program {}", other),
        }
    }
}

/// Fills every byte with the same value.
pub struct FixedRandom(pub u8);

impl RandomSource for FixedRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), KeyError> {
        dest.fill(self.0);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub location: String,
    pub key: String,
    pub data: Bytes,
    pub content_type: String,
}

/// Object store that keeps puts in memory and signs URLs with a fake scheme:
/// `https://<location>.storage.test/<key>?X-Amz-Expires=<secs>&expires_at=<unix>`.
pub struct RecordingStorage {
    location: String,
    fail_puts: bool,
    puts: Mutex<Vec<StoredObject>>,
    presigns: AtomicUsize,
}

impl RecordingStorage {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            fail_puts: false,
            puts: Mutex::new(Vec::new()),
            presigns: AtomicUsize::new(0),
        }
    }

    pub fn failing(location: &str) -> Self {
        Self {
            fail_puts: true,
            ..Self::new(location)
        }
    }

    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().unwrap().clone()
    }

    pub fn presign_count(&self) -> usize {
        self.presigns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn put(
        &self,
        location: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        if location != self.location {
            return Err(StorageError::UnknownLocation(location.to_string()));
        }
        if self.fail_puts {
            return Err(StorageError::UploadFailed("connection reset".to_string()));
        }
        self.puts.lock().unwrap().push(StoredObject {
            location: location.to_string(),
            key: key.to_string(),
            data,
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn presign_get(
        &self,
        location: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if location != self.location {
            return Err(StorageError::UnknownLocation(location.to_string()));
        }
        self.presigns.fetch_add(1, Ordering::SeqCst);
        let expires_at = (SystemTime::now() + expires_in)
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        Ok(format!(
            "https://{}.storage.test/{}?X-Amz-Expires={}&expires_at={}",
            location,
            key,
            expires_in.as_secs(),
            expires_at
        ))
    }

    fn upload_location(&self) -> &str {
        &self.location
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
