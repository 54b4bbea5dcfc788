use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8888".parse().unwrap()
}

/// Task store location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/tasks")
}

/// Work queue bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum number of queued task ids; submissions beyond this are
    /// rejected as overloaded.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    10_000
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    3
}

/// External inference engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Inference command launched once per worker.
    #[serde(default = "default_engine_command")]
    pub command: PathBuf,
    /// Device selector handed to the engine (e.g. "cpu", "cuda:0").
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            device: default_device(),
        }
    }
}

fn default_engine_command() -> PathBuf {
    PathBuf::from("faceswap-infer")
}

fn default_device() -> String {
    "cpu".to_string()
}

/// Media directories and public result URL prefix
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Prefix prepended to result filenames when building `result_url`.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            results_dir: default_results_dir(),
            public_url: default_public_url(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("data/media/uploads")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("data/media/results")
}

fn default_public_url() -> String {
    "/media_result/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8888");
        assert_eq!(config.queue.capacity, 10_000);
        assert_eq!(config.pool.workers, 3);
        assert_eq!(config.engine.device, "cpu");
        assert_eq!(config.media.public_url, "/media_result/");
    }
}
