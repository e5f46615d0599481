use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use futures::channel::oneshot;
use futures::future::join_all;
use image::{ImageError, ImageReader};
use thiserror::Error;
use tracing::{info, warn};

use crate::sprite_keys::{sprite_image_path, SpriteKeyError};

use super::animation::AnimationClock;
use super::rendering::SpriteImage;
use super::sprites::SpriteId;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid sprite key {key}: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: SpriteKeyError,
    },
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("decoded image {path} has an inconsistent pixel buffer")]
    Malformed { path: PathBuf },
    #[error("decode worker for {key} exited without a result")]
    WorkerLost { key: String },
}

#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub clock: AnimationClock,
    pub image: Arc<SpriteImage>,
}

impl SpriteSheet {
    /// Sheets whose clock has no frame size use the whole image as one frame.
    pub fn new(clock: AnimationClock, image: Arc<SpriteImage>) -> Self {
        let clock = if clock.frame_width == 0 || clock.frame_height == 0 {
            AnimationClock::still(image.width, image.height)
        } else {
            clock
        };
        Self { clock, image }
    }
}

/// Every sheet that decoded, plus the ids that did not.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    sheets: HashMap<SpriteId, SpriteSheet>,
    failed: Vec<SpriteId>,
}

impl AssetBundle {
    pub fn insert(&mut self, id: SpriteId, image: SpriteImage) {
        let sheet = SpriteSheet::new(id.kind.clock(), Arc::new(image));
        self.sheets.insert(id, sheet);
    }

    pub fn sheet(&self, id: SpriteId) -> Option<&SpriteSheet> {
        self.sheets.get(&id)
    }

    pub fn loaded_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn failed(&self) -> &[SpriteId] {
        &self.failed
    }
}

#[derive(Debug, Clone)]
pub struct AssetLoader {
    sprite_root: PathBuf,
}

impl AssetLoader {
    pub fn new(sprite_root: PathBuf) -> Self {
        Self { sprite_root }
    }

    pub fn sprite_root(&self) -> &Path {
        &self.sprite_root
    }

    /// Decodes every requested sheet on its own worker thread and resolves
    /// once all of them have finished. Failures are logged and recorded;
    /// the bundle always resolves.
    pub async fn load_bundle<I>(&self, ids: I) -> AssetBundle
    where
        I: IntoIterator<Item = SpriteId>,
    {
        let mut seen = HashSet::new();
        let requests: Vec<SpriteId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let pending = requests.iter().map(|id| self.spawn_decode(*id));
        let results = join_all(pending).await;

        let mut bundle = AssetBundle::default();
        for (id, result) in requests.into_iter().zip(results) {
            match result {
                Ok(image) => bundle.insert(id, image),
                Err(error) => {
                    warn!(
                        sprite_key = %id.key(),
                        error = %error,
                        "sprite_load_failed"
                    );
                    bundle.failed.push(id);
                }
            }
        }
        info!(
            loaded = bundle.loaded_count(),
            failed = bundle.failed.len(),
            sprite_root = %self.sprite_root.display(),
            "assets_ready"
        );
        bundle
    }

    fn spawn_decode(
        &self,
        id: SpriteId,
    ) -> impl std::future::Future<Output = Result<SpriteImage, AssetError>> {
        let key = id.key();
        let resolved = sprite_image_path(&self.sprite_root, &key).map_err(|source| {
            AssetError::InvalidKey {
                key: key.clone(),
                source,
            }
        });
        let (sender, receiver) = oneshot::channel();
        if let Ok(path) = &resolved {
            let path = path.clone();
            let spawned = thread::Builder::new()
                .name(format!("decode:{key}"))
                .spawn(move || {
                    let _ = sender.send(decode_sprite(&path));
                });
            if let Err(error) = spawned {
                warn!(sprite_key = %key, error = %error, "decode_worker_spawn_failed");
            }
        }

        async move {
            resolved?;
            receiver
                .await
                .unwrap_or(Err(AssetError::WorkerLost { key }))
        }
    }
}

fn decode_sprite(path: &Path) -> Result<SpriteImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    let (width, height) = (image.width(), image.height());
    SpriteImage::new(width, height, image.into_raw()).ok_or_else(|| AssetError::Malformed {
        path: path.to_path_buf(),
    })
}
