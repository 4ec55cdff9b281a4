//! Map tile downloads and the tile texture cache.

use crate::constants::{MAX_CACHED_TILES, TILE_IDLE_FRAMES, USER_AGENT};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;
use std::sync::mpsc;
use survey_overlay::{TileId, TileSource};
use thiserror::Error;

/// Errors that can occur when fetching a tile.
#[derive(Error, Debug)]
pub enum TileError {
    #[error("failed to start tile runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("tile request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to decode tile: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded tile pixels.
struct DecodedTile {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

enum TileState {
    Loading(mpsc::Receiver<Result<DecodedTile, TileError>>),
    Ready(TextureHandle),
    /// Not retried.
    Failed,
}

struct CachedTile {
    state: TileState,
    last_used: u64,
}

/// Fetches tiles in the background and keeps their textures.
pub struct TileCache {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    source: TileSource,
    tiles: HashMap<TileId, CachedTile>,
    frame: u64,
}

impl TileCache {
    pub fn new(source: TileSource) -> Result<Self, TileError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tile-fetch")
            .enable_all()
            .build()?;
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            runtime,
            client,
            source,
            tiles: HashMap::new(),
            frame: 0,
        })
    }

    /// Returns the texture for `tile`, requesting it on first use.
    pub fn get(&mut self, ctx: &egui::Context, tile: TileId) -> Option<&TextureHandle> {
        let frame = self.frame;
        if !self.tiles.contains_key(&tile) {
            let state = self.request(ctx, tile);
            self.tiles.insert(
                tile,
                CachedTile {
                    state,
                    last_used: frame,
                },
            );
        }

        let cached = self.tiles.get_mut(&tile)?;
        cached.last_used = frame;
        poll_tile(ctx, tile, &mut cached.state);
        match &cached.state {
            TileState::Ready(texture) => Some(texture),
            TileState::Loading(_) | TileState::Failed => None,
        }
    }

    fn request(&self, ctx: &egui::Context, tile: TileId) -> TileState {
        let (tx, rx) = mpsc::channel();
        let ctx = ctx.clone();
        let client = self.client.clone();
        let url = self.source.url(tile);

        self.runtime.spawn(async move {
            let result = fetch_tile(&client, &url).await;
            if let Err(err) = &result {
                log::debug!("{url}: {err}");
            }
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        TileState::Loading(rx)
    }

    /// Advances the frame counter and drops tiles that have not been drawn
    /// for a while once the cache is over its limit.
    pub fn end_frame(&mut self) {
        self.frame += 1;
        if self.tiles.len() <= MAX_CACHED_TILES {
            return;
        }
        let frame = self.frame;
        self.tiles
            .retain(|_, cached| frame.saturating_sub(cached.last_used) < TILE_IDLE_FRAMES);
    }
}

fn poll_tile(ctx: &egui::Context, tile: TileId, state: &mut TileState) {
    let TileState::Loading(rx) = state else {
        return;
    };
    match rx.try_recv() {
        Ok(Ok(decoded)) => {
            let image = ColorImage::from_rgba_unmultiplied(
                [decoded.width as usize, decoded.height as usize],
                &decoded.pixels,
            );
            let name = format!("tile-{}-{}-{}", tile.z, tile.x, tile.y);
            *state = TileState::Ready(ctx.load_texture(name, image, TextureOptions::LINEAR));
        }
        Ok(Err(_)) | Err(mpsc::TryRecvError::Disconnected) => *state = TileState::Failed,
        Err(mpsc::TryRecvError::Empty) => {}
    }
}

async fn fetch_tile(client: &reqwest::Client, url: &str) -> Result<DecodedTile, TileError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedTile {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}
