//! Narrow asset lookup used by the shell for textures and sounds.
//!
//! The simulation never depends on assets. A missing asset degrades to a
//! solid colour or silence and is reported once per name.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Opaque texture reference owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Opaque sound reference owned by the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundHandle(pub u32);

/// RGBA color representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Fallback colors for untextured surfaces.
    pub const FLOOR: Color = Color::rgb(96, 96, 96);
    pub const WALL: Color = Color::rgb(140, 120, 100);
    pub const ENEMY: Color = Color::rgb(200, 40, 40);
    pub const PROJECTILE: Color = Color::rgb(255, 220, 60);
}

/// How a surface should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Texture(TextureHandle),
    Solid(Color),
}

/// Lookup by name. Implemented by the shell's asset loader.
pub trait AssetCatalog {
    fn texture(&self, name: &str) -> Option<TextureHandle>;
    fn sound(&self, name: &str) -> Option<SoundHandle>;
}

/// Catalog without any assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAssets;

impl AssetCatalog for NullAssets {
    fn texture(&self, _name: &str) -> Option<TextureHandle> {
        None
    }

    fn sound(&self, _name: &str) -> Option<SoundHandle> {
        None
    }
}

/// In-memory catalog built up front.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    textures: HashMap<String, TextureHandle>,
    sounds: HashMap<String, SoundHandle>,
}

impl StaticAssets {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_texture(mut self, name: impl Into<String>, handle: TextureHandle) -> Self {
        self.textures.insert(name.into(), handle);
        self
    }

    #[must_use]
    pub fn with_sound(mut self, name: impl Into<String>, handle: SoundHandle) -> Self {
        self.sounds.insert(name.into(), handle);
        self
    }
}

impl AssetCatalog for StaticAssets {
    fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    fn sound(&self, name: &str) -> Option<SoundHandle> {
        self.sounds.get(name).copied()
    }
}

/// Sound requests emitted by the session, drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    MusicStart,
    MusicStop,
    PlayerShot,
    EnemyShot,
    Explosion,
    PlayerHurt,
    Jump,
    GameOver,
    Victory,
}

impl AudioCue {
    /// Catalog name of the sound for this cue.
    pub const fn sound_name(self) -> &'static str {
        match self {
            Self::MusicStart | Self::MusicStop => "background",
            Self::PlayerShot => "shoot",
            Self::EnemyShot => "enemy_shoot",
            Self::Explosion => "explosion",
            Self::PlayerHurt => "hurt",
            Self::Jump => "jump",
            Self::GameOver => "game_over",
            Self::Victory => "victory",
        }
    }
}

/// Resolves names against a catalog, falling back and warning once per miss.
#[derive(Debug)]
pub struct AssetResolver<C> {
    catalog: C,
    warned: HashSet<String>,
}

impl<C: AssetCatalog> AssetResolver<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            warned: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Texture for `name`, or a solid `fallback` color.
    pub fn surface(&mut self, name: &str, fallback: Color) -> Surface {
        match self.catalog.texture(name) {
            Some(handle) => Surface::Texture(handle),
            None => {
                self.warn_once("texture", name);
                Surface::Solid(fallback)
            }
        }
    }

    /// Sound for `name`; `None` means play nothing.
    pub fn sound(&mut self, name: &str) -> Option<SoundHandle> {
        let handle = self.catalog.sound(name);
        if handle.is_none() {
            self.warn_once("sound", name);
        }
        handle
    }

    pub fn cue(&mut self, cue: AudioCue) -> Option<SoundHandle> {
        self.sound(cue.sound_name())
    }

    fn warn_once(&mut self, kind: &str, name: &str) {
        if self.warned.insert(format!("{kind}:{name}")) {
            tracing::warn!("[assets] missing {} '{}', using fallback", kind, name);
        }
    }

    /// Number of distinct misses reported so far.
    pub fn miss_count(&self) -> usize {
        self.warned.len()
    }
}
