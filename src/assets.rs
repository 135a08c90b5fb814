//! Asset manifest
//!
//! The host calls [`load_assets`] once at startup, before the first frame.
//! Nothing in `sim` touches the filesystem. Layout under the asset root:
//!
//! ```text
//! images/<name>.png
//! fonts/<name>.ttf
//! sounds/<name>.wav
//! music/<name>.ogg
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::AssetError;
use crate::audio::{MusicTrack, SoundEffect};
use crate::sim::shop::initial_catalog;
use crate::sim::{EnemyVariant, PlaceableKind, ProjectileKind, WallVariant, WeaponKind};

const FONTS: [&str; 2] = ["ui", "ui_zh"];

/// Resolved paths of every asset the game needs
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    pub root: PathBuf,
    pub textures: BTreeMap<String, PathBuf>,
    pub fonts: BTreeMap<String, PathBuf>,
    pub sounds: BTreeMap<String, PathBuf>,
    pub music: BTreeMap<String, PathBuf>,
}

impl AssetManifest {
    pub fn texture(&self, name: &str) -> Option<&Path> {
        self.textures.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.textures.len() + self.fonts.len() + self.sounds.len() + self.music.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn enemy_name(variant: EnemyVariant) -> &'static str {
    match variant {
        EnemyVariant::White => "white",
        EnemyVariant::Red => "red",
        EnemyVariant::Crack => "crack",
        EnemyVariant::BigMouth => "big_mouth",
        EnemyVariant::Crash => "crash",
        EnemyVariant::Tank => "tank",
    }
}

fn projectile_name(kind: ProjectileKind) -> &'static str {
    match kind {
        ProjectileKind::Bullet => "bullet",
        ProjectileKind::EnergyBullet => "energy_bullet",
        ProjectileKind::Missile => "missile",
        ProjectileKind::FireBall => "fire_ball",
        ProjectileKind::ExplosionParticle => "explosion",
    }
}

fn wall_name(variant: WallVariant) -> &'static str {
    match variant {
        WallVariant::Horizontal => "wall_h",
        WallVariant::Vertical => "wall_v",
        WallVariant::Corner => "wall_corner",
    }
}

/// Every texture name the renderer may ask for
pub fn texture_names() -> Vec<String> {
    let mut names = vec!["player".to_string(), "shadow".to_string(), "ground".to_string()];
    names.extend(EnemyVariant::ALL.map(|v| format!("enemy_{}", enemy_name(v))));
    names.extend(
        [
            ProjectileKind::Bullet,
            ProjectileKind::EnergyBullet,
            ProjectileKind::Missile,
            ProjectileKind::FireBall,
            ProjectileKind::ExplosionParticle,
        ]
        .map(|k| format!("projectile_{}", projectile_name(k))),
    );
    names.extend(
        [WallVariant::Horizontal, WallVariant::Vertical, WallVariant::Corner]
            .map(|v| wall_name(v).to_string()),
    );
    names.extend(
        [PlaceableKind::Wall, PlaceableKind::Barrel, PlaceableKind::Mine]
            .map(|k| format!("placeable_{}", k.weapon().name())),
    );
    names.extend(WeaponKind::ALL.map(|k| format!("weapon_{}", k.name())));
    // Shop item icons
    names.extend(WeaponKind::ALL.map(|k| format!("item_{}", k.name())));
    names.extend(
        initial_catalog()
            .into_iter()
            .filter(|item| item.weapon().is_none())
            .map(|item| item.image_id()),
    );
    names.sort();
    names.dedup();
    names
}

fn require(
    root: &Path,
    sub: &str,
    ext: &str,
    kind: &'static str,
    names: impl IntoIterator<Item = String>,
) -> Result<BTreeMap<String, PathBuf>, AssetError> {
    let mut found = BTreeMap::new();
    for name in names {
        let path = root.join(sub).join(format!("{name}.{ext}"));
        if !path.is_file() {
            return Err(AssetError::Missing { kind, path });
        }
        found.insert(name, path);
    }
    Ok(found)
}

/// Check that every required file exists under `root`
pub fn load_assets(root: &Path) -> Result<AssetManifest, AssetError> {
    fs::read_dir(root).map_err(|source| AssetError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let manifest = AssetManifest {
        root: root.to_path_buf(),
        textures: require(root, "images", "png", "texture", texture_names())?,
        fonts: require(root, "fonts", "ttf", "font", FONTS.map(String::from))?,
        sounds: require(
            root,
            "sounds",
            "wav",
            "audio",
            SoundEffect::all().into_iter().map(|e| e.name().to_string()),
        )?,
        music: require(
            root,
            "music",
            "ogg",
            "audio",
            [MusicTrack::Start, MusicTrack::Game].map(|t| t.name().to_string()),
        )?,
    };
    log::info!("Loaded {} assets from {}", manifest.len(), root.display());
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(root: &Path) {
        let groups: [(&str, &str, Vec<String>); 4] = [
            ("images", "png", texture_names()),
            ("fonts", "ttf", FONTS.map(String::from).to_vec()),
            (
                "sounds",
                "wav",
                SoundEffect::all().iter().map(|e| e.name().to_string()).collect(),
            ),
            (
                "music",
                "ogg",
                vec!["start_music".to_string(), "game_music".to_string()],
            ),
        ];
        for (sub, ext, names) in groups {
            fs::create_dir_all(root.join(sub)).unwrap();
            for name in names {
                fs::write(root.join(sub).join(format!("{name}.{ext}")), b"").unwrap();
            }
        }
    }

    #[test]
    fn test_complete_tree_loads() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let manifest = load_assets(dir.path()).unwrap();
        assert!(manifest.texture("player").is_some());
        assert!(manifest.texture("enemy_big_mouth").is_some());
        assert!(manifest.texture("item_increase_luck").is_some());
        assert_eq!(manifest.sounds.len(), SoundEffect::all().len());
    }

    #[test]
    fn test_missing_sound_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let path = dir.path().join("sounds").join("explosion.wav");
        fs::remove_file(&path).unwrap();
        match load_assets(dir.path()) {
            Err(AssetError::Missing { kind, path: p }) => {
                assert_eq!(kind, "audio");
                assert_eq!(p, path);
            }
            other => panic!("expected missing audio, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_assets(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
