use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sprite_geometry::{GeometryError, GeometryMode, GeometryPipeline, PixelRect, RenderVertex, SpriteGeometry};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    GeometryError(#[from] GeometryError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One sprite cut from the sheet
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SpriteConfig {
    pub name: String,
    pub description: Option<String>,
    /// Source rect in the sheet; the whole image when omitted
    pub region: Option<PixelRect>,
    #[serde(default)]
    pub geometry: GeometryMode,
    #[serde(default)]
    pub avoid_vertex_merging: bool,
}

impl SpriteConfig {
    pub fn pipeline(&self) -> GeometryPipeline {
        let builder = GeometryPipeline::builder()
            .mode(self.geometry.clone())
            .avoid_vertex_merging(self.avoid_vertex_merging);
        match self.region {
            Some(region) => builder.source_region(region).build(),
            None => builder.build(),
        }
    }
}

/// Sprite sheet build file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SpriteSheetConfig {
    pub input_path: String,
    pub output_path: String,
    pub sprites: Vec<SpriteConfig>,
}

/// Geometry of one built sprite, as written by `sprite_cli build`
#[derive(Debug, Clone, Serialize)]
pub struct BuiltSprite {
    pub name: String,
    pub region: PixelRect,
    pub geometry: SpriteGeometry,
    pub render_vertices: Vec<RenderVertex>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuiltSpriteSheet {
    pub image_width: u32,
    pub image_height: u32,
    pub sprites: Vec<BuiltSprite>,
}

impl SpriteSheetConfig {
    /// Load the configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load the configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Run every sprite's pipeline over the sheet's alpha channel
    pub fn build(&self, sheet: &image::GrayImage) -> BuiltSpriteSheet {
        let sprites = self
            .sprites
            .iter()
            .map(|sprite| {
                let pipeline = sprite.pipeline();
                let geometry = pipeline.process(sheet);
                BuiltSprite {
                    name: sprite.name.clone(),
                    region: pipeline.source_region_for(sheet),
                    render_vertices: geometry.bake_render_vertices(sheet.width(), sheet.height()),
                    geometry,
                }
            })
            .collect();

        BuiltSpriteSheet {
            image_width: sheet.width(),
            image_height: sheet.height(),
            sprites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    const SHEET_TOML: &str = r#"
input_path = "sheet.png"
output_path = "sheet.geometry.json"

[[sprites]]
name = "hero"
region = { x = 0, y = 0, width = 32, height = 32 }

[sprites.geometry]
mode = "shrink_wrapped"
detail = 1.0

[[sprites]]
name = "background"
description = "Fills the whole sheet"
avoid_vertex_merging = true
"#;

    #[test]
    fn toml_config_fills_in_mode_defaults() {
        let config = SpriteSheetConfig::from_toml(SHEET_TOML).unwrap();
        assert_eq!(config.sprites.len(), 2);

        let hero = &config.sprites[0];
        assert_eq!(hero.region, Some(PixelRect::new(0, 0, 32, 32)));
        assert_eq!(hero.geometry, GeometryMode::shrink_wrapped(1.0, 2.0));
        assert!(!hero.avoid_vertex_merging);

        let background = &config.sprites[1];
        assert_eq!(background.region, None);
        assert_eq!(background.geometry, GeometryMode::default());
        assert!(background.avoid_vertex_merging);
    }

    #[test]
    fn config_round_trips_through_json_and_toml() {
        let config = SpriteSheetConfig::from_toml(SHEET_TOML).unwrap();
        assert_eq!(SpriteSheetConfig::from_json(&config.to_json().unwrap()).unwrap(), config);
        assert_eq!(SpriteSheetConfig::from_toml(&config.to_toml().unwrap()).unwrap(), config);
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        assert!(matches!(
            SpriteSheetConfig::from_file("sheet.yaml"),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn build_runs_each_sprite_in_its_region() {
        let mut sheet = GrayImage::new(64, 32);
        for y in 4..12 {
            for x in 36..44 {
                sheet.put_pixel(x, y, Luma([255]));
            }
        }
        let config = SpriteSheetConfig {
            input_path: "sheet.png".to_string(),
            output_path: "out.json".to_string(),
            sprites: vec![SpriteConfig {
                name: "coin".to_string(),
                description: None,
                region: Some(PixelRect::new(32, 0, 32, 32)),
                geometry: GeometryMode::default(),
                avoid_vertex_merging: false,
            }],
        };

        let built = config.build(&sheet);
        assert_eq!(built.sprites.len(), 1);
        assert_eq!(built.sprites[0].region, PixelRect::new(32, 0, 32, 32));
        assert_eq!(built.sprites[0].geometry.triangle_count(), 2);
        assert_eq!(built.sprites[0].render_vertices.len(), 6);
        assert!(serde_json::to_string(&built).is_ok());
    }
}
