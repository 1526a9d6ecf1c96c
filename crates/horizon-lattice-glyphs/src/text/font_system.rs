//! Font system management and font database access.

use std::path::Path;

/// Configuration for initializing the font system.
#[derive(Debug, Clone)]
pub struct FontSystemConfig {
    /// Whether to load system fonts on initialization.
    pub load_system_fonts: bool,
    /// Locale string for text shaping (e.g., "en-US").
    pub locale: String,
    /// Font family that the generic `monospace` family resolves to.
    pub monospace_family: Option<String>,
}

impl Default for FontSystemConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            locale: sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string()),
            monospace_family: None,
        }
    }
}

impl FontSystemConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to load system fonts on initialization.
    pub fn load_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }

    /// Set the locale for text shaping.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the family that `monospace` resolves to.
    pub fn monospace_family(mut self, family: impl Into<String>) -> Self {
        self.monospace_family = Some(family.into());
        self
    }
}

/// Owns cosmic-text's font system: the font database plus shaping caches.
///
/// `FontSystem` is not `Sync`; the glyph cache keeps it on a single thread.
pub struct FontSystem {
    inner: cosmic_text::FontSystem,
}

impl FontSystem {
    /// Build the font database described by `config`.
    ///
    /// Loading system fonts can take around a second on machines with many
    /// fonts installed.
    pub fn with_config(config: FontSystemConfig) -> Self {
        let mut db = fontdb::Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        if let Some(ref family) = config.monospace_family {
            db.set_monospace_family(family);
        }

        tracing::debug!(
            locale = %config.locale,
            faces = db.faces().count(),
            "font system created"
        );

        Self {
            inner: cosmic_text::FontSystem::new_with_locale_and_db(config.locale, db),
        }
    }

    /// Get a reference to the underlying cosmic-text font system.
    pub fn inner(&self) -> &cosmic_text::FontSystem {
        &self.inner
    }

    /// Get a mutable reference to the underlying cosmic-text font system.
    pub fn inner_mut(&mut self) -> &mut cosmic_text::FontSystem {
        &mut self.inner
    }

    /// Locale used for shaping.
    pub fn locale(&self) -> &str {
        self.inner.locale()
    }

    /// Load a terminal font from a file, e.g. one named in a user config.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<(), FontLoadError> {
        self.inner
            .db_mut()
            .load_font_file(path.as_ref())
            .map_err(|e| FontLoadError::IoError(e.to_string()))
    }

    /// Load a terminal font embedded in the binary.
    ///
    /// Data that does not parse as TTF, OTF, TTC or OTC adds no face.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.inner.db_mut().load_font_data(data);
    }

    /// Load every font found under `path`, e.g. a bundled font directory.
    pub fn load_fonts_dir(&mut self, path: impl AsRef<Path>) {
        self.inner.db_mut().load_fonts_dir(path);
    }

    /// Get the number of loaded font faces.
    pub fn face_count(&self) -> usize {
        self.inner.db().faces().count()
    }

    /// Check if any monospaced face is loaded.
    pub fn has_monospace_face(&self) -> bool {
        self.inner.db().faces().any(|face| face.monospaced)
    }

    /// Check if a font family exists in the database.
    pub fn has_family(&self, family: &str) -> bool {
        self.inner
            .db()
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == family))
    }

    /// Set the family that `monospace` resolves to.
    ///
    /// Takes effect for cells shaped afterwards; glyphs already in a cache
    /// keep the face they were shaped with.
    pub fn set_monospace_family(&mut self, family: impl AsRef<str>) {
        self.inner.db_mut().set_monospace_family(family.as_ref());
    }

    /// Family name the generic `monospace` family currently resolves to.
    pub fn monospace_family(&self) -> &str {
        self.inner.db().family_name(&fontdb::Family::Monospace)
    }
}

impl std::fmt::Debug for FontSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSystem")
            .field("face_count", &self.face_count())
            .field("locale", &self.locale())
            .finish()
    }
}

/// Error type for font loading operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FontLoadError {
    /// An I/O error occurred while loading the font.
    #[error("I/O error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_system_creation() {
        // Create without system fonts for faster testing
        let config = FontSystemConfig::new().load_system_fonts(false);
        let font_system = FontSystem::with_config(config);
        assert_eq!(font_system.face_count(), 0);
        assert!(!font_system.has_monospace_face());
        assert!(!font_system.has_family("DejaVu Sans Mono"));
    }

    #[test]
    fn font_system_config_builder() {
        let config = FontSystemConfig::new()
            .load_system_fonts(false)
            .locale("fr-FR")
            .monospace_family("Consolas");

        assert!(!config.load_system_fonts);
        assert_eq!(config.locale, "fr-FR");
        assert_eq!(config.monospace_family, Some("Consolas".to_string()));
    }

    #[test]
    fn locale_is_passed_through() {
        let config = FontSystemConfig::new().load_system_fonts(false).locale("de-DE");
        let font_system = FontSystem::with_config(config);
        assert_eq!(font_system.locale(), "de-DE");
    }

    #[test]
    fn monospace_family_override() {
        let config = FontSystemConfig::new()
            .load_system_fonts(false)
            .monospace_family("Terminus");
        let mut font_system = FontSystem::with_config(config);
        assert_eq!(font_system.monospace_family(), "Terminus");

        font_system.set_monospace_family("Iosevka Term");
        assert_eq!(font_system.monospace_family(), "Iosevka Term");
    }

    #[test]
    fn unparsable_font_data_adds_no_face() {
        let config = FontSystemConfig::new().load_system_fonts(false);
        let mut font_system = FontSystem::with_config(config);
        font_system.load_font_data(b"definitely not a font".to_vec());
        assert_eq!(font_system.face_count(), 0);
    }

    #[test]
    fn fontless_directory_adds_no_face() {
        let dir = std::env::temp_dir().join(format!(
            "horizon-lattice-glyphs-fonts-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("README.txt"), "no fonts here").unwrap();

        let config = FontSystemConfig::new().load_system_fonts(false);
        let mut font_system = FontSystem::with_config(config);
        font_system.load_fonts_dir(&dir);
        assert_eq!(font_system.face_count(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        let config = FontSystemConfig::new().load_system_fonts(false);
        let mut font_system = FontSystem::with_config(config);
        let err = font_system
            .load_font_file("/nonexistent/horizon-lattice/font.ttf")
            .unwrap_err();
        assert!(matches!(err, FontLoadError::IoError(_)));
    }
}
