use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{KaraokeError, KaraokeResult};

/// Where a resolved font came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontOrigin {
    /// Loaded from an explicit or built-in file candidate.
    File(PathBuf),
    /// Picked from the system font database.
    System,
}

/// Loaded font face: raw bytes, face index within the file, and family name.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, Debug)]
pub struct FontHandle {
    bytes: Arc<Vec<u8>>,
    index: u32,
    family: String,
    origin: FontOrigin,
}

impl FontHandle {
    /// Load the first face of a font file (`.ttf`, `.otf`, `.ttc`).
    pub fn from_path(path: &Path) -> KaraokeResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        Self::from_bytes(bytes, FontOrigin::File(path.to_path_buf()))
    }

    /// Parse font bytes, keeping the first face.
    pub fn from_bytes(bytes: Vec<u8>, origin: FontOrigin) -> KaraokeResult<Self> {
        let bytes = Arc::new(bytes);
        let mut db = usvg::fontdb::Database::new();
        db.load_font_source(usvg::fontdb::Source::Binary(bytes.clone()));
        let face = db
            .faces()
            .next()
            .ok_or_else(|| KaraokeError::render("font data contains no usable faces"))?;
        let family = face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "unknown".to_owned());
        Ok(Self {
            index: face.index,
            family,
            bytes,
            origin,
        })
    }

    /// Shared handle to the font file bytes, for blobs that must not copy them.
    pub(crate) fn shared_bytes(&self) -> Arc<dyn AsRef<[u8]> + Send + Sync> {
        self.bytes.clone()
    }

    /// Family name reported by the face.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Where this font was loaded from.
    pub fn origin(&self) -> &FontOrigin {
        &self.origin
    }

    pub(crate) fn to_glyph_font(&self) -> vello_cpu::peniko::FontData {
        vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::new(self.shared_bytes()),
            self.index,
        )
    }
}

/// Built-in font file candidates, best Unicode/Bengali coverage first.
pub fn builtin_font_candidates() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        for name in [
            "NotoSansBengali-Bold.ttf",
            "NotoSansBengali-ExtraBold.ttf",
            "NotoSerifBengali-Black.ttf",
        ] {
            out.push(home.join("Library/Fonts").join(name));
            out.push(home.join(".local/share/fonts").join(name));
        }
    }
    for p in [
        "/System/Library/Fonts/KohinoorBangla.ttc",
        "/System/Library/Fonts/Supplemental/Bangla Sangam MN.ttc",
        "/System/Library/Fonts/Supplemental/Bangla MN.ttc",
        "/System/Library/Fonts/Kohinoor.ttc",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "/System/Library/Fonts/Helvetica.ttc",
        "/usr/share/fonts/truetype/noto/NotoSansBengali-Bold.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
        "/usr/share/fonts/noto/NotoSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "C:\\Windows\\Fonts\\arialbd.ttf",
    ] {
        out.push(PathBuf::from(p));
    }
    out
}

/// Resolve the caption font.
///
/// Tries `configured` files in order, then [`builtin_font_candidates`], then the system
/// sans-serif face. The first success wins.
#[tracing::instrument(skip_all, fields(configured = configured.len()))]
pub fn resolve_font(configured: &[PathBuf]) -> KaraokeResult<FontHandle> {
    for path in configured {
        match FontHandle::from_path(path) {
            Ok(font) => {
                tracing::info!(path = %path.display(), family = font.family(), "loaded font");
                return Ok(font);
            }
            Err(e) => tracing::warn!(path = %path.display(), "configured font unusable: {e}"),
        }
    }

    for path in builtin_font_candidates() {
        if !path.is_file() {
            continue;
        }
        match FontHandle::from_path(&path) {
            Ok(font) => {
                tracing::info!(path = %path.display(), family = font.family(), "loaded font");
                return Ok(font);
            }
            Err(e) => tracing::debug!(path = %path.display(), "font candidate skipped: {e}"),
        }
    }

    tracing::warn!("no font file candidate found; falling back to system sans-serif");
    system_sans_serif().ok_or_else(|| KaraokeError::render("no usable font found on this system"))
}

/// Pick a sans-serif face from the system font database.
pub fn system_sans_serif() -> Option<FontHandle> {
    use usvg::fontdb::{Family, Query};

    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let id = db
        .query(&Query {
            families: &[Family::SansSerif],
            ..Query::default()
        })
        .or_else(|| {
            db.faces()
                .find(|f| f.families.iter().any(|(name, _)| name.contains("Sans")))
                .map(|f| f.id)
        })
        .or_else(|| db.faces().next().map(|f| f.id))?;

    let family = db
        .face(id)
        .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
        .unwrap_or_else(|| "unknown".to_owned());
    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;

    Some(FontHandle {
        bytes: Arc::new(bytes),
        index,
        family,
        origin: FontOrigin::System,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
