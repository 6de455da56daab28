//! Picture challenge generation and checking.
//!
//! Renders the answer into a distorted SVG (noise lines, jittered and
//! rotated glyphs) and returns it as a base64 data URL for client
//! display. The expected text only ever goes into the cache.

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
use std::sync::Arc;

use themis_common::CacheError;
use themis_common::constants::{PICTURE_CODE_LENGTH, cache_keys::PICTURE_CODE_PREFIX};

use crate::cache::CodeCache;

/// Issues and checks picture challenges, keyed by username.
pub struct PictureChallenger {
    cache: Arc<dyn CodeCache>,
}

impl PictureChallenger {
    pub fn new(cache: Arc<dyn CodeCache>) -> Self {
        Self { cache }
    }

    /// Generate a challenge for `username` and return the rendered image.
    pub async fn issue(&self, username: &str) -> Result<String, CacheError> {
        let (answer, image) = {
            let mut rng = rand::rng();
            let answer = generate_answer(&mut rng);
            let image = render_svg(&answer, &mut rng);
            (answer, image)
        };

        let key = format!("{PICTURE_CODE_PREFIX}{username}");
        let issued_at = chrono::Utc::now().timestamp();
        self.cache.put(&key, &answer, issued_at).await?;

        tracing::debug!(username = %username, "issued picture challenge");
        Ok(image)
    }

    /// Exact, case-sensitive comparison against the live challenge.
    ///
    /// A cache failure (including expiry) is surfaced as an error, not a
    /// plain mismatch; callers treat it as verification failure.
    pub async fn verify(&self, username: &str, answer: &str) -> Result<bool, CacheError> {
        let key = format!("{PICTURE_CODE_PREFIX}{username}");
        let expected = self.cache.get(&key).await?;

        let ok = expected == answer;
        if !ok {
            tracing::warn!(username = %username, "wrong picture challenge answer");
        }
        Ok(ok)
    }
}

/// Random alphanumeric answer, uppercase
fn generate_answer(rng: &mut impl Rng) -> String {
    (0..PICTURE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'A' + idx - 10) as char
            }
        })
        .collect()
}

/// Render the answer into a distorted SVG, returned as a data URL.
fn render_svg(text: &str, rng: &mut impl Rng) -> String {
    let width = 200;
    let height = 80;
    let noise_count = 20;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        width, height
    );

    // Background
    svg.push_str(r##"<rect width="100%" height="100%" fill="#1a1a2e"/>"##);

    // Noise lines
    for _ in 0..noise_count {
        let x1 = rng.random_range(0..width);
        let y1 = rng.random_range(0..height);
        let x2 = rng.random_range(0..width);
        let y2 = rng.random_range(0..height);
        let opacity = rng.random_range(20..50);
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="rgba(255,255,255,0.{})" stroke-width="1"/>"#,
            x1, y1, x2, y2, opacity
        ));
    }

    // Text characters with slight randomization
    let char_width = width as f32 / (text.len() as f32 + 1.0);
    for (i, c) in text.chars().enumerate() {
        let x = char_width * (i as f32 + 0.8);
        let y = 50 + rng.random_range(-10..10);
        let rotation = rng.random_range(-15..15);
        let color = format!(
            "rgb({},{},{})",
            rng.random_range(150..255),
            rng.random_range(150..255),
            rng.random_range(150..255)
        );

        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="monospace" font-size="32" font-weight="bold" fill="{}" transform="rotate({} {} {})">{}</text>"#,
            x, y, color, rotation, x, y, c
        ));
    }

    svg.push_str("</svg>");
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(&svg))
}
