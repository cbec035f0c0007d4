//! Shareable chapter snapshots.
//!
//! Each chapter becomes one fixed-size PNG card: chapter label, wrapped
//! paragraph, the recipient's rendered answer and, when it can be loaded,
//! the chapter image. Text is drawn with `embedded-graphics` mono fonts on a
//! half-resolution canvas that is then scaled up, and the photo is composited
//! at full resolution.

use std::convert::Infallible;
use std::io::Cursor;

use async_trait::async_trait;
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::integration::render_for;
use crate::story::PlayableStory;
use crate::types::Answers;

/// Brand mark printed in the card footer.
const BRAND: &str = "Storyline";

const BACKGROUND: Rgb888 = Rgb888::new(0xFF, 0xFB, 0xF5);
const FOREGROUND: Rgb888 = Rgb888::new(0x3E, 0x27, 0x23);
const MUTED: Rgb888 = Rgb888::new(0x8D, 0x6E, 0x63);
const VIEWER_VOICE: Rgb888 = Rgb888::new(0x7A, 0x70, 0x68);

/// Text is laid out at half the output resolution.
const SCALE: u32 = 2;
const LINE_SPACING: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// Output format of a snapshot card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotAspect {
    /// 9:16, 1080x1920.
    #[default]
    #[serde(alias = "9:16")]
    Portrait,
    /// 1:1, 1080x1080.
    #[serde(alias = "1:1")]
    Square,
}

impl SnapshotAspect {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Portrait => (1080, 1920),
            Self::Square => (1080, 1080),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "portrait" | "9:16" => Some(Self::Portrait),
            "square" | "1:1" => Some(Self::Square),
            _ => None,
        }
    }

    fn layout(self) -> Layout {
        match self {
            Self::Portrait => Layout {
                padding: 50,
                label_gap: 20,
                section_gap: 12,
                paragraph_lines: 10,
                answer_lines: 5,
                image_gap: 20,
                image_max_height: 300,
            },
            Self::Square => Layout {
                padding: 40,
                label_gap: 14,
                section_gap: 8,
                paragraph_lines: 6,
                answer_lines: 3,
                image_gap: 12,
                image_max_height: 190,
            },
        }
    }
}

/// Spacing in half-resolution pixels.
struct Layout {
    padding: u32,
    label_gap: u32,
    section_gap: u32,
    paragraph_lines: usize,
    answer_lines: usize,
    image_gap: u32,
    image_max_height: u32,
}

/// Fetches chapter images by URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<u8>, ExportError>;
}

/// Text shown on one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub label: String,
    pub paragraph: String,
    /// Rendered answer, if the chapter has a visible one.
    pub answer: Option<String>,
    pub story_title: String,
}

impl CardContent {
    pub fn for_chapter(story: &PlayableStory, index: usize, answers: &Answers) -> Option<Self> {
        let chapter = story.chapters.get(index)?;
        let answer = answers
            .get(&chapter.id)
            .map(|a| render_for(&chapter.prompt, a))
            .filter(|display| display.is_visible())
            .map(|display| display.text);
        Some(Self {
            label: chapter.label(index),
            paragraph: chapter.paragraph_text.clone(),
            answer,
            story_title: story.title.clone(),
        })
    }
}

/// One rendered card.
#[derive(Debug, Clone)]
pub struct ChapterSnapshot {
    pub index: usize,
    pub chapter_id: String,
    pub png: Vec<u8>,
    /// False when the chapter had no image or it could not be loaded.
    pub image_included: bool,
}

impl ChapterSnapshot {
    pub fn file_name(&self) -> String {
        format!("chapter-{}.png", self.index + 1)
    }
}

/// Render one snapshot per chapter, in chapter order.
///
/// An image that cannot be fetched or decoded degrades that card to text
/// only; it never fails the export.
pub async fn build_snapshots(
    story: &PlayableStory,
    answers: &Answers,
    aspect: SnapshotAspect,
    images: &dyn ImageSource,
) -> Result<Vec<ChapterSnapshot>, ExportError> {
    let mut snapshots = Vec::with_capacity(story.chapters.len());
    for (index, chapter) in story.chapters.iter().enumerate() {
        let picture = match chapter.image_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => load_picture(images, url).await,
            _ => None,
        };
        let Some(content) = CardContent::for_chapter(story, index, answers) else {
            continue;
        };
        let (png, image_included) = render_card(&content, aspect, picture.as_ref())?;
        snapshots.push(ChapterSnapshot {
            index,
            chapter_id: chapter.id.clone(),
            png,
            image_included,
        });
    }
    tracing::info!(story_id = %story.id, count = snapshots.len(), ?aspect, "Snapshots rendered");
    Ok(snapshots)
}

async fn load_picture(images: &dyn ImageSource, url: &str) -> Option<DynamicImage> {
    let bytes = match images.load(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url, error = %e, "Chapter image unavailable, exporting text only");
            return None;
        }
    };
    match image::load_from_memory(&bytes) {
        Ok(picture) => Some(picture),
        Err(e) => {
            tracing::warn!(url, error = %e, "Chapter image unreadable, exporting text only");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// `embedded-graphics` draw target over an RGBA buffer.
struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        let [r, g, b] = [BACKGROUND.r(), BACKGROUND.g(), BACKGROUND.b()];
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
        }
    }

    fn text(&mut self, text: &str, x: u32, y: u32, font: &MonoFont<'_>, color: Rgb888) {
        let style = MonoTextStyle::new(font, color);
        let origin = Point::new(x as i32, y as i32);
        // Drawing on an in-memory canvas cannot fail.
        let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(self);
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.image.width() && y < self.image.height() {
                self.image
                    .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

/// Render one card to PNG bytes. Returns whether the picture was placed.
pub fn render_card(
    content: &CardContent,
    aspect: SnapshotAspect,
    picture: Option<&DynamicImage>,
) -> Result<(Vec<u8>, bool), ExportError> {
    let (full_w, full_h) = aspect.dimensions();
    let (w, h) = (full_w / SCALE, full_h / SCALE);
    let layout = aspect.layout();
    let body = &FONT_10X20;
    let small = &FONT_6X10;
    let columns = ((w - 2 * layout.padding) / body.character_size.width) as usize;
    let line_height = body.character_size.height + LINE_SPACING;

    let mut canvas = Canvas::new(w, h);
    let x = layout.padding;
    let mut y = layout.padding;

    let label = clamp_lines(wrap_text(&content.label.to_uppercase(), columns), 1);
    for line in &label {
        canvas.text(line, x, y, body, MUTED);
    }
    y += body.character_size.height + layout.label_gap;

    for line in clamp_lines(wrap_text(&content.paragraph, columns), layout.paragraph_lines) {
        canvas.text(&line, x, y, body, FOREGROUND);
        y += line_height;
    }

    if let Some(answer) = &content.answer {
        y += layout.section_gap;
        for line in clamp_lines(wrap_text(answer, columns), layout.answer_lines) {
            canvas.text(&line, x, y, body, VIEWER_VOICE);
            y += line_height;
        }
    }

    let footer_y = h - layout.padding - small.character_size.height;
    let footer_columns = ((w - 2 * layout.padding) / small.character_size.width) as usize;
    let title_columns = footer_columns.saturating_sub(BRAND.len() + 2);
    if let Some(title) = clamp_lines(wrap_text(&content.story_title, title_columns), 1).first() {
        canvas.text(title, x, footer_y, small, MUTED);
    }
    let brand_x = w - layout.padding - small.character_size.width * BRAND.len() as u32;
    canvas.text(BRAND, brand_x, footer_y, small, MUTED);

    let mut full = image::imageops::resize(&canvas.image, full_w, full_h, FilterType::Nearest);

    let mut image_included = false;
    if let Some(picture) = picture {
        let top = y + layout.image_gap;
        let bottom = footer_y.saturating_sub(layout.image_gap);
        let box_h = bottom.saturating_sub(top).min(layout.image_max_height);
        let box_w = w - 2 * layout.padding;
        if box_h >= body.character_size.height * 2 {
            let fitted = picture
                .resize_to_fill(box_w * SCALE, box_h * SCALE, FilterType::Triangle)
                .to_rgba8();
            image::imageops::overlay(
                &mut full,
                &fitted,
                i64::from(x * SCALE),
                i64::from(top * SCALE),
            );
            image_included = true;
        }
    }

    let mut png = Cursor::new(Vec::new());
    full.write_to(&mut png, ImageFormat::Png)?;
    Ok((png.into_inner(), image_included))
}

/// Greedy word wrap to `columns` characters. Words longer than a line are
/// split; explicit newlines are kept.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > columns {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = chars.split_off(columns);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            let word_len = chars.len();
            if word_len == 0 {
                continue;
            }
            if current_len > 0 && current_len + 1 + word_len > columns {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(chars);
            current_len += word_len;
        }
        if current_len > 0 || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Keep at most `max` lines, marking a cut with a trailing ellipsis.
fn clamp_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() <= max {
        return lines;
    }
    lines.truncate(max);
    if let Some(last) = lines.last_mut() {
        let keep = last.chars().count().saturating_sub(3);
        let mut clipped: String = last.chars().take(keep).collect();
        clipped.push_str("...");
        *last = clipped;
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use image::GenericImageView;

    use super::*;
    use crate::prompt::{AudioPlaybackConfig, MultipleChoiceConfig, Prompt};
    use crate::story::{ImagePosition, PlayableChapter};

    struct FakeImages {
        broken: HashSet<String>,
    }

    #[async_trait]
    impl ImageSource for FakeImages {
        async fn load(&self, url: &str) -> Result<Vec<u8>, ExportError> {
            if self.broken.contains(url) {
                return Err(ExportError::ImageLoad {
                    url: url.to_string(),
                    reason: "404".into(),
                });
            }
            if url.ends_with(".txt") {
                return Ok(b"not an image".to_vec());
            }
            let img = RgbaImage::from_pixel(8, 8, Rgba([200, 30, 30, 255]));
            let mut buf = Cursor::new(Vec::new());
            img.write_to(&mut buf, ImageFormat::Png).unwrap();
            Ok(buf.into_inner())
        }
    }

    fn chapter(id: &str, image_url: Option<&str>, prompt: Prompt) -> PlayableChapter {
        PlayableChapter {
            id: id.into(),
            title: None,
            paragraph_text: "We met on a rainy Tuesday and talked until the cafe closed.".into(),
            image_url: image_url.map(String::from),
            image_position: ImagePosition::default(),
            prompt,
        }
    }

    fn story() -> PlayableStory {
        PlayableStory {
            id: "S1".into(),
            title: "Our Story".into(),
            recipient_name: None,
            occasion: None,
            final_message: None,
            chapters: vec![
                chapter(
                    "c1",
                    Some("https://cdn.test/ok.png"),
                    Prompt::MultipleChoice(MultipleChoiceConfig {
                        question: String::new(),
                        options: vec!["A".into(), "B".into()],
                        integration_template: "You picked [choice]!".into(),
                    }),
                ),
                chapter("c2", Some("https://cdn.test/missing.png"), Prompt::None),
                chapter(
                    "c3",
                    Some("https://cdn.test/garbage.txt"),
                    Prompt::AudioPlayback(AudioPlaybackConfig {
                        button_text: "Play".into(),
                        audio_url: "https://cdn.test/a.mp3".into(),
                    }),
                ),
                chapter("c4", None, Prompt::None),
            ],
        }
    }

    fn images() -> FakeImages {
        FakeImages {
            broken: HashSet::from(["https://cdn.test/missing.png".to_string()]),
        }
    }

    #[tokio::test]
    async fn snapshots_follow_chapter_order_and_degrade_on_bad_images() {
        let answers = Answers::from([("c1".to_string(), "A".to_string())]);
        let snapshots = build_snapshots(&story(), &answers, SnapshotAspect::Square, &images())
            .await
            .unwrap();

        let ids: Vec<&str> = snapshots.iter().map(|s| s.chapter_id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3", "c4"]);
        let names: Vec<String> = snapshots.iter().map(ChapterSnapshot::file_name).collect();
        assert_eq!(names, ["chapter-1.png", "chapter-2.png", "chapter-3.png", "chapter-4.png"]);

        let included: Vec<bool> = snapshots.iter().map(|s| s.image_included).collect();
        assert_eq!(included, [true, false, false, false]);
    }

    #[tokio::test]
    async fn snapshots_have_fixed_dimensions() {
        for aspect in [SnapshotAspect::Portrait, SnapshotAspect::Square] {
            let snapshots = build_snapshots(&story(), &Answers::new(), aspect, &images())
                .await
                .unwrap();
            let decoded = image::load_from_memory(&snapshots[0].png).unwrap();
            assert_eq!(decoded.dimensions(), aspect.dimensions());
        }
    }

    #[test]
    fn card_content_renders_visible_answers_only() {
        let answers = Answers::from([
            ("c1".to_string(), "A".to_string()),
            ("c3".to_string(), "played".to_string()),
        ]);
        let story = story();
        let first = CardContent::for_chapter(&story, 0, &answers).unwrap();
        assert_eq!(first.label, "Chapter 1");
        assert_eq!(first.answer.as_deref(), Some("You picked A!"));
        assert_eq!(CardContent::for_chapter(&story, 2, &answers).unwrap().answer, None);
        assert!(CardContent::for_chapter(&story, 9, &answers).is_none());
    }

    #[test]
    fn aspect_names() {
        assert_eq!(SnapshotAspect::from_name("9:16"), Some(SnapshotAspect::Portrait));
        assert_eq!(SnapshotAspect::from_name("square"), Some(SnapshotAspect::Square));
        assert_eq!(SnapshotAspect::from_name("4:3"), None);
    }

    #[test]
    fn wrap_breaks_on_words_and_splits_long_words() {
        assert_eq!(wrap_text("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4), ["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("a\n\nb", 10), ["a", "", "b"]);
    }

    #[test]
    fn clamp_marks_truncation() {
        let lines = clamp_lines(vec!["first line".into(), "second".into()], 1);
        assert_eq!(lines, ["first l..."]);
        assert_eq!(clamp_lines(vec!["x".into()], 3), ["x"]);
    }
}
