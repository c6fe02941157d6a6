use clipdeck::export::{ExportOptions, FramePolicy, SubsectionMode};
use clipdeck::media::{FramePosition, MediaBackend, NullBackend};
use clipdeck::pdf::combined_frame_plan;
use clipdeck::{
    convert_html, convert_pdf, convert_pptx, DeckError, HtmlConfig, PdfConfig, PptxConfig,
    PresentationConfig, SlideConfig, SubsectionMarker,
};
use image::{ImageBuffer, Rgb};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

/// Backend standing in for ffmpeg: posters are tiny generated images, clip
/// concatenation writes a placeholder file.
struct StubBackend;

impl MediaBackend for StubBackend {
    fn probe_duration(&self, clip: &Path) -> clipdeck::Result<f64> {
        if !clip.exists() {
            return Err(DeckError::PathNotFoundError(clip.to_path_buf()));
        }
        Ok(0.5)
    }

    fn extract_frame(
        &self,
        clip: &Path,
        _position: FramePosition,
        dest: &Path,
    ) -> clipdeck::Result<()> {
        if !clip.exists() {
            return Err(DeckError::PathNotFoundError(clip.to_path_buf()));
        }
        let image: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 4, Rgb([10, 20, 30]));
        image.save(dest).map_err(|e| DeckError::MediaError {
            clip: clip.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn concat_clips(&self, clips: &[PathBuf], dest: &Path) -> clipdeck::Result<()> {
        for clip in clips {
            if !clip.exists() {
                return Err(DeckError::PathNotFoundError(clip.clone()));
            }
        }
        fs::write(dest, b"stub video").map_err(DeckError::FileReadError)?;
        Ok(())
    }
}

fn write_clip(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not really a video").expect("Failed to write clip");
    path
}

fn slide_with_clips(clips: Vec<PathBuf>) -> SlideConfig {
    SlideConfig {
        animation_files: clips,
        loop_: false,
        auto_next: false,
        reversed_animation_files: None,
        notes: String::new(),
        subsections: Vec::new(),
    }
}

fn two_slide_config(clip_dir: &Path) -> PresentationConfig {
    let mut first = slide_with_clips(vec![
        write_clip(clip_dir, "s0c0.mp4"),
        write_clip(clip_dir, "s0c1.mp4"),
    ]);
    first.subsections = vec![SubsectionMarker {
        clip_index: 1,
        label: None,
        auto_next: false,
    }];
    let second = slide_with_clips(vec![write_clip(clip_dir, "s1c0.mp4")]);
    PresentationConfig {
        slides: vec![first, second],
        resolution: (1920, 1080),
        background_color: "black".to_string(),
    }
}

#[test]
fn convert_html_writes_deck_and_assets() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = two_slide_config(temp_dir.path());
    let output = temp_dir.path().join("deck.html");

    convert_html(
        &[config],
        &output,
        &ExportOptions::default(),
        &HtmlConfig::default(),
    )
    .expect("Failed to convert to HTML");

    assert!(output.is_file());
    let assets = temp_dir.path().join("deck_assets");
    assert!(assets.is_dir());
    assert!(assets.join("slide0000_clip00.mp4").is_file());
    assert!(assets.join("slide0000_clip01.mp4").is_file());
    assert!(assets.join("slide0001_clip00.mp4").is_file());

    let html = fs::read_to_string(&output).expect("Failed to read output");
    assert!(html.contains("deck_assets/slide0001_clip00.mp4"));
}

#[test]
fn convert_html_aborts_cleanly_on_missing_clip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = two_slide_config(temp_dir.path());
    config.slides[1].animation_files = vec![temp_dir.path().join("gone.mp4")];
    let output = temp_dir.path().join("deck.html");

    let result = convert_html(
        &[config],
        &output,
        &ExportOptions::default(),
        &HtmlConfig::default(),
    );

    match result {
        Err(DeckError::MissingClip { slide_index, clip }) => {
            assert_eq!(slide_index, 1);
            assert_eq!(clip, temp_dir.path().join("gone.mp4"));
        }
        other => panic!("Expected MissingClip, got {:?}", other.map(|_| ())),
    }

    // Nothing partial is left at the destination.
    assert!(!output.exists());
    assert!(!temp_dir.path().join("deck_assets").exists());
    for entry in fs::read_dir(temp_dir.path()).expect("Failed to list dir") {
        let name = entry.expect("bad entry").file_name().to_string_lossy().to_string();
        assert!(!name.starts_with(".deck"), "leftover temp artifact {}", name);
    }
}

#[test]
fn convert_pdf_produces_one_page_per_slide() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = two_slide_config(temp_dir.path());
    let output = temp_dir.path().join("deck.pdf");

    convert_pdf(
        &[config],
        &output,
        &ExportOptions::default(),
        &PdfConfig::default(),
        &StubBackend,
    )
    .expect("Failed to convert to PDF");

    let bytes = fs::read(&output).expect("Failed to read output");
    assert!(bytes.starts_with(b"%PDF-1.4"));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 2"));
    assert!(text.contains("/DCTDecode"));
}

#[test]
fn convert_pdf_with_all_subsections_adds_pages() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = two_slide_config(temp_dir.path());
    let output = temp_dir.path().join("deck.pdf");

    let options = ExportOptions {
        frame_policy: FramePolicy::Last,
        subsections: SubsectionMode::All,
    };
    convert_pdf(
        &[config],
        &output,
        &options,
        &PdfConfig::default(),
        &StubBackend,
    )
    .expect("Failed to convert to PDF");

    // Two segments on the first slide plus one whole second slide.
    let bytes = fs::read(&output).expect("Failed to read output");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 3"));
}

#[test]
fn convert_pdf_aborts_cleanly_when_the_backend_cannot_extract() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = two_slide_config(temp_dir.path());
    let output = temp_dir.path().join("deck.pdf");

    let result = convert_pdf(
        &[config],
        &output,
        &ExportOptions::default(),
        &PdfConfig::default(),
        &NullBackend::default(),
    );

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn combined_frame_plan_numbers_slides_globally() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let first = two_slide_config(temp_dir.path());
    let second = PresentationConfig {
        slides: vec![slide_with_clips(vec![write_clip(temp_dir.path(), "s2c0.mp4")])],
        resolution: (1920, 1080),
        background_color: "black".to_string(),
    };

    let plan = combined_frame_plan(&[first, second], &ExportOptions::default())
        .expect("Failed to plan frames");
    let indices: Vec<usize> = plan.iter().map(|f| f.slide_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn convert_pptx_embeds_one_video_per_slide() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = two_slide_config(temp_dir.path());
    let output = temp_dir.path().join("deck.pptx");

    convert_pptx(
        &[config],
        &output,
        &ExportOptions::default(),
        &PptxConfig::default(),
        &StubBackend,
    )
    .expect("Failed to convert to PPTX");

    let file = fs::File::open(&output).expect("Failed to open output");
    let mut archive = ZipArchive::new(file).expect("Failed to read archive");

    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("bad entry").name().to_string())
        .collect();
    assert!(names.contains(&"[Content_Types].xml".to_string()));
    assert!(names.contains(&"ppt/presentation.xml".to_string()));
    assert!(names.contains(&"ppt/slides/slide1.xml".to_string()));
    assert!(names.contains(&"ppt/slides/slide2.xml".to_string()));
    assert!(!names.contains(&"ppt/slides/slide3.xml".to_string()));
    assert!(names.contains(&"ppt/media/media1.mp4".to_string()));
    assert!(names.contains(&"ppt/media/poster2.png".to_string()));
}

#[test]
fn convert_pptx_splits_slides_at_subsection_markers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = two_slide_config(temp_dir.path());
    let output = temp_dir.path().join("deck.pptx");

    let options = ExportOptions {
        frame_policy: FramePolicy::Last,
        subsections: SubsectionMode::All,
    };
    convert_pptx(
        &[config],
        &output,
        &options,
        &PptxConfig::default(),
        &StubBackend,
    )
    .expect("Failed to convert to PPTX");

    let file = fs::File::open(&output).expect("Failed to open output");
    let mut archive = ZipArchive::new(file).expect("Failed to read archive");
    assert!(archive.by_name("ppt/slides/slide3.xml").is_ok());

    // Split parts keep the source slide number with a letter suffix.
    let read = |archive: &mut ZipArchive<fs::File>, name: &str| -> String {
        use std::io::Read;
        let mut content = String::new();
        archive
            .by_name(name)
            .expect("missing entry")
            .read_to_string(&mut content)
            .expect("bad entry");
        content
    };
    assert!(read(&mut archive, "ppt/slides/slide1.xml").contains("Slide 1"));
    assert!(read(&mut archive, "ppt/slides/slide2.xml").contains("Slide 1a"));
    assert!(read(&mut archive, "ppt/slides/slide3.xml").contains("Slide 2"));
}

#[test]
fn convert_pptx_aborts_cleanly_on_missing_clip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = two_slide_config(temp_dir.path());
    config.slides[1].animation_files = vec![temp_dir.path().join("gone.mp4")];
    let output = temp_dir.path().join("deck.pptx");

    let result = convert_pptx(
        &[config],
        &output,
        &ExportOptions::default(),
        &PptxConfig::default(),
        &StubBackend,
    );

    match result {
        Err(DeckError::MissingClip { slide_index, .. }) => assert_eq!(slide_index, 1),
        other => panic!("Expected MissingClip, got {:?}", other.map(|_| ())),
    }
    assert!(!output.exists());
    for entry in fs::read_dir(temp_dir.path()).expect("Failed to list dir") {
        let name = entry.expect("bad entry").file_name().to_string_lossy().to_string();
        assert!(!name.starts_with(".deck"), "leftover temp artifact {}", name);
    }
}

#[test]
fn convert_rejects_empty_config_list() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = temp_dir.path().join("deck.pptx");
    let result = convert_pptx(
        &[],
        &output,
        &ExportOptions::default(),
        &PptxConfig::default(),
        &StubBackend,
    );
    assert!(result.is_err());
}
