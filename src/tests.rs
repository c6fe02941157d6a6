use super::*;
use crate::export::{temp_sibling, PlannedFrame};
use crate::media::FramePosition;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use tempfile::{NamedTempFile, TempDir};

fn create_temp_resource_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write to temp file");
    file
}

fn clips(n: usize) -> Vec<PathBuf> {
    (0..n).map(|i| PathBuf::from(format!("clip{}.mp4", i))).collect()
}

fn simple_slide(n: usize) -> SlideConfig {
    SlideConfig {
        animation_files: clips(n),
        loop_: false,
        auto_next: false,
        reversed_animation_files: None,
        notes: String::new(),
        subsections: Vec::new(),
    }
}

fn marker(clip_index: usize, auto_next: bool) -> SubsectionMarker {
    SubsectionMarker {
        clip_index,
        label: None,
        auto_next,
    }
}

#[test]
fn test_config_json_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("scene.json");

    let mut slide = simple_slide(3);
    // Absolute paths survive the round trip unchanged.
    slide.animation_files = (0..3)
        .map(|i| temp_dir.path().join(format!("clip{}.mp4", i)))
        .collect();
    slide.loop_ = true;
    slide.notes = "Speaker notes".to_string();
    slide.subsections = vec![marker(1, false), marker(2, true)];

    let config = PresentationConfig {
        slides: vec![slide],
        resolution: (1280, 720),
        background_color: "white".to_string(),
    };

    config.to_file(&path).expect("Failed to write config");
    let loaded = PresentationConfig::from_file(&path).expect("Failed to read config");

    assert_eq!(loaded, config);

    // Paths under the config directory are stored relative to it.
    let raw = std::fs::read_to_string(&path).expect("Failed to read raw config");
    assert!(raw.contains("\"clip0.mp4\""));
    assert!(!raw.contains(&temp_dir.path().to_string_lossy().to_string()));
}

#[test]
fn test_config_relative_paths_resolved_against_config_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("scene.json");

    let json = r#"{"slides": [{"animation_files": ["media/clip0.mp4"]}]}"#;
    std::fs::write(&path, json).expect("Failed to write config");

    let loaded = PresentationConfig::from_file(&path).expect("Failed to read config");
    assert_eq!(
        loaded.slides[0].animation_files[0],
        temp_dir.path().join("media/clip0.mp4")
    );
}

#[test]
fn test_config_defaults_for_older_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("scene.json");

    // A file written before notes, subsections and reversed clips existed.
    let json = r#"{"slides": [{"animation_files": ["clip0.mp4"]}]}"#;
    std::fs::write(&path, json).expect("Failed to write config");

    let loaded = PresentationConfig::from_file(&path).expect("Failed to read config");
    let slide = &loaded.slides[0];
    assert!(!slide.loop_);
    assert!(!slide.auto_next);
    assert!(slide.reversed_animation_files.is_none());
    assert!(slide.notes.is_empty());
    assert!(slide.subsections.is_empty());
    assert_eq!(loaded.resolution, (1920, 1080));
    assert_eq!(loaded.background_color, "black");
}

#[test]
fn test_config_missing_file_reports_path() {
    let result = PresentationConfig::from_file(&PathBuf::from("/nonexistent/scene.json"));
    match result {
        Err(DeckError::ConfigError { path, .. }) => {
            assert_eq!(path, PathBuf::from("/nonexistent/scene.json"));
        }
        other => panic!("Expected ConfigError, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_validation_rejects_empty_slide() {
    let config = PresentationConfig {
        slides: vec![simple_slide(0)],
        resolution: (1920, 1080),
        background_color: "black".to_string(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_non_interior_markers() {
    let mut slide = simple_slide(3);
    slide.subsections = vec![marker(0, false)];
    assert!(slide.validate(0).is_err());

    let mut slide = simple_slide(3);
    slide.subsections = vec![marker(3, false)];
    assert!(slide.validate(0).is_err());
}

#[test]
fn test_validation_rejects_non_increasing_markers() {
    let mut slide = simple_slide(5);
    slide.subsections = vec![marker(2, false), marker(2, false)];
    assert!(slide.validate(0).is_err());

    let mut slide = simple_slide(5);
    slide.subsections = vec![marker(3, false), marker(2, false)];
    assert!(slide.validate(0).is_err());
}

#[test]
fn test_validation_rejects_mismatched_reversed_clips() {
    let mut slide = simple_slide(3);
    slide.reversed_animation_files = Some(clips(2));
    assert!(slide.validate(0).is_err());
}

#[test]
fn test_segment_spans() {
    let mut slide = simple_slide(5);
    slide.subsections = vec![marker(2, false), marker(4, false)];

    assert_eq!(slide.segment_count(), 3);
    assert_eq!(slide.segment_span(0), (0, 2));
    assert_eq!(slide.segment_span(1), (2, 4));
    assert_eq!(slide.segment_span(2), (4, 5));

    assert_eq!(slide.boundary_clip(-1), 0);
    assert_eq!(slide.boundary_clip(0), 2);
    assert_eq!(slide.boundary_clip(1), 4);
    assert_eq!(slide.last_subsection_index(), 1);
}

#[test]
fn test_slide_builder_finalize() {
    let options = SceneOptions::default();
    let mut builder = SlideBuilder::new();
    builder.push_clip(PathBuf::from("a.mp4"), Some(PathBuf::from("a_rev.mp4")));
    builder.push_clip(PathBuf::from("b.mp4"), Some(PathBuf::from("b_rev.mp4")));

    let slide = builder
        .finalize(&options, false, false, String::new())
        .expect("Failed to finalize slide");

    assert_eq!(slide.animation_files.len(), 2);
    // Reversed clips replay the slide back-to-front.
    assert_eq!(
        slide.reversed_animation_files,
        Some(vec![PathBuf::from("b_rev.mp4"), PathBuf::from("a_rev.mp4")])
    );
    // The buffer is cleared for the next slide.
    assert_eq!(builder.clip_count(), 0);
}

#[test]
fn test_slide_builder_rejects_empty_slide() {
    let options = SceneOptions::default();
    let mut builder = SlideBuilder::new();
    assert!(builder.finalize(&options, false, false, String::new()).is_err());
}

#[test]
fn test_slide_builder_skip_reversing_drops_reversed_clips() {
    let options = SceneOptions {
        skip_reversing: true,
        ..SceneOptions::default()
    };
    let mut builder = SlideBuilder::new();
    builder.push_clip(PathBuf::from("a.mp4"), Some(PathBuf::from("a_rev.mp4")));
    let slide = builder
        .finalize(&options, false, false, String::new())
        .expect("Failed to finalize slide");
    assert!(slide.reversed_animation_files.is_none());
}

#[test]
fn test_slide_builder_markers() {
    let options = SceneOptions::default();
    let mut builder = SlideBuilder::new();

    // A marker before any clip is not interior.
    assert!(builder.mark_subsection(None, false).is_err());

    builder.push_clip(PathBuf::from("a.mp4"), None);
    builder.mark_subsection(Some("part two".to_string()), false).expect("mark failed");

    // Two markers at the same position are not strictly increasing.
    assert!(builder.mark_subsection(None, false).is_err());

    builder.push_clip(PathBuf::from("b.mp4"), None);
    let slide = builder
        .finalize(&options, false, false, String::new())
        .expect("Failed to finalize slide");
    assert_eq!(slide.subsections.len(), 1);
    assert_eq!(slide.subsections[0].clip_index, 1);
    assert_eq!(slide.subsections[0].label.as_deref(), Some("part two"));
}

#[test]
fn test_slide_builder_rejects_trailing_marker() {
    let options = SceneOptions::default();
    let mut builder = SlideBuilder::new();
    builder.push_clip(PathBuf::from("a.mp4"), None);
    builder.mark_subsection(None, false).expect("mark failed");
    // No clip was pushed after the marker, so it sits at the slide's end.
    assert!(builder.finalize(&options, false, false, String::new()).is_err());
}

#[test]
fn test_deck_builder() {
    let mut deck = DeckBuilder::new();
    assert!(DeckBuilder::new()
        .finalize((1920, 1080), "black".to_string())
        .is_err());

    deck.push_slide(simple_slide(1));
    let config = deck
        .finalize((1920, 1080), "black".to_string())
        .expect("Failed to finalize deck");
    assert_eq!(config.slides.len(), 1);
}

fn plan_config() -> PresentationConfig {
    let mut slide_a = simple_slide(3);
    slide_a.subsections = vec![marker(1, false)];
    let slide_b = simple_slide(2);
    PresentationConfig {
        slides: vec![slide_a, slide_b],
        resolution: (1920, 1080),
        background_color: "black".to_string(),
    }
}

#[test]
fn test_frame_plan_one_frame_per_slide_by_default() {
    let config = plan_config();
    let options = ExportOptions::default();
    let plan = frame_plan(&config, &options).expect("Failed to plan frames");

    assert_eq!(plan.len(), 2);
    // Default policy is the last frame of the last clip.
    assert_eq!(plan[0].clip, PathBuf::from("clip2.mp4"));
    assert_eq!(plan[0].position, FramePosition::Last);
    assert_eq!(plan[1].slide_index, 1);
}

#[test]
fn test_frame_plan_first_policy() {
    let config = plan_config();
    let options = ExportOptions {
        frame_policy: FramePolicy::First,
        subsections: SubsectionMode::None,
    };
    let plan = frame_plan(&config, &options).expect("Failed to plan frames");
    assert_eq!(plan[0].clip, PathBuf::from("clip0.mp4"));
    assert_eq!(plan[0].position, FramePosition::First);
}

#[test]
fn test_frame_plan_all_subsections() {
    let config = plan_config();
    let options = ExportOptions {
        frame_policy: FramePolicy::Last,
        subsections: SubsectionMode::All,
    };
    let plan = frame_plan(&config, &options).expect("Failed to plan frames");

    // Slide 0 has one marker (two segments), slide 1 has none.
    assert_eq!(plan.len(), 3);
    assert_eq!(plan[0].segment, Some(0));
    assert_eq!(plan[0].clip, PathBuf::from("clip0.mp4"));
    assert_eq!(plan[1].segment, Some(1));
    assert_eq!(plan[1].clip, PathBuf::from("clip2.mp4"));
    assert_eq!(plan[2].slide_index, 1);
}

#[test]
fn test_frame_plan_final_subsection() {
    let config = plan_config();
    let options = ExportOptions {
        frame_policy: FramePolicy::First,
        subsections: SubsectionMode::Final,
    };
    let plan = frame_plan(&config, &options).expect("Failed to plan frames");

    assert_eq!(plan.len(), 2);
    // First frame of the terminal segment, which starts at the marker.
    assert_eq!(plan[0].clip, PathBuf::from("clip1.mp4"));
}

#[test]
fn test_frame_plan_two_markers_make_three_units() {
    let mut slide = simple_slide(4);
    slide.subsections = vec![marker(1, false), marker(3, false)];
    let config = PresentationConfig {
        slides: vec![slide],
        resolution: (1920, 1080),
        background_color: "black".to_string(),
    };

    let all = ExportOptions {
        frame_policy: FramePolicy::Last,
        subsections: SubsectionMode::All,
    };
    assert_eq!(frame_plan(&config, &all).expect("plan failed").len(), 3);

    let none = ExportOptions::default();
    assert_eq!(frame_plan(&config, &none).expect("plan failed").len(), 1);
}

#[test]
fn test_frame_plan_is_deterministic() {
    let config = plan_config();
    let options = ExportOptions {
        frame_policy: FramePolicy::Last,
        subsections: SubsectionMode::All,
    };
    let first: Vec<PlannedFrame> = frame_plan(&config, &options).expect("plan failed");
    let second: Vec<PlannedFrame> = frame_plan(&config, &options).expect("plan failed");
    assert_eq!(first, second);
}

#[test]
fn test_generate_html_structure() {
    let mut config = plan_config();
    config.slides[0].loop_ = true;
    config.slides[0].notes = "Intro & <welcome>".to_string();

    let options = ExportOptions {
        frame_policy: FramePolicy::Last,
        subsections: SubsectionMode::All,
    };
    let html = generate_html(&[config], &options, &HtmlConfig::default(), "deck_assets")
        .expect("Failed to generate HTML");

    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("data-slide-count=\"2\""));
    assert!(html.contains("data-loop=\"true\""));
    assert!(html.contains("data-cues=\"1\""));
    assert!(html.contains("src=\"deck_assets/slide0000_clip00.mp4\""));
    // Notes are escaped, never emitted raw.
    assert!(html.contains("Intro &amp; &lt;welcome&gt;"));
    // The built-in player and stylesheet are embedded by default.
    assert!(html.contains("<style>"));
    assert!(html.contains("<script>"));
}

#[test]
fn test_generate_html_omits_cues_without_subsection_mode() {
    let config = plan_config();
    let options = ExportOptions::default();
    let html = generate_html(&[config], &options, &HtmlConfig::default(), "deck_assets")
        .expect("Failed to generate HTML");
    assert!(!html.contains("data-cues"));
}

#[test]
fn test_generate_html_rejects_empty_input() {
    let options = ExportOptions::default();
    assert!(generate_html(&[], &options, &HtmlConfig::default(), "deck_assets").is_err());
}

#[test]
fn test_resource_file_embeds_local_content() {
    let css = create_temp_resource_file("body { background: #000; }");
    let resource = ResourceFile::new(css.path().to_str().unwrap());
    assert!(!resource.is_remote);

    let tag = resource.tag("css", true).expect("Failed to build tag");
    assert_eq!(tag, "<style>body { background: #000; }</style>");
}

#[test]
fn test_resource_file_links_instead_of_embedding() {
    let js = create_temp_resource_file("console.log('ready');");
    let path = js.path().to_str().unwrap().to_string();
    let resource = ResourceFile::new(&path);

    let tag = resource.tag("js", false).expect("Failed to build tag");
    assert_eq!(tag, format!(r#"<script src="{}"></script>"#, path));
}

#[test]
fn test_resource_file_remote_is_always_linked() {
    let resource = ResourceFile::new("https://example.com/deck.css");
    assert!(resource.is_remote);

    // Remote resources are referenced, never fetched for embedding here.
    let tag = resource.tag("css", true).expect("Failed to build tag");
    assert_eq!(
        tag,
        r#"<link rel="stylesheet" href="https://example.com/deck.css">"#
    );
}

#[test]
fn test_resource_file_rejects_unknown_tag_type() {
    let resource = ResourceFile::new("deck.css");
    assert!(resource.tag("font", false).is_err());
}

#[test]
fn test_resource_file_missing_local_file() {
    let resource = ResourceFile::new("/nonexistent/deck.css");
    assert!(resource.content().is_err());
}

#[test]
fn test_generate_html_with_custom_css() {
    let css = create_temp_resource_file("body { font-family: Arial; }");
    let html_config = HtmlConfig {
        css_files: vec![ResourceFile::new(css.path().to_str().unwrap())],
        ..HtmlConfig::default()
    };

    let html = generate_html(
        &[plan_config()],
        &ExportOptions::default(),
        &html_config,
        "deck_assets",
    )
    .expect("Failed to generate HTML");

    assert!(html.contains("<style>body { font-family: Arial; }</style>"));
}

#[test]
fn test_option_parsing() {
    assert_eq!(FramePolicy::from_str("first").unwrap(), FramePolicy::First);
    assert_eq!(FramePolicy::from_str("LAST").unwrap(), FramePolicy::Last);
    assert!(FramePolicy::from_str("middle").is_err());

    assert_eq!(SubsectionMode::from_str("none").unwrap(), SubsectionMode::None);
    assert_eq!(SubsectionMode::from_str("final").unwrap(), SubsectionMode::Final);
    assert_eq!(SubsectionMode::from_str("all").unwrap(), SubsectionMode::All);
    assert!(SubsectionMode::from_str("some").is_err());

    assert_eq!(BackendChoice::from_str("ffmpeg").unwrap(), BackendChoice::Ffmpeg);
    assert_eq!(BackendChoice::from_str("null").unwrap(), BackendChoice::Null);
    assert!(BackendChoice::from_str("gstreamer").is_err());
}

#[test]
fn test_list_presentation_configs_skips_invalid_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let valid = temp_dir.path().join("scene_a.json");
    std::fs::write(&valid, r#"{"slides": [{"animation_files": ["a.mp4"]}]}"#)
        .expect("Failed to write config");

    let invalid = temp_dir.path().join("scene_b.json");
    std::fs::write(&invalid, "not json at all").expect("Failed to write config");

    let found = list_presentation_configs(temp_dir.path()).expect("Failed to list configs");
    assert_eq!(found, vec![valid]);
}

#[test]
fn test_temp_sibling_stays_in_parent_directory() {
    let dest = PathBuf::from("/output/deck.pdf");
    let temp = temp_sibling(&dest);
    assert_eq!(temp.parent(), dest.parent());
    let name = temp.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with(".deck.pdf."));
    assert!(name.ends_with(".tmp"));
}
