use image::Rgba;

use super::*;
use crate::image::{encode_png, TRANSPARENT};

const RED: Rgba<u8> = Rgba([220, 30, 30, 255]);
const YELLOW: Rgba<u8> = Rgba([250, 240, 40, 255]);

/// Left half ribs, right half blades, top row transparent.
fn template(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if y == 0 {
            TRANSPARENT
        } else if x < width / 2 {
            RED
        } else {
            YELLOW
        }
    })
}

fn polymer_session() -> Session {
    let mut session = Session::polymer(800, 600, Thresholds::default()).unwrap();
    session.load_template_image(template(40, 20)).unwrap();
    session
}

fn cloth_session() -> Session {
    Session::cloth(800, 600, FanOutline::default(), Thresholds::default()).unwrap()
}

fn assert_clips_follow_background(session: &Session) {
    let background = session.background_transform().unwrap();
    for decoration in session.decorations() {
        let clip = decoration.clip().unwrap();
        assert!(
            clip.transform.approx_eq(&background, 1e-4),
            "clip of {} is {:?}, background is {background:?}",
            decoration.id(),
            clip.transform
        );
    }
}

#[test]
fn test_polymer_load_places_layers() {
    let session = polymer_session();

    assert_eq!(session.state(), SessionState::Ready);
    let background = session.background_layer().unwrap();
    let frame = session.frame_layer().unwrap();

    // min(600/40, 450/20) = 15
    assert!((background.transform().scale_x - 15.0).abs() < 1e-5);
    assert!(background.transform().is_uniform());
    assert_eq!(background.transform(), frame.transform());
    assert_eq!((background.transform().left, background.transform().top), (400.0, 300.0));

    // initial colors: white blades, black ribs
    assert_eq!(*background.rendered().get_pixel(30, 5), Rgba([255, 255, 255, 255]));
    assert_eq!(*frame.rendered().get_pixel(5, 5), Rgba([0, 0, 0, 255]));
    assert_eq!(frame.rendered().get_pixel(30, 5)[3], 0);

    let mask = session.silhouette().unwrap();
    assert_eq!(mask.get_pixel(5, 0)[3], 0);
    assert_eq!(mask.get_pixel(5, 1)[3], 255);
}

#[test]
fn test_stale_load_is_discarded() {
    let mut session = Session::polymer(800, 600, Thresholds::default()).unwrap();

    let slow = session.begin_load().unwrap();
    let fast = session.begin_load().unwrap();
    assert!(fast.generation() > slow.generation());

    let outcome = session.finish_load(fast, Ok(template(40, 20))).unwrap();
    assert_eq!(outcome, LoadOutcome::Applied);

    let outcome = session.finish_load(slow, Ok(template(100, 100))).unwrap();
    assert_eq!(outcome, LoadOutcome::Stale);
    assert_eq!(session.background_layer().unwrap().natural_size(), (40.0, 20.0));

    // a stale failure is not reported either
    let outcome = session
        .finish_load(slow, decode_image(b"garbage"))
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Stale);
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn test_finished_ticket_cannot_be_replayed() {
    let mut session = Session::polymer(800, 600, Thresholds::default()).unwrap();
    let ticket = session.begin_load().unwrap();
    session.finish_load(ticket, Ok(template(40, 20))).unwrap();

    let outcome = session.finish_load(ticket, Ok(template(10, 10))).unwrap();
    assert_eq!(outcome, LoadOutcome::Stale);
}

#[test]
fn test_decode_failure_is_non_fatal() {
    let mut session = Session::polymer(800, 600, Thresholds::default()).unwrap();

    let err = session.load_template(b"not an image").unwrap_err();
    assert!(matches!(err, Error::ImageDecode { .. }));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.background_layer().is_none());

    let png = encode_png(&template(40, 20)).unwrap();
    session.load_template(&png).unwrap();
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn test_empty_template_is_not_an_error() {
    let mut session = Session::polymer(800, 600, Thresholds::default()).unwrap();
    session
        .load_template_image(RgbaImage::new(8, 8))
        .unwrap();

    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.silhouette().unwrap().pixels().all(|p| p[3] == 0));

    session.load_template_image(RgbaImage::new(0, 0)).unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.silhouette().unwrap().dimensions(), (0, 0));
    assert!(session.geometry().is_some());
}

#[test]
fn test_decorations_need_a_loaded_template() {
    let mut session = Session::polymer(800, 600, Thresholds::default()).unwrap();
    let err = session.add_text("Hola").unwrap_err();
    assert!(matches!(err, Error::NotReady { .. }));
}

#[test]
fn test_new_decorations_are_clipped_to_the_fan() {
    let mut polymer = polymer_session();
    let text = polymer.add_text("Tu Texto").unwrap();
    let clip = polymer.decoration(text).unwrap().clip().unwrap();
    assert!(matches!(clip.shape, ClipShape::Silhouette(_)));

    let mut cloth = cloth_session();
    let text = cloth.add_text("Tu Texto").unwrap();
    let clip = cloth.decoration(text).unwrap().clip().unwrap();
    assert!(matches!(clip.shape, ClipShape::Outline(_)));

    assert_clips_follow_background(&polymer);
    assert_clips_follow_background(&cloth);
}

#[test]
fn test_text_defaults_per_kind() {
    let mut polymer = polymer_session();
    polymer.set_rib_color(Color::rgb(0x93, 0x33, 0xea));
    let id = polymer.add_text("A").unwrap();
    let text = polymer.decoration(id).unwrap().text().unwrap();
    assert_eq!(text.fill, Color::rgb(0x93, 0x33, 0xea));
    assert_eq!(text.font_family, DEFAULT_FONT_FAMILY);

    let mut cloth = cloth_session();
    let id = cloth.add_text("B").unwrap();
    assert_eq!(cloth.decoration(id).unwrap().text().unwrap().fill, Color::TEXT_DEFAULT);
}

#[test]
fn test_clip_synchrony_after_resize() {
    for mut session in [polymer_session(), cloth_session()] {
        let text = session.add_text("Tu Texto").unwrap();
        let image = session
            .add_image(RgbaImage::from_pixel(20, 20, RED))
            .unwrap();
        let text_transform = *session.decoration(text).unwrap().transform();

        session.resize(375, 700).unwrap();
        assert_clips_follow_background(&session);

        session.resize(1920, 300).unwrap();
        assert_clips_follow_background(&session);
        assert!(session.background_transform().unwrap().is_uniform());

        // decorations themselves stay put
        assert_eq!(*session.decoration(text).unwrap().transform(), text_transform);
        assert!(session.decoration(image).is_some());
    }
}

#[test]
fn test_resize_recomputes_all_layers_once() {
    let mut session = polymer_session();
    session.resize(1000, 500).unwrap();

    let geometry = *session.geometry().unwrap();
    // min(750/40, 375/20) = 18.75
    assert!((geometry.scale_x - 18.75).abs() < 1e-5);
    assert_eq!(session.background_layer().unwrap().transform(), &geometry);
    assert_eq!(session.frame_layer().unwrap().transform(), &geometry);
}

#[test]
fn test_resize_requests_are_coalesced() {
    let mut session = cloth_session();
    let before = session.render_requests();

    session.request_resize(500, 500);
    session.request_resize(640, 480);
    session.request_resize(1024, 768);

    assert!(session.flush_frame().unwrap());
    assert_eq!(session.canvas_size(), (1024, 768));
    assert_eq!(session.render_requests(), before + 1);
    assert!(!session.flush_frame().unwrap());
}

#[test]
fn test_pending_resize_survives_template_change() {
    let mut session = polymer_session();
    session.request_resize(1000, 500);

    let ticket = session.begin_load().unwrap();
    session.finish_load(ticket, Ok(template(40, 20))).unwrap();

    assert!(session.flush_frame().unwrap());
    assert_eq!(session.canvas_size(), (1000, 500));
    let geometry = *session.geometry().unwrap();
    assert!((geometry.scale_x - 18.75).abs() < 1e-5);
    assert_eq!(session.background_layer().unwrap().transform(), &geometry);
}

#[test]
fn test_zero_sized_resize_is_rejected() {
    let mut session = cloth_session();
    assert!(session.resize(0, 600).is_err());
    assert_eq!(session.canvas_size(), (800, 600));
}

#[test]
fn test_move_decoration_keeps_clip_window() {
    let mut session = polymer_session();
    let id = session.add_text("Tu Texto").unwrap();
    let clip_before = session.decoration(id).unwrap().clip().unwrap().transform;

    session
        .move_decoration(id, Transform::centered(10.0, 10.0, 3.0))
        .unwrap();

    let decoration = session.decoration(id).unwrap();
    assert_eq!(decoration.transform().scale_x, 3.0);
    assert_eq!(decoration.clip().unwrap().transform, clip_before);
}

#[test]
fn test_one_render_per_color_commit() {
    let mut session = polymer_session();
    session.take_render_request();
    let before = session.render_requests();

    assert!(session.set_blade_color(Color::rgb(0xec, 0x48, 0x99)));
    assert_eq!(session.render_requests(), before + 1);
    assert!(session.take_render_request());
    assert!(!session.take_render_request());

    // same color again is a no-op
    assert!(!session.set_blade_color(Color::rgb(0xec, 0x48, 0x99)));
    assert_eq!(session.render_requests(), before + 1);

    let background = session.background_layer().unwrap();
    assert_eq!(*background.rendered().get_pixel(30, 5), Rgba([0xec, 0x48, 0x99, 255]));
    assert_eq!(*background.source().get_pixel(30, 5), YELLOW);
}

#[test]
fn test_rib_color_follows_into_image_decorations() {
    let mut session = polymer_session();
    let id = session
        .add_image(RgbaImage::from_pixel(4, 4, RED))
        .unwrap();
    session.set_decoration_filter(id, Filter::Invert).unwrap();

    let gold = Color::rgb(0xff, 0xd7, 0x00);
    session.set_rib_color(gold);

    let decoration = session.decoration(id).unwrap();
    assert_eq!(decoration.filters().tint_color(), Some(gold));
    // a rib change resets the chain to grayscale + tint
    assert!(decoration.filters().contains(FilterKind::Grayscale));
    assert!(!decoration.filters().contains(FilterKind::Invert));
    assert_eq!(
        session.frame_layer().unwrap().color(),
        Some(gold)
    );
}

#[test]
fn test_add_image_removes_white_and_scales_down() {
    let mut session = cloth_session();
    let mut upload = RgbaImage::from_pixel(600, 10, Rgba([255, 255, 255, 255]));
    upload.put_pixel(0, 0, RED);

    let id = session.add_image(upload).unwrap();
    let decoration = session.decoration(id).unwrap();

    assert!((decoration.transform().scale_x - 0.5).abs() < 1e-6);
    assert_eq!((decoration.transform().left, decoration.transform().top), (400.0, 300.0));

    let DecorationKind::Image(pixels) = decoration.kind() else {
        panic!("expected an image decoration");
    };
    assert_eq!(*pixels.get_pixel(0, 0), RED);
    assert_eq!(pixels.get_pixel(1, 0)[3], 0);
    // cloth images are not tinted
    assert!(decoration.filters().is_empty());
}

#[test]
fn test_generated_image_keeps_background() {
    let mut session = polymer_session();
    let id = session
        .add_generated_image(RgbaImage::from_pixel(800, 8, Rgba([255, 255, 255, 255])))
        .unwrap();
    let decoration = session.decoration(id).unwrap();

    assert!((decoration.transform().scale_x - 0.5).abs() < 1e-6);
    let DecorationKind::Image(pixels) = decoration.kind() else {
        panic!("expected an image decoration");
    };
    assert!(pixels.pixels().all(|p| p[3] == 255));
    assert_eq!(decoration.filters().tint_color(), Some(Color::BLACK));
}

#[test]
fn test_manual_background_removal() {
    let mut session = cloth_session();
    let id = session
        .add_generated_image(RgbaImage::from_pixel(2, 1, Rgba([240, 240, 240, 255])))
        .unwrap();

    let report = session.remove_decoration_background(id).unwrap();
    assert_eq!(report.cleared, 2);

    let text = session.add_text("x").unwrap();
    assert!(session.remove_decoration_background(text).is_err());
}

#[test]
fn test_filters_only_apply_to_images() {
    let mut session = cloth_session();
    let text = session.add_text("x").unwrap();
    assert!(session.set_decoration_filter(text, Filter::Invert).is_err());

    let image = session
        .add_image(RgbaImage::from_pixel(2, 2, RED))
        .unwrap();
    session.set_decoration_filter(image, Filter::Invert).unwrap();
    session.clear_decoration_filter(image, FilterKind::Invert).unwrap();
    assert!(session.decoration(image).unwrap().filters().is_empty());
    assert!(session.set_text_fill(image, Color::BLACK).is_err());
}

#[test]
fn test_match_rib_color() {
    let mut session = polymer_session();
    let text = session.add_text("x").unwrap();
    let image = session
        .add_generated_image(RgbaImage::from_pixel(2, 2, RED))
        .unwrap();

    session.set_text_fill(text, Color::WHITE).unwrap();
    session.clear_decoration_filter(image, FilterKind::Tint).unwrap();

    session.match_rib_color(text).unwrap();
    session.match_rib_color(image).unwrap();

    let rib = session.rib_color();
    assert_eq!(session.decoration(text).unwrap().text().unwrap().fill, rib);
    assert_eq!(session.decoration(image).unwrap().filters().tint_color(), Some(rib));
}

#[test]
fn test_remove_decoration() {
    let mut session = cloth_session();
    let id = session.add_text("x").unwrap();

    let removed = session.remove_decoration(id).unwrap();
    assert_eq!(removed.id(), id);
    assert!(session.decorations().is_empty());
    assert!(matches!(
        session.remove_decoration(id),
        Err(Error::UnknownDecoration(_))
    ));
}

#[test]
fn test_template_change_disposes_everything() {
    let mut session = polymer_session();
    session.add_text("x").unwrap();

    session.begin_load().unwrap();
    assert_eq!(session.state(), SessionState::Loading);
    assert!(session.decorations().is_empty());
    assert!(session.background_layer().is_none());
    assert!(session.geometry().is_none());

    session.dispose();
    assert_eq!(session.state(), SessionState::Disposed);
}

#[test]
fn test_kind_specific_operations() {
    let mut cloth = cloth_session();
    assert!(cloth.begin_load().is_err());

    cloth.add_text("x").unwrap();
    cloth.set_outline(FanOutline::new(300.0, 50.0).unwrap()).unwrap();
    assert!(cloth.decorations().is_empty());
    assert_eq!(cloth.outline().outer_radius(), 300.0);

    let mut polymer = polymer_session();
    assert!(polymer.set_outline(FanOutline::default()).is_err());
}

#[test]
fn test_scene_description() {
    let mut session = polymer_session();
    session.add_text("Tu Texto").unwrap();

    let json = serde_json::to_value(session.scene()).unwrap();
    assert_eq!(json["kind"], "polymer");
    assert_eq!(json["state"], "ready");
    assert_eq!(json["rib_color"], "#000000");
    assert_eq!(json["layers"].as_array().unwrap().len(), 2);
    assert_eq!(json["decorations"][0]["type"], "text");
    assert_eq!(json["decorations"][0]["clip"]["shape"], "silhouette");
    assert!(json.get("outline_path").is_none());

    let cloth = serde_json::to_value(cloth_session().scene()).unwrap();
    assert_eq!(cloth["outline_path"], FanOutline::default().svg_path());
    assert_eq!(cloth["geometry"]["origin"], "center_bottom");
}
