use stereograph::render_graph::recording::Binding;
use stereograph::render_graph::{
    CompositeRenderer, DisplaySize, RecordingEngine, RenderEngine, RenderOp,
};
use stereograph::{Camera, Eye, EyePair, Rect, StereoCameraRig, Vec2, Vec3};

fn attached_rig(baseline: f32) -> StereoCameraRig {
    let mut rig = StereoCameraRig::new(baseline, Vec3::new(0.0, 2.0, 8.0));
    rig.attach(Some(Camera::new()), Some(Camera::new()))
        .expect("both cameras present");
    rig
}

fn overlay_op(ops: &[RenderOp]) -> (EyePair<Option<Rect>>, EyePair<DisplaySize>) {
    ops.iter()
        .find_map(|op| match op {
            RenderOp::RenderOverlay { quads, targets } => Some((*quads, *targets)),
            _ => None,
        })
        .expect("overlay rendered")
}

#[test]
fn every_frame_runs_the_same_sequence() {
    let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
    let mut compositor = CompositeRenderer::new();
    let rig = attached_rig(10.0);
    let main = Camera::new().at([0.0, 5.0, 20.0]);

    for _ in 0..3 {
        compositor.render_frame(&mut engine, &rig, &main);
        let ops = engine.take_ops();

        let kinds: Vec<&str> = ops
            .iter()
            .map(|op| match op {
                RenderOp::SetAutoClear(false) => "auto-clear off",
                RenderOp::SetAutoClear(true) => "auto-clear on",
                RenderOp::Bind(Binding::Target(Eye::Left)) => "bind left",
                RenderOp::Bind(Binding::Target(Eye::Right)) => "bind right",
                RenderOp::Bind(Binding::Display) => "bind display",
                RenderOp::Clear => "clear",
                RenderOp::ClearOverrideMaterial => "clear override",
                RenderOp::RenderScene(_) => "scene",
                RenderOp::RenderOverlay { .. } => "overlay",
            })
            .collect();

        assert_eq!(
            kinds,
            [
                "auto-clear off",
                "bind left",
                "clear",
                "scene",
                "bind right",
                "clear",
                "scene",
                "clear override",
                "bind display",
                "scene",
                "overlay",
                "auto-clear on",
            ]
        );
    }
    assert_eq!(engine.allocations(), 2);
}

#[test]
fn eye_renders_use_the_rig_cameras() {
    let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
    let mut compositor = CompositeRenderer::new();

    compositor.render_frame(&mut engine, &attached_rig(10.0), &Camera::new());

    let scene_positions: Vec<Vec3> = engine
        .ops()
        .iter()
        .filter_map(|op| match op {
            RenderOp::RenderScene(position) => Some(*position),
            _ => None,
        })
        .collect();
    assert_eq!(
        scene_positions,
        [
            Vec3::new(-5.0, 2.0, 8.0),
            Vec3::new(5.0, 2.0, 8.0),
            Vec3::ZERO
        ]
    );
}

#[test]
fn resize_reallocates_targets_and_relays_quads() {
    let mut engine = RecordingEngine::new(DisplaySize::new(800, 600));
    let mut compositor = CompositeRenderer::new();
    let rig = attached_rig(10.0);
    let main = Camera::new();

    compositor.render_frame(&mut engine, &rig, &main);
    let (quads, targets) = overlay_op(&engine.take_ops());
    assert_eq!(targets.left, DisplaySize::new(800, 600));
    assert_eq!(quads.left.unwrap().size(), Vec2::new(400.0, 600.0));

    engine.resize(DisplaySize::new(1024, 768));
    compositor.render_frame(&mut engine, &rig, &main);
    let (quads, targets) = overlay_op(&engine.take_ops());

    let expected = DisplaySize::new(1024, 768);
    assert_eq!(targets, EyePair::new(expected, expected));
    assert_eq!(compositor.pool().size(), Some(DisplaySize::new(1024, 768)));
    assert_eq!(engine.allocations(), 4);

    let left = quads.left.unwrap();
    let right = quads.right.unwrap();
    assert_eq!(left.size(), Vec2::new(512.0, 768.0));
    assert_eq!(right.size(), Vec2::new(512.0, 768.0));
    assert_eq!(left.center(), Vec2::new(256.0, 384.0));
    assert_eq!(right.center(), Vec2::new(768.0, 384.0));
    assert_eq!(left.right(), 512.0);
    assert_eq!(right.x, 512.0);
}

#[test]
fn minimized_window_renders_nothing_until_restored() {
    let mut engine = RecordingEngine::new(DisplaySize::new(0, 0));
    let mut compositor = CompositeRenderer::new();
    let rig = attached_rig(10.0);

    compositor.render_frame(&mut engine, &rig, &Camera::new());
    assert!(engine.ops().is_empty());

    engine.resize(DisplaySize::new(640, 480));
    compositor.render_frame(&mut engine, &rig, &Camera::new());
    assert_eq!(engine.allocations(), 2);
    assert!(engine.auto_clear());
}

#[test]
fn quads_split_every_display_size_at_the_midline() {
    let sizes = [
        (1, 1),
        (2, 1),
        (3, 3),
        (7, 480),
        (801, 600),
        (1023, 767),
        (1920, 1080),
        (7680, 1080),
        (100, 4000),
    ];
    let mut engine = RecordingEngine::new(DisplaySize::new(640, 480));
    let mut compositor = CompositeRenderer::new();
    let rig = attached_rig(10.0);

    for (width, height) in sizes {
        let display = DisplaySize::new(width, height);
        engine.resize(display);
        compositor.render_frame(&mut engine, &rig, &Camera::new());
        let (quads, targets) = overlay_op(&engine.take_ops());

        assert_eq!(targets, EyePair::new(display, display), "{width}x{height}");
        assert_eq!(compositor.pool().size(), Some(display));

        let left = quads.left.expect("left quad");
        let right = quads.right.expect("right quad");
        let (w, h) = (width as f32, height as f32);
        assert_eq!(left.width + right.width, w, "{width}x{height}");
        assert_eq!(left.right(), w / 2.0, "{width}x{height}");
        assert_eq!(right.x, w / 2.0, "{width}x{height}");
        assert_eq!(right.right(), w, "{width}x{height}");
        assert_eq!((left.y, left.height), (0.0, h));
        assert_eq!((right.y, right.height), (0.0, h));
    }
    assert_eq!(engine.allocations(), 2 * sizes.len());
}
