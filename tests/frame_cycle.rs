//! Whole-frame tests: snap, pixelize, release.

mod common;

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use rstest::rstest;

use common::{backend_with_target, draw_nothing, TestScene};
use pixelsnap::backend::{
    Command, GraphicsBackend, RecordingBackend, TextureAspect, TextureBinding, TextureHandle,
};
use pixelsnap::pipeline::{PipelineError, ShaderId};
use pixelsnap::render_graph::ResourceSlot;
use pixelsnap::scene::{CameraMatrices, SceneGraph, Transform};
use pixelsnap::{ConfigError, PixelRenderer, PixelizeConfig, RendererConfig, SnapConfig};

fn renderer(ts: &mut TestScene) -> PixelRenderer {
    PixelRenderer::new(&ts.scene, &mut ts.registry, &ts.camera, RendererConfig::default()).unwrap()
}

/// Texture acquired for each slot, by label
fn slots(backend: &RecordingBackend) -> HashMap<String, TextureHandle> {
    backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::AcquireTexture {
                texture,
                label: Some(label),
            } => Some((label.clone(), *texture)),
            _ => None,
        })
        .collect()
}

fn slot(backend: &RecordingBackend, slot: ResourceSlot) -> TextureHandle {
    slots(backend)[slot.name()]
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(16)]
fn resources_balance_over_frames(#[case] frames: usize) {
    let mut ts = TestScene::orthographic();
    ts.object(None, Transform::from_position(Vec3::new(1.3, -0.2, 5.9)));
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);

    for _ in 0..frames {
        let stats = renderer
            .render_frame(
                &mut ts.scene,
                &mut ts.registry,
                &mut ts.camera,
                &mut backend,
                &target,
                draw_nothing,
            )
            .unwrap();
        assert!(stats.snapped && stats.pixelized);
        assert_eq!(stats.snapped_entities, 2);
        // Only the scene depth outlives the frame
        assert_eq!(backend.live_textures(), 1);
    }

    assert_eq!(backend.acquired_count(), frames * ResourceSlot::ACQUIRED.len());
    assert_eq!(backend.released_count(), backend.acquired_count() - 1);
    renderer.shutdown(&mut backend);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.invalid_releases(), 0);
}

#[test]
fn passes_record_in_stage_order() {
    let mut ts = TestScene::orthographic();
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);

    renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            draw_nothing,
        )
        .unwrap();

    let original = slot(&backend, ResourceSlot::OriginalScene);
    let map = slot(&backend, ResourceSlot::PixelizationMap);
    let pixelated = slot(&backend, ResourceSlot::PixelatedScene);
    let depth_temp = slot(&backend, ResourceSlot::DepthAttachmentTemp);
    let outlines_temp = slot(&backend, ResourceSlot::OutlinesTemp);
    let outlines = slot(&backend, ResourceSlot::Outlines);
    let scene_depth = slot(&backend, ResourceSlot::SceneDepth);

    let position = |pred: &dyn Fn(&Command) -> bool| {
        backend
            .commands()
            .iter()
            .position(pred)
            .expect("command not recorded")
    };
    let blit_into = |target: TextureHandle| {
        move |c: &Command| matches!(c, Command::Blit { target: t, .. } if *t == target)
    };

    let capture = position(&|c| {
        matches!(c, Command::Blit { source, target: t, shader: None }
            if source.texture == target.color && *t == original)
    });
    let map_pass = position(&blit_into(map));
    let color = position(&blit_into(pixelated));
    let depth = position(&|c| matches!(c, Command::BeginRenderPass(d)
        if d.depth_stencil_attachment.as_ref().map(|a| a.texture) == Some(depth_temp)));
    let outline_raster = position(&|c| matches!(c, Command::DrawTagged(tag) if tag == "Outlines"));
    let outline_pixelize = position(&blit_into(outlines));
    let composite = position(&|c| matches!(c, Command::BeginRenderPass(d)
        if d.color_attachments.first().map(|a| a.texture) == Some(target.color)));
    let write_back = position(&blit_into(scene_depth));

    let order = [
        capture,
        map_pass,
        color,
        depth,
        outline_raster,
        outline_pixelize,
        composite,
        write_back,
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");

    // Outlines are drawn into the cleared metadata target
    assert!(backend.commands().iter().any(|c| matches!(c,
        Command::BeginRenderPass(d) if d.color_attachments.first().map(|a| a.texture) == Some(outlines_temp))));
}

#[test]
fn color_and_outlines_share_one_map() {
    let mut ts = TestScene::orthographic();
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);

    renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            draw_nothing,
        )
        .unwrap();

    let map = slot(&backend, ResourceSlot::PixelizationMap);
    let bound_maps: Vec<TextureBinding> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SetGlobalTexture { name, binding } if name == "_PixelizationMap" => {
                Some(*binding)
            }
            _ => None,
        })
        .collect();
    assert_eq!(bound_maps, vec![TextureBinding::color(map); 2]);

    let pixelated = slot(&backend, ResourceSlot::PixelatedScene);
    let outlines = slot(&backend, ResourceSlot::Outlines);
    let shader_for = |target: TextureHandle| {
        backend.commands().iter().find_map(|c| match c {
            Command::Blit { target: t, shader, .. } if *t == target => Some(*shader),
            _ => None,
        })
    };
    let color_shader = shader_for(pixelated).flatten();
    assert!(color_shader.is_some());
    assert_eq!(color_shader, shader_for(outlines).flatten());

    // Color is resampled from the live camera target
    assert!(backend.commands().iter().any(|c| matches!(c,
        Command::Blit { source, target: t, .. } if *t == pixelated && source.texture == target.color)));
}

#[test]
fn depth_reconstruct_uses_identity_then_restores_camera() {
    let mut ts = TestScene::orthographic();
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);

    let mut seen: Option<CameraMatrices> = None;
    renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            |_, matrices| seen = Some(*matrices),
        )
        .unwrap();
    let camera = seen.unwrap();

    let matrices: Vec<(Mat4, Mat4)> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SetViewProjection { view, projection } => Some((*view, *projection)),
            _ => None,
        })
        .collect();
    assert_eq!(matrices.first(), Some(&(Mat4::IDENTITY, Mat4::IDENTITY)));
    assert_eq!(matrices.last(), Some(&(camera.view, camera.projection)));
    assert!(matrices[1..]
        .iter()
        .all(|m| *m == (camera.view, camera.projection)));
}

#[test]
fn host_draws_with_snapped_camera() {
    let mut ts = TestScene::orthographic();
    let unsnapped = ts.camera.matrices(&ts.scene);
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);

    let mut seen: Option<CameraMatrices> = None;
    renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            |_, matrices| seen = Some(*matrices),
        )
        .unwrap();

    let seen = seen.unwrap();
    assert!(seen.orthographic);
    assert_ne!(seen.view, unsnapped.view);
    // Camera is back where it was
    assert_eq!(ts.camera.matrices(&ts.scene).view, unsnapped.view);
}

#[test]
fn composite_reads_pixelized_depth_and_texel_size() {
    let mut ts = TestScene::orthographic();
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);

    renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            draw_nothing,
        )
        .unwrap();

    let depth_temp = slot(&backend, ResourceSlot::DepthAttachmentTemp);
    assert!(backend.commands().iter().any(|c| matches!(c,
        Command::SetGlobalTexture { name, binding }
            if name == "_Depth" && binding.texture == depth_temp && binding.aspect == TextureAspect::Depth)));
    assert!(backend.commands().iter().any(|c| matches!(c,
        Command::SetGlobalVector { name, value }
            if name == "_TexelSize" && value.z == 320.0 && value.w == 180.0)));

    let scene_depth = renderer.pipeline().scene_depth().unwrap();
    assert!(backend.commands().iter().any(|c| matches!(c,
        Command::SetGlobalTexture { name, binding }
            if name == "_CameraDepthTexture" && binding.texture == scene_depth)));
}

#[rstest]
#[case(ShaderId::Composite)]
#[case(ShaderId::PixelizationMap)]
#[case(ShaderId::CopyDepth)]
fn missing_shader_degrades_to_pass_through(#[case] missing: ShaderId) {
    let mut ts = TestScene::orthographic();
    let mut backend = RecordingBackend::new().with_missing_shader(missing.shader_name());
    let color = backend.create_external_texture("camera color");
    let target = pixelsnap::render_graph::CameraTarget::new(color, 320, 180);
    let mut renderer = renderer(&mut ts);

    for _ in 0..3 {
        let stats = renderer
            .render_frame(
                &mut ts.scene,
                &mut ts.registry,
                &mut ts.camera,
                &mut backend,
                &target,
                draw_nothing,
            )
            .unwrap();
        assert!(stats.pixelized);
    }
    // Each distinct shader name is looked up once for the renderer's lifetime
    assert_eq!(backend.shader_lookups(), 4);
    assert_eq!(backend.live_textures(), 1);

    if missing == ShaderId::Composite {
        let pixelated = slot(&backend, ResourceSlot::PixelatedScene);
        assert!(backend.commands().iter().any(|c| matches!(c,
            Command::Blit { source, target: t, shader: None }
                if source.texture == pixelated && *t == color)));
    }
}

#[test]
fn failed_configure_still_restores_transforms() {
    let mut ts = TestScene::orthographic();
    let node = ts.object(None, Transform::from_position(Vec3::new(1.3, -0.2, 5.9)));
    let nodes = [ts.camera.node, node];
    let before = ts.snapshot(&nodes);
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);
    backend.fail_acquire_after(2);

    let err = renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            draw_nothing,
        )
        .unwrap_err();

    assert!(matches!(err, PipelineError::Configure(_)));
    assert_eq!(ts.snapshot(&nodes), before);
    assert_eq!(backend.live_textures(), 0);
    assert!(!renderer.orchestrator().is_frame_open());
}

#[test]
fn destroyed_camera_stops_rendering() {
    let mut ts = TestScene::orthographic();
    let (mut backend, target) = backend_with_target();
    let mut renderer = renderer(&mut ts);
    ts.scene.despawn(ts.camera.node);

    let stats = renderer
        .render_frame(
            &mut ts.scene,
            &mut ts.registry,
            &mut ts.camera,
            &mut backend,
            &target,
            |backend: &mut dyn GraphicsBackend, _: &CameraMatrices| {
                backend.draw_tagged_renderers("unexpected")
            },
        )
        .unwrap();

    assert!(!stats.snapped && !stats.pixelized);
    assert!(backend.commands().is_empty());
    assert!(!ts.scene.contains(ts.camera.node));
}

#[rstest]
#[case(RendererConfig { snap: SnapConfig::default().with_pixel_size(-0.5), ..Default::default() },
       ConfigError::PixelSize(-0.5))]
#[case(RendererConfig { pixelize: PixelizeConfig::default().with_depth_test(true, f32::INFINITY), ..Default::default() },
       ConfigError::DepthTestThreshold(f32::INFINITY))]
fn invalid_renderer_config_is_rejected(#[case] config: RendererConfig, #[case] expected: ConfigError) {
    let mut ts = TestScene::orthographic();
    assert_eq!(config.validate(), Err(expected.clone()));

    let err = PixelRenderer::new(&ts.scene, &mut ts.registry, &ts.camera, config)
        .err()
        .unwrap();
    assert_eq!(err, PipelineError::Config(expected));
    // Nothing was registered for the camera
    assert!(ts.registry.is_empty());
}
