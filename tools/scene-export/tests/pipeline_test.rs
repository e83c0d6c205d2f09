//! End-to-end tests: authoring scene -> document -> GLB -> gltf re-import

mod fixtures;

use gltf::animation::util::ReadOutputs;
use tempfile::tempdir;

use scene_export::authoring::{
    Face, MemoryScene, MeshDescription, NodeDescription, TransformDescription,
};
use scene_export::{export_scene, formats, ClipArg, ExportArgs, ExportError, NodeId};

fn clip(name: &str, start: f64, end: f64) -> ClipArg {
    ClipArg {
        name: name.to_string(),
        start,
        end,
    }
}

fn export_glb(args: &ExportArgs) -> Vec<u8> {
    let scene = MemoryScene::new(fixtures::character()).expect("Failed to build scene");
    let document = export_scene(&scene, args).expect("Export failed");
    formats::glb_bytes(&document).expect("Failed to serialize GLB")
}

#[test]
fn test_hierarchy_survives_round_trip() {
    let bytes = export_glb(&ExportArgs::default());
    let (document, _buffers, _) = gltf::import_slice(&bytes).expect("Failed to import GLB");

    let names: Vec<_> = document.nodes().map(|n| n.name().unwrap().to_string()).collect();
    assert_eq!(names, vec!["character", "hips", "spine", "body", "prop"]);

    let scene = document.default_scene().expect("No default scene");
    let roots: Vec<_> = scene.nodes().map(|n| n.index()).collect();
    assert_eq!(roots, vec![0, 4]);

    // Every non-root node is listed exactly once as somebody's child
    let mut child_counts = vec![0usize; 5];
    for node in document.nodes() {
        for child in node.children() {
            child_counts[child.index()] += 1;
        }
    }
    assert_eq!(child_counts, vec![0, 1, 1, 1, 0]);

    let hips = document.nodes().nth(1).unwrap();
    let (translation, _, _) = hips.transform().decomposed();
    assert_eq!(translation, [0.0, 1.0, 0.0]);
}

#[test]
fn test_skin_joints_and_weights() {
    let bytes = export_glb(&ExportArgs::default());
    let (document, buffers, _) = gltf::import_slice(&bytes).expect("Failed to import GLB");

    let skin = document.skins().next().expect("Missing skin");
    let joints: Vec<_> = skin.joints().map(|j| j.index()).collect();
    assert_eq!(joints, vec![1, 2]);
    assert_eq!(skin.skeleton().map(|s| s.index()), Some(1));

    let body = document.nodes().nth(3).unwrap();
    assert_eq!(body.skin().map(|s| s.index()), Some(0));

    let mesh = body.mesh().expect("Body has no mesh");
    let primitive = mesh.primitives().next().unwrap();
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let weights: Vec<[f32; 4]> = reader.read_weights(0).unwrap().into_f32().collect();
    let joint_indices: Vec<[u16; 4]> = reader.read_joints(0).unwrap().into_u16().collect();
    assert_eq!(weights.len(), 4);
    assert!(reader.read_joints(1).is_none());

    for w in &weights {
        let sum: f32 = w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "weights {:?} do not sum to 1", w);
    }

    // Position 2 is weighted 0.3 / 0.7: spine first
    assert_eq!(joint_indices[2], [1, 0, 0, 0]);
    assert!((weights[2][0] - 0.7).abs() < 1e-6);

    let inverse_binds: Vec<[[f32; 4]; 4]> = skin
        .reader(|buffer| Some(&buffers[buffer.index()]))
        .read_inverse_bind_matrices()
        .unwrap()
        .collect();
    // Spine sits at y = 1.5 in bind pose
    assert!((inverse_binds[1][3][1] + 1.5).abs() < 1e-6);
}

#[test]
fn test_top_influence_cap() {
    let args = ExportArgs {
        max_joint_influences: 1,
        ..Default::default()
    };
    let bytes = export_glb(&args);
    let (document, buffers, _) = gltf::import_slice(&bytes).expect("Failed to import GLB");

    let mesh = document.meshes().find(|m| m.name() == Some("bodyShape")).unwrap();
    let primitive = mesh.primitives().next().unwrap();
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    for w in reader.read_weights(0).unwrap().into_f32() {
        assert_eq!(w, [1.0, 0.0, 0.0, 0.0]);
    }
}

#[test]
fn test_clip_is_sampled_at_fixed_rate() {
    let args = ExportArgs {
        frame_rate: Some(1.0),
        clips: vec![clip("walk", 0.0, 10.0)],
        ..Default::default()
    };
    let bytes = export_glb(&args);
    let (document, buffers, _) = gltf::import_slice(&bytes).expect("Failed to import GLB");

    let animation = document.animations().next().expect("Missing animation");
    assert_eq!(animation.name(), Some("walk"));
    // Five animated nodes, three channels each
    assert_eq!(animation.channels().count(), 15);

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader.read_inputs().unwrap().collect();
        assert_eq!(times.len(), 11);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[10], 10.0);
        assert_eq!(
            channel.sampler().interpolation(),
            gltf::animation::Interpolation::Linear
        );
    }

    let hips_translation = animation
        .channels()
        .find(|c| {
            c.target().node().index() == 1
                && c.target().property() == gltf::animation::Property::Translation
        })
        .unwrap();
    let reader = hips_translation.reader(|buffer| Some(&buffers[buffer.index()]));
    let Some(ReadOutputs::Translations(values)) = reader.read_outputs() else {
        panic!("Expected translation outputs");
    };
    let values: Vec<[f32; 3]> = values.collect();
    assert!((values[5][2] - 5.0).abs() < 1e-5);
    assert!((values[10][2] - 10.0).abs() < 1e-5);
}

#[test]
fn test_clip_offset_maps_to_zero_based_times() {
    let scene = MemoryScene::new(fixtures::character()).unwrap();
    let args = ExportArgs {
        frame_rate: Some(2.0),
        clips: vec![clip("late", 4.0, 6.0)],
        ..Default::default()
    };
    let document = export_scene(&scene, &args).unwrap();

    let animation = &document.animations()[0];
    let times = document.accessor(animation.times);
    assert_eq!(
        times,
        &scene_export::document::AccessorData::Scalar(vec![0.0, 0.5, 1.0, 1.5, 2.0])
    );

    // First sample is the pose at host time 4.0
    let hips = animation
        .channels
        .iter()
        .find(|c| c.node == NodeId(1))
        .unwrap();
    let scene_export::document::AccessorData::Vec3(translations) =
        document.accessor(hips.translations)
    else {
        panic!("Expected VEC3 translations");
    };
    assert!((translations[0][2] - 4.0).abs() < 1e-5);
}

#[test]
fn test_export_is_deterministic() {
    let args = ExportArgs {
        clips: vec![clip("walk", 0.0, 2.0), clip("idle", 5.0, 5.5)],
        ..Default::default()
    };
    assert_eq!(export_glb(&args), export_glb(&args));
}

#[test]
fn test_multiple_skins_abort_export() {
    let description = fixtures::character_with_skins(vec![
        fixtures::body_skin("skinCluster1"),
        fixtures::body_skin("skinCluster2"),
    ]);
    let scene = MemoryScene::new(description).unwrap();

    let err = export_scene(&scene, &ExportArgs::default()).unwrap_err();
    match err {
        ExportError::MultipleSkins { mesh, deformers } => {
            assert_eq!(mesh, "bodyShape");
            assert_eq!(deformers.len(), 2);
        }
        other => panic!("unexpected error {other:?}"),
    }

    // Ignoring one deformer makes the scene exportable again
    let args = ExportArgs {
        ignore_mesh_deformers: vec!["skinCluster2".to_string()],
        ..Default::default()
    };
    let document = export_scene(&scene, &args).unwrap();
    assert_eq!(document.skins().len(), 1);
}

#[test]
fn test_backwards_clip_rejected() {
    let scene = MemoryScene::new(fixtures::character()).unwrap();
    let args = ExportArgs {
        clips: vec![clip("backwards", 3.0, 1.0)],
        ..Default::default()
    };
    let err = export_scene(&scene, &args).unwrap_err();
    assert!(matches!(err, ExportError::InvalidClip { ref clip, .. } if clip == "backwards"));
}

#[test]
fn test_clip_sampling_failure_names_clip_node_and_frame() {
    let mut description = fixtures::character();
    // Scale y crosses zero at t = 0.5
    description.nodes.push(
        NodeDescription::new("squash")
            .key(0.0, TransformDescription::default())
            .key(
                1.0,
                TransformDescription {
                    scale: [1.0, -1.0, 1.0],
                    ..Default::default()
                },
            ),
    );
    let scene = MemoryScene::new(description).unwrap();
    let args = ExportArgs {
        frame_rate: Some(4.0),
        clips: vec![clip("idle", 0.0, 0.2), clip("squish", 0.0, 1.0)],
        ..Default::default()
    };

    let err = export_scene(&scene, &args).unwrap_err();
    match err {
        ExportError::ClipSampling {
            clip,
            node,
            frame,
            source,
        } => {
            assert_eq!(clip, "squish");
            assert_eq!(node, "squash");
            assert_eq!(frame, 2);
            assert!(matches!(*source, ExportError::Decomposition { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_mesh_left_without_triangles_aborts_export() {
    let mut description = fixtures::character();
    description.nodes.push(NodeDescription::new("flat").mesh(MeshDescription {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        faces: vec![Face::new(&[0, 1, 2])],
        ..Default::default()
    }));
    let scene = MemoryScene::new(description).unwrap();
    let args = ExportArgs {
        max_degenerate_faces: 1,
        ..Default::default()
    };

    let err = export_scene(&scene, &args).unwrap_err();
    match err {
        ExportError::UnsupportedTopology { mesh, reason } => {
            assert_eq!(mesh, "flatShape");
            assert!(reason.contains("no triangles"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_concave_face_exports_valid_triangles() {
    let mut description = fixtures::character();
    description.nodes.push(NodeDescription::new("notched").mesh(MeshDescription {
        positions: vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [1.0, 0.5, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ],
        faces: vec![Face::new(&[1, 2, 3, 4, 0])],
        ..Default::default()
    }));
    let scene = MemoryScene::new(description).unwrap();
    let document = export_scene(&scene, &ExportArgs::default()).unwrap();
    let bytes = formats::glb_bytes(&document).unwrap();

    let (gltf, buffers, _) = gltf::import_slice(&bytes).expect("Failed to import GLB");
    let mesh = gltf.meshes().find(|m| m.name() == Some("notchedShape")).unwrap();
    let primitive = mesh.primitives().next().unwrap();
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<[f32; 3]> = reader.read_positions().unwrap().collect();
    let indices: Vec<u32> = reader.read_indices().unwrap().into_u32().collect();

    let mut total = 0.0f32;
    for triangle in indices.chunks(3) {
        let [a, b, c] = [0, 1, 2].map(|i| positions[triangle[i] as usize]);
        let area = ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])) * 0.5;
        assert!(area > 0.0, "triangle {triangle:?} is flipped");
        total += area;
    }
    assert!((total - 3.0).abs() < 1e-5);
}

#[test]
fn test_scale_factor_applies_to_positions_and_translations() {
    let scene = MemoryScene::new(fixtures::character()).unwrap();
    let args = ExportArgs {
        scale_factor: 0.5,
        ..Default::default()
    };
    let document = export_scene(&scene, &args).unwrap();

    assert_eq!(document.node(NodeId(4)).translation, [1.5, 0.0, 0.0]);
    let prop_mesh = &document.meshes()[1];
    let scene_export::document::AccessorData::Vec3(positions) =
        document.accessor(prop_mesh.positions)
    else {
        panic!("Expected VEC3 positions");
    };
    assert_eq!(positions[1], [0.5, 0.0, 0.0]);
}

#[test]
fn test_gltf_output_writes_sibling_bin() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("character.gltf");

    let scene = MemoryScene::new(fixtures::character()).unwrap();
    let document = export_scene(&scene, &ExportArgs::default()).unwrap();
    formats::write_document(&path, &document).expect("Failed to write glTF");

    assert!(dir.path().join("character.bin").exists());
    let (gltf, _buffers, _) = gltf::import(&path).expect("Failed to import glTF");
    assert_eq!(gltf.nodes().count(), 5);
    assert_eq!(gltf.meshes().count(), 2);
}
