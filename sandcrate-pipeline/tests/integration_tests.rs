//! End-to-end tests of the sensor to geometry cycle

use approx::assert_relative_eq;
use sandcrate_algorithms::{Roi, Visualisation};
use sandcrate_core::{Drawable, Rgba};
use sandcrate_pipeline::{
    FrameSource, Geometry, LatestFrameSlot, OutputKind, SandboxParameters, SandboxPipeline, SensorLease, SharedSensor, Stage,
    FACE_REMESHING, NO_SENSOR_DATA,
};

fn running_sensor(width: usize, height: usize) -> (SharedSensor<LatestFrameSlot>, SensorLease<LatestFrameSlot>) {
    let sensor = SharedSensor::new(LatestFrameSlot::new(width, height));
    let session = sensor.acquire().unwrap();
    (sensor, session)
}

fn publish(sensor: &SharedSensor<LatestFrameSlot>, value: u16) {
    let source = sensor.source();
    source.publish(vec![value; source.width() * source.height()]).unwrap();
}

#[test]
fn test_flat_sand_sits_on_reference_plane() {
    let (sensor, _session) = running_sensor(4, 4);
    publish(&sensor, 1000);

    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
    let params = SandboxParameters::default();
    let solution = pipeline.solve(&params);

    let Geometry::Mesh(mesh) = solution.geometry else {
        panic!("expected mesh output");
    };
    assert_eq!(mesh.vertex_count(), 16);
    assert_eq!(mesh.face_count(), 4);
    for vertex in &mesh.vertices {
        assert_relative_eq!(vertex.z, 0.0);
    }

    let boundary = params.visualisation.compute_lookup_table(&params.analysis()).boundary_color();
    let colors = mesh.colors.as_ref().unwrap();
    assert_eq!(colors.len(), 16);
    assert!(colors.iter().all(|&c| c == boundary));
}

#[test]
fn test_averaging_window_smooths_recent_frames() {
    let (sensor, _session) = running_sensor(3, 3);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
    let params = SandboxParameters {
        average_frame_count: 3,
        output: OutputKind::PointCloud,
        ..Default::default()
    };

    for value in [1000, 1000, 1006] {
        publish(&sensor, value);
        pipeline.solve(&params);
    }
    assert_eq!(pipeline.averager().average(4), Some(1002));

    let solution = pipeline.solve(&params);
    let Geometry::PointCloud(cloud) = solution.geometry else {
        panic!("expected point cloud output");
    };
    // 1006 pushed twice now, so the window is [1000, 1006, 1006]
    assert_relative_eq!(cloud[4].position.z, -4.0);
}

#[test]
fn test_missing_frame_reports_and_returns_nothing() {
    let (sensor, session) = running_sensor(4, 4);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
    let solution = pipeline.solve(&SandboxParameters::default());

    assert!(solution.geometry.is_empty());
    assert!(solution.diagnostics.has_note(NO_SENSOR_DATA));
    assert!(solution.diagnostics.to_string().contains(NO_SENSOR_DATA));
    drop(session);
}

#[test]
fn test_oversized_trims_give_empty_geometry() {
    let (sensor, _session) = running_sensor(5, 4);
    publish(&sensor, 1000);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();

    let params = SandboxParameters {
        roi: Roi::new(0, 0, 3, 3),
        ..Default::default()
    };
    let solution = pipeline.solve(&params);
    let Geometry::Mesh(mesh) = solution.geometry else {
        panic!("expected mesh output");
    };
    assert!(mesh.is_empty());
    assert_eq!(mesh.face_count(), 0);
}

#[test]
fn test_topology_survives_frames_and_rebuilds_on_trim() {
    let (sensor, _session) = running_sensor(10, 8);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
    let mut params = SandboxParameters::default();

    publish(&sensor, 1000);
    let first = pipeline.solve(&params);
    assert!(first.diagnostics.has_note(FACE_REMESHING));

    publish(&sensor, 1100);
    let second = pipeline.solve(&params);
    assert!(!second.diagnostics.has_note(FACE_REMESHING));
    let Geometry::Mesh(mesh) = second.geometry else {
        panic!("expected mesh output");
    };
    assert_relative_eq!(mesh.vertices[0].z, -100.0);
    assert_eq!(mesh.face_count(), 8 * 6);
    assert_eq!(pipeline.builder().rebuilds(), 1);

    params.roi = Roi::new(1, 2, 0, 3);
    let third = pipeline.solve(&params);
    let Geometry::Mesh(mesh) = third.geometry else {
        panic!("expected mesh output");
    };
    assert_eq!((mesh.width, mesh.height), (7, 5));
    assert_eq!(mesh.face_count(), 5 * 3);
    // the first kept column is source column 3
    let pitch = mesh.vertices[0].x - mesh.vertices[1].x;
    assert_relative_eq!(mesh.vertices[0].x, -3.0 * pitch, epsilon = 1e-3);
    assert_eq!(pipeline.builder().rebuilds(), 2);
}

#[test]
fn test_color_table_cached_until_reference_moves() {
    let (sensor, _session) = running_sensor(4, 4);
    publish(&sensor, 1000);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
    let mut params = SandboxParameters::default();

    for _ in 0..3 {
        pipeline.solve(&params);
    }
    assert_eq!(pipeline.tables().rebuilds(), 1);

    params.reference_elevation = 1020.0;
    pipeline.solve(&params);
    assert_eq!(pipeline.tables().rebuilds(), 2);

    params.visualisation = Visualisation::Aspect;
    pipeline.solve(&params);
    assert_eq!(pipeline.tables().rebuilds(), 3);
}

#[test]
fn test_uncolored_output_drops_colors() {
    let (sensor, _session) = running_sensor(4, 4);
    publish(&sensor, 1000);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();

    let mesh_params = SandboxParameters {
        colored: false,
        ..Default::default()
    };
    let solution = pipeline.solve(&mesh_params);
    assert!(solution.diagnostics.timing(Stage::Coloring).is_none());
    let Geometry::Mesh(mesh) = solution.geometry else {
        panic!("expected mesh output");
    };
    assert!(mesh.colors.is_none());

    let cloud_params = SandboxParameters {
        colored: false,
        output: OutputKind::PointCloud,
        ..Default::default()
    };
    let solution = pipeline.solve(&cloud_params);
    let Geometry::PointCloud(cloud) = solution.geometry else {
        panic!("expected point cloud output");
    };
    assert!(cloud.iter().all(|p| p.color == Rgba::WHITE));
}

#[test]
fn test_pipelines_share_one_sensor_session() {
    let sensor = SharedSensor::new(LatestFrameSlot::new(6, 6));
    let mut mesh_pipeline = SandboxPipeline::new(&sensor).unwrap();
    let mut cloud_pipeline = SandboxPipeline::new(&sensor).unwrap();
    assert_eq!(sensor.ref_count(), 2);
    assert!(sensor.source().is_running());

    publish(&sensor, 990);
    let mesh_params = SandboxParameters::default();
    let cloud_params = SandboxParameters {
        output: OutputKind::PointCloud,
        blur_radius: 2,
        ..Default::default()
    };

    let mesh_solution = mesh_pipeline.solve(&mesh_params);
    let Geometry::Mesh(mesh) = mesh_solution.geometry else {
        panic!("expected mesh output");
    };
    let mesh_box = mesh.bounding_box();

    let cloud_solution = cloud_pipeline.solve(&cloud_params);
    let Geometry::PointCloud(cloud) = cloud_solution.geometry else {
        panic!("expected point cloud output");
    };
    assert_eq!(cloud.len(), 36);
    let cloud_box = cloud.bounding_box();
    assert_relative_eq!(mesh_box.0.z, cloud_box.0.z, epsilon = 1e-4);

    drop(mesh_pipeline);
    assert_eq!(sensor.ref_count(), 1);
    assert!(sensor.source().is_running());

    drop(cloud_pipeline);
    assert_eq!(sensor.ref_count(), 0);
    assert!(!sensor.source().is_running());
}

#[test]
fn test_parameters_from_json_drive_a_cycle() {
    let json = r#"{
        "reference_elevation": 1200,
        "average_frame_count": 0,
        "blur_radius": -3,
        "tick_rate_ms": 0,
        "unit": "centimeters",
        "output": "point_cloud",
        "visualisation": { "kind": "slope", "threshold_degrees": 30.0 }
    }"#;
    let params = SandboxParameters::from_json(json).unwrap();
    assert_eq!(params.frame_count(), 1);
    assert_eq!(params.blur(), 1);

    let (sensor, _session) = running_sensor(4, 3);
    publish(&sensor, 1100);
    let mut pipeline = SandboxPipeline::new(&sensor).unwrap();
    let solution = pipeline.solve(&params);

    assert_eq!(solution.next_tick, None);
    let Geometry::PointCloud(cloud) = solution.geometry else {
        panic!("expected point cloud output");
    };
    // 100 mm above the reference plane, in centimetres
    assert_relative_eq!(cloud[0].position.z, 10.0, epsilon = 1e-4);
}
