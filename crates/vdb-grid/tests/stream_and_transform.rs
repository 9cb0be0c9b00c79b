//! Property tests for transforms and the grid stream codec.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use nalgebra::{Isometry3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};
use proptest::prelude::*;
use vdb_grid::{
    AnyGrid, FloatGrid, GridRef, Int32Grid, MetaMap, MetaValue, Transform, VoxelCoord, read_stream,
    write_stream,
};

fn posed_transform(voxel_size: f64, angles: (f64, f64, f64), offset: Vector3<f64>) -> Transform {
    let iso = Isometry3::from_parts(
        Translation3::from(offset),
        UnitQuaternion::from_euler_angles(angles.0, angles.1, angles.2),
    );
    let scale = Matrix4::new_nonuniform_scaling(&Vector3::repeat(voxel_size));
    Transform::from_matrix(iso.to_homogeneous() * scale).unwrap()
}

fn voxel() -> impl Strategy<Value = (i32, i32, i32, f32)> {
    (-200i32..200, -200i32..200, -200i32..200, -5.0f32..5.0)
}

proptest! {
    #[test]
    fn world_index_round_trip(
        voxel_size in 0.01f64..2.0,
        roll in -3.0f64..3.0,
        pitch in -1.5f64..1.5,
        yaw in -3.0f64..3.0,
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        z in -100.0f64..100.0,
    ) {
        let xform = posed_transform(voxel_size, (roll, pitch, yaw), Vector3::new(1.0, -2.0, 3.0));
        let p = Point3::new(x, y, z);
        let back = xform.index_to_world(&xform.world_to_index(&p));
        assert_relative_eq!(back, p, epsilon = 1e-8);
        assert_relative_eq!(xform.voxel_size(), Vector3::repeat(voxel_size), epsilon = 1e-9);
    }

    #[test]
    fn stream_preserves_grids(
        voxels in prop::collection::vec(voxel(), 0..64),
        inactive in prop::collection::vec(voxel(), 0..16),
        id in 0u16..u16::MAX,
    ) {
        let mut grid = FloatGrid::with_transform(0.3, posed_transform(0.1, (0.1, 0.2, 0.3), Vector3::zeros()));
        grid.set_name("tsdf");
        grid.insert_meta("ID", MetaValue::Float(f32::from(id)));
        for &(x, y, z, v) in &inactive {
            grid.set_inactive_value(VoxelCoord::new(x, y, z), v);
        }
        for &(x, y, z, v) in &voxels {
            grid.set_value(VoxelCoord::new(x, y, z), v);
        }
        let mut index = Int32Grid::new(-1);
        for &(x, y, z, _) in &voxels {
            index.set_value(VoxelCoord::new(x, y, z), x + y);
        }

        let mut metadata = MetaMap::new();
        metadata.insert("m_fastSweep".into(), MetaValue::Bool(true));
        let mut bytes = Vec::new();
        write_stream(&mut bytes, &metadata, &[GridRef::from(&grid), GridRef::from(&index)]).unwrap();

        let stream = read_stream(bytes.as_slice()).unwrap();
        prop_assert_eq!(stream.metadata, metadata);
        prop_assert_eq!(stream.grids.len(), 2);
        prop_assert_eq!(&stream.grids[0], &AnyGrid::Float(grid));
        prop_assert_eq!(&stream.grids[1], &AnyGrid::Int32(index));
    }
}
