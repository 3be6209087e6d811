//! End-to-end slicing of small hand-built meshes.

use approx::assert_relative_eq;
use lamina_mesh::{normalize, to_binary_stl, GeometryBuffer};
use lamina_slicer::{
    load_mesh, point_in_polygon, slice_mesh, slice_with_settings, Axis, ContourKind, Mesh,
    MeshError, SliceSettings, SlicerError,
};

type P = [f32; 3];

/// Triangle soup builder.
#[derive(Default)]
struct Soup {
    positions: Vec<f32>,
}

impl Soup {
    fn tri(&mut self, a: P, b: P, c: P) {
        for p in [a, b, c] {
            self.positions.extend_from_slice(&p);
        }
    }

    fn quad(&mut self, a: P, b: P, c: P, d: P) {
        self.tri(a, b, c);
        self.tri(a, c, d);
    }

    /// Four vertical walls around the rectangle `(x0, y0)..(x1, y1)`.
    fn walls(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, z0: f32, z1: f32) {
        let ring = [[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
        for i in 0..4 {
            let [ax, ay] = ring[i];
            let [bx, by] = ring[(i + 1) % 4];
            self.quad([ax, ay, z0], [bx, by, z0], [bx, by, z1], [ax, ay, z1]);
        }
    }

    fn mesh(self) -> Mesh {
        normalize(GeometryBuffer::from_positions(self.positions)).unwrap()
    }
}

/// 8 shared vertices, 12 triangles.
fn unit_cube() -> Mesh {
    let positions = vec![
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4, // front
        1, 2, 6, 1, 6, 5, // right
        2, 3, 7, 2, 7, 6, // back
        3, 0, 4, 3, 4, 7, // left
    ];
    let mesh = normalize(GeometryBuffer {
        indices: Some(indices),
        ..GeometryBuffer::from_positions(positions)
    })
    .unwrap();
    assert_eq!(mesh.num_vertices(), 8);
    assert_eq!(mesh.num_triangles(), 12);
    mesh
}

/// 4x4 square plate with a centered 2x2 square hole, 2 units tall.
fn washer() -> Mesh {
    let mut soup = Soup::default();
    soup.walls(0.0, 0.0, 4.0, 4.0, 0.0, 2.0);
    soup.walls(1.0, 1.0, 3.0, 3.0, 0.0, 2.0);
    for z in [0.0, 2.0] {
        let outer = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        let inner = [[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]];
        for i in 0..4 {
            let j = (i + 1) % 4;
            soup.quad(
                [outer[i][0], outer[i][1], z],
                [outer[j][0], outer[j][1], z],
                [inner[j][0], inner[j][1], z],
                [inner[i][0], inner[i][1], z],
            );
        }
    }
    soup.mesh()
}

#[test]
fn test_unit_cube_two_layers() {
    let result = slice_mesh(&unit_cube(), Axis::Z, 1.0);
    assert_eq!(result.layers.len(), 2);
    assert_eq!(result.layers[0].coordinate, 0.0);
    assert_eq!(result.layers[1].coordinate, 1.0);

    for layer in &result.layers {
        assert_eq!(layer.paths.len(), 1);
        let path = &layer.paths[0];
        assert!(path.closed);
        assert_eq!(path.kind, ContourKind::Outer);
        assert_eq!(path.vertex_count(), 4);
        assert_relative_eq!(path.signed_area().abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(path.length(), 4.0, epsilon = 1e-9);
    }
}

#[test]
fn test_washer_has_outer_and_hole() {
    let result = slice_mesh(&washer(), Axis::Z, 0.9);
    assert_eq!(result.layers.len(), 3);

    let middle = &result.layers[1];
    assert_relative_eq!(middle.coordinate, 1.0);
    assert_eq!(middle.paths.len(), 2);
    assert!(middle.paths.iter().all(|p| p.closed));

    let outers: Vec<_> = middle.outers().collect();
    let holes: Vec<_> = middle.holes().collect();
    assert_eq!(outers.len(), 1);
    assert_eq!(holes.len(), 1);
    assert_relative_eq!(outers[0].signed_area().abs(), 16.0, epsilon = 1e-9);
    assert_relative_eq!(holes[0].signed_area().abs(), 4.0, epsilon = 1e-9);

    let stats = result.stats();
    assert_eq!(stats.layer_count, 3);
    assert!(stats.hole_count >= 1);
    assert_eq!(stats.open_count, 0);
}

#[test]
fn test_holes_lie_inside_an_outer() {
    let result = slice_mesh(&washer(), Axis::Z, 0.25);
    for layer in &result.layers {
        for hole in layer.holes() {
            assert!(layer.outers().any(|outer| hole
                .vertices()
                .iter()
                .all(|p| point_in_polygon(p, outer.vertices()))));
        }
    }
}

#[test]
fn test_non_positive_thickness_gives_two_layers() {
    let cube = unit_cube();
    for thickness in [0.0, -2.0, f64::NAN] {
        let result = slice_mesh(&cube, Axis::Z, thickness);
        assert_eq!(result.layers.len(), 2);
        assert_eq!(result.layers[0].coordinate, 0.0);
        assert_eq!(result.layers[1].coordinate, 1.0);
    }
}

#[test]
fn test_point_mesh_gives_two_identical_layers() {
    let mut soup = Soup::default();
    soup.tri([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
    let result = slice_mesh(&soup.mesh(), Axis::X, 0.5);
    assert_eq!(result.layers.len(), 2);
    assert_eq!(result.layers[0].coordinate, result.layers[1].coordinate);
    assert!(result.layers.iter().all(|l| l.is_empty()));
}

#[test]
fn test_extremes_are_exact_on_every_axis() {
    let mesh = washer();
    for axis in Axis::ALL {
        let result = slice_mesh(&mesh, axis, 0.3);
        let (min, max) = mesh.bounds().range(axis);
        assert_eq!(result.layers.first().unwrap().coordinate, min);
        assert_eq!(result.layers.last().unwrap().coordinate, max);
        assert!(result
            .layers
            .windows(2)
            .all(|w| w[0].coordinate <= w[1].coordinate));
    }
}

#[test]
fn test_closed_paths_repeat_first_point() {
    let mesh = washer();
    for axis in Axis::ALL {
        for layer in slice_mesh(&mesh, axis, 0.4).layers {
            for path in layer.paths.iter().filter(|p| p.closed) {
                assert_eq!(path.start(), path.end());
            }
        }
    }
}

#[test]
fn test_slicing_is_deterministic() {
    let mesh = washer();
    let a = slice_mesh(&mesh, Axis::Y, 0.35);
    let b = slice_mesh(&mesh, Axis::Y, 0.35);
    assert_eq!(a, b);
    assert_eq!(a.models(), b.models());
}

#[test]
fn test_side_axis_uses_fixed_plane() {
    let result = slice_mesh(&unit_cube(), Axis::X, 0.5);
    let model = &result.models()[1];
    assert_eq!(model.plane.u_axis, Axis::Y);
    assert_eq!(model.plane.v_axis, Axis::Z);
    assert_relative_eq!(model.extents.width(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(model.extents.height(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_stl_inputs_slice_identically() {
    let mesh = washer();
    let expected = slice_mesh(&mesh, Axis::Z, 0.5);

    let binary = to_binary_stl(mesh.geometry()).unwrap();
    let from_binary = load_mesh(&binary).unwrap();
    assert_eq!(slice_mesh(&from_binary, Axis::Z, 0.5), expected);

    let mut ascii = String::from("solid washer\n");
    for tri in mesh.triangles() {
        ascii.push_str("facet normal 0 0 0\nouter loop\n");
        for p in tri {
            ascii.push_str(&format!("vertex {} {} {}\n", p.x, p.y, p.z));
        }
        ascii.push_str("endloop\nendfacet\n");
    }
    ascii.push_str("endsolid washer\n");
    let from_ascii = load_mesh(ascii.as_bytes()).unwrap();
    assert_eq!(slice_mesh(&from_ascii, Axis::Z, 0.5), expected);
}

#[test]
fn test_missing_positions_rejected() {
    let err = normalize(GeometryBuffer::default()).unwrap_err();
    assert!(matches!(err, MeshError::InvalidMesh(_)));
}

#[test]
fn test_settings_errors_surface() {
    let settings = SliceSettings {
        tolerances: lamina_slicer::Tolerances {
            node_tolerance: -1.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let err = slice_with_settings(&unit_cube(), &settings).unwrap_err();
    assert!(matches!(err, SlicerError::InvalidSettings(_)));
}
