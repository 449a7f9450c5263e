//! Rays through shared mesh vertices and edges never slip between triangles.

use prism_renderer::{HitRecord, Hittable, Quad, Ray, Triangle, Vec2, Vec3, Vertex};

/// A `n` x `n` grid of unit cells in the z = 0 plane, two triangles each.
fn grid(n: u32) -> Vec<Triangle> {
    let vertex = |x: u32, y: u32| {
        Vertex::new(
            Vec3::new(x as f32, y as f32, 0.0),
            Vec2::new(x as f32 / n as f32, y as f32 / n as f32),
        )
    };
    let mut triangles = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let (a, b, c, d) = (vertex(x, y), vertex(x + 1, y), vertex(x + 1, y + 1), vertex(x, y + 1));
            triangles.push(Triangle::new(a, b, c));
            triangles.push(Triangle::new(a, c, d));
        }
    }
    triangles
}

fn hits_individually(triangles: &[Triangle], ray: &Ray) -> usize {
    triangles
        .iter()
        .filter(|tri| tri.hit(ray, &mut HitRecord::new()))
        .count()
}

fn hits_shared(triangles: &[Triangle], ray: &Ray) -> usize {
    let mut rec = HitRecord::new();
    triangles.iter().filter(|tri| tri.hit(ray, &mut rec)).count()
}

#[test]
fn shared_vertices_register_exactly_one_hit() {
    let mesh = grid(4);
    for y in 0..=4 {
        for x in 0..=4 {
            let target = Vec3::new(x as f32, y as f32, 0.0);
            for origin_z in [5.0, -5.0] {
                let origin = target + Vec3::new(0.0, 0.0, origin_z);
                let ray = Ray::new(origin, target - origin);

                assert!(hits_individually(&mesh, &ray) >= 1, "vertex ({x}, {y})");
                assert_eq!(hits_shared(&mesh, &ray), 1, "vertex ({x}, {y})");
            }
        }
    }
}

#[test]
fn oblique_rays_through_edges_never_miss() {
    let mesh = grid(4);
    let origins = [
        Vec3::new(-3.0, 1.5, 7.0),
        Vec3::new(9.0, -2.0, 3.0),
        Vec3::new(0.25, 6.0, -4.0),
    ];

    for y in 0..4 {
        for x in 0..4 {
            let (fx, fy) = (x as f32, y as f32);
            let targets = [
                Vec3::new(fx + 0.5, fy, 0.0),       // horizontal edge
                Vec3::new(fx, fy + 0.5, 0.0),       // vertical edge
                Vec3::new(fx + 0.5, fy + 0.5, 0.0), // diagonal
                Vec3::new(fx, fy, 0.0),             // vertex
            ];
            for target in targets {
                for origin in origins {
                    let ray = Ray::new(origin, target - origin);
                    assert!(hits_individually(&mesh, &ray) >= 1, "{target} from {origin}");

                    let mut rec = HitRecord::new();
                    let hit = mesh.iter().fold(false, |acc, tri| tri.hit(&ray, &mut rec) || acc);
                    assert!(hit);
                    assert!((ray.at(rec.dist).z).abs() < 1e-4);
                }
            }
        }
    }
}

#[test]
fn quad_diagonal_is_closed() {
    let v = |x: f32, y: f32| Vertex::new(Vec3::new(x, y, 0.0), Vec2::new(x, y));
    let quad = Quad::new(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0));

    for k in 0..=16 {
        let t = k as f32 / 16.0;
        let target = Vec3::new(t, t, 0.0);
        let origin = Vec3::new(0.3, -0.7, 2.0);
        let mut rec = HitRecord::new();

        assert!(quad.hit(&Ray::new(origin, target - origin), &mut rec), "t = {t}");
        assert!((rec.st - Vec2::new(t, t)).length() < 1e-3);
    }
}
