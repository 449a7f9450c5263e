//! Built-in scenes.
//!
//! - `cornell`: the measured Cornell box (millimetres) with spectral
//!   reflectances and emission read from `data/scenes/cornell/`.
//! - `cornell-srgb`: the same box with the back and left walls textured and
//!   a D65 light.
//! - `plane-srgb`: a textured plane seen head-on under a large D65 emitter.
//! - `white-point`: a D65 emitter filling the view, which should come out
//!   white.

use std::path::Path;
use std::sync::Arc;

use prism_core::color::d65_rad;
use prism_core::{load_spectral_data, load_texture_file, Filter, Spectrum};
use prism_math::{Vec2, Vec3};

use crate::camera::Camera;
use crate::material::{LambertianSpectral, LambertianTextured};
use crate::options::RenderOptions;
use crate::quad::Quad;
use crate::scene::{Scene, SceneBuilder, SceneError, SceneResult};
use crate::triangle::Vertex;

/// Names accepted by `load_scene`.
pub const SCENE_NAMES: [&str; 4] = ["cornell", "cornell-srgb", "plane-srgb", "white-point"];

/// Measured data rows span this range.
const CORNELL_LAMBDA_MIN: f32 = 400.0;
const CORNELL_LAMBDA_MAX: f32 = 700.0;

const CORNELL_LIGHT_REFLECTANCE: f32 = 0.78;

/// Relative to `data_dir`.
const CORNELL_REFLECTANCE_FILE: &str = "scenes/cornell/white-green-red.csv";
const CORNELL_LIGHT_FILE: &str = "scenes/cornell/light.csv";
const TEST_TEXTURE_FILE: &str = "scenes/test-img.png";

/// Build the built-in scene `name` at the resolution in `options`, reading
/// its data from `options.data_dir`.
pub fn load_scene(name: &str, options: &RenderOptions) -> SceneResult<Scene> {
    let scene = match name {
        "cornell" => cornell(options)?.build()?,
        "cornell-srgb" => cornell_srgb(options)?.build()?,
        "plane-srgb" => plane_srgb(options)?.build()?,
        "white-point" => white_point(options)?.build()?,
        _ => {
            return Err(SceneError::UnknownScene {
                name: name.to_string(),
                supported: SCENE_NAMES.join(", "),
            })
        }
    };
    log::info!("Loaded scene {name:?}");
    Ok(scene)
}

fn v(x: f32, y: f32, z: f32, s: f32, t: f32) -> Vertex {
    Vertex::new(Vec3::new(x, y, z), Vec2::new(s, t))
}

/// Quad with all texture coordinates at the origin.
fn untextured_quad(corners: [[f32; 3]; 4]) -> Quad {
    let [a, b, c, d] = corners.map(|[x, y, z]| Vertex::new(Vec3::new(x, y, z), Vec2::ZERO));
    Quad::new(a, b, c, d)
}

fn cornell_camera(options: &RenderOptions) -> Camera {
    Camera::new()
        .with_resolution(options.width, options.height)
        .with_position(Vec3::new(278.0, 273.0, -800.0), Vec3::Z, Vec3::Y)
        .with_lens(39.0, 0.1, 1.0)
}

fn cornell(options: &RenderOptions) -> SceneResult<SceneBuilder> {
    let data_dir = options.data_dir.as_path();
    let mut builder = SceneBuilder::new(cornell_camera(options));
    add_cornell_materials(&mut builder, data_dir)?;
    add_cornell_geometry(&mut builder)?;
    Ok(builder)
}

fn add_cornell_materials(builder: &mut SceneBuilder, data_dir: &Path) -> SceneResult<()> {
    let reflectances = load_spectral_data(data_dir.join(CORNELL_REFLECTANCE_FILE), 3)?
        .to_spectra(CORNELL_LAMBDA_MIN, CORNELL_LAMBDA_MAX)?;
    let emission = load_spectral_data(data_dir.join(CORNELL_LIGHT_FILE), 1)?
        .to_spectra(CORNELL_LAMBDA_MIN, CORNELL_LAMBDA_MAX)?;

    // Rows: white, green, red.
    let [white, green, red] = [0, 1, 2].map(|row| reflectances[row].clone());
    for name in ["white-back", "white-blocks", "white-floorceil"] {
        builder.add_material(name, LambertianSpectral::new(white.clone()))?;
    }
    builder.add_material("green", LambertianSpectral::new(green))?;
    builder.add_material("red", LambertianSpectral::new(red))?;
    builder.add_material(
        "light",
        LambertianSpectral::emitter(
            emission[0].clone(),
            Spectrum::constant(CORNELL_LIGHT_REFLECTANCE),
        ),
    )?;
    Ok(())
}

fn add_cornell_geometry(builder: &mut SceneBuilder) -> SceneResult<()> {
    // Floor
    builder.add(
        Quad::new(
            v(552.8, 0.0, 0.0, 1.0, 0.0),
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(0.0, 0.0, 559.2, 0.0, 1.0),
            v(549.6, 0.0, 559.2, 1.0, 1.0),
        ),
        "white-floorceil",
    )?;

    // Light
    builder.add(
        Quad::new(
            v(343.0, 548.7, 227.0, 1.0, 0.0),
            v(343.0, 548.7, 332.0, 1.0, 1.0),
            v(213.0, 548.7, 332.0, 0.0, 1.0),
            v(213.0, 548.7, 227.0, 0.0, 0.0),
        ),
        "light",
    )?;

    // Ceiling
    builder.add(
        Quad::new(
            v(556.0, 548.8, 0.0, 1.0, 0.0),
            v(556.0, 548.8, 559.2, 1.0, 1.0),
            v(0.0, 548.8, 559.2, 0.0, 1.0),
            v(0.0, 548.8, 0.0, 0.0, 0.0),
        ),
        "white-floorceil",
    )?;

    // Back wall
    builder.add(
        Quad::new(
            v(549.6, 0.0, 559.2, 1.0, 0.0),
            v(0.0, 0.0, 559.2, 0.0, 0.0),
            v(0.0, 548.8, 559.2, 0.0, 1.0),
            v(556.0, 548.8, 559.2, 1.0, 1.0),
        ),
        "white-back",
    )?;

    // Right wall
    builder.add(
        Quad::new(
            v(0.0, 0.0, 559.2, 1.0, 0.0),
            v(0.0, 0.0, 0.0, 0.0, 0.0),
            v(0.0, 548.8, 0.0, 0.0, 1.0),
            v(0.0, 548.8, 559.2, 1.0, 1.0),
        ),
        "green",
    )?;

    // Left wall
    builder.add(
        Quad::new(
            v(552.8, 0.0, 0.0, 0.0, 0.0),
            v(549.6, 0.0, 559.2, 0.0, 1.0),
            v(556.0, 548.8, 559.2, 1.0, 1.0),
            v(556.0, 548.8, 0.0, 1.0, 0.0),
        ),
        "red",
    )?;

    let short_block = [
        [[130.0, 165.0, 65.0], [82.0, 165.0, 225.0], [240.0, 165.0, 272.0], [290.0, 165.0, 114.0]],
        [[290.0, 0.0, 114.0], [290.0, 165.0, 114.0], [240.0, 165.0, 272.0], [240.0, 0.0, 272.0]],
        [[130.0, 0.0, 65.0], [130.0, 165.0, 65.0], [290.0, 165.0, 114.0], [290.0, 0.0, 114.0]],
        [[82.0, 0.0, 225.0], [82.0, 165.0, 225.0], [130.0, 165.0, 65.0], [130.0, 0.0, 65.0]],
        [[240.0, 0.0, 272.0], [240.0, 165.0, 272.0], [82.0, 165.0, 225.0], [82.0, 0.0, 225.0]],
    ];
    let tall_block = [
        [[423.0, 330.0, 247.0], [265.0, 330.0, 296.0], [314.0, 330.0, 456.0], [472.0, 330.0, 406.0]],
        [[423.0, 0.0, 247.0], [423.0, 330.0, 247.0], [472.0, 330.0, 406.0], [472.0, 0.0, 406.0]],
        [[472.0, 0.0, 406.0], [472.0, 330.0, 406.0], [314.0, 330.0, 456.0], [314.0, 0.0, 456.0]],
        [[314.0, 0.0, 456.0], [314.0, 330.0, 456.0], [265.0, 330.0, 296.0], [265.0, 0.0, 296.0]],
        [[265.0, 0.0, 296.0], [265.0, 330.0, 296.0], [423.0, 330.0, 247.0], [423.0, 0.0, 247.0]],
    ];
    for face in short_block.into_iter().chain(tall_block) {
        builder.add(untextured_quad(face), "white-blocks")?;
    }

    Ok(())
}

fn cornell_srgb(options: &RenderOptions) -> SceneResult<SceneBuilder> {
    let mut builder = cornell(options)?;

    let texture = load_texture_file(&options.data_dir.join(TEST_TEXTURE_FILE))?;
    builder.add_material("srgb", LambertianTextured::new(Arc::new(texture)))?;
    builder.add_material("white1", LambertianSpectral::new(Spectrum::constant(1.0)))?;

    builder.reassign_material("white-back", "srgb")?;
    builder.reassign_material("red", "srgb")?;
    for name in ["white-blocks", "white-floorceil", "green"] {
        builder.reassign_material(name, "white1")?;
    }

    builder.replace_material(
        "light",
        LambertianSpectral::emitter(
            d65_rad() * 20.0,
            Spectrum::constant(CORNELL_LIGHT_REFLECTANCE),
        ),
    )?;
    Ok(builder)
}

/// Camera on +Z looking at the origin, framing the -1..1 square at z = 0.
fn head_on_camera(options: &RenderOptions) -> Camera {
    let distance = 5.0_f32;
    let vfov = (2.0 * 1.0_f32.atan2(distance)).to_degrees();
    Camera::new()
        .with_resolution(options.width, options.height)
        .with_position(Vec3::new(0.0, 0.0, distance), -Vec3::Z, Vec3::Y)
        .with_lens(vfov, 0.1, 1.0)
}

fn plane_srgb(options: &RenderOptions) -> SceneResult<SceneBuilder> {
    let mut builder = SceneBuilder::new(head_on_camera(options));

    let texture = load_texture_file(&options.data_dir.join(TEST_TEXTURE_FILE))?;
    builder.add_material("srgb", LambertianTextured::new(Arc::new(texture)))?;
    builder.add_material(
        "light",
        LambertianSpectral::emitter(
            (d65_rad() * 4.0).with_filter(Filter::Nearest),
            Spectrum::constant(0.0),
        ),
    )?;

    builder.add(
        Quad::new(
            v(-1.0, -1.0, 0.0, 0.0, 0.0),
            v(1.0, -1.0, 0.0, 1.0, 0.0),
            v(1.0, 1.0, 0.0, 1.0, 1.0),
            v(-1.0, 1.0, 0.0, 0.0, 1.0),
        ),
        "srgb",
    )?;

    // Behind the camera, far enough that the plane lies outside its
    // bounding sphere.
    builder.add(
        untextured_quad([
            [-10.0, -10.0, 20.0],
            [10.0, -10.0, 20.0],
            [10.0, 10.0, 20.0],
            [-10.0, 10.0, 20.0],
        ]),
        "light",
    )?;

    Ok(builder)
}

fn white_point(options: &RenderOptions) -> SceneResult<SceneBuilder> {
    let mut builder = SceneBuilder::new(head_on_camera(options));
    builder.add_material(
        "light",
        LambertianSpectral::emitter(
            d65_rad().clone().with_filter(Filter::Nearest),
            Spectrum::constant(0.0),
        ),
    )?;

    // Far side of the origin, wide enough to cover the whole view.
    builder.add(
        untextured_quad([
            [-10.0, -10.0, -10.0],
            [10.0, -10.0, -10.0],
            [10.0, 10.0, -10.0],
            [-10.0, 10.0, -10.0],
        ]),
        "light",
    )?;

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::PathIntegrator;
    use crate::random::RandomStream;
    use std::path::PathBuf;

    fn data_options() -> RenderOptions {
        RenderOptions {
            width: 16,
            height: 16,
            data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data"),
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_cornell() {
        let scene = load_scene("cornell", &data_options()).unwrap();

        // Six walls, light included, plus two five-sided blocks.
        assert_eq!(scene.primitives().len(), 16);
        assert_eq!(scene.lights().len(), 1);
        assert_eq!(scene.lights()[0].index(), 1);
        assert_eq!(scene.camera().image_width, 16);
        assert_eq!(scene.camera().vfov(), 39.0);
    }

    #[test]
    fn test_cornell_srgb_reassigns_walls() {
        let scene = load_scene("cornell-srgb", &data_options()).unwrap();
        let srgb = scene.material_id("srgb").unwrap();
        let white1 = scene.material_id("white1").unwrap();

        let materials: Vec<_> = scene.primitives().iter().map(|p| p.material).collect();
        assert_eq!(materials[3], srgb); // back
        assert_eq!(materials[5], srgb); // left
        assert_eq!(materials[0], white1);
        assert_eq!(materials[4], white1);
        assert!(materials[6..].iter().all(|&m| m == white1));
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_plane_srgb_fills_view() {
        let scene = load_scene("plane-srgb", &data_options()).unwrap();
        let camera = scene.camera();

        // The top edge of the view grazes the top edge of the plane.
        let top = camera.direction_through(Vec2::new(0.5, 1.0));
        let hit = camera.position() + top * (5.0 / -top.z);
        assert!((hit.y - 1.0).abs() < 1e-3);
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_white_point_is_white() {
        let options = RenderOptions {
            width: 8,
            height: 8,
            ..data_options()
        };
        let scene = load_scene("white-point", &options).unwrap();
        assert_eq!(scene.primitives().len(), 1);
        assert_eq!(scene.lights().len(), 1);

        let integrator = PathIntegrator::new(&scene, &options);
        let mut rng = RandomStream::new();
        let rgb = integrator.estimate_pixel(4, 4, 10_000, &mut rng).to_linear_rgb();
        assert!((rgb.0 - Vec3::ONE).abs().max_element() < 0.1, "{:?}", rgb.0);
    }

    #[test]
    fn test_unknown_scene() {
        let err = load_scene("d65sphere", &data_options()).unwrap_err();
        assert!(matches!(err, SceneError::UnknownScene { .. }));
        assert!(err.to_string().contains("cornell-srgb"));
    }

    #[test]
    fn test_missing_data_dir() {
        let options = RenderOptions {
            data_dir: std::env::temp_dir().join("prism-no-such-dir"),
            ..data_options()
        };

        assert!(matches!(
            load_scene("cornell", &options),
            Err(SceneError::SpectralData(_))
        ));
        assert!(matches!(
            load_scene("plane-srgb", &options),
            Err(SceneError::Texture(_))
        ));
    }
}
