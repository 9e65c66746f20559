mod cli;

use clap::Parser;
use lowpoly_image::{
    density_image, triangulate, triangulate_tracked, Artifact, OutputFormat, PreprocessSettings,
    TriangulateConfig, TriangulateSettings,
};
use std::fs::write;

use crate::cli::{Action, CliArgs, CommonArgs};

fn main() {
    env_logger::init();
    run_app(CliArgs::parse());
}

fn preprocess_settings(common: &CommonArgs) -> PreprocessSettings {
    PreprocessSettings {
        brightness: common.brightness,
        contrast: common.contrast,
        saturation: common.saturation,
        blur: common.blur,
        invert: common.invert,
        gamma: common.gamma,
        density_mode: common.density_mode.into(),
        edge_boost: common.edge_boost,
    }
}

fn run_app(args: CliArgs) {
    match args.action {
        Action::Density { common } => {
            let settings = preprocess_settings(&common);
            if common.verbose {
                println!("{:#?}", settings);
            }
            let image = image::open(&common.input).expect("Cannot open input image");
            let image = density_image(&image, common.resolution, &settings)
                .expect("Cannot produce density field image");
            image.save(&common.output).expect("Cannot save output image");
            log::info!("saved density field image to {}", common.output.display());
        }
        Action::Triangulate {
            common,
            format,
            points,
            dark_strength,
            min_dist,
            edge_samples,
            no_wires,
            wire_color,
            wire_width,
            seed,
            output_resolution,
            settings_space,
        } => {
            let image = image::open(&common.input).expect("Cannot open input image");
            let config = TriangulateConfig {
                image,
                resolution: common.resolution,
                output_resolution,
                preprocess: preprocess_settings(&common),
                settings: TriangulateSettings {
                    points,
                    dark_strength,
                    min_dist,
                    edge_samples,
                    show_wires: !no_wires,
                    wire_color,
                    wire_width,
                    seed,
                    settings_space: settings_space.into(),
                },
                format: if format.svg {
                    OutputFormat::Svg
                } else {
                    OutputFormat::Image
                },
            };
            if common.verbose {
                println!("{:#?}", config.preprocess);
                println!("{:#?}", config.settings);
            }
            let artifact = if common.verbose {
                triangulate_tracked(&config, |percent| {
                    println!("Progress: {}%", percent);
                })
            } else {
                triangulate(&config)
            }
            .expect("Cannot produce triangulated artwork");
            match artifact {
                Artifact::Raster(image) => {
                    image.save(&common.output).expect("Cannot save output image");
                }
                Artifact::Svg(svg) => {
                    write(&common.output, svg).expect("Cannot save output file");
                }
            }
            log::info!("saved triangulated artwork to {}", common.output.display());
        }
    }
}
