use std::env;

use anyhow::{anyhow, Context, Result};
use glam::Vec4;
use log::{info, warn};

use globe_shading::{render_preview, shader_source, GlobeShader, PreviewOptions, ShadingConfig};

const USAGE: &str = "Usage: globe-shade <output.png> [--config <file.xml>] [--size <px>] \
[--specular <value>] [--color <r g b>] [--unlit] [--gradient-only] [--back-faces]\n       \
globe-shade --print-wgsl [--config <file.xml>]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let config = match options.config.as_deref() {
        Some(path) => ShadingConfig::load(path)?,
        None => ShadingConfig::default(),
    };

    if options.print_wgsl {
        print!("{}", shader_source(&config));
        return Ok(());
    }

    let Some(output) = options.output else {
        return Err(anyhow!(USAGE));
    };
    if options.preview.specular > 1.0 {
        warn!(
            "specular {} is above 1; the rim blend saturates",
            options.preview.specular
        );
    }

    let shader = GlobeShader::new(config);
    let image = render_preview(&shader, &options.preview)?;
    image
        .save(&output)
        .with_context(|| format!("failed to write {output}"))?;
    info!("preview written to {output}");
    println!(
        "Wrote {0}x{0} preview to {output}",
        options.preview.size
    );
    Ok(())
}

struct CliOptions {
    output: Option<String>,
    config: Option<String>,
    print_wgsl: bool,
    preview: PreviewOptions,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            output: None,
            config: None,
            print_wgsl: false,
            preview: PreviewOptions::default(),
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--print-wgsl" => options.print_wgsl = true,
                "--unlit" => options.preview.lighting = false,
                "--gradient-only" => options.preview.gradient_only = true,
                "--back-faces" => options.preview.back_faces = true,
                "--config" => options.config = Some(value(&mut args, "--config")?),
                "--size" => {
                    let size = value(&mut args, "--size")?;
                    options.preview.size = size
                        .parse()
                        .with_context(|| format!("invalid --size {size:?}"))?;
                }
                "--specular" => {
                    let specular = value(&mut args, "--specular")?;
                    options.preview.specular = specular
                        .parse()
                        .with_context(|| format!("invalid --specular {specular:?}"))?;
                }
                "--color" => {
                    let mut rgb = [0.0f32; 3];
                    for channel in rgb.iter_mut() {
                        let component = value(&mut args, "--color")?;
                        *channel = component
                            .parse()
                            .with_context(|| format!("invalid --color component {component:?}"))?;
                    }
                    options.preview.color = Vec4::new(rgb[0], rgb[1], rgb[2], 1.0);
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
                other => {
                    if options.output.is_some() {
                        return Err(anyhow!("Unexpected argument: {other}\n{USAGE}"));
                    }
                    options.output = Some(other.to_string());
                }
            }
        }
        Ok(options)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
}
