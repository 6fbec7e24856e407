use anyhow::{Context, Result};
use clap::Parser;
use shp2svg::archive::ZipShapefileOpener;
use shp2svg::runtime::{self, ConvertRequest};
use shp2svg::{OutputFormat, Preset, RenderOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shp2svg")]
#[command(about = "Render zipped shapefiles into a single SVG image", long_about = None)]
struct Args {
    /// Path to zipped shapefiles
    #[arg(short = 'z', long = "shapefiles", required = true, num_args = 1..)]
    shapefiles: Vec<PathBuf>,

    /// Path to destination image
    #[arg(short = 'd', long)]
    destination: PathBuf,

    /// Target projection (e.g. 'EPSG:3857' or a proj string)
    #[arg(short = 'c', long)]
    crs: Option<String>,

    /// Keep source coordinates instead of projecting
    #[arg(long, conflicts_with = "crs")]
    no_projection: bool,

    /// Filter expressions, ';' separated (e.g. 'NAME = [France, Spain]; TYPE = country')
    #[arg(short = 'f', long = "filter", value_delimiter = ';')]
    filters: Vec<String>,

    /// Scale factor
    #[arg(short = 's', long = "scale-factor")]
    scale: Option<f64>,

    /// Default settings to start from
    #[arg(long, value_enum, default_value_t = Preset::Projected)]
    preset: Preset,

    /// Output format (defaults to the destination extension, then svg)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// JSON file with render options, used instead of the preset
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn render_options(&self) -> Result<RenderOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config '{}'", path.display()))?;
                RenderOptions::from_json(&text)
                    .with_context(|| format!("Invalid config '{}'", path.display()))?
            }
            None => self.preset.options(),
        };

        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        if self.no_projection {
            options.crs = None;
        } else if let Some(crs) = &self.crs {
            options.crs = Some(crs.clone());
        }
        if let Some(format) = self
            .format
            .or_else(|| OutputFormat::from_path(&self.destination))
        {
            options.format = format;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let options = args.render_options()?;

    let request = ConvertRequest {
        shapefiles: args.shapefiles.clone(),
        destination: args.destination.clone(),
        // Tolerate empty segments such as a trailing ';'
        filters: args
            .filters
            .iter()
            .filter(|f| !f.trim().is_empty())
            .cloned()
            .collect(),
        options,
    };

    let report = runtime::convert(&request, &ZipShapefileOpener)
        .with_context(|| format!("Failed to render '{}'", args.destination.display()))?;

    log::info!(
        "{} shapes from {} records rendered at {}x{}",
        report.shapes,
        report.records_scanned,
        report.width,
        report.height
    );

    Ok(())
}
