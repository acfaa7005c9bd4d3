use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crs::{Converter, CrsId, CrsRegistry, detect};
use formats::Format;
use foundation::{Coord, Geometry, RawPair};
use interaction::copy::copy_all;
use interaction::upload::upload;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use viewport::{
    FitOptions, GeometrySource, PyramidSet, TilePyramid, ZoomPair, ZoomState, fit_viewport,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Coordinate detection, conversion and viewport tools")]
struct Args {
    /// Pyramid config JSON (default: $COORDTOOL_PYRAMIDS, else built-in values)
    #[arg(long)]
    pyramids: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Name the CRS a north/east pair belongs to
    Detect {
        #[arg(allow_hyphen_values = true)]
        north: String,
        #[arg(allow_hyphen_values = true)]
        east: String,
    },

    /// Convert a north/east pair between systems
    Convert {
        /// Source CRS (WGS84, YKJ, ETRS-TM35FIN or an EPSG code)
        #[arg(long)]
        from: CrsId,

        #[arg(long)]
        to: CrsId,

        #[arg(allow_hyphen_values = true)]
        north: f64,
        #[arg(allow_hyphen_values = true)]
        east: f64,
    },

    /// Read coordinate text in any format; print what was detected and the
    /// resulting WGS84 GeoJSON
    Upload {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Re-emit coordinate text in another system and format
    Copy {
        #[arg(long)]
        to: CrsId,

        /// GeoJSON, ISO 6709 or WKT
        #[arg(long, default_value = "geojson")]
        format: Format,

        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Zoom bookkeeping on a pyramid, optionally across a switch
    Zoom {
        #[arg(long, default_value = "national")]
        pyramid: TilePyramid,

        /// Normalized zoom to request
        #[arg(long, allow_hyphen_values = true)]
        normalized: i32,

        /// Pyramid to switch to afterwards
        #[arg(long)]
        switch_to: Option<TilePyramid>,
    },

    /// Fit a viewport around coordinate text
    Fit {
        #[arg(long, default_value = "national")]
        pyramid: TilePyramid,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct UploadReport<'a> {
    format: &'a str,
    crs: &'a str,
    features: usize,
    verbatim: Vec<Option<&'a str>>,
}

#[derive(Serialize)]
struct ZoomReport {
    pyramid: TilePyramid,
    zoom: ZoomPair,
    requested_normalized: i32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let pyramids_path = args
        .pyramids
        .or_else(|| env::var("COORDTOOL_PYRAMIDS").ok().map(PathBuf::from));
    let pyramids = match &pyramids_path {
        Some(path) => {
            info!(path = %path.display(), "loading pyramid config");
            PyramidSet::load(path)?
        }
        None => PyramidSet::default(),
    };

    let registry = CrsRegistry::new()?;
    let converter = Converter::new(&registry);

    match args.command {
        Command::Detect { north, east } => {
            let pair = RawPair::parse_north_east(&north, &east)
                .ok_or_else(|| format!("not a number pair: {north} {east}"))?;
            let crs = detect(&registry, &pair, None)?;
            println!("{crs}");
        }
        Command::Convert {
            from,
            to,
            north,
            east,
        } => {
            let out = converter.convert(Coord::new(north, east), from, to)?;
            println!("{}:{}", out.north, out.east);
        }
        Command::Upload { file } => {
            let text = read_input(file.as_ref())?;
            let uploaded = upload(&converter, &text)?;
            let report = UploadReport {
                format: uploaded.format_name(),
                crs: uploaded.crs_name(),
                features: uploaded.features.len(),
                verbatim: uploaded
                    .features
                    .iter()
                    .map(|f| f.coordinate_verbatim.as_deref())
                    .collect(),
            };
            eprintln!("{}", serde_json::to_string(&report)?);
            let geometries: Vec<Geometry> =
                uploaded.features.into_iter().map(|f| f.geometry).collect();
            println!(
                "{}",
                copy_all(&converter, &geometries, CrsId::Wgs84, Format::GeoJson)?
            );
        }
        Command::Copy { to, format, file } => {
            let text = read_input(file.as_ref())?;
            let uploaded = upload(&converter, &text)?;
            debug!(from = uploaded.crs_name(), to = %to, %format, "copying");
            let geometries: Vec<Geometry> =
                uploaded.features.into_iter().map(|f| f.geometry).collect();
            println!("{}", copy_all(&converter, &geometries, to, format)?);
        }
        Command::Zoom {
            pyramid,
            normalized,
            switch_to,
        } => {
            let mut state = ZoomState::new(pyramid, normalized, &pyramids);
            if let Some(target) = switch_to {
                state.switch_pyramid(target, &pyramids);
            }
            let report = ZoomReport {
                pyramid: state.pyramid(),
                zoom: state.zoom(),
                requested_normalized: state.requested_normalized(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Fit {
            pyramid,
            width,
            height,
            file,
        } => {
            let text = read_input(file.as_ref())?;
            let uploaded = upload(&converter, &text)?;
            let geometries: Vec<Geometry> =
                uploaded.features.into_iter().map(|f| f.geometry).collect();
            let options = FitOptions {
                width_px: width,
                height_px: height,
                ..FitOptions::default()
            };
            let view = fit_viewport(
                &converter,
                &[GeometrySource::new("input", &geometries)],
                pyramids.get(pyramid),
                &options,
            )?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn read_input(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}
