// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use navix;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct NetworkLoadError(PathBuf, #[source] navix::osm::Error);

#[derive(Parser)]
struct Cli {
    /// The path to the OSM file (.osm, .osm.gz or .osm.bz2)
    osm_file: PathBuf,

    /// Latitude of the start point
    start_lat: f64,

    /// Longitude of the start point
    start_lon: f64,

    /// Latitude of the end point
    end_lat: f64,

    /// Longitude of the end point
    end_lon: f64,

    /// Print the route as GeoJSON instead of turn-by-turn directions
    #[arg(long)]
    geojson: bool,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let net = load_network(&cli.osm_file)?;
    log::info!("loaded road network with {} nodes", net.len());

    let route = navix::shortest_path(
        &net,
        cli.start_lon,
        cli.start_lat,
        cli.end_lon,
        cli.end_lat,
        navix::DEFAULT_STEP_LIMIT,
    )?;

    if cli.geojson {
        print_geojson(&net, &route);
    } else {
        for step in navix::route_directions(&net, &route)? {
            println!("{step}");
        }
    }

    Ok(())
}

fn load_network<P: AsRef<Path>>(path: P) -> Result<navix::RoadNetwork, NetworkLoadError> {
    let path = path.as_ref();
    let mut net = navix::RoadNetwork::new();
    let options = navix::osm::Options {
        file_format: navix::osm::FileFormat::from_path(path),
        bbox: [0.0; 4],
    };
    if let Err(e) = navix::osm::add_features_from_file(&mut net, &options, path) {
        return Err(NetworkLoadError(PathBuf::from(path), e));
    }
    if let Err(e) = net.freeze() {
        return Err(NetworkLoadError(PathBuf::from(path), e.into()));
    }
    Ok(net)
}

fn print_geojson(net: &navix::RoadNetwork, route: &[i64]) {
    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{}},");

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut nodes = route
        .iter()
        .map(|&node_id| net.node(node_id).unwrap())
        .peekable();
    while let Some(node) = nodes.next() {
        let suffix = if nodes.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", node.lon, node.lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");
}
